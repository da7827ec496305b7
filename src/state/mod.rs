use std::sync::Arc;

use crate::audit::build_audit_sink;
use crate::core::config::service::parse_app_config;
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::engine::{EngineConfig, QueryEngine};
use crate::llm::build_answer_model;
use crate::rag::{CorpusSource, Embedder, HttpEmbedder};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// The handbook index inside `engine` is built once here and never mutated
/// afterwards.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppConfig>,
    pub engine: Arc<QueryEngine>,
}

impl AppState {
    pub fn new(settings: AppConfig, engine: QueryEngine) -> Arc<Self> {
        Arc::new(AppState {
            settings: Arc::new(settings),
            engine: Arc::new(engine),
        })
    }

    /// Loads configuration, builds the index and wires every collaborator.
    ///
    /// A corpus that cannot be loaded is fatal: the server never starts
    /// without an index.
    pub async fn initialize_with(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        tracing::debug!(
            "Effective configuration from {}: {}",
            config.config_path().display(),
            config.redact_sensitive_values(&raw)
        );
        let settings = parse_app_config(&raw).map_err(|e| InitializationError::Config(e.into()))?;

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::from_config(&settings.embedding));

        let source = CorpusSource::from_config(&settings.corpus, &paths);
        tracing::info!("Loading handbook index from {:?}", source);
        let index = source
            .load_index(embedder.as_ref())
            .await
            .map_err(|e| InitializationError::Corpus(e.into()))?;
        tracing::info!(
            chunks = index.len(),
            dimension = ?index.dimension(),
            origin = ?index.origin(),
            "Handbook index ready"
        );

        let model =
            build_answer_model(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;

        let audit = build_audit_sink(&settings.audit, &paths)
            .await
            .map_err(|e| InitializationError::Audit(e.into()))?;
        tracing::info!("Audit sink: {}", audit.name());

        let engine = QueryEngine::new(
            Arc::new(index),
            embedder,
            model,
            audit,
            EngineConfig::from(&settings),
        );

        Ok(Arc::new(AppState {
            settings: Arc::new(settings),
            engine: Arc::new(engine),
        }))
    }
}
