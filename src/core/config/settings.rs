//! Typed view of the merged `config.yml` + `secrets.yaml` document.
//!
//! Every field has a default so that an empty configuration still starts a
//! server against `handbook.txt` in the project root.

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_MAX_TURNS;
use crate::prompt::Persona;
use crate::rag::chunker::DEFAULT_MAX_WORDS;
use crate::rag::ranker::DEFAULT_TOP_K;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub retrieval: RetrievalConfig,
    pub history: HistoryConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub audit: AuditConfig,
    pub persona: PersonaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5173,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Plain-text handbook, chunked and embedded at startup.
    pub text_path: Option<String>,
    /// Single JSON file holding `{ "chunks": [...], "embeddings": [[...]] }`.
    pub precomputed_path: Option<String>,
    /// Split precomputed form: a JSON array of chunk texts...
    pub chunks_path: Option<String>,
    /// ...and a JSON matrix of embeddings aligned with it.
    pub embeddings_path: Option<String>,
    pub max_words: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            text_path: None,
            precomputed_path: None,
            chunks_path: None,
            embeddings_path: None,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub max_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub normalize: bool,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
            normalize: true,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    Gemini,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
            api_key: None,
            temperature: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditBackend {
    Sqlite,
    Supabase,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub backend: AuditBackend,
    pub table: String,
    pub source_label: String,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: AuditBackend::Sqlite,
            table: "Services".to_string(),
            source_label: "Localhost".to_string(),
            supabase_url: None,
            supabase_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub default: Persona,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config.corpus.max_words, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.history.max_turns, 5);
        assert_eq!(config.corpus.max_words, DEFAULT_MAX_WORDS);
        assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
        assert_eq!(config.history.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert_eq!(config.audit.source_label, "Localhost");
        assert_eq!(config.persona.default, Persona::Standard);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = serde_json::from_value(json!({
            "llm": { "provider": "openai_compatible", "base_url": "http://localhost:1234" },
            "audit": { "backend": "disabled" }
        }))
        .unwrap();

        assert_eq!(config.llm.provider, LlmProviderKind::OpenaiCompatible);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.audit.backend, AuditBackend::Disabled);
        assert!(config.audit.enabled);
    }
}
