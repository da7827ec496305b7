//! Embeddings served over an OpenAI-compatible `/v1/embeddings` endpoint
//! (LM Studio, llama.cpp server, text-embeddings-inference, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::embedder::{l2_normalize, EmbeddingModel, LazyEmbedder, ModelLoader};
use crate::core::config::EmbeddingConfig;
use crate::core::errors::RagError;

const DIMENSION_PROBE: &str = "dimension probe";

pub type HttpEmbedder = LazyEmbedder<HttpEmbeddingLoader>;

impl HttpEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        LazyEmbedder::new(HttpEmbeddingLoader::new(config.clone()))
    }
}

pub struct HttpEmbeddingLoader {
    config: EmbeddingConfig,
}

impl HttpEmbeddingLoader {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for HttpEmbeddingLoader {
    type Model = HttpEmbeddingModel;

    fn describe(&self) -> String {
        format!("{} @ {}", self.config.model, self.config.base_url)
    }

    async fn load(&self) -> Result<HttpEmbeddingModel, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(RagError::embedding)?;

        let mut model = HttpEmbeddingModel {
            client,
            url: format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/')),
            model: self.config.model.clone(),
            api_key: self.config.api_key.clone(),
            normalize: self.config.normalize,
            dimension: 0,
        };

        let probe = model.request(DIMENSION_PROBE).await?;
        if probe.is_empty() {
            return Err(RagError::EmbeddingUnavailable(format!(
                "model {} returned an empty embedding",
                model.model
            )));
        }
        model.dimension = probe.len();
        Ok(model)
    }
}

pub struct HttpEmbeddingModel {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    normalize: bool,
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl HttpEmbeddingModel {
    async fn request(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let body = json!({
            "model": self.model,
            "input": [text],
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(RagError::embedding)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingUnavailable(format!(
                "embedding endpoint returned {}: {}",
                status, text
            )));
        }

        let payload: EmbeddingResponse = res.json().await.map_err(RagError::embedding)?;
        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| RagError::EmbeddingUnavailable("empty embedding response".into()))?;

        Ok(if self.normalize {
            l2_normalize(vector)
        } else {
            vector
        })
    }
}

#[async_trait]
impl EmbeddingModel for HttpEmbeddingModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.request(text).await
    }
}
