use std::sync::Arc;

use async_trait::async_trait;

use super::gemini::GeminiModel;
use super::openai_compatible::OpenAiCompatibleModel;
use crate::core::config::{LlmConfig, LlmProviderKind};
use crate::core::errors::RagError;

/// The generative backend: prompt in, answer out.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    /// Provider name for logs (e.g. "gemini", "openai_compatible").
    fn name(&self) -> &str;

    /// Single non-streaming completion. Timeouts are enforced by the
    /// provider's HTTP client.
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

pub fn build_answer_model(config: &LlmConfig) -> Result<Arc<dyn AnswerModel>, RagError> {
    match config.provider {
        LlmProviderKind::Gemini => Ok(Arc::new(GeminiModel::new(config)?)),
        LlmProviderKind::OpenaiCompatible => Ok(Arc::new(OpenAiCompatibleModel::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_requires_an_api_key() {
        let config = LlmConfig {
            api_key: None,
            ..LlmConfig::default()
        };
        let err = build_answer_model(&config).err().unwrap();
        assert!(matches!(err, RagError::ExternalModelFailure(_)));
    }

    #[test]
    fn builds_the_configured_provider() {
        let gemini = build_answer_model(&LlmConfig {
            api_key: Some("key".into()),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(gemini.name(), "gemini");

        let local = build_answer_model(&LlmConfig {
            provider: LlmProviderKind::OpenaiCompatible,
            base_url: "http://localhost:1234/".into(),
            model: "qwen2.5-7b-instruct".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(local.name(), "openai_compatible");
    }
}
