use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::AnswerModel;
use super::types::ChatMessage;
use crate::core::config::LlmConfig;
use crate::core::errors::RagError;

/// Any server exposing `/v1/chat/completions` (LM Studio, llama.cpp, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f64>,
    client: Client,
}

impl OpenAiCompatibleModel {
    pub fn new(config: &LlmConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagError::model)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            client,
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl AnswerModel for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": [ChatMessage::user(prompt)],
            "stream": false,
        });
        if let (Some(obj), Some(t)) = (body.as_object_mut(), self.temperature) {
            obj.insert("temperature".to_string(), json!(t));
        }

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(RagError::model)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ExternalModelFailure(format!(
                "chat completion returned {}: {}",
                status, text
            )));
        }

        let payload: ChatCompletionResponse = res.json().await.map_err(RagError::model)?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::ExternalModelFailure("completion had no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_payload() {
        let payload: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Yes, on Fridays."},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.choices[0].message.content, "Yes, on Fridays.");
    }

    #[tokio::test]
    async fn unreachable_server_is_external_model_failure() {
        let model = OpenAiCompatibleModel::new(&LlmConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..LlmConfig::default()
        })
        .unwrap();

        let err = model.generate("hello").await.unwrap_err();
        assert!(matches!(err, RagError::ExternalModelFailure(_)));
    }
}
