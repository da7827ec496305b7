use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::AnswerModel;
use crate::core::config::LlmConfig;
use crate::core::errors::RagError;

/// Google Generative Language API (`models/{model}:generateContent`).
#[derive(Clone)]
pub struct GeminiModel {
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f64>,
    client: Client,
}

impl GeminiModel {
    pub fn new(config: &LlmConfig) -> Result<Self, RagError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RagError::ExternalModelFailure(
                    "llm.api_key (or GEMINI_API_KEY) is required for the gemini provider".into(),
                )
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagError::model)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[async_trait]
impl AnswerModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if let (Some(obj), Some(t)) = (body.as_object_mut(), self.temperature) {
            obj.insert("generationConfig".to_string(), json!({ "temperature": t }));
        }

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RagError::model)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ExternalModelFailure(format!(
                "gemini returned {}: {}",
                status, text
            )));
        }

        let payload: GenerateContentResponse = res.json().await.map_err(RagError::model)?;
        payload
            .into_text()
            .ok_or_else(|| RagError::ExternalModelFailure("gemini returned no candidates".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_configured_model() {
        let model = GeminiModel::new(&LlmConfig {
            api_key: Some("key".into()),
            base_url: "https://generativelanguage.googleapis.com/".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(
            model.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let result = GeminiModel::new(&LlmConfig {
            api_key: Some("  ".into()),
            ..LlmConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn joins_candidate_parts() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Bro, "},{"text":"bawal yan."}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.into_text().as_deref(), Some("Bro, bawal yan."));

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.into_text(), None);
    }
}
