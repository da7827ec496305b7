use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{validate_table_name, AuditRecord, AuditSink};
use crate::core::config::AuditConfig;
use crate::core::errors::RagError;

/// Inserts rows through Supabase's PostgREST endpoint.
pub struct SupabaseAuditSink {
    endpoint: String,
    key: String,
    client: Client,
}

impl SupabaseAuditSink {
    pub fn new(config: &AuditConfig) -> Result<Self, RagError> {
        validate_table_name(&config.table)?;
        let url = config
            .supabase_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| RagError::audit("audit.supabase_url (or SUPABASE_URL) is not set"))?;
        let key = config
            .supabase_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RagError::audit("audit.supabase_key (or SUPABASE_ANON_KEY) is not set")
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(RagError::audit)?;

        Ok(Self {
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table),
            key,
            client,
        })
    }
}

fn row(record: &AuditRecord) -> serde_json::Value {
    json!({
        "UserPrompt": record.question,
        "AIResponse": record.answer,
        "Site": record.source_label,
    })
}

#[async_trait]
impl AuditSink for SupabaseAuditSink {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn record(&self, record: &AuditRecord) -> Result<(), RagError> {
        let res = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=minimal")
            .json(&row(record))
            .send()
            .await
            .map_err(RagError::audit)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::AuditWriteFailure(format!(
                "supabase insert returned {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}
