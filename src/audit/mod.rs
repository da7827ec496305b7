//! Best-effort recording of answered questions.
//!
//! Audit writes run on their own task after the answer is produced; a failed
//! write is logged and never reaches the caller.

mod sqlite;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::config::{AppPaths, AuditBackend, AuditConfig};
use crate::core::errors::RagError;

pub use sqlite::SqliteAuditSink;
pub use supabase::SupabaseAuditSink;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub question: String,
    pub answer: String,
    pub source_label: String,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(question: &str, answer: &str, source_label: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            source_label: source_label.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &str;

    async fn record(&self, record: &AuditRecord) -> Result<(), RagError>;
}

/// Sink used when auditing is turned off.
pub struct DisabledAuditSink;

#[async_trait]
impl AuditSink for DisabledAuditSink {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn record(&self, _record: &AuditRecord) -> Result<(), RagError> {
        Ok(())
    }
}

/// Hands `record` to `sink` on a background task.
pub fn spawn_record(sink: Arc<dyn AuditSink>, record: AuditRecord) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = sink.record(&record).await {
            tracing::warn!("Failed to write audit record to {}: {}", sink.name(), e);
        }
    })
}

pub async fn build_audit_sink(
    config: &AuditConfig,
    paths: &AppPaths,
) -> Result<Arc<dyn AuditSink>, RagError> {
    if !config.enabled {
        return Ok(Arc::new(DisabledAuditSink));
    }
    match config.backend {
        AuditBackend::Disabled => Ok(Arc::new(DisabledAuditSink)),
        AuditBackend::Sqlite => Ok(Arc::new(
            SqliteAuditSink::with_path(paths.db_path.clone(), &config.table).await?,
        )),
        AuditBackend::Supabase => Ok(Arc::new(SupabaseAuditSink::new(config)?)),
    }
}

/// Table names are interpolated into SQL and URLs, so only plain identifiers
/// are accepted.
fn validate_table_name(table: &str) -> Result<(), RagError> {
    let valid = !table.is_empty()
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(RagError::AuditWriteFailure(format!(
            "invalid audit table name '{}'",
            table
        )))
    }
}
