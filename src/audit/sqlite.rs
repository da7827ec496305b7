use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use super::{validate_table_name, AuditRecord, AuditSink};
use crate::core::errors::RagError;

/// Local audit log in the user data directory.
pub struct SqliteAuditSink {
    pool: SqlitePool,
    insert_sql: String,
}

impl SqliteAuditSink {
    pub async fn with_path(db_path: PathBuf, table: &str) -> Result<Self, RagError> {
        validate_table_name(table)?;

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::audit)?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_prompt TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                site TEXT NOT NULL,
                created_at TEXT NOT NULL
            )"
        ))
        .execute(&pool)
        .await
        .map_err(RagError::audit)?;

        Ok(Self {
            pool,
            insert_sql: format!(
                "INSERT INTO {table} (user_prompt, ai_response, site, created_at) VALUES (?, ?, ?, ?)"
            ),
        })
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn record(&self, record: &AuditRecord) -> Result<(), RagError> {
        sqlx::query(&self.insert_sql)
            .bind(&record.question)
            .bind(&record.answer)
            .bind(&record.source_label)
            .bind(record.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(RagError::audit)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    async fn test_sink(table: &str) -> (tempfile::TempDir, SqliteAuditSink) {
        let tmp = tempfile::tempdir().unwrap();
        let sink = SqliteAuditSink::with_path(tmp.path().join("audit.db"), table)
            .await
            .unwrap();
        (tmp, sink)
    }

    #[tokio::test]
    async fn records_question_answer_and_site() {
        let (_tmp, sink) = test_sink("Services").await;

        sink.record(&AuditRecord::new("Can I wear shorts?", "Only on Fridays.", "Localhost"))
            .await
            .unwrap();
        sink.record(&AuditRecord::new("Second?", "Yes.", "Localhost"))
            .await
            .unwrap();

        let rows = sqlx::query("SELECT user_prompt, ai_response, site FROM Services ORDER BY id")
            .fetch_all(&sink.pool)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get::<String, _>("user_prompt"), "Can I wear shorts?");
        assert_eq!(rows[0].get::<String, _>("ai_response"), "Only on Fridays.");
        assert_eq!(rows[1].get::<String, _>("site"), "Localhost");
    }

    #[tokio::test]
    async fn reopening_keeps_existing_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.db");

        let first = SqliteAuditSink::with_path(path.clone(), "qa_log").await.unwrap();
        first.record(&AuditRecord::new("q", "a", "prod")).await.unwrap();
        first.pool.close().await;

        let second = SqliteAuditSink::with_path(path, "qa_log").await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qa_log")
            .fetch_one(&second.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn rejects_unsafe_table_names() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SqliteAuditSink::with_path(tmp.path().join("audit.db"), "a-b").await;
        assert!(matches!(result, Err(RagError::AuditWriteFailure(_))));
    }
}
