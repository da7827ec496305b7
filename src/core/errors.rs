use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Message returned to callers for every per-request failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Failures of the retrieval and answering pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("external model failure: {0}")]
    ExternalModelFailure(String),
    #[error("audit write failure: {0}")]
    AuditWriteFailure(String),
}

impl RagError {
    pub fn corpus<E: std::fmt::Display>(err: E) -> Self {
        RagError::CorpusUnavailable(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RagError::EmbeddingUnavailable(err.to_string())
    }

    pub fn model<E: std::fmt::Display>(err: E) -> Self {
        RagError::ExternalModelFailure(err.to_string())
    }

    pub fn audit<E: std::fmt::Display>(err: E) -> Self {
        RagError::AuditWriteFailure(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match &err {
            RagError::DimensionMismatch { expected, actual } => {
                tracing::error!(
                    expected = *expected,
                    actual = *actual,
                    "Configuration anomaly: query embedding dimension does not match the corpus index"
                );
            }
            other => tracing::error!("Request failed: {}", other),
        }
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Internal detail is logged where the error is raised, never returned.
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_ERROR_MESSAGE.to_string(),
            ),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_detail() {
        let response =
            ApiError::from(RagError::model("quota exceeded for key abc")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn dimension_mismatch_names_both_sizes() {
        let err = RagError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: index has 384, query has 768"
        );
    }

    #[test]
    fn bad_request_keeps_status() {
        let response = ApiError::BadRequest("question must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
