use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::core::errors::ApiError;
use crate::engine::{HistoryInput, QueryRequest};
use crate::prompt::Persona;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub persona: Option<Persona>,
    #[serde(default)]
    pub brainrot_mode: Option<bool>,
    #[serde(default)]
    pub history: Option<HistoryInput>,
}

impl AskRequest {
    /// An explicit `persona` wins over the legacy `brainrotMode` flag, which
    /// wins over the configured default.
    fn resolve_persona(&self, default: Persona) -> Persona {
        self.persona
            .or_else(|| self.brainrot_mode.map(Persona::from_brainrot_flag))
            .unwrap_or(default)
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: Option<String>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let request_id = uuid::Uuid::new_v4();
    let persona = payload.resolve_persona(state.settings.persona.default);
    let request = QueryRequest {
        question: payload.question,
        persona,
        history: payload.history,
    };

    let span = tracing::info_span!("ask", %request_id, persona = persona.name());
    let answer = state.engine.answer(request).instrument(span).await?;

    Ok(Json(AskResponse { answer }))
}
