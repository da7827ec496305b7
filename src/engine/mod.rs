//! Per-request orchestration: embed the question, rank the handbook, window
//! the history, compose the prompt, call the model, audit the answer.
//!
//! The engine owns no mutable state. The index is shared read-only and every
//! collaborator is injected, so any number of requests can run concurrently.

use std::sync::Arc;

use serde::Deserialize;

use crate::audit::{spawn_record, AuditRecord, AuditSink};
use crate::core::config::AppConfig;
use crate::core::errors::RagError;
use crate::history::{truncate_turns, window, Message, Turn, DEFAULT_MAX_TURNS};
use crate::llm::AnswerModel;
use crate::prompt::{Persona, PromptRequest};
use crate::rag::ranker::DEFAULT_TOP_K;
use crate::rag::{top_k, Embedder, Index, RetrievalResult};

/// Liveness check: answered with `None` without touching any collaborator.
pub const PING_QUESTION: &str = "ping6969lol";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Embedded,
    Retrieved,
    ComposedReady,
    PromptReady,
    Answered,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub top_k: usize,
    pub max_turns: usize,
    pub history_enabled: bool,
    pub audit_enabled: bool,
    pub source_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_turns: DEFAULT_MAX_TURNS,
            history_enabled: true,
            audit_enabled: true,
            source_label: "Localhost".to_string(),
        }
    }
}

impl From<&AppConfig> for EngineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_turns: config.history.max_turns,
            history_enabled: config.history.enabled,
            audit_enabled: config.audit.enabled,
            source_label: config.audit.source_label.clone(),
        }
    }
}

/// Conversation history as sent by a client: either the raw message log or
/// turns that were already paired.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryInput {
    Messages(Vec<Message>),
    Turns(Vec<Turn>),
}

impl HistoryInput {
    pub fn into_turns(self, max_turns: usize) -> Vec<Turn> {
        match self {
            HistoryInput::Messages(messages) => window(&messages, max_turns),
            HistoryInput::Turns(turns) => truncate_turns(turns, max_turns),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    pub persona: Persona,
    pub history: Option<HistoryInput>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            persona: Persona::default(),
            history: None,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_history(mut self, history: HistoryInput) -> Self {
        self.history = Some(history);
        self
    }
}

pub struct QueryEngine {
    index: Arc<Index>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn AnswerModel>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(
        index: Arc<Index>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn AnswerModel>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            model,
            audit,
            config,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Embeds `question` and returns the best matching excerpts.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult, RagError> {
        let query = self.embedder.embed(question).await?;
        trace_stage(Stage::Embedded);

        let excerpts = top_k(&query, &self.index, self.config.top_k)?;
        trace_stage(Stage::Retrieved);
        Ok(excerpts)
    }

    /// Everything up to the model call. Returns the exact prompt string.
    pub async fn build_prompt(&self, request: &QueryRequest) -> Result<String, RagError> {
        let excerpts = self.retrieve(&request.question).await?;
        tracing::debug!(
            scores = ?excerpts.chunks.iter().map(|c| (c.chunk_id, c.score)).collect::<Vec<_>>(),
            "Retrieved handbook excerpts"
        );

        let history = match (&request.history, self.config.history_enabled) {
            (Some(history), true) => history.clone().into_turns(self.config.max_turns),
            _ => Vec::new(),
        };
        trace_stage(Stage::ComposedReady);

        let prompt = PromptRequest {
            question: &request.question,
            persona: request.persona,
            history: &history,
            excerpts: &excerpts,
        }
        .render();
        trace_stage(Stage::PromptReady);
        Ok(prompt)
    }

    /// Runs one request to completion. `Ok(None)` only for the ping question.
    pub async fn answer(&self, request: QueryRequest) -> Result<Option<String>, RagError> {
        if request.question == PING_QUESTION {
            return Ok(None);
        }
        trace_stage(Stage::Received);
        tracing::info!(
            persona = request.persona.name(),
            "Received question: {}",
            request.question
        );

        let prompt = self.build_prompt(&request).await?;
        let answer = self.model.generate(&prompt).await?;
        trace_stage(Stage::Answered);
        tracing::info!(
            model = self.model.name(),
            "Generated response ({} chars)",
            answer.len()
        );

        if self.config.audit_enabled {
            spawn_record(
                self.audit.clone(),
                AuditRecord::new(&request.question, &answer, &self.config.source_label),
            );
        }

        Ok(Some(answer))
    }
}

fn trace_stage(stage: Stage) {
    tracing::debug!(stage = ?stage, "query stage reached");
}
