//! Conversation history windowing.
//!
//! The chat client sends its raw message log; the prompt only ever sees the
//! most recent user/assistant pairs.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TURNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One user question and the reply to it, empty until one arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    #[serde(default)]
    pub assistant: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Folds messages into turns in arrival order.
///
/// A user message opens a turn; an assistant message fills the most recently
/// opened one. Assistant messages that arrive before any user message are
/// dropped.
pub fn fold_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();
    for message in messages {
        match message.role {
            Role::User => turns.push(Turn::new(message.content.clone(), "")),
            Role::Assistant => {
                if let Some(last) = turns.last_mut() {
                    last.assistant = message.content.clone();
                }
            }
        }
    }
    turns
}

/// Keeps the last `max_turns` turns.
pub fn truncate_turns(mut turns: Vec<Turn>, max_turns: usize) -> Vec<Turn> {
    let excess = turns.len().saturating_sub(max_turns);
    turns.drain(..excess);
    turns
}

pub fn window(messages: &[Message], max_turns: usize) -> Vec<Turn> {
    truncate_turns(fold_turns(messages), max_turns)
}
