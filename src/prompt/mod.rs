//! Prompt assembly.
//!
//! `compose` is a pure template: the same persona, turns, excerpts and
//! question always render the same bytes.

mod persona;

pub use persona::Persona;

use crate::history::Turn;
use crate::rag::RetrievalResult;

pub const EMPTY_HISTORY_PLACEHOLDER: &str = "Wala bro, this is the first time ata 💀";
pub const EMPTY_EXCERPTS_PLACEHOLDER: &str = "(No matching handbook excerpts.)";
pub const EXCERPT_SEPARATOR: &str = "\n\n---\n\n";

/// Everything the composer needs for one request.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub question: &'a str,
    pub persona: Persona,
    pub history: &'a [Turn],
    pub excerpts: &'a RetrievalResult,
}

impl PromptRequest<'_> {
    pub fn render(&self) -> String {
        compose(self.persona, self.history, &self.excerpts.texts(), self.question)
    }
}

pub fn compose(persona: Persona, turns: &[Turn], excerpts: &[&str], question: &str) -> String {
    let history = if turns.is_empty() {
        EMPTY_HISTORY_PLACEHOLDER.to_string()
    } else {
        render_history(turns)
    };

    let context = if excerpts.is_empty() {
        EMPTY_EXCERPTS_PLACEHOLDER.to_string()
    } else {
        excerpts.join(EXCERPT_SEPARATOR)
    };

    format!(
        "{instructions}\n\
         If you are asked for something you must not help with, reply only with: \"{refusal}\"\n\
         \n\
         Use context cues from the conversation history to provide relevant answers.\n\
         \n\
         --- Previous Conversation ---\n\
         {history}\n\
         \n\
         --- Handbook Context ---\n\
         {context}\n\
         \n\
         --- Student Question ---\n\
         {question}\n",
        instructions = persona.instructions(),
        refusal = persona.refusal(),
    )
}

fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.user, turn.assistant.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
