pub mod gemini;
pub mod openai_compatible;
pub mod provider;
pub mod types;

pub use gemini::GeminiModel;
pub use openai_compatible::OpenAiCompatibleModel;
pub use provider::{build_answer_model, AnswerModel};
