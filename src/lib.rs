pub mod audit;
pub mod core;
pub mod engine;
pub mod history;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod server;
pub mod state;
