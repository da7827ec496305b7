//! Precomputes handbook embeddings so the server can start without
//! embedding the whole corpus.
//!
//! Usage: `embed_handbook [TEXT_PATH] [OUTPUT_PATH]`. Missing arguments fall
//! back to `corpus.text_path` and `corpus.precomputed_path` from config.

use std::env;
use std::sync::Arc;

use anyhow::Context;

use handbook_qa::core::config::{AppPaths, ConfigService};
use handbook_qa::core::logging;
use handbook_qa::rag::chunker::chunk_file;
use handbook_qa::rag::corpus::write_precomputed;
use handbook_qa::rag::{HttpEmbedder, Index};

const DEFAULT_TEXT_PATH: &str = "handbook.txt";
const DEFAULT_OUTPUT_PATH: &str = "handbook_embeddings.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "embed_handbook.log");

    let settings = ConfigService::new(paths.clone())
        .load_app_config()
        .context("Failed to load configuration")?;

    let mut args = env::args().skip(1);
    let text_path = args
        .next()
        .or_else(|| settings.corpus.text_path.clone())
        .unwrap_or_else(|| DEFAULT_TEXT_PATH.to_string());
    let output_path = args
        .next()
        .or_else(|| settings.corpus.precomputed_path.clone())
        .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());
    let text_path = paths.resolve(&text_path);
    let output_path = paths.resolve(&output_path);

    let chunks = chunk_file(&text_path, settings.corpus.max_words).await?;
    tracing::info!(
        "Chunked {} into {} chunks of at most {} words",
        text_path.display(),
        chunks.len(),
        settings.corpus.max_words
    );

    let embedder = HttpEmbedder::from_config(&settings.embedding);
    let index = Index::build_from_corpus(chunks, &embedder).await?;

    write_precomputed(&output_path, &index).await?;
    tracing::info!(
        dimension = ?index.dimension(),
        "Wrote {} embeddings to {}",
        index.len(),
        output_path.display()
    );

    Ok(())
}
