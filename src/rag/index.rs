//! The build-once handbook index.
//!
//! An `Index` pairs every chunk with its embedding by ordinal position and is
//! never mutated after construction, so it can be shared behind an `Arc`
//! without locking.

use serde::Serialize;

use super::chunker::Chunk;
use super::embedder::Embedder;
use crate::core::errors::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    /// Embeddings computed at startup from the chunked text.
    BuiltFromCorpus,
    /// Embeddings loaded from files produced ahead of time.
    Precomputed,
}

#[derive(Debug)]
pub struct Index {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimension: Option<usize>,
    origin: IndexOrigin,
}

impl Index {
    /// Embeds each chunk in order. Any failure discards the whole build.
    pub async fn build_from_corpus(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Self, RagError> {
        let total = chunks.len();
        let mut embeddings = Vec::with_capacity(total);
        for (position, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Embedding chunk {}/{}", position + 1, total);
            let vector = embedder.embed(&chunk.text).await.map_err(|e| {
                RagError::CorpusUnavailable(format!(
                    "failed to embed chunk {} with {}: {}",
                    chunk.id,
                    embedder.name(),
                    e
                ))
            })?;
            embeddings.push(vector);
        }
        Self::from_parts(chunks, embeddings, IndexOrigin::BuiltFromCorpus)
    }

    /// Pairs persisted chunks and embeddings after checking their alignment.
    pub fn precomputed(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self, RagError> {
        Self::from_parts(chunks, embeddings, IndexOrigin::Precomputed)
    }

    fn from_parts(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        origin: IndexOrigin,
    ) -> Result<Self, RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::CorpusUnavailable(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map(Vec::len);
        if dimension == Some(0) {
            return Err(RagError::CorpusUnavailable(
                "embeddings must not be empty".to_string(),
            ));
        }
        if let Some(expected) = dimension {
            if let Some((position, bad)) = embeddings
                .iter()
                .enumerate()
                .find(|(_, e)| e.len() != expected)
            {
                return Err(RagError::CorpusUnavailable(format!(
                    "embedding {} has dimension {}, expected {}",
                    position,
                    bad.len(),
                    expected
                )));
            }
        }

        Ok(Self {
            chunks,
            embeddings,
            dimension,
            origin,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension, `None` for an empty corpus.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Chunks paired with their embeddings, in ordinal order.
    pub fn entries(&self) -> impl Iterator<Item = (&Chunk, &[f32])> {
        self.chunks
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }
}
