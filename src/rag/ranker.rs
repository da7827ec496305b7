//! Cosine-similarity ranking over the handbook index.

use std::cmp::Ordering;

use serde::Serialize;

use super::index::Index;
use crate::core::errors::RagError;

pub const DEFAULT_TOP_K: usize = 3;

/// A retrieved chunk with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    pub chunk_id: usize,
    pub text: String,
    pub score: f32,
}

/// Top-K chunks, best first; equal scores keep corpus order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub chunks: Vec<RankedChunk>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

/// `dot(a, b) / (|a| * |b|)`, or `0.0` when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RagError> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32)
}

/// Scores every indexed chunk against `query` and keeps the best `k`.
pub fn top_k(query: &[f32], index: &Index, k: usize) -> Result<RetrievalResult, RagError> {
    let Some(dimension) = index.dimension() else {
        return Ok(RetrievalResult::default());
    };
    if query.len() != dimension {
        return Err(RagError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }

    let mut scored = Vec::with_capacity(index.len());
    for (chunk, embedding) in index.entries() {
        scored.push((chunk, cosine_similarity(embedding, query)?));
    }

    // `sort_by` is stable, so ties (including -0.0 vs 0.0) stay in corpus order.
    scored.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);

    Ok(RetrievalResult {
        chunks: scored
            .into_iter()
            .map(|(chunk, score)| RankedChunk {
                chunk_id: chunk.id,
                text: chunk.text.clone(),
                score,
            })
            .collect(),
    })
}
