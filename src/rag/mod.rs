//! Retrieval over the handbook.
//!
//! - `chunker`: splits the handbook into fixed-size word chunks
//! - `embedder` / `http_embedder`: lazily loaded text embedding
//! - `index`: the immutable (chunk, embedding) table
//! - `ranker`: cosine top-K retrieval
//! - `corpus`: where the index is loaded from

pub mod chunker;
pub mod corpus;
pub mod embedder;
pub mod http_embedder;
pub mod index;
pub mod ranker;

pub use chunker::{chunk, Chunk};
pub use corpus::{CorpusSource, PrecomputedCorpus};
pub use embedder::{Embedder, EmbeddingModel, LazyEmbedder, ModelLoader};
pub use http_embedder::HttpEmbedder;
pub use index::{Index, IndexOrigin};
pub use ranker::{cosine_similarity, top_k, RankedChunk, RetrievalResult};
