//! Corpus sources and the persisted `{ chunks, embeddings }` format.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::chunker::{chunk_file, Chunk};
use super::embedder::Embedder;
use super::index::Index;
use crate::core::config::{AppPaths, CorpusConfig};
use crate::core::errors::RagError;

const DEFAULT_TEXT_PATH: &str = "handbook.txt";

/// Where the index comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// Plain text, chunked and embedded at startup.
    Text { path: PathBuf, max_words: usize },
    /// One JSON document holding both chunks and embeddings.
    Precomputed { path: PathBuf },
    /// Chunks and embeddings stored side by side.
    PrecomputedPair {
        chunks_path: PathBuf,
        embeddings_path: PathBuf,
    },
}

impl CorpusSource {
    /// Precomputed files win over plain text when both are configured.
    pub fn from_config(config: &CorpusConfig, paths: &AppPaths) -> Self {
        if let Some(path) = &config.precomputed_path {
            return CorpusSource::Precomputed {
                path: paths.resolve(path),
            };
        }
        if let (Some(chunks), Some(embeddings)) = (&config.chunks_path, &config.embeddings_path) {
            return CorpusSource::PrecomputedPair {
                chunks_path: paths.resolve(chunks),
                embeddings_path: paths.resolve(embeddings),
            };
        }
        let text = config.text_path.as_deref().unwrap_or(DEFAULT_TEXT_PATH);
        CorpusSource::Text {
            path: paths.resolve(text),
            max_words: config.max_words,
        }
    }

    pub async fn load_index(&self, embedder: &dyn Embedder) -> Result<Index, RagError> {
        match self {
            CorpusSource::Text { path, max_words } => {
                let chunks = chunk_file(path, *max_words).await?;
                tracing::info!(
                    "Embedding {} chunks from {} with {}",
                    chunks.len(),
                    path.display(),
                    embedder.name()
                );
                Index::build_from_corpus(chunks, embedder).await
            }
            CorpusSource::Precomputed { path } => {
                let file: PrecomputedCorpus = read_json(path).await?;
                Index::precomputed(into_chunks(file.chunks), file.embeddings)
            }
            CorpusSource::PrecomputedPair {
                chunks_path,
                embeddings_path,
            } => {
                let chunks: Vec<String> = read_json(chunks_path).await?;
                let embeddings: Vec<Vec<f32>> = read_json(embeddings_path).await?;
                Index::precomputed(into_chunks(chunks), embeddings)
            }
        }
    }
}

/// On-disk layout shared with the `embed_handbook` tool.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrecomputedCorpus {
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

impl From<&Index> for PrecomputedCorpus {
    fn from(index: &Index) -> Self {
        Self {
            chunks: index.chunks().iter().map(|c| c.text.clone()).collect(),
            embeddings: index.embeddings().to_vec(),
        }
    }
}

pub async fn write_precomputed(path: &Path, index: &Index) -> Result<(), RagError> {
    let payload =
        serde_json::to_vec_pretty(&PrecomputedCorpus::from(index)).map_err(RagError::corpus)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(RagError::corpus)?;
    }
    tokio::fs::write(path, payload).await.map_err(|e| {
        RagError::CorpusUnavailable(format!("failed to write {}: {}", path.display(), e))
    })
}

fn into_chunks(texts: Vec<String>) -> Vec<Chunk> {
    texts
        .into_iter()
        .enumerate()
        .map(|(id, text)| Chunk { id, text })
        .collect()
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, RagError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        RagError::CorpusUnavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RagError::CorpusUnavailable(format!("failed to parse {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::index::IndexOrigin;
    use async_trait::async_trait;

    struct UnusedEmbedder;

    #[async_trait]
    impl Embedder for UnusedEmbedder {
        fn name(&self) -> &str {
            "unused"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RagError> {
            panic!("precomputed corpora must not be embedded");
        }
    }

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn test_paths(dir: &Path) -> AppPaths {
        AppPaths::with_dirs(dir.to_path_buf(), dir.to_path_buf())
    }

    #[test]
    fn source_prefers_precomputed_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = test_paths(tmp.path());

        let config = CorpusConfig {
            text_path: Some("handbook.txt".into()),
            precomputed_path: Some("handbook-embeddings.json".into()),
            ..CorpusConfig::default()
        };
        assert_eq!(
            CorpusSource::from_config(&config, &paths),
            CorpusSource::Precomputed {
                path: tmp.path().join("handbook-embeddings.json")
            }
        );

        assert_eq!(
            CorpusSource::from_config(&CorpusConfig::default(), &paths),
            CorpusSource::Text {
                path: tmp.path().join("handbook.txt"),
                max_words: 500
            }
        );
    }

    #[tokio::test]
    async fn loads_single_precomputed_file_without_embedding() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("handbook-embeddings.json");
        std::fs::write(
            &path,
            r#"{ "chunks": ["Uniform policy", "Grading"], "embeddings": [[1.0, 0.0], [0.0, 1.0]] }"#,
        )
        .unwrap();

        let index = CorpusSource::Precomputed { path }
            .load_index(&UnusedEmbedder)
            .await
            .unwrap();

        assert_eq!(index.origin(), IndexOrigin::Precomputed);
        assert_eq!(index.len(), 2);
        assert_eq!(index.chunks()[1].text, "Grading");
    }

    #[tokio::test]
    async fn rejects_misaligned_pair() {
        let tmp = tempfile::tempdir().unwrap();
        let chunks_path = tmp.path().join("chunks.json");
        let embeddings_path = tmp.path().join("embeddings.json");
        std::fs::write(&chunks_path, r#"["a", "b", "c"]"#).unwrap();
        std::fs::write(&embeddings_path, r#"[[1.0], [2.0]]"#).unwrap();

        let err = CorpusSource::PrecomputedPair {
            chunks_path,
            embeddings_path,
        }
        .load_index(&UnusedEmbedder)
        .await
        .unwrap_err();

        assert!(matches!(err, RagError::CorpusUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_or_malformed_files_are_corpus_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = CorpusSource::Precomputed {
            path: tmp.path().join("nope.json"),
        };
        assert!(matches!(
            missing.load_index(&UnusedEmbedder).await.unwrap_err(),
            RagError::CorpusUnavailable(_)
        ));

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            CorpusSource::Precomputed { path: bad }
                .load_index(&UnusedEmbedder)
                .await
                .unwrap_err(),
            RagError::CorpusUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn text_corpus_round_trips_through_precomputed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let text_path = tmp.path().join("handbook.txt");
        std::fs::write(&text_path, "one two three four five").unwrap();

        let built = CorpusSource::Text {
            path: text_path,
            max_words: 2,
        }
        .load_index(&FixedEmbedder)
        .await
        .unwrap();
        assert_eq!(built.origin(), IndexOrigin::BuiltFromCorpus);

        let out = tmp.path().join("out").join("handbook-embeddings.json");
        write_precomputed(&out, &built).await.unwrap();

        let loaded = CorpusSource::Precomputed { path: out }
            .load_index(&UnusedEmbedder)
            .await
            .unwrap();
        assert_eq!(loaded.chunks(), built.chunks());
        assert_eq!(loaded.embeddings(), built.embeddings());
    }
}
