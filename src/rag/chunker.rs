//! Word-count chunking of the handbook text.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// Default number of words per chunk.
pub const DEFAULT_MAX_WORDS: usize = 500;

/// A bounded slice of the handbook, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Ordinal position within the corpus.
    pub id: usize,
    pub text: String,
}

/// Splits `text` on whitespace runs and groups consecutive words into chunks
/// of at most `max_words` words, joined by single spaces.
///
/// Empty or whitespace-only text yields no chunks. A `max_words` of zero is
/// treated as one word per chunk.
pub fn chunk(text: &str, max_words: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .enumerate()
        .map(|(id, group)| Chunk {
            id,
            text: group.join(" "),
        })
        .collect()
}

/// Reads the handbook and chunks it.
pub async fn chunk_file(path: &Path, max_words: usize) -> Result<Vec<Chunk>, RagError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        RagError::CorpusUnavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    Ok(chunk(&text, max_words))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_counts(chunks: &[Chunk]) -> Vec<usize> {
        chunks
            .iter()
            .map(|c| c.text.split_whitespace().count())
            .collect()
    }

    #[test]
    fn twelve_hundred_words_split_500_500_200() {
        let text = (0..1200)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = chunk(&text, 500);

        assert_eq!(word_counts(&chunks), vec![500, 500, 200]);
        assert_eq!(chunks[1].id, 1);
        assert!(chunks[1].text.starts_with("w500 "));
        assert!(chunks[2].text.ends_with("w1199"));
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        let chunks = chunk("  Section 1\n\n  Attendance\tpolicy  \r\n applies ", 3);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Section 1 Attendance");
        assert_eq!(chunks[1].text, "policy applies");
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk("", 500).is_empty());
        assert!(chunk(" \n\t ", 500).is_empty());
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(40);
        assert_eq!(chunk(&text, 7), chunk(&text, 7));
    }

    #[tokio::test]
    async fn missing_file_is_corpus_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = chunk_file(&tmp.path().join("missing.txt"), 500)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::CorpusUnavailable(_)));
    }

    #[tokio::test]
    async fn chunk_file_reads_the_handbook() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("handbook.txt");
        std::fs::write(&path, "one two three four five").unwrap();

        let chunks = chunk_file(&path, 2).await.unwrap();
        assert_eq!(word_counts(&chunks), vec![2, 2, 1]);
    }
}
