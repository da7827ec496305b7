//! Text embedding behind a lazily loaded model.
//!
//! `Embedder` is what the index and the query engine depend on. The stock
//! implementation, `LazyEmbedder`, defers loading its model until the first
//! call and shares that single load between every concurrent caller.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::core::errors::RagError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Maps `text` to a vector whose length is fixed for the process.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// A loaded embedding model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// Produces an `EmbeddingModel`; invoked at most once per successful load.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    type Model: EmbeddingModel;

    fn describe(&self) -> String;

    async fn load(&self) -> Result<Self::Model, RagError>;
}

pub struct LazyEmbedder<L: ModelLoader> {
    name: String,
    loader: L,
    model: OnceCell<L::Model>,
}

impl<L: ModelLoader> LazyEmbedder<L> {
    pub fn new(loader: L) -> Self {
        Self {
            name: loader.describe(),
            loader,
            model: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Loads the model on first use. Concurrent callers wait on the same
    /// load; a failed load leaves the cell empty.
    async fn model(&self) -> Result<&L::Model, RagError> {
        self.model
            .get_or_try_init(|| async {
                tracing::info!("Loading embedding model {}", self.name);
                let model = self.loader.load().await?;
                tracing::info!(
                    "Embedding model {} ready (dimension {})",
                    self.name,
                    model.dimension()
                );
                Ok::<_, RagError>(model)
            })
            .await
    }
}

#[async_trait]
impl<L: ModelLoader> Embedder for LazyEmbedder<L> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let model = self.model().await?;
        let vector = model.embed(text).await?;
        if vector.len() != model.dimension() {
            return Err(RagError::EmbeddingUnavailable(format!(
                "model {} returned {} values, expected {}",
                self.name,
                vector.len(),
                model.dimension()
            )));
        }
        Ok(vector)
    }
}

/// Scales `vector` to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector
        .iter()
        .map(|x| (*x as f64).powi(2))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x = (*x as f64 / norm) as f32);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct LengthModel;

    #[async_trait]
    impl EmbeddingModel for LengthModel {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            if text == "wrong-size" {
                return Ok(vec![1.0]);
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        failures_left: AtomicUsize,
    }

    impl CountingLoader {
        fn new(loads: Arc<AtomicUsize>, failures: usize) -> Self {
            Self {
                loads,
                failures_left: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        type Model = LengthModel;

        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn load(&self) -> Result<LengthModel, RagError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RagError::EmbeddingUnavailable("weights missing".into()));
            }
            Ok(LengthModel)
        }
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let embedder = Arc::new(LazyEmbedder::new(CountingLoader::new(loads.clone(), 0)));
        assert!(!embedder.is_loaded());

        let mut handles = Vec::new();
        for i in 0..8 {
            let embedder = embedder.clone();
            handles.push(tokio::spawn(async move {
                embedder.embed(&"x".repeat(i + 1)).await
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let vector = handle.await.unwrap().unwrap();
            assert_eq!(vector, vec![(i + 1) as f32, 1.0]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(embedder.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_reported_and_not_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let embedder = LazyEmbedder::new(CountingLoader::new(loads.clone(), 1));

        let err = embedder.embed("question").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));
        assert!(!embedder.is_loaded());

        assert_eq!(embedder.embed("abc").await.unwrap(), vec![3.0, 1.0]);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn inconsistent_output_length_is_an_embedding_failure() {
        let embedder = LazyEmbedder::new(CountingLoader::new(Arc::new(AtomicUsize::new(0)), 0));
        let err = embedder.embed("wrong-size").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn l2_normalize_scales_to_unit_length() {
        let normalized = l2_normalize(vec![3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
