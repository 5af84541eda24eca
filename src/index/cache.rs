//! Per-run index cache.
//!
//! One research run touches the same corpus repeatedly; the cache keeps the
//! loaded [`VectorIndex`] keyed by corpus path so repeated internal searches
//! never rebuild or re-embed. The cache is owned by the orchestrator and
//! lives no longer than its owner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::chunker::Chunker;
use super::embedding::Embedder;
use super::store::VectorIndex;
use crate::error::IndexError;

/// Cache of loaded indexes, keyed by corpus path.
#[derive(Debug, Default)]
pub struct IndexCache {
    indexes: HashMap<PathBuf, Arc<VectorIndex>>,
}

impl IndexCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for `corpus_dir`, resolving it on the first
    /// request via [`VectorIndex::get_or_create`].
    ///
    /// # Errors
    ///
    /// Returns index build errors on a cache miss; a failed resolution
    /// caches nothing.
    pub async fn get_or_build(
        &mut self,
        artifact_dir: &Path,
        corpus_dir: &Path,
        chunker: Chunker,
        embedder: &dyn Embedder,
        force_rebuild: bool,
    ) -> Result<Arc<VectorIndex>, IndexError> {
        if !force_rebuild {
            if let Some(index) = self.indexes.get(corpus_dir) {
                debug!(corpus = %corpus_dir.display(), "index cache hit");
                return Ok(Arc::clone(index));
            }
        }

        let index = Arc::new(
            VectorIndex::get_or_create(artifact_dir, corpus_dir, chunker, embedder, force_rebuild)
                .await?,
        );
        self.indexes
            .insert(corpus_dir.to_path_buf(), Arc::clone(&index));
        Ok(index)
    }

    /// Returns the cached index for `corpus_dir` without resolving.
    #[must_use]
    pub fn get(&self, corpus_dir: &Path) -> Option<Arc<VectorIndex>> {
        self.indexes.get(corpus_dir).map(Arc::clone)
    }

    /// Drops every cached index.
    pub fn clear(&mut self) {
        self.indexes.clear();
    }

    /// Number of cached indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder counting how many embed calls it serves.
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &str {
            "counting"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0])
                .collect())
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_rebuild() {
        let corpus = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(corpus.path().join("a.md"), "some content")
            .unwrap_or_else(|e| panic!("write: {e}"));
        let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));

        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let mut cache = IndexCache::new();
        let chunker = Chunker::new(1000, 200);

        let first = cache
            .get_or_build(artifacts.path(), corpus.path(), chunker, &embedder, false)
            .await
            .unwrap_or_else(|e| panic!("build: {e}"));
        let second = cache
            .get_or_build(artifacts.path(), corpus.path(), chunker, &embedder, false)
            .await
            .unwrap_or_else(|e| panic!("cached: {e}"));

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_miss_on_bad_corpus_caches_nothing() {
        let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let mut cache = IndexCache::new();

        let result = cache
            .get_or_build(
                artifacts.path(),
                Path::new("/nonexistent/corpus"),
                Chunker::new(1000, 200),
                &embedder,
                false,
            )
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let corpus = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(corpus.path().join("a.md"), "text")
            .unwrap_or_else(|e| panic!("write: {e}"));
        let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let mut cache = IndexCache::new();

        cache
            .get_or_build(
                artifacts.path(),
                corpus.path(),
                Chunker::new(1000, 200),
                &embedder,
                false,
            )
            .await
            .unwrap_or_else(|e| panic!("build: {e}"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(corpus.path()).is_none());
    }
}
