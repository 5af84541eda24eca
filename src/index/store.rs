//! Persistent similarity index over corpus chunks.
//!
//! The artifact is a directory holding `index.json` (chunk text, source, and
//! vector per entry) and `metadata.json` (the embedding model the vectors
//! were produced with, plus counts). A loaded index is rejected when its
//! recorded model differs from the configured one; the caller rebuilds.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chunker::Chunker;
use super::corpus::load_documents;
use super::embedding::Embedder;
use crate::error::IndexError;

/// Entry filename within the artifact directory.
const INDEX_FILENAME: &str = "index.json";
/// Metadata filename within the artifact directory.
const METADATA_FILENAME: &str = "metadata.json";

/// One indexed chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    content: String,
    source: String,
    vector: Vec<f32>,
}

/// Index metadata, persisted alongside the entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexMetadata {
    /// Model the vectors were produced with.
    embedding_model: String,
    /// Number of indexed chunks.
    chunk_count: usize,
    /// Number of source documents.
    document_count: usize,
}

/// One similarity-search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Chunk text.
    pub content: String,
    /// Source document the chunk came from.
    pub source: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
}

/// In-memory similarity index with a JSON artifact on disk.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    metadata: IndexMetadata,
}

impl VectorIndex {
    /// Builds a fresh index from the corpus at `corpus_dir`.
    ///
    /// # Errors
    ///
    /// Returns corpus errors from [`load_documents`] and
    /// [`IndexError::Embedding`] from the embedding backend.
    pub async fn build(
        corpus_dir: &Path,
        chunker: Chunker,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexError> {
        let documents = load_documents(corpus_dir)?;
        let document_count = documents.len();

        let mut texts = Vec::new();
        let mut sources = Vec::new();
        for doc in &documents {
            for chunk in chunker.split(&doc.content) {
                texts.push(chunk);
                sources.push(doc.source.clone());
            }
        }

        info!(
            documents = document_count,
            chunks = texts.len(),
            "building index"
        );

        let vectors = embedder.embed(&texts).await?;
        let entries = texts
            .into_iter()
            .zip(sources)
            .zip(vectors)
            .map(|((content, source), vector)| IndexEntry {
                content,
                source,
                vector,
            })
            .collect::<Vec<_>>();

        let metadata = IndexMetadata {
            embedding_model: embedder.model().to_string(),
            chunk_count: entries.len(),
            document_count,
        };

        Ok(Self { entries, metadata })
    }

    /// Writes the artifact to `dir`, creating the directory as needed.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Persist`] when serialization or writing fails.
    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        std::fs::create_dir_all(dir)?;

        let entries = serde_json::to_string(&self.entries).map_err(|e| IndexError::Persist {
            message: e.to_string(),
        })?;
        let metadata = serde_json::to_string_pretty(&self.metadata).map_err(|e| {
            IndexError::Persist {
                message: e.to_string(),
            }
        })?;

        std::fs::write(dir.join(INDEX_FILENAME), entries)?;
        std::fs::write(dir.join(METADATA_FILENAME), metadata)?;

        debug!(dir = %dir.display(), chunks = self.metadata.chunk_count, "index saved");
        Ok(())
    }

    /// Loads the artifact from `dir`, checking the embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Load`] when the artifact is missing or
    /// malformed, and [`IndexError::ModelMismatch`] when it was built with a
    /// different embedding model than `expected_model`.
    pub fn load(dir: &Path, expected_model: &str) -> Result<Self, IndexError> {
        let read = |name: &str| -> Result<String, IndexError> {
            std::fs::read_to_string(dir.join(name)).map_err(|e| IndexError::Load {
                message: format!("{name}: {e}"),
            })
        };

        let metadata: IndexMetadata =
            serde_json::from_str(&read(METADATA_FILENAME)?).map_err(|e| IndexError::Load {
                message: format!("{METADATA_FILENAME}: {e}"),
            })?;

        if metadata.embedding_model != expected_model {
            return Err(IndexError::ModelMismatch {
                expected: expected_model.to_string(),
                found: metadata.embedding_model,
            });
        }

        let entries: Vec<IndexEntry> =
            serde_json::from_str(&read(INDEX_FILENAME)?).map_err(|e| IndexError::Load {
                message: format!("{INDEX_FILENAME}: {e}"),
            })?;

        debug!(dir = %dir.display(), chunks = entries.len(), "index loaded");
        Ok(Self { entries, metadata })
    }

    /// Returns true when an artifact exists at `dir`.
    #[must_use]
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILENAME).is_file() && dir.join(METADATA_FILENAME).is_file()
    }

    /// Loads the artifact when present and valid, otherwise builds and saves
    /// a fresh index. A load failure is logged and falls through to a
    /// rebuild; only build failures abort.
    ///
    /// # Errors
    ///
    /// Returns corpus, embedding, or persist errors from the rebuild path.
    pub async fn get_or_create(
        artifact_dir: &Path,
        corpus_dir: &Path,
        chunker: Chunker,
        embedder: &dyn Embedder,
        force_rebuild: bool,
    ) -> Result<Self, IndexError> {
        if !force_rebuild && Self::exists(artifact_dir) {
            match Self::load(artifact_dir, embedder.model()) {
                Ok(index) => return Ok(index),
                Err(e) => {
                    warn!(error = %e, "failed to load persisted index, rebuilding");
                }
            }
        }

        let index = Self::build(corpus_dir, chunker, embedder).await?;
        index.save(artifact_dir)?;
        Ok(index)
    }

    /// Returns the `top_k` entries most similar to `query` by cosine
    /// similarity, best first. When `score_threshold` is set, results below
    /// it are dropped.
    #[must_use]
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|e| SearchHit {
                content: e.content.clone(),
                source: e.source.clone(),
                score: cosine_similarity(query, &e.vector),
            })
            .filter(|h| score_threshold.is_none_or(|t| h.score >= t))
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        hits
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the index holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Model the index was built with.
    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.metadata.embedding_model
    }

    /// Number of source documents the index covers.
    #[must_use]
    pub const fn document_count(&self) -> usize {
        self.metadata.document_count
    }

    /// Distinct source documents, sorted.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        let set: HashSet<&str> = self.entries.iter().map(|e| e.source.as_str()).collect();
        let mut sources: Vec<String> = set.into_iter().map(String::from).collect();
        sources.sort();
        sources
    }
}

/// Cosine similarity between two vectors; zero for zero-norm inputs.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
