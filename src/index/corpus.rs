//! Corpus loading: recursive document discovery under a directory.
//!
//! Only `.md` and `.txt` files are indexed. Unreadable files are skipped
//! with a warning; an empty corpus is a hard error because there is nothing
//! to search.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::IndexError;

/// One loaded corpus document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the file, relative to the corpus root where possible.
    pub source: String,
    /// Full UTF-8 content.
    pub content: String,
}

/// Returns true when the path has an indexable extension.
fn is_indexable(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "txt")
    )
}

/// Collects the indexable file paths under `root`, sorted for determinism.
fn indexable_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_indexable(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Loads every `.md`/`.txt` document under `root`.
///
/// # Errors
///
/// Returns [`IndexError::CorpusMissing`] or [`IndexError::NotADirectory`]
/// when the path is invalid, and [`IndexError::NoDocuments`] when the scan
/// finds nothing loadable.
pub fn load_documents(root: &Path) -> Result<Vec<Document>, IndexError> {
    if !root.exists() {
        return Err(IndexError::CorpusMissing {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(IndexError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut documents = Vec::new();
    for path in indexable_files(root) {
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let source = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .display()
                    .to_string();
                documents.push(Document { source, content });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable document");
            }
        }
    }

    if documents.is_empty() {
        return Err(IndexError::NoDocuments {
            path: root.to_path_buf(),
        });
    }

    debug!(count = documents.len(), root = %root.display(), "corpus loaded");
    Ok(documents)
}

/// Lists the filenames of indexable documents under `root`.
///
/// Used for prompt context only, so invalid paths yield an empty list
/// rather than an error.
#[must_use]
pub fn list_document_names(root: &Path) -> Vec<String> {
    if !root.is_dir() {
        return Vec::new();
    }
    indexable_files(root)
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect()
}
