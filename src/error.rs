//! Error types for the research agent.
//!
//! Two families: [`AgentError`] for provider, credential, and web-search
//! failures, and [`IndexError`] for corpus and retrieval-index failures.
//! Per-step failures (reasoning, action, synthesis) are absorbed at the
//! component boundary and converted into fallback values; only configuration
//! and index-build errors are allowed to abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from LLM providers, credentials, and the web-search layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required API key is not configured.
    #[error("{name} not configured. Set it in .env file or environment.")]
    ApiKeyMissing {
        /// Environment variable name of the missing key.
        name: String,
    },

    /// An API request failed (transport error, non-2xx status, SDK error).
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description from the transport or SDK.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// The model returned an empty completion.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The configured provider name is not supported.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The unrecognized provider name.
        name: String,
    },

    /// A web-search provider call failed.
    #[error("web search failed: {message}")]
    WebSearch {
        /// Error description from the provider.
        message: String,
    },
}

/// Errors from corpus loading and the retrieval index lifecycle.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The corpus location does not exist.
    #[error("corpus path does not exist: {path}")]
    CorpusMissing {
        /// The missing path.
        path: PathBuf,
    },

    /// The corpus location is not a directory.
    #[error("corpus path is not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The corpus yielded zero loadable documents.
    #[error("no documents found in {path}")]
    NoDocuments {
        /// The corpus directory that was scanned.
        path: PathBuf,
    },

    /// Embedding generation failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Error description from the embedding backend.
        message: String,
    },

    /// A persisted index could not be loaded.
    #[error("failed to load index: {message}")]
    Load {
        /// Error description.
        message: String,
    },

    /// The persisted index was built with a different embedding model.
    #[error("index was built with embedding model '{found}', expected '{expected}'")]
    ModelMismatch {
        /// Model the current configuration expects.
        expected: String,
        /// Model recorded in the index metadata.
        found: String,
    },

    /// Writing the index artifact failed.
    #[error("failed to persist index: {message}")]
    Persist {
        /// Error description.
        message: String,
    },

    /// Filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
