//! Retrieval index: corpus loading, chunking, embeddings, and the
//! persistent similarity index with its per-run cache.

pub mod cache;
pub mod chunker;
pub mod corpus;
pub mod embedding;
pub mod store;

pub use cache::IndexCache;
pub use chunker::Chunker;
pub use corpus::{Document, list_document_names, load_documents};
pub use embedding::{Embedder, OpenAiEmbedder};
pub use store::{SearchHit, VectorIndex};
