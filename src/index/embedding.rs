//! Embedding backends for the retrieval index.
//!
//! The [`Embedder`] trait is the seam between the index and any embedding
//! API, so index build and search logic stay testable with a deterministic
//! in-process embedder.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_trait::async_trait;
use tracing::debug;

use crate::config::Settings;
use crate::error::IndexError;

/// Texts per embedding API request.
const EMBED_BATCH_SIZE: usize = 128;

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the embedding model. Persisted in index metadata so a loaded
    /// index can be checked against the current configuration.
    fn model(&self) -> &str;

    /// Embeds a batch of texts, one vector per input, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Embedding`] on API failures or a response with
    /// the wrong cardinality.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError>;
}

/// Embedder backed by the `OpenAI` embeddings API.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder from agent configuration.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&settings.openai_api_key);
        if let Some(ref base_url) = settings.openai_base_url {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
            model: settings.embedding_model.clone(),
        }
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let request = CreateEmbeddingRequest {
                model: self.model.clone(),
                input: EmbeddingInput::StringArray(batch.to_vec()),
                ..Default::default()
            };

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| IndexError::Embedding {
                    message: e.to_string(),
                })?;

            if response.data.len() != batch.len() {
                return Err(IndexError::Embedding {
                    message: format!(
                        "embedding count mismatch: sent {}, received {}",
                        batch.len(),
                        response.data.len()
                    ),
                });
            }

            vectors.extend(response.data.into_iter().map(|d| d.embedding));
        }

        debug!(count = vectors.len(), model = %self.model, "embeddings generated");
        Ok(vectors)
    }
}
