//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;

use crate::error::AgentError;

/// Default reasoning model.
const DEFAULT_LLM_MODEL: &str = "gpt-5-mini";
/// Default embedding model for the retrieval index.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default sampling temperature for reasoning and synthesis.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default max tokens for a reasoning completion. Short on purpose: the
/// response is three labelled lines.
const DEFAULT_REASONING_MAX_TOKENS: u32 = 500;
/// Default max tokens for the synthesis completion.
const DEFAULT_SYNTHESIS_MAX_TOKENS: u32 = 2000;
/// Default step budget for the decision/action loop.
const DEFAULT_MAX_STEPS: usize = 10;
/// Default number of results retrieved per search action.
const DEFAULT_TOP_K: usize = 5;
/// Default chunk size in characters.
const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default index artifact directory.
const DEFAULT_INDEX_DIR: &str = "./data/vectorstore";

/// Configuration for the research agent.
#[derive(Debug, Clone)]
pub struct Settings {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the LLM provider (also used for embeddings).
    pub openai_api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub openai_base_url: Option<String>,
    /// API key for the Tavily web-search provider. Absent means external
    /// search is unavailable.
    pub tavily_api_key: Option<String>,
    /// Model used for reasoning and synthesis completions.
    pub llm_model: String,
    /// Sampling temperature for completions.
    pub llm_temperature: f32,
    /// Maximum tokens for a reasoning completion.
    pub reasoning_max_tokens: u32,
    /// Maximum tokens for the synthesis completion.
    pub synthesis_max_tokens: u32,
    /// Embedding model the retrieval index is built with.
    pub embedding_model: String,
    /// Directory where the index artifact is persisted and looked up.
    pub index_dir: PathBuf,
    /// Maximum action steps before the router forces finish.
    pub max_steps: usize,
    /// Results per search action (internal and external).
    pub top_k: usize,
    /// Minimum cosine similarity for internal results; `None` keeps all.
    pub score_threshold: Option<f32>,
    /// Maximum characters per corpus chunk.
    pub chunk_size: usize,
    /// Overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Settings {
    /// Creates a new builder for `Settings`.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no OpenAI API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Returns the names of required API keys that are not configured.
    ///
    /// `OPENAI_API_KEY` is always required; `TAVILY_API_KEY` is required for
    /// external web search.
    #[must_use]
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.tavily_api_key.as_deref().is_none_or(str::is_empty) {
            missing.push("TAVILY_API_KEY");
        }
        missing
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    provider: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    tavily_api_key: Option<String>,
    llm_model: Option<String>,
    llm_temperature: Option<f32>,
    reasoning_max_tokens: Option<u32>,
    synthesis_max_tokens: Option<u32>,
    embedding_model: Option<String>,
    index_dir: Option<PathBuf>,
    max_steps: Option<usize>,
    top_k: Option<usize>,
    score_threshold: Option<f32>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

impl SettingsBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("NAV_PROVIDER").ok();
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.openai_base_url.is_none() {
            self.openai_base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        if self.llm_model.is_none() {
            self.llm_model = std::env::var("NAV_LLM_MODEL").ok();
        }
        if self.llm_temperature.is_none() {
            self.llm_temperature = std::env::var("NAV_LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.embedding_model.is_none() {
            self.embedding_model = std::env::var("NAV_EMBEDDING_MODEL").ok();
        }
        if self.index_dir.is_none() {
            self.index_dir = std::env::var("NAV_INDEX_DIR").ok().map(PathBuf::from);
        }
        if self.max_steps.is_none() {
            self.max_steps = std::env::var("NAV_MAX_STEPS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.top_k.is_none() {
            self.top_k = std::env::var("NAV_TOP_K").ok().and_then(|v| v.parse().ok());
        }
        if self.score_threshold.is_none() {
            self.score_threshold = std::env::var("NAV_SCORE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.chunk_size.is_none() {
            self.chunk_size = std::env::var("NAV_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.chunk_overlap.is_none() {
            self.chunk_overlap = std::env::var("NAV_CHUNK_OVERLAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the OpenAI API key.
    #[must_use]
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Sets the Tavily API key.
    #[must_use]
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Sets the reasoning/synthesis model.
    #[must_use]
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn llm_temperature(mut self, t: f32) -> Self {
        self.llm_temperature = Some(t);
        self
    }

    /// Sets the reasoning max tokens.
    #[must_use]
    pub const fn reasoning_max_tokens(mut self, n: u32) -> Self {
        self.reasoning_max_tokens = Some(n);
        self
    }

    /// Sets the synthesis max tokens.
    #[must_use]
    pub const fn synthesis_max_tokens(mut self, n: u32) -> Self {
        self.synthesis_max_tokens = Some(n);
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets the index artifact directory.
    #[must_use]
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    /// Sets the step budget.
    #[must_use]
    pub const fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Sets the results per search action.
    #[must_use]
    pub const fn top_k(mut self, n: usize) -> Self {
        self.top_k = Some(n);
        self
    }

    /// Sets the minimum cosine similarity for internal results.
    #[must_use]
    pub const fn score_threshold(mut self, t: f32) -> Self {
        self.score_threshold = Some(t);
        self
    }

    /// Sets the chunk size in characters.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the chunk overlap in characters.
    #[must_use]
    pub const fn chunk_overlap(mut self, n: usize) -> Self {
        self.chunk_overlap = Some(n);
        self
    }

    /// Builds the [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no OpenAI API key was set.
    pub fn build(self) -> Result<Settings, AgentError> {
        let openai_api_key = self
            .openai_api_key
            .ok_or_else(|| AgentError::ApiKeyMissing {
                name: "OPENAI_API_KEY".to_string(),
            })?;

        Ok(Settings {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            openai_api_key,
            openai_base_url: self.openai_base_url,
            tavily_api_key: self.tavily_api_key,
            llm_model: self
                .llm_model
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature: self.llm_temperature.unwrap_or(DEFAULT_TEMPERATURE),
            reasoning_max_tokens: self
                .reasoning_max_tokens
                .unwrap_or(DEFAULT_REASONING_MAX_TOKENS),
            synthesis_max_tokens: self
                .synthesis_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIS_MAX_TOKENS),
            embedding_model: self
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            index_dir: self
                .index_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
            max_steps: self.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            score_threshold: self.score_threshold,
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let settings = Settings::builder()
            .openai_api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(settings.top_k, DEFAULT_TOP_K);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = Settings::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_custom_values() {
        let settings = Settings::builder()
            .openai_api_key("key")
            .tavily_api_key("tvly-key")
            .llm_model("gpt-4o")
            .max_steps(3)
            .top_k(7)
            .index_dir("/tmp/idx")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(settings.llm_model, "gpt-4o");
        assert_eq!(settings.max_steps, 3);
        assert_eq!(settings.top_k, 7);
        assert_eq!(settings.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(settings.tavily_api_key.as_deref(), Some("tvly-key"));
    }

    #[test]
    fn test_missing_api_keys() {
        let settings = Settings::builder()
            .openai_api_key("key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(settings.missing_api_keys(), vec!["TAVILY_API_KEY"]);

        let settings = Settings::builder()
            .openai_api_key("key")
            .tavily_api_key("tvly")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(settings.missing_api_keys().is_empty());
    }
}
