//! Live web search via the Tavily JSON API.
//!
//! The [`WebSearchProvider`] trait is the seam between the external search
//! action and the network, so the agent loop tests with in-process fakes.
//! [`TavilyClient`] is the production implementation over `reqwest`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::state::WebResult;
use crate::error::AgentError;

/// Tavily search endpoint.
const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Parameters for one web search.
#[derive(Debug, Clone, Serialize)]
pub struct WebSearchRequest {
    /// The search query.
    pub query: String,
    /// Maximum results to return.
    pub max_results: usize,
    /// Search depth, `"basic"` or `"advanced"`.
    pub search_depth: String,
    /// Domains to restrict results to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
    /// Domains to exclude from results.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_domains: Vec<String>,
}

impl WebSearchRequest {
    /// Creates a basic-depth request with no domain filters.
    #[must_use]
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            search_depth: "basic".to_string(),
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

/// Trait for web-search backends.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Runs one search and returns normalized results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::WebSearch`] on transport or API failures.
    async fn search(&self, request: &WebSearchRequest) -> Result<Vec<WebResult>, AgentError>;
}

/// One raw result from the Tavily response. Missing text fields normalize
/// to empty strings.
#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    score: Option<f64>,
    published_date: Option<String>,
}

/// Tavily response envelope.
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// Request body sent to Tavily, the search parameters plus the key.
#[derive(Debug, Serialize)]
struct TavilyRequestBody<'a> {
    api_key: &'a str,
    #[serde(flatten)]
    request: &'a WebSearchRequest,
}

/// Web-search provider backed by the Tavily API.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
}

impl TavilyClient {
    /// Creates a client from the configured API key.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] when no key is configured, so
    /// the absence surfaces at construction rather than mid-run.
    pub fn new(api_key: Option<&str>) -> Result<Self, AgentError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::ApiKeyMissing {
                name: "TAVILY_API_KEY".to_string(),
            })?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WebSearchProvider for TavilyClient {
    async fn search(&self, request: &WebSearchRequest) -> Result<Vec<WebResult>, AgentError> {
        let body = TavilyRequestBody {
            api_key: &self.api_key,
            request,
        };

        let response = self
            .http
            .post(TAVILY_SEARCH_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::WebSearch {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::WebSearch {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: TavilyResponse =
            response.json().await.map_err(|e| AgentError::WebSearch {
                message: format!("malformed response: {e}"),
            })?;

        let results: Vec<WebResult> = parsed
            .results
            .into_iter()
            .map(|r| WebResult {
                title: r.title,
                url: r.url,
                content: r.content,
                relevance_score: r.score,
                published_date: r.published_date,
            })
            .collect();

        debug!(query = %request.query, count = results.len(), "web search completed");
        Ok(results)
    }
}
