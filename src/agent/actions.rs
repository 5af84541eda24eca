//! Evidence-gathering actions.
//!
//! Both actions share a contract: they always increment `step`, they record
//! a tool call for every attempt they make, and they never fail the run —
//! an error becomes a tool-call record with `is_error` set and the loop
//! moves on.

use tracing::{debug, warn};

use super::state::{Action, AgentState, ToolCallRecord};
use crate::index::{Embedder, VectorIndex};
use crate::web::{WebSearchProvider, WebSearchRequest};

/// Resolves the search query for an action: the latest decision's argument
/// when present, the research query otherwise.
fn search_query(state: &AgentState) -> String {
    state
        .last_decision()
        .filter(|d| !d.action_input.is_empty())
        .map_or_else(|| state.query.clone(), |d| d.action_input.clone())
}

/// Runs the internal similarity search against the resolved index.
///
/// With no index available (no corpus configured) the action is a skip:
/// `step` advances, nothing else changes. An embedding failure records an
/// error tool call; evidence and the success tool call are appended
/// together, so their counts stay consistent.
pub async fn run_internal_search(
    state: &mut AgentState,
    index: Option<&VectorIndex>,
    embedder: &dyn Embedder,
    top_k: usize,
    score_threshold: Option<f32>,
) {
    let Some(index) = index else {
        debug!("no corpus configured, skipping internal search");
        state.step += 1;
        return;
    };

    let query = search_query(state);

    match embedder.embed(std::slice::from_ref(&query)).await {
        Ok(vectors) => {
            let hits = vectors
                .first()
                .map(|v| index.search(v, top_k, score_threshold))
                .unwrap_or_default();
            let chunks: Vec<String> = hits.into_iter().map(|h| h.content).collect();

            debug!(query = %query, hits = chunks.len(), "internal search completed");
            state.tool_calls.push(ToolCallRecord {
                tool_name: Action::SearchInternal.as_str().to_string(),
                input: query,
                output: serde_json::to_string(&chunks)
                    .unwrap_or_else(|_| format!("{} results retrieved", chunks.len())),
                is_error: false,
            });
            state.internal_evidence.extend(chunks);
        }
        Err(e) => {
            warn!(error = %e, "internal search failed");
            state.tool_calls.push(ToolCallRecord {
                tool_name: Action::SearchInternal.as_str().to_string(),
                input: query,
                output: e.to_string(),
                is_error: true,
            });
        }
    }

    state.step += 1;
}

/// Runs the external web search.
///
/// A missing provider (no API key configured) and a failed call both record
/// an error tool call; successful results land in `external_evidence`.
pub async fn run_web_search(
    state: &mut AgentState,
    provider: Option<&dyn WebSearchProvider>,
    top_k: usize,
) {
    let query = search_query(state);

    let outcome = match provider {
        Some(provider) => {
            let request = WebSearchRequest::new(query.clone(), top_k);
            provider.search(&request).await
        }
        None => Err(crate::error::AgentError::ApiKeyMissing {
            name: "TAVILY_API_KEY".to_string(),
        }),
    };

    match outcome {
        Ok(results) => {
            debug!(query = %query, results = results.len(), "web search completed");
            state.tool_calls.push(ToolCallRecord {
                tool_name: Action::WebSearch.as_str().to_string(),
                input: query,
                output: serde_json::to_string(&results)
                    .unwrap_or_else(|_| format!("{} results retrieved", results.len())),
                is_error: false,
            });
            state.external_evidence.extend(results);
        }
        Err(e) => {
            warn!(error = %e, "web search failed");
            state.tool_calls.push(ToolCallRecord {
                tool_name: Action::WebSearch.as_str().to_string(),
                input: query,
                output: e.to_string(),
                is_error: true,
            });
        }
    }

    state.step += 1;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::state::{DecisionRecord, WebResult};
    use crate::error::{AgentError, IndexError};
    use async_trait::async_trait;

    struct FixedEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
            if self.fail {
                return Err(IndexError::Embedding {
                    message: "embed down".to_string(),
                });
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct FixedWeb {
        result: Result<Vec<WebResult>, String>,
    }

    #[async_trait]
    impl WebSearchProvider for FixedWeb {
        async fn search(
            &self,
            _request: &WebSearchRequest,
        ) -> Result<Vec<WebResult>, AgentError> {
            match &self.result {
                Ok(results) => Ok(results.clone()),
                Err(msg) => Err(AgentError::WebSearch {
                    message: msg.clone(),
                }),
            }
        }
    }

    fn state_with_decision(action: Action, input: &str) -> AgentState {
        let mut state = AgentState::new("base query", None, 10);
        state.decision_trace.push(DecisionRecord {
            step: 0,
            thought: "t".to_string(),
            action,
            action_input: input.to_string(),
        });
        state
    }

    async fn built_index(embedder: &dyn Embedder) -> (tempfile::TempDir, VectorIndex) {
        let corpus = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(corpus.path().join("doc.md"), "relevant content here")
            .unwrap_or_else(|e| panic!("write: {e}"));
        let index = VectorIndex::build(corpus.path(), crate::index::Chunker::new(1000, 200), embedder)
            .await
            .unwrap_or_else(|e| panic!("build: {e}"));
        (corpus, index)
    }

    #[tokio::test]
    async fn test_internal_search_appends_evidence_and_step() {
        let embedder = FixedEmbedder { fail: false };
        let (_corpus, index) = built_index(&embedder).await;
        let mut state = state_with_decision(Action::SearchInternal, "content");

        run_internal_search(&mut state, Some(&index), &embedder, 5, None).await;

        assert_eq!(state.step, 1);
        assert_eq!(state.tool_calls.len(), 1);
        assert!(!state.tool_calls[0].is_error);
        assert_eq!(state.tool_calls[0].input, "content");
        assert_eq!(state.internal_evidence.len(), 1);
        assert!(state.internal_evidence[0].contains("relevant content"));
    }

    #[tokio::test]
    async fn test_internal_search_skip_without_index() {
        let embedder = FixedEmbedder { fail: false };
        let mut state = state_with_decision(Action::SearchInternal, "x");

        run_internal_search(&mut state, None, &embedder, 5, None).await;

        assert_eq!(state.step, 1);
        assert!(state.tool_calls.is_empty());
        assert!(state.internal_evidence.is_empty());
    }

    #[tokio::test]
    async fn test_internal_search_embed_failure_records_error() {
        let good = FixedEmbedder { fail: false };
        let (_corpus, index) = built_index(&good).await;
        let failing = FixedEmbedder { fail: true };
        let mut state = state_with_decision(Action::SearchInternal, "x");

        run_internal_search(&mut state, Some(&index), &failing, 5, None).await;

        assert_eq!(state.step, 1);
        assert_eq!(state.tool_calls.len(), 1);
        assert!(state.tool_calls[0].is_error);
        assert!(state.tool_calls[0].output.contains("embed down"));
        assert!(state.internal_evidence.is_empty());
    }

    #[tokio::test]
    async fn test_web_search_appends_results() {
        let provider = FixedWeb {
            result: Ok(vec![WebResult {
                title: "T".to_string(),
                url: "https://example.com".to_string(),
                content: "c".to_string(),
                relevance_score: Some(0.9),
                published_date: None,
            }]),
        };
        let mut state = state_with_decision(Action::WebSearch, "rust");

        run_web_search(&mut state, Some(&provider), 5).await;

        assert_eq!(state.step, 1);
        assert_eq!(state.external_evidence.len(), 1);
        assert!(!state.tool_calls[0].is_error);
        assert_eq!(state.tool_calls[0].input, "rust");
    }

    #[tokio::test]
    async fn test_web_search_failure_records_error_and_advances() {
        let provider = FixedWeb {
            result: Err("network down".to_string()),
        };
        let mut state = state_with_decision(Action::WebSearch, "rust");

        run_web_search(&mut state, Some(&provider), 5).await;

        assert_eq!(state.step, 1);
        assert!(state.external_evidence.is_empty());
        assert!(state.tool_calls[0].is_error);
        assert!(state.tool_calls[0].output.contains("network down"));
    }

    #[tokio::test]
    async fn test_web_search_without_provider_records_missing_key() {
        let mut state = state_with_decision(Action::WebSearch, "rust");

        run_web_search(&mut state, None, 5).await;

        assert_eq!(state.step, 1);
        assert!(state.tool_calls[0].is_error);
        assert!(state.tool_calls[0].output.contains("TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_search_query_falls_back_to_research_query() {
        let provider = FixedWeb { result: Ok(vec![]) };
        let mut state = AgentState::new("base query", None, 10);

        run_web_search(&mut state, Some(&provider), 5).await;

        assert_eq!(state.tool_calls[0].input, "base query");
    }
}
