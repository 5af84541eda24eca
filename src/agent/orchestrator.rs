//! The decision/action loop.
//!
//! The orchestrator owns every collaborator for a run: the LLM provider,
//! the embedder, the optional web-search provider, both engines, and the
//! index cache. It is the only mutator of [`AgentState`]. Retry and
//! fallback policy live inside the called components; the loop itself only
//! sequences them and enforces the step budget.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use super::actions::{run_internal_search, run_web_search};
use super::client::create_provider;
use super::provider::LlmProvider;
use super::reasoning::ReasoningEngine;
use super::state::{Action, AgentState};
use super::synthesis::SynthesisEngine;
use crate::config::Settings;
use crate::error::{AgentError, IndexError};
use crate::index::{
    Chunker, Embedder, IndexCache, OpenAiEmbedder, VectorIndex, list_document_names,
};
use crate::web::{TavilyClient, WebSearchProvider};

/// Drives a research run to completion within the step budget.
pub struct Orchestrator {
    settings: Settings,
    provider: Box<dyn LlmProvider>,
    embedder: Box<dyn Embedder>,
    web: Option<Box<dyn WebSearchProvider>>,
    reasoning: ReasoningEngine,
    synthesis: SynthesisEngine,
    cache: IndexCache,
    force_rebuild: bool,
}

impl Orchestrator {
    /// Creates an orchestrator with explicit collaborators.
    #[must_use]
    pub fn new(
        settings: Settings,
        provider: Box<dyn LlmProvider>,
        embedder: Box<dyn Embedder>,
        web: Option<Box<dyn WebSearchProvider>>,
    ) -> Self {
        let reasoning = ReasoningEngine::new(&settings);
        let synthesis = SynthesisEngine::new(&settings);
        Self {
            settings,
            provider,
            embedder,
            web,
            reasoning,
            synthesis,
            cache: IndexCache::new(),
            force_rebuild: false,
        }
    }

    /// Wires the production collaborators from configuration.
    ///
    /// The web-search provider is optional: with no Tavily key configured
    /// the orchestrator still runs, and external searches record the
    /// missing-key error instead.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for an unknown LLM
    /// provider name.
    pub fn from_settings(settings: Settings) -> Result<Self, AgentError> {
        let provider = create_provider(&settings)?;
        let embedder: Box<dyn Embedder> = Box::new(OpenAiEmbedder::new(&settings));
        let web: Option<Box<dyn WebSearchProvider>> =
            match TavilyClient::new(settings.tavily_api_key.as_deref()) {
                Ok(client) => Some(Box::new(client)),
                Err(_) => None,
            };
        Ok(Self::new(settings, provider, embedder, web))
    }

    /// Forces an index rebuild on the next corpus resolution.
    #[must_use]
    pub const fn with_force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Drops every cached index.
    pub fn clear_index_cache(&mut self) {
        self.cache.clear();
    }

    /// Pure routing function.
    ///
    /// Budget exhaustion overrides any model preference; otherwise the most
    /// recent decision names the action, and an empty trace finishes.
    #[must_use]
    pub fn route(state: &AgentState) -> Action {
        if state.step >= state.max_steps {
            return Action::Finish;
        }
        state.last_decision().map_or(Action::Finish, |d| d.action)
    }

    /// Actions currently legal for the reasoning model to pick. Internal
    /// search requires a configured corpus; finish is always legal.
    fn legal_actions(state: &AgentState) -> Vec<Action> {
        let mut actions = Vec::with_capacity(3);
        if state.corpus_location.is_some() {
            actions.push(Action::SearchInternal);
        }
        actions.push(Action::WebSearch);
        actions.push(Action::Finish);
        actions
    }

    /// Runs the full loop for `query` and returns the final state with
    /// `final_report` populated.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when a configured corpus cannot be indexed —
    /// the only failure that aborts a run. Reasoning, action, and synthesis
    /// failures degrade into fallbacks inside their components.
    pub async fn run(
        &mut self,
        query: &str,
        corpus_location: Option<PathBuf>,
    ) -> Result<AgentState, IndexError> {
        let mut state = AgentState::new(query, corpus_location, self.settings.max_steps);

        // Resolve the index up front so a bad corpus aborts before any
        // steps are taken.
        let index: Option<Arc<VectorIndex>> = match state.corpus_location.clone() {
            Some(corpus) => {
                let chunker = Chunker::new(self.settings.chunk_size, self.settings.chunk_overlap);
                let index = self
                    .cache
                    .get_or_build(
                        &self.settings.index_dir,
                        &corpus,
                        chunker,
                        self.embedder.as_ref(),
                        self.force_rebuild,
                    )
                    .await?;
                self.force_rebuild = false;
                Some(index)
            }
            None => None,
        };

        let corpus_docs: Vec<String> = state
            .corpus_location
            .as_deref()
            .map(list_document_names)
            .unwrap_or_default();

        info!(query = %state.query, max_steps = state.max_steps, "starting research run");

        loop {
            let legal = Self::legal_actions(&state);
            let record = self
                .reasoning
                .decide(self.provider.as_ref(), &state, &corpus_docs, &legal)
                .await;
            state.decision_trace.push(record);

            match Self::route(&state) {
                Action::Finish => {
                    debug!(step = state.step, "routing to finish");
                    let report = self
                        .synthesis
                        .synthesize(self.provider.as_ref(), &state)
                        .await;
                    state.final_report = Some(report);
                    break;
                }
                Action::SearchInternal => {
                    run_internal_search(
                        &mut state,
                        index.as_deref(),
                        self.embedder.as_ref(),
                        self.settings.top_k,
                        self.settings.score_threshold,
                    )
                    .await;
                }
                Action::WebSearch => {
                    run_web_search(&mut state, self.web.as_deref(), self.settings.top_k).await;
                }
            }
        }

        info!(
            steps = state.step,
            internal = state.internal_evidence.len(),
            external = state.external_evidence.len(),
            "research run complete"
        );
        Ok(state)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("web", &self.web.is_some())
            .field("force_rebuild", &self.force_rebuild)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::DecisionRecord;

    fn decision(step: usize, action: Action) -> DecisionRecord {
        DecisionRecord {
            step,
            thought: "t".to_string(),
            action,
            action_input: "i".to_string(),
        }
    }

    #[test]
    fn test_route_empty_trace_finishes() {
        let state = AgentState::new("q", None, 10);
        assert_eq!(Orchestrator::route(&state), Action::Finish);
    }

    #[test]
    fn test_route_follows_latest_decision() {
        let mut state = AgentState::new("q", None, 10);
        state.decision_trace.push(decision(0, Action::WebSearch));
        assert_eq!(Orchestrator::route(&state), Action::WebSearch);

        state.decision_trace.push(decision(1, Action::SearchInternal));
        assert_eq!(Orchestrator::route(&state), Action::SearchInternal);
    }

    #[test]
    fn test_route_budget_exhaustion_overrides_decision() {
        let mut state = AgentState::new("q", None, 2);
        state.step = 2;
        state.decision_trace.push(decision(2, Action::WebSearch));
        assert_eq!(Orchestrator::route(&state), Action::Finish);
    }

    #[test]
    fn test_route_zero_budget_forces_finish_immediately() {
        let mut state = AgentState::new("q", None, 0);
        state.decision_trace.push(decision(0, Action::SearchInternal));
        assert_eq!(Orchestrator::route(&state), Action::Finish);
    }

    #[test]
    fn test_legal_actions_without_corpus() {
        let state = AgentState::new("q", None, 10);
        let legal = Orchestrator::legal_actions(&state);
        assert_eq!(legal, vec![Action::WebSearch, Action::Finish]);
    }

    #[test]
    fn test_legal_actions_with_corpus() {
        let state = AgentState::new("q", Some(PathBuf::from("./kb")), 10);
        let legal = Orchestrator::legal_actions(&state);
        assert_eq!(
            legal,
            vec![Action::SearchInternal, Action::WebSearch, Action::Finish]
        );
    }
}
