//! Reasoning engine: one model call per decision, with a deterministic
//! fallback.
//!
//! A decision is never an error. The engine either parses the model's
//! three-line response into a [`DecisionRecord`], or absorbs the failure and
//! returns a forced-finish record that names the failure in its rationale.
//! The fallback construction is a pure function so it is testable without
//! inducing real call failures.

use tracing::{debug, warn};

use super::message::{ChatRequest, user_message};
use super::prompt::build_reasoning_prompt;
use super::provider::LlmProvider;
use super::state::{Action, AgentState, DecisionRecord, parse_decision};
use crate::config::Settings;
use crate::error::AgentError;

/// Produces one decision record per reasoning call.
#[derive(Debug, Clone)]
pub struct ReasoningEngine {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ReasoningEngine {
    /// Creates an engine from agent configuration.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
            max_tokens: settings.reasoning_max_tokens,
        }
    }

    /// Makes one reasoning call and returns the resulting decision.
    ///
    /// Malformed model output parses to a finish decision via the grammar's
    /// fallback rule; a failed call produces [`fallback_decision`]. Either
    /// way the caller always gets exactly one record.
    pub async fn decide(
        &self,
        provider: &dyn LlmProvider,
        state: &AgentState,
        corpus_docs: &[String],
        legal_actions: &[Action],
    ) -> DecisionRecord {
        match self
            .request_decision(provider, state, corpus_docs, legal_actions)
            .await
        {
            Ok(record) => {
                debug!(
                    step = record.step,
                    action = %record.action,
                    "reasoning decision"
                );
                record
            }
            Err(e) => {
                warn!(error = %e, "reasoning call failed, forcing finish");
                fallback_decision(state, &e.to_string())
            }
        }
    }

    async fn request_decision(
        &self,
        provider: &dyn LlmProvider,
        state: &AgentState,
        corpus_docs: &[String],
        legal_actions: &[Action],
    ) -> Result<DecisionRecord, AgentError> {
        let prompt = build_reasoning_prompt(state, corpus_docs, legal_actions);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![user_message(&prompt)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        let response = provider.chat(&request).await?;
        let (thought, action, action_input) = parse_decision(&response.content);

        Ok(DecisionRecord {
            step: state.step,
            thought,
            action,
            action_input,
        })
    }
}

/// Builds the forced-finish decision used when the reasoning call fails.
///
/// Pure function of the state and the failure description.
#[must_use]
pub fn fallback_decision(state: &AgentState, failure: &str) -> DecisionRecord {
    DecisionRecord {
        step: state.step,
        thought: format!("Error in reasoning: {failure}. Proceeding to finish."),
        action: Action::Finish,
        action_input: state.query.clone(),
    }
}
