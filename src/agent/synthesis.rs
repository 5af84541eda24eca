//! Synthesis engine: one model call for the final report, with a
//! deterministic offline fallback.
//!
//! Synthesis never fails the run. When the model call errors, the engine
//! returns [`fallback_report`] — a templated brief built purely from the run
//! state and the failure reason, producible with no external calls.

use std::fmt::Write;

use tracing::{info, warn};

use super::message::{ChatRequest, user_message};
use super::prompt::{build_synthesis_prompt, preview};
use super::provider::LlmProvider;
use super::state::AgentState;
use crate::config::Settings;
use crate::error::AgentError;

/// Sources listed per evidence list in the fallback report.
const MAX_FALLBACK_SOURCES: usize = 5;
/// Preview length per internal source in the fallback report.
const FALLBACK_PREVIEW_CHARS: usize = 100;

/// Produces the final research brief.
#[derive(Debug, Clone)]
pub struct SynthesisEngine {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl SynthesisEngine {
    /// Creates an engine from agent configuration.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
            max_tokens: settings.synthesis_max_tokens,
        }
    }

    /// Generates the final report, falling back to the offline template on
    /// any model failure.
    pub async fn synthesize(&self, provider: &dyn LlmProvider, state: &AgentState) -> String {
        match self.request_report(provider, state).await {
            Ok(report) => {
                info!("research brief generated");
                report
            }
            Err(e) => {
                warn!(error = %e, "synthesis failed, using fallback report");
                fallback_report(state, &e.to_string())
            }
        }
    }

    async fn request_report(
        &self,
        provider: &dyn LlmProvider,
        state: &AgentState,
    ) -> Result<String, AgentError> {
        let prompt = build_synthesis_prompt(state);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![user_message(&prompt)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };
        let response = provider.chat(&request).await?;
        Ok(response.content)
    }
}

/// Builds the deterministic fallback report.
///
/// Pure function of the run state and the failure reason: given the same
/// evidence lists and message, the output is byte-for-byte reproducible.
#[must_use]
pub fn fallback_report(state: &AgentState, failure: &str) -> String {
    let mut internal = String::new();
    if state.internal_evidence.is_empty() {
        internal.push_str("- No internal sources used");
    } else {
        for (i, chunk) in state
            .internal_evidence
            .iter()
            .take(MAX_FALLBACK_SOURCES)
            .enumerate()
        {
            if i > 0 {
                internal.push('\n');
            }
            let _ = write!(internal, "- {}", preview(chunk, FALLBACK_PREVIEW_CHARS));
        }
    }

    let mut external = String::new();
    if state.external_evidence.is_empty() {
        external.push_str("- No external sources used");
    } else {
        for (i, result) in state
            .external_evidence
            .iter()
            .take(MAX_FALLBACK_SOURCES)
            .enumerate()
        {
            if i > 0 {
                external.push('\n');
            }
            let _ = write!(external, "- [{}]({})", result.title, result.url);
        }
    }

    format!(
        "# Research Brief: {query}\n\n\
         ## Summary\n\n\
         An error occurred during synthesis. Below is a basic summary of the gathered information.\n\n\
         ## Process\n\n\
         - Steps taken: {steps}\n\
         - Internal sources consulted: {internal_count}\n\
         - External sources consulted: {external_count}\n\n\
         ## Sources\n\n\
         ### Internal Knowledge Base\n\
         {internal}\n\n\
         ### External Web Search\n\
         {external}\n\n\
         ## Error\n\n\
         Synthesis failed: {failure}\n",
        query = state.query,
        steps = state.step,
        internal_count = state.internal_evidence.len(),
        external_count = state.external_evidence.len(),
        internal = internal,
        external = external,
        failure = failure,
    )
}
