//! Shared run state and the reasoning-response grammar.
//!
//! [`AgentState`] is the single record of a research run: the query, the
//! evidence gathered by actions, the decision trace, and the step counter.
//! Only the orchestrator mutates it; engines and actions receive it by
//! reference and return values.
//!
//! The module also owns the textual command grammar the reasoning model
//! replies in: three labelled lines (`THOUGHT:`, `ACTION:`, `ACTION_INPUT:`)
//! parsed by [`parse_decision`] with a default-to-finish fallback on any
//! malformed output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default rationale when the model omits a `THOUGHT:` line.
const DEFAULT_THOUGHT: &str = "Analyzing the query and deciding next steps.";
/// Default argument when the model omits an `ACTION_INPUT:` line.
const DEFAULT_ACTION_INPUT: &str = "No specific input needed";

/// An action the reasoning model can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Query the local similarity index.
    SearchInternal,
    /// Query the live web-search provider.
    WebSearch,
    /// Stop gathering evidence and synthesize the report.
    Finish,
}

impl Action {
    /// Wire name of the action, as it appears in prompts and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchInternal => "search_internal",
            Self::WebSearch => "web_search",
            Self::Finish => "finish",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reasoning decision: rationale, chosen action, action argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Step counter value at the time of the decision.
    pub step: usize,
    /// Model rationale for the choice.
    pub thought: String,
    /// The selected action.
    pub action: Action,
    /// Free-text argument for the action (usually a search query).
    pub action_input: String,
}

/// One executed tool call, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name (`"search_internal"` or `"web_search"`).
    pub tool_name: String,
    /// The input the tool was invoked with.
    pub input: String,
    /// Result payload (JSON list of retrieved items), or the error
    /// description when `is_error` is set.
    pub output: String,
    /// Whether the call failed.
    pub is_error: bool,
}

/// A normalized result from the web-search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result content snippet (empty when the provider omits it).
    pub content: String,
    /// Provider relevance score, when reported.
    pub relevance_score: Option<f64>,
    /// Publication date, when reported.
    pub published_date: Option<String>,
}

/// Mutable state of a single research run.
#[derive(Debug, Clone)]
pub struct AgentState {
    /// The research question being answered.
    pub query: String,
    /// Corpus directory for internal search, if one is configured.
    pub corpus_location: Option<PathBuf>,
    /// Every reasoning decision made so far, in order.
    pub decision_trace: Vec<DecisionRecord>,
    /// Every executed tool call, in order, including failures.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Text snippets retrieved from the local index.
    pub internal_evidence: Vec<String>,
    /// Results retrieved from the web-search provider.
    pub external_evidence: Vec<WebResult>,
    /// Number of actions executed. Incremented only by actions, never by
    /// reasoning calls.
    pub step: usize,
    /// Step budget; the router forces finish once `step >= max_steps`.
    pub max_steps: usize,
    /// The synthesized (or fallback) report, set once at the end of the run.
    pub final_report: Option<String>,
}

impl AgentState {
    /// Creates a fresh run state for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>, corpus_location: Option<PathBuf>, max_steps: usize) -> Self {
        Self {
            query: query.into(),
            corpus_location,
            decision_trace: Vec::new(),
            tool_calls: Vec::new(),
            internal_evidence: Vec::new(),
            external_evidence: Vec::new(),
            step: 0,
            max_steps,
            final_report: None,
        }
    }

    /// The most recent decision, if any.
    #[must_use]
    pub fn last_decision(&self) -> Option<&DecisionRecord> {
        self.decision_trace.last()
    }
}

/// Parses a reasoning completion into `(thought, action, action_input)`.
///
/// The grammar is three labelled lines, matched case-insensitively on the
/// label and tolerant of reordering and omission:
///
/// ```text
/// THOUGHT: <rationale>
/// ACTION: <selector>
/// ACTION_INPUT: <argument>
/// ```
///
/// The action selector resolves by substring: `"internal"` selects
/// [`Action::SearchInternal`], `"web"` selects [`Action::WebSearch`],
/// `"finish"` selects [`Action::Finish`]. Anything else, including a
/// completely unlabelled response, resolves to [`Action::Finish`]. Missing
/// thought and input lines get fixed defaults. `"ACTION INPUT:"` is accepted
/// as a label spelling alongside `"ACTION_INPUT:"`.
#[must_use]
pub fn parse_decision(response: &str) -> (String, Action, String) {
    let mut thought = String::new();
    let mut action = Action::Finish;
    let mut action_input = String::new();

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = strip_label(line, "THOUGHT:") {
            thought = rest.to_string();
        } else if let Some(rest) =
            strip_label(line, "ACTION_INPUT:").or_else(|| strip_label(line, "ACTION INPUT:"))
        {
            action_input = rest.to_string();
        } else if let Some(rest) = strip_label(line, "ACTION:") {
            let selector = rest.to_lowercase();
            if selector.contains("internal") {
                action = Action::SearchInternal;
            } else if selector.contains("web") {
                action = Action::WebSearch;
            } else if selector.contains("finish") {
                action = Action::Finish;
            }
        }
    }

    if thought.is_empty() {
        thought = DEFAULT_THOUGHT.to_string();
    }
    if action_input.is_empty() {
        action_input = DEFAULT_ACTION_INPUT.to_string();
    }

    (thought, action, action_input)
}

/// Strips a case-insensitive label prefix, returning the trimmed remainder.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    match line.get(..label.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(label) => {
            line.get(label.len()..).map(str::trim)
        }
        _ => None,
    }
}
