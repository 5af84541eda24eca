//! Research agent: the decision/action loop, its engines, and the
//! provider-agnostic LLM layer.

pub mod actions;
pub mod client;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod reasoning;
pub mod state;
pub mod synthesis;

pub use client::create_provider;
pub use orchestrator::Orchestrator;
pub use provider::LlmProvider;
pub use reasoning::ReasoningEngine;
pub use state::{Action, AgentState, DecisionRecord, ToolCallRecord, WebResult, parse_decision};
pub use synthesis::SynthesisEngine;
