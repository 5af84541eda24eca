//! research-nav: an LLM-routed research loop over a local similarity index
//! and live web search.
//!
//! A run interleaves reasoning and evidence gathering: a reasoning call
//! picks the next action (internal search, web search, or finish), the
//! chosen action appends evidence and advances the step counter, and a
//! synthesis call turns everything into a Markdown research brief. Every
//! external call has a deterministic fallback, so a run either aborts on a
//! configuration problem before taking any steps or completes with a
//! report.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod web;

pub use agent::{Action, AgentState, Orchestrator};
pub use config::Settings;
pub use error::{AgentError, IndexError};
