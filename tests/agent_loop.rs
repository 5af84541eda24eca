//! End-to-end tests for the research loop with in-process fakes for the
//! LLM provider, the embedder, and the web-search provider.

#![allow(clippy::panic)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use research_nav::agent::message::{ChatRequest, ChatResponse, TokenUsage};
use research_nav::agent::{LlmProvider, Orchestrator, WebResult};
use research_nav::config::Settings;
use research_nav::error::{AgentError, IndexError};
use research_nav::index::{Chunker, Embedder, VectorIndex};
use research_nav::web::{WebSearchProvider, WebSearchRequest};

/// Provider replaying a scripted list of responses. Calls past the end of
/// the script repeat the final entry.
struct ScriptedProvider {
    script: Vec<Result<String, String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<String, String>>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = self.script.get(i).unwrap_or_else(|| {
            self.script.last().unwrap_or_else(|| panic!("empty script"))
        });
        match entry {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(msg) => Err(AgentError::ApiRequest {
                message: msg.clone(),
                status: Some(500),
            }),
        }
    }
}

/// Deterministic embedder: a fixed unit vector per text, no network.
struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        "hash-embedder"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let sum: u32 = t.bytes().map(u32::from).sum();
                let x = (sum % 97) as f32 / 97.0;
                let y = (1.0 - x * x).max(0.0).sqrt();
                vec![x, y]
            })
            .collect())
    }
}

/// Web provider failing every call.
struct FailingWeb {
    calls: AtomicUsize,
}

#[async_trait]
impl WebSearchProvider for FailingWeb {
    async fn search(&self, _request: &WebSearchRequest) -> Result<Vec<WebResult>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::WebSearch {
            message: "provider unavailable".to_string(),
        })
    }
}

/// Web provider returning one fixed result per call.
struct FixedWeb;

#[async_trait]
impl WebSearchProvider for FixedWeb {
    async fn search(&self, request: &WebSearchRequest) -> Result<Vec<WebResult>, AgentError> {
        Ok(vec![WebResult {
            title: format!("Result for {}", request.query),
            url: "https://example.com".to_string(),
            content: "fixed content".to_string(),
            relevance_score: Some(0.9),
            published_date: None,
        }])
    }
}

fn settings(max_steps: usize, index_dir: &Path) -> Settings {
    Settings::builder()
        .openai_api_key("test-key")
        .max_steps(max_steps)
        .index_dir(index_dir)
        .build()
        .unwrap_or_else(|e| panic!("settings: {e}"))
}

fn corpus_with(content: &str) -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    std::fs::write(dir.path().join("notes.md"), content)
        .unwrap_or_else(|e| panic!("write: {e}"));
    dir
}

const FINISH: &str = "THOUGHT: enough evidence\nACTION: finish\nACTION_INPUT: done";

#[tokio::test]
async fn scenario_a_zero_budget_forces_immediate_finish() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        // The model asks for a web search, but the budget is already spent.
        Ok("THOUGHT: look it up\nACTION: web_search\nACTION_INPUT: ping".to_string()),
        Ok("# Research Brief: ping\n\nNothing gathered.".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(0, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        Some(Box::new(FixedWeb)),
    );

    let state = orchestrator
        .run("ping", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, 0);
    assert!(state.internal_evidence.is_empty());
    assert!(state.external_evidence.is_empty());
    assert!(state.tool_calls.is_empty());
    assert_eq!(state.decision_trace.len(), 1);
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn scenario_b_internal_search_then_finish() {
    let corpus = corpus_with("Quantum entanglement links particle states.");
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        Ok("THOUGHT: check the KB\nACTION: search_internal\nACTION_INPUT: q".to_string()),
        Ok(FINISH.to_string()),
        Ok("# Research Brief: q\n\nDone.".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        None,
    );

    let state = orchestrator
        .run("q", Some(corpus.path().to_path_buf()))
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, 1);
    assert_eq!(state.tool_calls.len(), 1);
    assert_eq!(state.tool_calls[0].tool_name, "search_internal");
    assert_eq!(state.tool_calls[0].input, "q");
    assert!(!state.tool_calls[0].is_error);
    assert!(!state.internal_evidence.is_empty());
    assert!(state.internal_evidence[0].contains("entanglement"));
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn scenario_c_failing_web_provider_still_produces_report() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        Ok("THOUGHT: try the web\nACTION: web_search\nACTION_INPUT: q".to_string()),
        Ok("THOUGHT: try again\nACTION: web_search\nACTION_INPUT: q".to_string()),
        Ok(FINISH.to_string()),
        Ok("# Research Brief: q\n\nReport despite failures.".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        Some(Box::new(FailingWeb {
            calls: AtomicUsize::new(0),
        })),
    );

    let state = orchestrator
        .run("q", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, 2);
    assert_eq!(state.tool_calls.len(), 2);
    assert!(state.tool_calls.iter().all(|c| c.is_error));
    assert!(state.tool_calls[0].output.contains("provider unavailable"));
    assert!(state.external_evidence.is_empty());
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn termination_within_budget_plus_one_reasoning_calls() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    // The model never volunteers to finish.
    let provider = ScriptedProvider::new(vec![Ok(
        "THOUGHT: keep searching\nACTION: web_search\nACTION_INPUT: more".to_string(),
    )]);
    let call_counter = std::sync::Arc::new(AtomicUsize::new(0));

    struct CountingWrapper {
        inner: ScriptedProvider,
        counter: std::sync::Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmProvider for CountingWrapper {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            self.inner.chat(request).await
        }
    }

    let max_steps = 3;
    let mut orchestrator = Orchestrator::new(
        settings(max_steps, artifacts.path()),
        Box::new(CountingWrapper {
            inner: provider,
            counter: std::sync::Arc::clone(&call_counter),
        }),
        Box::new(HashEmbedder::new()),
        Some(Box::new(FixedWeb)),
    );

    let state = orchestrator
        .run("endless", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, max_steps);
    assert_eq!(state.tool_calls.len(), state.step);
    // max_steps + 1 reasoning calls, plus the synthesis call.
    assert_eq!(call_counter.load(Ordering::SeqCst), max_steps + 2);
    assert_eq!(state.decision_trace.len(), max_steps + 1);
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn no_corpus_keeps_internal_evidence_empty() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    // The model insists on internal search even though no corpus exists.
    let provider = ScriptedProvider::new(vec![
        Ok("THOUGHT: kb\nACTION: search_internal\nACTION_INPUT: x".to_string()),
        Ok(FINISH.to_string()),
        Ok("report".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        None,
    );

    let state = orchestrator
        .run("q", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert!(state.internal_evidence.is_empty());
    assert!(
        state
            .tool_calls
            .iter()
            .all(|c| c.tool_name != "search_internal")
    );
    assert!(state.final_report.is_some());
}

#[tokio::test]
async fn invalid_corpus_aborts_before_any_steps() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![Ok(FINISH.to_string())]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        None,
    );

    let result = orchestrator
        .run("q", Some(Path::new("/nonexistent/kb").to_path_buf()))
        .await;
    assert!(matches!(result, Err(IndexError::CorpusMissing { .. })));
}

#[tokio::test]
async fn synthesis_failure_yields_fallback_report() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        Ok(FINISH.to_string()),
        Err("model overloaded".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        None,
    );

    let state = orchestrator
        .run("fallback query", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    let report = state.final_report.unwrap_or_else(|| panic!("missing report"));
    assert!(report.contains("# Research Brief: fallback query"));
    assert!(report.contains("Synthesis failed: "));
    assert!(report.contains("model overloaded"));
}

#[tokio::test]
async fn reasoning_failure_forces_finish_with_report() {
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        Err("reasoning down".to_string()),
        Ok("fallback-path report".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        None,
    );

    let state = orchestrator
        .run("q", None)
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, 0);
    assert_eq!(state.decision_trace.len(), 1);
    assert!(state.decision_trace[0].thought.contains("reasoning down"));
    assert_eq!(
        state.final_report.as_deref(),
        Some("fallback-path report")
    );
}

#[tokio::test]
async fn index_loader_is_idempotent_without_rebuild() {
    let corpus = corpus_with("Stable corpus content for indexing.");
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let chunker = Chunker::new(1000, 200);

    let first_embedder = HashEmbedder::new();
    let first = VectorIndex::get_or_create(
        artifacts.path(),
        corpus.path(),
        chunker,
        &first_embedder,
        false,
    )
    .await
    .unwrap_or_else(|e| panic!("first: {e}"));
    assert_eq!(first_embedder.calls.load(Ordering::SeqCst), 1);

    // A second loader with a fresh embedder reads the artifact; nothing is
    // re-embedded.
    let second_embedder = HashEmbedder::new();
    let second = VectorIndex::get_or_create(
        artifacts.path(),
        corpus.path(),
        chunker,
        &second_embedder,
        false,
    )
    .await
    .unwrap_or_else(|e| panic!("second: {e}"));

    assert_eq!(second_embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(first.len(), second.len());
    assert_eq!(first.sources(), second.sources());
}

#[tokio::test]
async fn mixed_run_keeps_tool_calls_equal_to_step() {
    let corpus = corpus_with("Internal knowledge about rust async runtimes.");
    let artifacts = tempfile::TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let provider = ScriptedProvider::new(vec![
        Ok("THOUGHT: kb first\nACTION: search_internal\nACTION_INPUT: rust async".to_string()),
        Ok("THOUGHT: now the web\nACTION: web_search\nACTION_INPUT: rust async".to_string()),
        Ok(FINISH.to_string()),
        Ok("final report".to_string()),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings(10, artifacts.path()),
        Box::new(provider),
        Box::new(HashEmbedder::new()),
        Some(Box::new(FixedWeb)),
    );

    let state = orchestrator
        .run("rust async", Some(corpus.path().to_path_buf()))
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(state.step, 2);
    assert_eq!(state.tool_calls.len(), state.step);
    assert!(!state.internal_evidence.is_empty());
    assert_eq!(state.external_evidence.len(), 1);
    assert_eq!(state.decision_trace.len(), 3);
}
