//! Prompt builders for the reasoning and synthesis calls.
//!
//! Both builders are pure functions of the run state, so prompt content is
//! testable without any live model. The reasoning prompt carries an evidence
//! digest (counts plus short previews) rather than full evidence, keeping the
//! decision call cheap; the synthesis prompt carries the top sources in full
//! preview form.

use std::fmt::Write;

use super::state::{Action, AgentState};

/// Maximum corpus filenames listed in the reasoning prompt.
const MAX_LISTED_DOCS: usize = 10;
/// Preview length for the first internal result in the reasoning digest.
const INTERNAL_PREVIEW_CHARS: usize = 200;
/// Preview length for the first external result in the reasoning digest.
const EXTERNAL_PREVIEW_CHARS: usize = 150;
/// Maximum sources per evidence list in the synthesis prompt.
const MAX_SYNTHESIS_SOURCES: usize = 5;
/// Preview length per source in the synthesis prompt.
const SYNTHESIS_PREVIEW_CHARS: usize = 300;

/// Truncates `text` to at most `max_chars` characters, appending an ellipsis
/// when anything was cut. Character-based so multi-byte input never splits.
#[must_use]
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

/// Builds the reasoning prompt: query, evidence digest, legal actions, and
/// the three-line response format.
///
/// `corpus_docs` lists the filenames available for internal search so the
/// model can judge topical fit before choosing `search_internal`.
#[must_use]
pub fn build_reasoning_prompt(
    state: &AgentState,
    corpus_docs: &[String],
    legal_actions: &[Action],
) -> String {
    let internal_done = state
        .tool_calls
        .iter()
        .any(|c| c.tool_name == Action::SearchInternal.as_str());
    let external_done = state
        .tool_calls
        .iter()
        .any(|c| c.tool_name == Action::WebSearch.as_str());

    let mut context = String::new();

    if let Some(ref kb) = state.corpus_location {
        let _ = writeln!(context, "- Knowledge base available at: {}", kb.display());
        if corpus_docs.is_empty() {
            context.push_str("  (knowledge base contains no .md/.txt documents)\n");
        } else {
            let listed: Vec<&str> = corpus_docs
                .iter()
                .take(MAX_LISTED_DOCS)
                .map(String::as_str)
                .collect();
            let _ = writeln!(context, "  Documents in KB: {}", listed.join(", "));
            if corpus_docs.len() > MAX_LISTED_DOCS {
                let _ = writeln!(
                    context,
                    "  (and {} more documents)",
                    corpus_docs.len() - MAX_LISTED_DOCS
                );
            }
        }
    }

    if internal_done {
        if state.internal_evidence.is_empty() {
            context.push_str("- Internal KB search completed: no relevant results found\n");
        } else {
            let _ = writeln!(
                context,
                "- Internal KB search completed: {} sources retrieved",
                state.internal_evidence.len()
            );
            let _ = writeln!(
                context,
                "  Preview of first result: {}",
                preview(&state.internal_evidence[0], INTERNAL_PREVIEW_CHARS)
            );
        }
    }

    if external_done {
        if state.external_evidence.is_empty() {
            context.push_str("- Web search completed: no results found\n");
        } else {
            let first = &state.external_evidence[0];
            let _ = writeln!(
                context,
                "- Web search COMPLETED: {} sources retrieved",
                state.external_evidence.len()
            );
            let _ = writeln!(context, "  Sample result: '{}'", first.title);
            let _ = writeln!(
                context,
                "  Content preview: {}",
                preview(&first.content, EXTERNAL_PREVIEW_CHARS)
            );
        }
    }

    if context.is_empty() {
        context.push_str("- No searches performed yet\n");
    }

    let actions: Vec<&str> = legal_actions.iter().map(|a| a.as_str()).collect();

    format!(
        "You are a research agent that answers questions by using available tools.\n\n\
         **Research Query:** {query}\n\n\
         **Current Context:**\n{context}\n\
         **Available Actions:**\n\
         - search_internal: Search the internal knowledge base (local documents)\n\
         - web_search: Search the web for current information or topics not in the KB\n\
         - finish: Generate the final answer when you have enough information\n\n\
         **Legal actions right now:** {actions}\n\n\
         **Your Task:**\n\
         Analyze the query and the current context, then decide what to do next. \
         Respond in exactly this format:\n\n\
         THOUGHT: [your reasoning about what to do next]\n\
         ACTION: [one of: {actions}]\n\
         ACTION_INPUT: [the query to use for the action]\n\n\
         Decision rules:\n\
         1. If a tool already COMPLETED with results in the context above, do not run it again.\n\
         2. Read the previews: if the results answer the query, choose finish.\n\
         3. Match the query topic against the KB document names before choosing search_internal.\n\n\
         Now, what should we do next?",
        query = state.query,
        context = context,
        actions = actions.join(", "),
    )
}

/// Builds the synthesis prompt from the full evidence lists.
///
/// The top sources from each list appear with short previews; the required
/// report outline (Summary, Key Findings, Detailed Analysis, Sources) is part
/// of the prompt so the model's output and the fallback report share a shape.
#[must_use]
pub fn build_synthesis_prompt(state: &AgentState) -> String {
    let mut internal = String::new();
    if state.internal_evidence.is_empty() {
        internal.push_str("**Internal Knowledge Base Sources:** None\n");
    } else {
        internal.push_str("**Internal Knowledge Base Sources:**\n\n");
        for (i, source) in state
            .internal_evidence
            .iter()
            .take(MAX_SYNTHESIS_SOURCES)
            .enumerate()
        {
            let _ = writeln!(
                internal,
                "{}. {}\n",
                i + 1,
                preview(source, SYNTHESIS_PREVIEW_CHARS)
            );
        }
    }

    let mut external = String::new();
    if state.external_evidence.is_empty() {
        external.push_str("**Web Search Sources:** None\n");
    } else {
        external.push_str("**Web Search Sources:**\n\n");
        for (i, result) in state
            .external_evidence
            .iter()
            .take(MAX_SYNTHESIS_SOURCES)
            .enumerate()
        {
            let _ = writeln!(
                external,
                "{}. **{}**\n   URL: {}\n   {}\n",
                i + 1,
                result.title,
                result.url,
                preview(&result.content, SYNTHESIS_PREVIEW_CHARS)
            );
        }
    }

    format!(
        "You are a research assistant tasked with creating a comprehensive research brief.\n\n\
         **Research Query:** {query}\n\n\
         {internal}\n\
         {external}\n\
         **Your Task:**\n\
         Synthesize the information from all sources into a well-structured research brief \
         in Markdown format.\n\n\
         **Required Structure:**\n\n\
         # Research Brief: {query}\n\n\
         ## Summary\n\
         [2-3 sentences summarizing the key findings]\n\n\
         ## Key Findings\n\
         [3-5 bullet points with the most important insights from the sources]\n\n\
         ## Detailed Analysis\n\
         [2-3 paragraphs providing deeper analysis based on the sources]\n\n\
         ## Sources\n\
         ### Internal Knowledge Base\n\
         [List internal sources if used]\n\
         ### External Web Sources\n\
         [List external sources with links if used]\n\n\
         Guidelines: synthesize rather than copy, cite sources for specific claims, \
         acknowledge conflicting sources, keep the language clear.\n\n\
         Now, generate the research brief:",
        query = state.query,
        internal = internal,
        external = external,
    )
}
