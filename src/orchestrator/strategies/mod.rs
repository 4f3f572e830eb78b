//! Control Strategies
//!
//! The four step-sequencing state machines and their shared primitives:
//! the tool-required repair nudge and the force-final turn with its
//! continuation-phrase fallback. All four share one skeleton: call the
//! model, inspect for tool calls, execute tools, repeat or conclude.

pub mod oneshot;
pub mod plan_execute;
pub mod react;
pub mod tool_oneshot;

pub use oneshot::run_oneshot;
pub use plan_execute::run_plan_execute;
pub use react::run_react_loop;
pub use tool_oneshot::run_tool_oneshot;

use std::sync::OnceLock;

use regex::Regex;

use agent_gateway_core::{AgentDelta, ToolChoice};

use crate::error::AppResult;
use crate::orchestrator::context::{ExecutionContext, HistoryKind};
use crate::orchestrator::sink::DeltaSink;
use crate::orchestrator::turn::{OrchestratorServices, TurnOptions};

/// Phrases that betray a deferred-continuation answer instead of a final
/// one. Matched against the lowercased, whitespace-collapsed text.
const CONTINUATION_PREFIXES: &[&str] = &[
    "let me check",
    "let me first",
    "let me look",
    "i need to check",
    "i'll check",
    "i will check",
    "first, let me",
    "first i will",
    "i will first",
];

const CONTINUATION_MARKERS: &[&str] = &[
    "call the tool",
    "calling the tool",
    "call a tool",
    "use the tool to",
    "check the available resources",
];

fn tool_call_snippet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b[a-z][a-z0-9_]{2,}\s*\(\s*[{"]"#)
            .unwrap_or_else(|e| panic!("invalid tool-call snippet regex: {}", e))
    })
}

/// The terminal fallback turn: a call that forbids further tool calls and
/// must produce user-facing text.
///
/// The turn itself streams nothing; the resolved text is emitted here when
/// `emit_content` is set. Blank output or deferred-continuation language
/// allows a re-issue up to the model scope's retry allowance; once the
/// allowance is spent, the structured fallback built from the last tool
/// record replaces it, never an unhelpful stub.
pub async fn force_final_answer(
    services: &OrchestratorServices,
    context: &mut ExecutionContext,
    system_prompt: &str,
    history: HistoryKind,
    stage: &str,
    emit_content: bool,
    sink: &DeltaSink,
) -> AppResult<String> {
    let attempts = context.budget().model_retry_count(1).max(1);
    let mut resolved = String::new();

    for attempt in 1..=attempts {
        let attempt_stage = if attempt == 1 {
            stage.to_string()
        } else {
            format!("{}-retry-{}", stage, attempt - 1)
        };
        let prompt = services.prompts.force_final.clone();
        let turn = services
            .run_model_turn(
                context,
                system_prompt,
                history,
                Some(prompt),
                vec![],
                TurnOptions::new(ToolChoice::None, &attempt_stage).emit_content(false),
                sink,
            )
            .await?;

        let final_text = turn.final_text.trim().to_string();
        if !should_fallback_to_blocked_final(&final_text) {
            resolved = final_text;
            break;
        }
    }
    if resolved.is_empty() {
        resolved = build_blocked_final_answer(context);
    }

    if emit_content && !resolved.is_empty() {
        sink.emit(AgentDelta::content(resolved.clone())).await;
    }
    Ok(resolved)
}

/// Whether forced-final output needs the structured fallback.
pub fn should_fallback_to_blocked_final(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    if tool_call_snippet_regex().is_match(&lowered) {
        return true;
    }
    let compact = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    CONTINUATION_PREFIXES.iter().any(|p| compact.starts_with(p))
        || CONTINUATION_MARKERS.iter().any(|m| compact.contains(m))
}

/// Structured fallback answer: confirmed info / blocking point / minimal
/// next step, seeded from the most recent tool record.
pub fn build_blocked_final_answer(context: &ExecutionContext) -> String {
    format!(
        "Confirmed information:\n{}\n\nBlocking point:\nTool calls are no longer allowed in \
         this turn, and the information gathered so far does not cover the goal.\n\nMinimal \
         next step:\nRetry with tool calls enabled and the run will continue to a final result.",
        summarize_latest_tool_record(context)
    )
}

fn summarize_latest_tool_record(context: &ExecutionContext) -> String {
    let Some(latest) = context.tool_records.last() else {
        return "- No tool results available yet.".to_string();
    };
    let tool_name = latest
        .get("toolName")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("unknown");
    let result = latest
        .get("result")
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "none".to_string());
    let one_line = result.split_whitespace().collect::<Vec<_>>().join(" ");
    let summary = if one_line.chars().count() > 240 {
        format!("{}...", one_line.chars().take(240).collect::<String>())
    } else if one_line.is_empty() {
        "none".to_string()
    } else {
        one_line
    };
    format!("- Latest tool: {}\n- Result summary: {}", tool_name, summary)
}
