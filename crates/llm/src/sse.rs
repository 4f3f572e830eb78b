//! OpenAI-Compatible SSE Line Adapter
//!
//! Maps `data: {...}` SSE lines from an OpenAI-compatible chat completion
//! stream to [`ModelDelta`]s. Tool-call fragments pass through with their
//! raw id/index untouched; reassembling them into stable records is the
//! orchestrator's job.

use serde::Deserialize;

use crate::types::{LlmError, LlmResult, ModelDelta, ToolCallFragment};

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<RawToolCall>>,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    #[serde(default)]
    call_type: Option<String>,
    #[serde(default)]
    function: Option<RawFunction>,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Adapter for one SSE stream. Returns `None` deltas for keep-alive noise
/// and signals end-of-stream via [`SseLineAdapter::is_done`] after `[DONE]`.
#[derive(Debug, Default)]
pub struct SseLineAdapter {
    done: bool,
}

impl SseLineAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been observed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Adapt one stream line. A line may produce zero or one delta.
    pub fn adapt(&mut self, line: &str) -> LlmResult<Option<ModelDelta>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(':') {
            return Ok(None);
        }

        let json_str = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            // Some gateways omit the SSE prefix on error payloads.
            None => trimmed,
        };

        if json_str == "[DONE]" {
            self.done = true;
            return Ok(None);
        }

        let chunk: ChatChunk =
            serde_json::from_str(json_str).map_err(|e| LlmError::ParseError {
                message: format!("bad stream chunk: {}", e),
            })?;

        let mut delta = ModelDelta::default();
        for choice in chunk.choices {
            if let Some(d) = choice.delta {
                if let Some(reasoning) = d.reasoning_content.filter(|s| !s.is_empty()) {
                    delta.reasoning = Some(reasoning);
                }
                if let Some(content) = d.content.filter(|s| !s.is_empty()) {
                    delta.content = Some(content);
                }
                if let Some(raw_calls) = d.tool_calls {
                    for raw in raw_calls {
                        let (name, arguments) = match raw.function {
                            Some(f) => (f.name, f.arguments.unwrap_or_default()),
                            None => (None, String::new()),
                        };
                        delta.tool_calls.push(ToolCallFragment {
                            id: raw.id.filter(|s| !s.is_empty()),
                            index: raw.index,
                            call_type: raw.call_type.filter(|s| !s.is_empty()),
                            name: name.filter(|s| !s.is_empty()),
                            arguments,
                        });
                    }
                }
            }
            if let Some(reason) = choice.finish_reason.filter(|s| !s.is_empty()) {
                delta.finish_reason = Some(reason);
            }
        }

        if delta.is_empty() {
            Ok(None)
        } else {
            Ok(Some(delta))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_delta() {
        let mut adapter = SseLineAdapter::new();
        let delta = adapter
            .adapt(r#"data: {"choices": [{"delta": {"content": "Hello"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(delta.content.as_deref(), Some("Hello"));
        assert!(delta.tool_calls.is_empty());
    }

    #[test]
    fn test_reasoning_delta() {
        let mut adapter = SseLineAdapter::new();
        let delta = adapter
            .adapt(r#"data: {"choices": [{"delta": {"reasoning_content": "thinking"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(delta.reasoning.as_deref(), Some("thinking"));
    }

    #[test]
    fn test_tool_call_fragment_passthrough() {
        let mut adapter = SseLineAdapter::new();
        let delta = adapter
            .adapt(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "id": "call_1", "type": "function", "function": {"name": "bash", "arguments": "{\"comman"}}]}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(delta.tool_calls.len(), 1);
        let fragment = &delta.tool_calls[0];
        assert_eq!(fragment.id.as_deref(), Some("call_1"));
        assert_eq!(fragment.index, Some(0));
        assert_eq!(fragment.name.as_deref(), Some("bash"));
        assert_eq!(fragment.arguments, "{\"comman");
    }

    #[test]
    fn test_continuation_fragment_keeps_missing_id() {
        let mut adapter = SseLineAdapter::new();
        let delta = adapter
            .adapt(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "d\":\"ls\"}"}}]}}]}"#)
            .unwrap()
            .unwrap();
        let fragment = &delta.tool_calls[0];
        assert!(fragment.id.is_none());
        assert_eq!(fragment.index, Some(0));
        assert_eq!(fragment.arguments, "d\":\"ls\"}");
    }

    #[test]
    fn test_finish_reason() {
        let mut adapter = SseLineAdapter::new();
        let delta = adapter
            .adapt(r#"data: {"choices": [{"finish_reason": "tool_calls"}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(delta.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn test_done_signal() {
        let mut adapter = SseLineAdapter::new();
        assert!(adapter.adapt("data: [DONE]").unwrap().is_none());
        assert!(adapter.is_done());
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let mut adapter = SseLineAdapter::new();
        assert!(adapter.adapt("").unwrap().is_none());
        assert!(adapter.adapt(": keep-alive").unwrap().is_none());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let mut adapter = SseLineAdapter::new();
        assert!(matches!(
            adapter.adapt("data: {not json"),
            Err(LlmError::ParseError { .. })
        ));
    }
}
