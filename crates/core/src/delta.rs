//! Streamed Output Units
//!
//! `AgentDelta` is the single unit of output a run streams to its consumer:
//! reasoning text, content text, live tool-call chunks, tool results, plan
//! snapshots, and the terminal finish marker. Deltas are emitted in exact
//! production order and never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One live tool-call fragment forwarded to the consumer while the model is
/// still streaming. `arguments` is the raw (partial) argument text of this
/// chunk, not the assembled whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    pub id: String,
    pub call_type: String,
    pub name: String,
    pub arguments: String,
}

/// One unit of streamed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentDelta {
    /// Model reasoning text chunk
    Reasoning { text: String },

    /// Model content text chunk
    Content { text: String },

    /// Live tool-call chunks observed in the model stream
    ToolCalls { calls: Vec<ToolCallChunk> },

    /// Result of executing one tool
    ToolResult { call_id: String, result: String },

    /// Snapshot of the current plan task list
    PlanUpdate {
        plan_id: String,
        tasks: Vec<PlanTask>,
    },

    /// Terminal marker; the stream carries nothing after it
    Finish { reason: String },
}

impl AgentDelta {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn tool_calls(calls: Vec<ToolCallChunk>) -> Self {
        Self::ToolCalls { calls }
    }

    pub fn tool_result(call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            result: result.into(),
        }
    }

    pub fn plan_update(plan_id: impl Into<String>, tasks: Vec<PlanTask>) -> Self {
        Self::PlanUpdate {
            plan_id: plan_id.into(),
            tasks,
        }
    }

    pub fn finish(reason: impl Into<String>) -> Self {
        Self::Finish {
            reason: reason.into(),
        }
    }
}

/// One accumulated record of run activity: tool executions and step
/// summaries both land here as loose key/value rows. The force-final
/// fallback reads `toolName`/`result` keys from the most recent row.
pub type ToolRecord = serde_json::Map<String, Value>;

/// One task in a plan snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub task_id: String,
    pub description: String,
    pub status: String,
}

/// A fully assembled, ready-to-execute tool invocation derived from
/// streamed fragments. Built incrementally during a turn and finalized when
/// the turn ends; `call_id` values are unique within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedToolCall {
    /// Lowercased tool name; never blank.
    pub name: String,
    /// Parsed argument map; empty when the streamed JSON was unusable.
    pub arguments: BTreeMap<String, Value>,
    pub call_id: String,
}

impl PlannedToolCall {
    pub fn new(
        name: impl Into<String>,
        arguments: BTreeMap<String, Value>,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            call_id: call_id.into(),
        }
    }

    /// Arguments re-serialized as a JSON object string.
    pub fn arguments_json(&self) -> String {
        serde_json::to_string(&self.arguments).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_serialization_tags() {
        let delta = AgentDelta::content("Hello");
        let json = serde_json::to_string(&delta).unwrap();
        assert!(json.contains("\"type\":\"content\""));
        assert!(json.contains("\"text\":\"Hello\""));

        let parsed: AgentDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(delta, parsed);
    }

    #[test]
    fn test_finish_delta() {
        let delta = AgentDelta::finish("stop");
        let json = serde_json::to_string(&delta).unwrap();
        assert!(json.contains("\"type\":\"finish\""));
        assert!(json.contains("\"reason\":\"stop\""));
    }

    #[test]
    fn test_planned_tool_call_arguments_json() {
        let mut args = BTreeMap::new();
        args.insert("command".to_string(), Value::String("ls".to_string()));
        let call = PlannedToolCall::new("bash", args, "call_1");
        assert_eq!(call.arguments_json(), r#"{"command":"ls"}"#);
    }

    #[test]
    fn test_tool_calls_delta_round_trip() {
        let delta = AgentDelta::tool_calls(vec![ToolCallChunk {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            name: "bash".to_string(),
            arguments: "{\"comman".to_string(),
        }]);
        let json = serde_json::to_string(&delta).unwrap();
        let parsed: AgentDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(delta, parsed);
    }
}
