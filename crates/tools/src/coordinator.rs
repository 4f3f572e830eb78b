//! Tool Coordinator
//!
//! Executes a batch of planned tool calls against a registry and returns
//! both the consumer-facing deltas and the events the orchestrator appends
//! to its message histories. This is the failure boundary for tools: an
//! unknown name or a failing execution becomes a structured error result,
//! never a propagated error that would kill the run.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use agent_gateway_core::{AgentDelta, PlannedToolCall, ToolRecord};

use crate::registry::ToolRegistry;
use crate::tool::ToolOutcome;

/// One completed tool execution, with everything needed to append the
/// standard assistant-tool-call + tool-response message pair.
#[derive(Debug, Clone)]
pub struct ToolExecutionEvent {
    pub call_id: String,
    pub tool_name: String,
    pub tool_type: String,
    pub args_json: String,
    pub result_text: String,
    pub success: bool,
}

/// Result of executing one batch of planned calls.
#[derive(Debug, Default)]
pub struct ToolExecutionBatch {
    pub deltas: Vec<AgentDelta>,
    pub events: Vec<ToolExecutionEvent>,
}

/// Stateless executor for batches of planned tool calls.
pub struct ToolCoordinator;

impl ToolCoordinator {
    /// Execute each planned call in order. Every call produces exactly one
    /// event and one `ToolResult` delta; a record row is appended per call.
    pub async fn execute_tool_calls(
        planned: &[PlannedToolCall],
        enabled: &ToolRegistry,
        records: &mut Vec<ToolRecord>,
        run_id: &str,
    ) -> ToolExecutionBatch {
        let mut batch = ToolExecutionBatch::default();

        for call in planned {
            let args = Value::Object(call.arguments.clone().into_iter().collect());
            let outcome = match enabled.get(&call.name) {
                Some(tool) => {
                    debug!(run_id, tool = %call.name, call_id = %call.call_id, "executing tool");
                    match tool.execute(&args).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!(run_id, tool = %call.name, error = %e, "tool execution failed");
                            ToolOutcome::err(e.to_string())
                        }
                    }
                }
                None => {
                    warn!(run_id, tool = %call.name, "unknown or disabled tool requested");
                    ToolOutcome::err(format!("Unknown or disabled tool: {}", call.name))
                }
            };

            let result_text = outcome.to_content();
            let args_json = call.arguments_json();

            let mut record = ToolRecord::new();
            record.insert("callId".to_string(), Value::String(call.call_id.clone()));
            record.insert("toolName".to_string(), Value::String(call.name.clone()));
            record.insert("args".to_string(), args);
            record.insert("result".to_string(), Value::String(result_text.clone()));
            record.insert(
                "at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
            records.push(record);

            batch.deltas.push(AgentDelta::tool_result(
                call.call_id.clone(),
                result_text.clone(),
            ));
            batch.events.push(ToolExecutionEvent {
                call_id: call.call_id.clone(),
                tool_name: call.name.clone(),
                tool_type: "function".to_string(),
                args_json,
                result_text,
                success: outcome.success,
            });
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;
    use agent_gateway_core::{CoreError, CoreResult};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the given text"
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn execute(&self, args: &Value) -> CoreResult<ToolOutcome> {
            Ok(ToolOutcome::ok(
                args["text"].as_str().unwrap_or_default().to_uppercase(),
            ))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn execute(&self, _args: &Value) -> CoreResult<ToolOutcome> {
            Err(CoreError::internal("deliberate failure"))
        }
    }

    fn planned(name: &str, call_id: &str) -> PlannedToolCall {
        let mut args = BTreeMap::new();
        args.insert("text".to_string(), Value::String("hi".to_string()));
        PlannedToolCall::new(name, args, call_id)
    }

    #[tokio::test]
    async fn test_successful_execution() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool));
        let mut records = Vec::new();

        let batch = ToolCoordinator::execute_tool_calls(
            &[planned("upper", "call_1")],
            &registry,
            &mut records,
            "run-1",
        )
        .await;

        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].result_text, "HI");
        assert!(batch.events[0].success);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["toolName"], "upper");
        assert!(matches!(
            &batch.deltas[0],
            AgentDelta::ToolResult { call_id, result } if call_id == "call_1" && result == "HI"
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_structured_error() {
        let registry = ToolRegistry::new();
        let mut records = Vec::new();

        let batch = ToolCoordinator::execute_tool_calls(
            &[planned("ghost", "call_2")],
            &registry,
            &mut records,
            "run-1",
        )
        .await;

        assert_eq!(batch.events.len(), 1);
        assert!(!batch.events[0].success);
        let parsed: Value = serde_json::from_str(&batch.events[0].result_text).unwrap();
        assert_eq!(parsed["ok"], false);
        assert!(parsed["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_tool_error_is_caught() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        let mut records = Vec::new();

        let batch = ToolCoordinator::execute_tool_calls(
            &[planned("failing", "call_3")],
            &registry,
            &mut records,
            "run-1",
        )
        .await;

        assert!(!batch.events[0].success);
        let parsed: Value = serde_json::from_str(&batch.events[0].result_text).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("deliberate"));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool));
        let mut records = Vec::new();

        let batch = ToolCoordinator::execute_tool_calls(
            &[planned("upper", "call_a"), planned("upper", "call_b")],
            &registry,
            &mut records,
            "run-1",
        )
        .await;

        assert_eq!(batch.events[0].call_id, "call_a");
        assert_eq!(batch.events[1].call_id, "call_b");
        assert_eq!(records.len(), 2);
    }
}
