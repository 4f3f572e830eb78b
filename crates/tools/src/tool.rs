//! Tool Trait
//!
//! The execution contract for one tool. Failures are data, not panics: a
//! tool that cannot complete returns an error outcome (or a `CoreError`
//! that the coordinator converts into one) and the run continues.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use agent_gateway_core::CoreResult;

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    /// Create a successful result
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    /// Create an error result
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// Text form handed back to the model. Failures are serialized as a
    /// structured `{ok:false, error}` object so the model can react to them.
    pub fn to_content(&self) -> String {
        if self.success {
            self.output.clone().unwrap_or_default()
        } else {
            serde_json::json!({
                "ok": false,
                "error": self.error.as_deref().unwrap_or("Unknown error"),
            })
            .to_string()
        }
    }
}

/// A tool the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique lowercase name of this tool (e.g. "bash").
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing input parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given argument object.
    async fn execute(&self, args: &Value) -> CoreResult<ToolOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_ok() {
        let outcome = ToolOutcome::ok("hello");
        assert!(outcome.success);
        assert_eq!(outcome.to_content(), "hello");
    }

    #[test]
    fn test_outcome_err_is_structured() {
        let outcome = ToolOutcome::err("boom");
        assert!(!outcome.success);
        let parsed: Value = serde_json::from_str(&outcome.to_content()).unwrap();
        assert_eq!(parsed["ok"], false);
        assert_eq!(parsed["error"], "boom");
    }
}
