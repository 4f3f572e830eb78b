//! LLM Types
//!
//! Raw streamed delta types and the call specification handed to a
//! provider. Tool-call fragments pass through exactly as the provider sent
//! them (optional id, optional positional index); identity resolution and
//! reassembly belong to the orchestrator's accumulator, not this crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use agent_gateway_core::{ComputeEffort, Message, ToolChoice};

/// One raw tool-call fragment from the model stream.
///
/// Providers frequently omit the `id` after a call's first fragment and
/// reference the call only by `index`. Fragments must be forwarded in
/// arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Argument text fragment; a left-to-right slice of a streamed JSON
    /// object, possibly empty.
    #[serde(default)]
    pub arguments: String,
}

/// One unit of raw model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ModelDelta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_fragments(fragments: Vec<ToolCallFragment>) -> Self {
        Self {
            tool_calls: fragments,
            ..Self::default()
        }
    }

    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reasoning.is_none()
            && self.content.is_none()
            && self.tool_calls.is_empty()
            && self.finish_reason.is_none()
    }
}

/// Tool schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: Value,
}

/// Specification for one streamed model call.
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub provider_key: String,
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub extra_user_prompt: Option<String>,
    pub tools: Vec<ToolSchema>,
    pub tool_choice: ToolChoice,
    pub compute_effort: ComputeEffort,
    pub reasoning_enabled: bool,
    pub max_tokens: u32,
    /// Label identifying the orchestration stage, for logging.
    pub stage: String,
    pub parallel_tool_calls: bool,
}

impl CallSpec {
    pub fn new(
        provider_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            provider_key: provider_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            messages,
            extra_user_prompt: None,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            compute_effort: ComputeEffort::Medium,
            reasoning_enabled: false,
            max_tokens: 4096,
            stage: String::new(),
            parallel_tool_calls: false,
        }
    }

    pub fn with_extra_user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.extra_user_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSchema>, choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = choice;
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }
}

/// Errors surfaced by model providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Server error (status {status:?}): {message}")]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for provider operations
pub type LlmResult<T> = Result<T, LlmError>;
