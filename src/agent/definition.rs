//! Agent Definition
//!
//! The immutable description of one agent: which provider/model it runs
//! on, its prompt set, its run policy, and the tools it may use.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agent_gateway_core::RunSpec;

/// Per-stage system prompts. Only `system` is required; plan/execute/
/// summary default through the fallback chain in [`AgentPromptSet::primary`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPromptSet {
    #[serde(default)]
    pub system: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AgentPromptSet {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Self::default()
        }
    }

    /// The primary system prompt: `system`, else `execute`, else `plan`.
    pub fn primary(&self) -> &str {
        if !self.system.trim().is_empty() {
            return &self.system;
        }
        if let Some(execute) = self.execute.as_deref() {
            if !execute.trim().is_empty() {
                return execute;
            }
        }
        if let Some(plan) = self.plan.as_deref() {
            if !plan.trim().is_empty() {
                return plan;
            }
        }
        ""
    }

    /// Plan-stage prompt, defaulting to the primary prompt.
    pub fn plan_prompt(&self) -> &str {
        match self.plan.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => self.primary(),
        }
    }

    /// Execute-stage prompt, defaulting to the primary prompt.
    pub fn execute_prompt(&self) -> &str {
        match self.execute.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => self.primary(),
        }
    }

    /// Summary-stage prompt, defaulting to the execute prompt.
    pub fn summary_prompt(&self) -> &str {
        match self.summary.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => self.execute_prompt(),
        }
    }
}

/// Immutable definition of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub provider_key: String,
    pub model: String,
    #[serde(default)]
    pub prompts: AgentPromptSet,
    #[serde(default)]
    pub run_spec: RunSpec,
    /// Names of the tools this agent may use; empty means all registered.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Whether reasoning chunks are requested and streamed to the consumer.
    #[serde(default)]
    pub reasoning_enabled: bool,
}

/// One incoming user request against an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub message: String,
}

impl AgentRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            run_id: new_run_id(),
            chat_id: None,
            message: message.into(),
        }
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// Generate a fresh run id.
pub fn new_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}
