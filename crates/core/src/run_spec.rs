//! Run Policy
//!
//! Declares how an agent executes: which control strategy sequences its
//! model and tool calls, whether tools are allowed or required, whether a
//! verification pass rewrites the final answer, and the run budget.

use serde::{Deserialize, Serialize};

use crate::budget::Budget;

/// Whether the agent may, must, or must not call tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPolicy {
    /// Tools are available; the model chooses.
    Allow,
    /// At least one tool call is expected; violations trigger a repair turn.
    Require,
    /// Tools are never offered to the model.
    Disallow,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self::Disallow
    }
}

/// Per-request tool choice forwarded to the model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Provider decides whether to call tools.
    Auto,
    /// Provider must emit at least one tool call.
    Required,
    /// Tool calling is disabled for this request.
    None,
}

impl Default for ToolChoice {
    fn default() -> Self {
        Self::Auto
    }
}

/// Whether a second model pass reviews the candidate final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyPolicy {
    /// Emit the first draft directly.
    None,
    /// Stream a second pass that corrects or restates the draft; only the
    /// second-pass output reaches the consumer.
    SecondPassFix,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self::None
    }
}

/// Reasoning-effort hint forwarded to providers that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeEffort {
    Low,
    Medium,
    High,
}

impl Default for ComputeEffort {
    fn default() -> Self {
        Self::Medium
    }
}

/// The step-sequencing policy governing a run.
///
/// Step caps live here rather than on [`Budget`]: the per-scope budget
/// model tracks calls and time, while the loop bound is a property of the
/// strategy itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlStrategy {
    /// Single model turn, no tools.
    Oneshot,
    /// One tool round: call, execute, one closing turn.
    ToolOneshot,
    /// Repeated call/execute loop with a forced final turn.
    ReactLoop {
        #[serde(default = "ControlStrategy::default_react_steps")]
        max_steps: u32,
    },
    /// Planning turn, per-step execution, forced final turn.
    PlanExecute {
        #[serde(default = "ControlStrategy::default_plan_steps")]
        max_steps: u32,
    },
}

impl ControlStrategy {
    fn default_react_steps() -> u32 {
        6
    }

    fn default_plan_steps() -> u32 {
        8
    }

    /// Normalize a zero step cap to the variant default.
    pub fn normalized(self) -> Self {
        match self {
            Self::ReactLoop { max_steps: 0 } => Self::ReactLoop {
                max_steps: Self::default_react_steps(),
            },
            Self::PlanExecute { max_steps: 0 } => Self::PlanExecute {
                max_steps: Self::default_plan_steps(),
            },
            other => other,
        }
    }
}

impl Default for ControlStrategy {
    fn default() -> Self {
        Self::Oneshot
    }
}

/// Declares how an agent executes. One `RunSpec` per agent definition,
/// immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    #[serde(default)]
    pub control: ControlStrategy,
    #[serde(default)]
    pub tool_policy: ToolPolicy,
    #[serde(default)]
    pub verify: VerifyPolicy,
    #[serde(default)]
    pub compute: ComputeEffort,
    #[serde(default)]
    pub budget: Budget,
}

impl RunSpec {
    pub fn new(
        control: ControlStrategy,
        tool_policy: ToolPolicy,
        verify: VerifyPolicy,
        budget: Budget,
    ) -> Self {
        Self {
            control: control.normalized(),
            tool_policy,
            verify,
            compute: ComputeEffort::default(),
            budget: budget.normalized(),
        }
    }

    /// Normalize nested fields after deserialization.
    pub fn normalized(self) -> Self {
        Self {
            control: self.control.normalized(),
            budget: self.budget.normalized(),
            ..self
        }
    }

    /// Whether the tool policy demands at least one tool call.
    pub fn requires_tool(&self) -> bool {
        self.tool_policy == ToolPolicy::Require
    }
}

impl Default for RunSpec {
    fn default() -> Self {
        Self::new(
            ControlStrategy::Oneshot,
            ToolPolicy::Disallow,
            VerifyPolicy::None,
            Budget::DEFAULT,
        )
    }
}
