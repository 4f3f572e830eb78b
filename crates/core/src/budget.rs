//! Run Budgets
//!
//! Immutable resource ceilings for a single agent run. Model calls and tool
//! calls are tracked as independent scopes, each with its own maximum call
//! count, per-call timeout, and retry allowance, plus an overall wall-clock
//! deadline for the whole run.
//!
//! Fields left at zero in configuration are normalized to the `DEFAULT`
//! preset values, so a partially specified budget is always usable.

use serde::{Deserialize, Serialize};

/// Resource ceiling for one call scope (model calls or tool calls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeBudget {
    /// Maximum number of calls of this kind in one run.
    #[serde(default)]
    pub max_calls: u32,
    /// Per-call timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: u64,
    /// How many times a repair/force-final primitive may re-issue a call
    /// of this kind. Zero means "use the caller's fallback".
    #[serde(default)]
    pub retry_count: u32,
}

impl ScopeBudget {
    pub const fn new(max_calls: u32, timeout_ms: u64, retry_count: u32) -> Self {
        Self {
            max_calls,
            timeout_ms,
            retry_count,
        }
    }

    /// Replace zero fields with the given preset's values.
    fn normalized(self, preset: ScopeBudget) -> Self {
        Self {
            max_calls: if self.max_calls == 0 {
                preset.max_calls
            } else {
                self.max_calls
            },
            timeout_ms: if self.timeout_ms == 0 {
                preset.timeout_ms
            } else {
                self.timeout_ms
            },
            // retry_count may legitimately stay zero: callers supply a fallback.
            retry_count: self.retry_count,
        }
    }
}

/// Resource ceiling for one run: an overall deadline plus one scope budget
/// each for model calls and tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Overall wall-clock timeout for the run, in milliseconds.
    #[serde(default)]
    pub timeout_ms: u64,
    /// Budget scope for model calls.
    #[serde(default = "Budget::default_model_scope")]
    pub model: ScopeBudget,
    /// Budget scope for tool calls.
    #[serde(default = "Budget::default_tool_scope")]
    pub tool: ScopeBudget,
}

impl Budget {
    /// Balanced preset for ordinary chat agents.
    pub const DEFAULT: Budget = Budget {
        timeout_ms: 120_000,
        model: ScopeBudget::new(15, 60_000, 0),
        tool: ScopeBudget::new(20, 30_000, 0),
    };

    /// Small preset for quick, tool-free answers.
    pub const LIGHT: Budget = Budget {
        timeout_ms: 30_000,
        model: ScopeBudget::new(3, 30_000, 0),
        tool: ScopeBudget::new(5, 15_000, 0),
    };

    /// Large preset for long plan/execute runs.
    pub const HEAVY: Budget = Budget {
        timeout_ms: 300_000,
        model: ScopeBudget::new(30, 90_000, 1),
        tool: ScopeBudget::new(50, 60_000, 1),
    };

    fn default_model_scope() -> ScopeBudget {
        Self::DEFAULT.model
    }

    fn default_tool_scope() -> ScopeBudget {
        Self::DEFAULT.tool
    }

    /// Normalize a configured budget: any zero field falls back to the
    /// `DEFAULT` preset value.
    pub fn normalized(self) -> Self {
        Self {
            timeout_ms: if self.timeout_ms == 0 {
                Self::DEFAULT.timeout_ms
            } else {
                self.timeout_ms
            },
            model: self.model.normalized(Self::DEFAULT.model),
            tool: self.tool.normalized(Self::DEFAULT.tool),
        }
    }

    /// Retry allowance for model-call re-issues; `fallback` when the scope
    /// does not configure one.
    pub fn model_retry_count(&self, fallback: u32) -> u32 {
        if self.model.retry_count > 0 {
            self.model.retry_count
        } else {
            fallback
        }
    }

    /// Retry allowance for tool-call re-issues; `fallback` when the scope
    /// does not configure one.
    pub fn tool_retry_count(&self, fallback: u32) -> u32 {
        if self.tool.retry_count > 0 {
            self.tool.retry_count
        } else {
            fallback
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::DEFAULT
    }
}
