//! Agent Gateway Core
//!
//! Foundational types for the Agent Gateway workspace: error types, run
//! policy (budgets, tool/verify policies, control strategies), the chat
//! message model, and the streamed `AgentDelta` output type. This crate has
//! no dependencies on the provider or tool layers.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `budget` - Per-scope call/time budgets and retry policy
//! - `run_spec` - Run policy (`RunSpec`, `ControlStrategy`, `ToolPolicy`, ...)
//! - `message` - Conversation message model
//! - `delta` - Streamed output units (`AgentDelta`) and assembled tool calls

pub mod budget;
pub mod delta;
pub mod error;
pub mod message;
pub mod run_spec;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Budget / Retry Policy ──────────────────────────────────────────────
pub use budget::{Budget, ScopeBudget};

// ── Run Policy ─────────────────────────────────────────────────────────
pub use run_spec::{ComputeEffort, ControlStrategy, RunSpec, ToolChoice, ToolPolicy, VerifyPolicy};

// ── Messages ───────────────────────────────────────────────────────────
pub use message::{Message, MessageContent, MessageRole};

// ── Stream Deltas ──────────────────────────────────────────────────────
pub use delta::{AgentDelta, PlanTask, PlannedToolCall, ToolCallChunk, ToolRecord};
