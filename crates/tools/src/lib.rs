//! Agent Gateway Tools
//!
//! Tool layer for the Agent Gateway workspace: the `Tool` trait, an
//! insertion-ordered registry, the `ToolCoordinator` that turns planned
//! tool calls into deltas + message-history events, and a shell tool with
//! a conservative command validator.
//!
//! ## Module Organization
//!
//! - `tool` - `Tool` trait and `ToolOutcome`
//! - `registry` - ordered name -> tool registry with schema export
//! - `coordinator` - batch execution boundary (never panics the run)
//! - `shell` - shell command tool + validator

pub mod coordinator;
pub mod registry;
pub mod shell;
pub mod tool;

pub use coordinator::{ToolCoordinator, ToolExecutionBatch, ToolExecutionEvent};
pub use registry::ToolRegistry;
pub use shell::{ShellCommandValidator, ShellTool};
pub use tool::{Tool, ToolOutcome};
