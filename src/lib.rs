//! Agent Gateway
//!
//! An LLM-agent execution server core: given a user request and an agent
//! definition, drive a bounded sequence of model calls and tool invocations
//! to a final answer, streaming intermediate output to the consumer.
//!
//! ## Module Organization
//!
//! - `agent` - agent definitions, the file loader, runtime prompt templates
//! - `orchestrator` - execution context, turn runner, control strategies,
//!   verify gate, and the run entry point
//! - `error` - application error types

pub mod agent;
pub mod error;
pub mod orchestrator;

pub use error::{AppError, AppResult};
pub use orchestrator::Orchestrator;
