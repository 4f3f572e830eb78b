//! Error Handling
//!
//! Application-wide error type for the gateway. Extends the core error set
//! with variants that need the provider layer and with the budget-exceeded
//! signal the orchestrator aborts on.

use thiserror::Error;

use agent_gateway_core::CoreError;
use agent_gateway_llm::LlmError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Core-layer errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Model provider errors
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    /// A run exceeded its budget (model calls, tool calls, or wall clock)
    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a budget-exceeded error
    pub fn budget_exceeded(msg: impl Into<String>) -> Self {
        Self::BudgetExceeded(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
