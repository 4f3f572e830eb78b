//! Agent Definitions
//!
//! Agent definition model, the file-based definition loader, and the
//! runtime prompt templates the orchestrator renders during a run.

pub mod definition;
pub mod loader;
pub mod prompts;

pub use definition::{new_run_id, AgentDefinition, AgentPromptSet, AgentRequest};
pub use loader::{AgentCatalog, AgentDefinitionLoader};
pub use prompts::RuntimePromptTemplates;
