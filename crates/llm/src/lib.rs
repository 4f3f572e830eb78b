//! Agent Gateway LLM
//!
//! Model-provider abstraction for the Agent Gateway workspace. Defines the
//! raw streamed delta types the orchestrator consumes, the `ModelClient`
//! trait all providers implement, an OpenAI-compatible SSE client, and the
//! read-only provider catalog shared across concurrent runs.
//!
//! ## Module Organization
//!
//! - `types` - `ModelDelta`, `ToolCallFragment`, `CallSpec`, `LlmError`
//! - `provider` - `ModelClient` trait and HTTP error mapping helpers
//! - `sse` - OpenAI-compatible SSE line adapter
//! - `openai` - reqwest-based OpenAI-compatible streaming client
//! - `catalog` - provider_key -> client registry

pub mod catalog;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

pub use catalog::{ProviderCatalog, ProviderEntry};
pub use openai::OpenAiCompatClient;
pub use provider::{missing_api_key_error, parse_http_error, ModelClient};
pub use sse::SseLineAdapter;
pub use types::{CallSpec, LlmError, LlmResult, ModelDelta, ToolCallFragment, ToolSchema};
