//! Model Client Trait
//!
//! The single contract the orchestrator needs from a model provider: stream
//! the deltas of one call, in order, into a channel, and terminate the
//! stream on completion or error.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::{CallSpec, LlmError, LlmResult, ModelDelta};

/// Trait all model providers implement.
///
/// Implementations must preserve within-call ordering of deltas and close
/// the channel (by dropping the sender) when the stream ends. A send error
/// means the consumer went away; providers may stop streaming at that
/// point but must still return cleanly.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider name for logging and identification.
    fn name(&self) -> &'static str;

    /// Stream one model call's deltas into `tx`.
    async fn stream_deltas(&self, spec: CallSpec, tx: mpsc::Sender<ModelDelta>) -> LlmResult<()>;
}

/// Error for a provider configured without an API key.
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Map an HTTP error status + body to an `LlmError`.
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
