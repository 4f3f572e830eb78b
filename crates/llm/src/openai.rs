//! OpenAI-Compatible Streaming Client
//!
//! `ModelClient` implementation for any OpenAI-compatible chat completion
//! endpoint (OpenAI itself, or aggregator gateways exposing the same wire
//! format). Posts one streaming request and pumps adapted deltas into the
//! caller's channel.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use agent_gateway_core::{ComputeEffort, Message, MessageContent, MessageRole, ToolChoice};

use crate::provider::{missing_api_key_error, parse_http_error, ModelClient};
use crate::sse::SseLineAdapter;
use crate::types::{CallSpec, LlmError, LlmResult, ModelDelta, ToolSchema};

/// Default OpenAI chat completions endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible streaming client
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| OPENAI_API_URL.to_string()),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn build_request_body(&self, spec: &CallSpec) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": spec.model,
            "max_tokens": spec.max_tokens,
            "stream": true,
        });

        if spec.reasoning_enabled {
            body["reasoning_effort"] = serde_json::json!(effort_label(spec.compute_effort));
        }

        let mut messages: Vec<serde_json::Value> = Vec::new();
        if !spec.system_prompt.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": spec.system_prompt,
            }));
        }
        for msg in &spec.messages {
            messages.push(message_to_wire(msg));
        }
        if let Some(extra) = spec.extra_user_prompt.as_ref().filter(|s| !s.is_empty()) {
            messages.push(serde_json::json!({
                "role": "user",
                "content": extra,
            }));
        }
        body["messages"] = serde_json::json!(messages);

        if !spec.tools.is_empty() {
            let tools: Vec<serde_json::Value> = spec.tools.iter().map(tool_to_wire).collect();
            body["tools"] = serde_json::json!(tools);
            body["tool_choice"] = serde_json::json!(match spec.tool_choice {
                ToolChoice::Auto => "auto",
                ToolChoice::Required => "required",
                ToolChoice::None => "none",
            });
            body["parallel_tool_calls"] = serde_json::json!(spec.parallel_tool_calls);
        }

        body
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    fn name(&self) -> &'static str {
        "openai-compat"
    }

    async fn stream_deltas(&self, spec: CallSpec, tx: mpsc::Sender<ModelDelta>) -> LlmResult<()> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai-compat"))?;

        let body = self.build_request_body(&spec);
        debug!(stage = %spec.stage, model = %spec.model, "issuing streaming chat completion");

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status, &body_text, "openai-compat"));
        }

        let mut adapter = SseLineAdapter::new();
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].to_string();
                buffer.drain(..=line_end);

                match adapter.adapt(&line) {
                    Ok(Some(delta)) => {
                        if tx.send(delta).await.is_err() {
                            // Consumer went away; stop streaming quietly.
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(stage = %spec.stage, error = %e, "dropping unparseable stream line");
                    }
                }
            }
            if adapter.is_done() {
                break;
            }
        }

        Ok(())
    }
}

fn effort_label(effort: ComputeEffort) -> &'static str {
    match effort {
        ComputeEffort::Low => "low",
        ComputeEffort::Medium => "medium",
        ComputeEffort::High => "high",
    }
}

/// Convert a conversation message to the OpenAI wire shape.
fn message_to_wire(message: &Message) -> serde_json::Value {
    // Tool-response messages become role "tool" with a tool_call_id.
    for content in &message.content {
        if let MessageContent::ToolResponse { id, text, .. } = content {
            return serde_json::json!({
                "role": "tool",
                "tool_call_id": id,
                "content": text,
            });
        }
    }

    let tool_calls: Vec<serde_json::Value> = message
        .content
        .iter()
        .filter_map(|c| {
            if let MessageContent::ToolCall {
                id,
                name,
                arguments_json,
                ..
            } = c
            {
                Some(serde_json::json!({
                    "id": id,
                    "type": "function",
                    "function": { "name": name, "arguments": arguments_json },
                }))
            } else {
                None
            }
        })
        .collect();

    let role = match message.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };
    let text = message.plain_text();

    if !tool_calls.is_empty() {
        let mut wire = serde_json::json!({
            "role": role,
            "tool_calls": tool_calls,
        });
        // Some OpenAI-compatible gateways require a content field even on
        // tool-call-only assistant messages.
        if text.is_empty() {
            wire["content"] = serde_json::Value::Null;
        } else {
            wire["content"] = serde_json::json!(text);
        }
        return wire;
    }

    serde_json::json!({ "role": role, "content": text })
}

fn tool_to_wire(tool: &ToolSchema) -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        },
    })
}
