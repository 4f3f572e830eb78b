//! Conversation Messages
//!
//! The message model the orchestrator appends to during a run. Tool
//! activity is recorded as a fixed two-message pair: an assistant message
//! carrying the tool call, followed by a tool-response message with the
//! result text.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text content
    Text { text: String },
    /// Tool call issued by the assistant
    ToolCall {
        id: String,
        call_type: String,
        name: String,
        arguments_json: String,
    },
    /// Tool result returned to the model
    ToolResponse {
        id: String,
        name: String,
        text: String,
    },
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<MessageContent>,
}

impl Message {
    /// Create a simple text message
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, text)
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(MessageRole::System, text)
    }

    /// Assistant message carrying one tool call (first half of the pair).
    pub fn assistant_tool_call(
        id: impl Into<String>,
        call_type: impl Into<String>,
        name: impl Into<String>,
        arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![MessageContent::ToolCall {
                id: id.into(),
                call_type: call_type.into(),
                name: name.into(),
                arguments_json: arguments_json.into(),
            }],
        }
    }

    /// Tool-response message (second half of the pair).
    pub fn tool_response(
        id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: vec![MessageContent::ToolResponse {
                id: id.into(),
                name: name.into(),
                text: text.into(),
            }],
        }
    }

    /// Concatenated plain text of the message, ignoring tool blocks.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.plain_text(), "hello");
    }

    #[test]
    fn test_tool_pair_shape() {
        let call = Message::assistant_tool_call("call_1", "function", "bash", r#"{"command":"ls"}"#);
        assert_eq!(call.role, MessageRole::Assistant);
        assert!(matches!(
            call.content[0],
            MessageContent::ToolCall { ref name, .. } if name == "bash"
        ));

        let response = Message::tool_response("call_1", "bash", "a.txt\nb.txt");
        assert_eq!(response.role, MessageRole::Tool);
        assert!(matches!(
            response.content[0],
            MessageContent::ToolResponse { ref id, .. } if id == "call_1"
        ));
    }

    #[test]
    fn test_plain_text_skips_tool_blocks() {
        let msg = Message {
            role: MessageRole::Assistant,
            content: vec![
                MessageContent::Text {
                    text: "before".to_string(),
                },
                MessageContent::ToolCall {
                    id: "c1".to_string(),
                    call_type: "function".to_string(),
                    name: "bash".to_string(),
                    arguments_json: "{}".to_string(),
                },
            ],
        };
        assert_eq!(msg.plain_text(), "before");
    }
}
