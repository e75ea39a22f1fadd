//! Core type definitions for the chat-completion wire protocol
//!
//! This module defines the data structures shared between the conversation
//! session, the streaming orchestrator, and the model endpoint client. The
//! design follows OpenAI's chat-completions format: role-tagged messages,
//! function-style tool calls with JSON arguments, and incremental stream
//! deltas that may carry text, tool-call pieces, and a finish reason in any
//! combination.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message body: plain text, or a list of structured content items as
/// returned by tool invocations.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Items(Vec<ContentItem>),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Items(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Items(items) => items.is_empty(),
        }
    }
}

/// Closed set of content item kinds a tool result may carry. Remote tools
/// returning anything else fail with an unsupported-content error instead of
/// silently passing opaque payloads to the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentItem::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    /// Assistant turn recording a tool call; the content stays empty, the
    /// call itself is carried in `tool_calls`.
    pub fn assistant_tool_call(id: String, name: String, arguments: Value) -> Self {
        Message {
            role: Role::Assistant,
            content: MessageContent::Text(String::new()),
            tool_call_id: None,
            name: None,
            tool_calls: Some(vec![ToolCall {
                id: Some(id),
                name,
                arguments,
            }]),
        }
    }

    /// Tool result keyed to the call that produced it.
    pub fn tool_result(tool_call_id: String, name: String, items: Vec<ContentItem>) -> Self {
        Message {
            role: Role::Tool,
            content: MessageContent::Items(items),
            tool_call_id: Some(tool_call_id),
            name: Some(name),
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// Accumulates the pieces of a streamed tool call until the endpoint signals
/// completion. `arguments_buffer` holds raw JSON text and must parse once the
/// stream finishes with a `tool_calls` reason; partial buffers are never
/// executed.
#[derive(Debug, Clone, Default)]
pub struct ToolCallFragment {
    pub name: String,
    pub id: String,
    pub arguments_buffer: String,
}

/// One incremental event from a streamed completion. Any combination of the
/// fields may be present on a single event.
#[derive(Debug, Clone, Default)]
pub struct ChatDelta {
    pub content: Option<String>,
    pub tool_call: Option<ToolCallDelta>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone)]
pub struct ToolCallDelta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_item_wire_format() {
        let text = ContentItem::text("hello");
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"type": "text", "text": "hello"})
        );

        let image = ContentItem::image_url("data:image/png;base64,AAAA");
        assert_eq!(
            serde_json::to_value(&image).unwrap(),
            json!({"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}})
        );
    }

    #[test]
    fn test_message_content_untagged() {
        let text = MessageContent::Text("plain".to_string());
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("plain"));

        let items = MessageContent::Items(vec![ContentItem::text("result")]);
        assert_eq!(
            serde_json::to_value(&items).unwrap(),
            json!([{"type": "text", "text": "result"}])
        );
    }

    #[test]
    fn test_tool_result_message() {
        let message = Message::tool_result(
            "call_123".to_string(),
            "get_weather".to_string(),
            vec![ContentItem::text("Paris: sunny")],
        );
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_123"));
        assert_eq!(message.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn test_assistant_tool_call_message() {
        let message = Message::assistant_tool_call(
            "call_1".to_string(),
            "search".to_string(),
            json!({"q": "rust"}),
        );
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search");
        assert!(message.content.is_empty());
    }
}
