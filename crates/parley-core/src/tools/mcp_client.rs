//! Model Context Protocol (MCP) client abstraction
//!
//! Defines the client-side surface the gateway needs from an MCP session:
//! tool discovery and tool invocation. Results are modeled as a closed set of
//! content kinds; anything a server returns beyond text and images is
//! surfaced as `Unsupported` and rejected deterministically during
//! translation rather than passed through opaquely.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::ChatError;

#[derive(Debug, Clone)]
pub struct MCPToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Raw content item returned by an MCP tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MCPContent {
    Text { text: String },
    Image { data: String, mime_type: String },
    Unsupported { kind: String },
}

#[async_trait]
pub trait MCPClientTrait: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, ChatError>;
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<MCPContent>, ChatError>;
    async fn is_connected(&self) -> bool;
}

// Mock implementation for testing
pub struct MockMCPClient {
    connected: bool,
}

impl MockMCPClient {
    pub fn new() -> Self {
        Self { connected: true }
    }

    pub fn with_connection_status(connected: bool) -> Self {
        Self { connected }
    }
}

impl Default for MockMCPClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MCPClientTrait for MockMCPClient {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, ChatError> {
        if !self.connected {
            return Err(ChatError::MCPError("Not connected".to_string()));
        }

        Ok(vec![
            MCPToolInfo {
                name: "search".to_string(),
                description: "Search the session's document store".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "q": {
                            "type": "string",
                            "description": "Search query"
                        }
                    },
                    "required": ["q"]
                }),
            },
            MCPToolInfo {
                name: "screenshot".to_string(),
                description: "Capture a screenshot of the current page".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ])
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<MCPContent>, ChatError> {
        if !self.connected {
            return Err(ChatError::MCPError("Not connected".to_string()));
        }

        Ok(vec![MCPContent::Text {
            text: format!("Mock result from {} with arguments: {}", tool_name, arguments),
        }])
    }

    async fn is_connected(&self) -> bool {
        self.connected
    }
}
