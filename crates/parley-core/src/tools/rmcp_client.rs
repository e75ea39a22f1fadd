//! Rust-native MCP session client over a child-process transport
//!
//! Connects to an MCP server by spawning its command and speaking the
//! protocol over stdio. Session lifecycle is owned by the embedder: the
//! client is created per user session and disconnected (or dropped) when the
//! session ends.

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, RawContent, Tool},
    service::{DynService, RunningService, ServiceExt},
    transport::TokioChildProcess,
    RoleClient,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::RwLock;

use super::mcp_client::{MCPClientTrait, MCPContent, MCPToolInfo};
use crate::errors::ChatError;

pub struct RMCPClient {
    service: Option<RunningService<RoleClient, Box<dyn DynService<RoleClient>>>>,
    connected: Arc<RwLock<bool>>,
    server_info: Arc<RwLock<Option<String>>>,
}

impl RMCPClient {
    pub async fn new(command: &str, args: &[String]) -> Result<Self, ChatError> {
        log::info!("Starting MCP server with command: {} {:?}", command, args);

        let mut cmd = Command::new(command);
        cmd.args(args);

        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| ChatError::MCPError(format!("Failed to create transport: {}", e)))?;

        let service_handler: Box<dyn DynService<RoleClient>> = Box::new(());
        let service = service_handler.serve(transport).await.map_err(|e| {
            log::error!("MCP service initialization failed: {}", e);
            ChatError::MCPError(format!("Failed to create service: {}", e))
        })?;

        let server_info_str = Some(format!("{:?}", service.peer_info()));
        log::info!("Connected to MCP server: {:?}", server_info_str);

        Ok(Self {
            service: Some(service),
            connected: Arc::new(RwLock::new(true)),
            server_info: Arc::new(RwLock::new(server_info_str)),
        })
    }

    pub async fn get_server_info(&self) -> Option<String> {
        self.server_info.read().await.clone()
    }

    pub async fn disconnect(&mut self) -> Result<(), ChatError> {
        if let Some(service) = self.service.take() {
            service
                .cancel()
                .await
                .map_err(|e| ChatError::MCPError(format!("Failed to cancel service: {}", e)))?;
        }
        *self.connected.write().await = false;
        log::info!("Disconnected from MCP server");
        Ok(())
    }
}

fn convert_tool(tool: &Tool) -> MCPToolInfo {
    MCPToolInfo {
        name: tool.name.to_string(),
        description: tool
            .description
            .as_ref()
            .map(|d| d.as_ref())
            .unwrap_or("")
            .to_string(),
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

fn convert_content(content: &rmcp::model::Content) -> MCPContent {
    match &content.raw {
        RawContent::Text(text_content) => MCPContent::Text {
            text: text_content.text.clone(),
        },
        RawContent::Image(image_content) => MCPContent::Image {
            data: image_content.data.clone(),
            mime_type: image_content.mime_type.clone(),
        },
        RawContent::Resource(_) => MCPContent::Unsupported {
            kind: "resource".to_string(),
        },
        RawContent::Audio(_) => MCPContent::Unsupported {
            kind: "audio".to_string(),
        },
    }
}

#[async_trait]
impl MCPClientTrait for RMCPClient {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, ChatError> {
        if !*self.connected.read().await {
            return Err(ChatError::MCPError("Not connected".to_string()));
        }

        let service = self
            .service
            .as_ref()
            .ok_or_else(|| ChatError::MCPError("Service not available".to_string()))?;

        // Some MCP servers are slow to come up; bound the wait.
        let tools_response = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            service.list_tools(Default::default()),
        )
        .await
        .map_err(|_| {
            log::error!("MCP list_tools operation timed out after 30 seconds");
            ChatError::MCPError("Timeout waiting for list_tools response".to_string())
        })?
        .map_err(|e| {
            log::error!("MCP list_tools operation failed: {}", e);
            ChatError::MCPError(format!("Failed to list tools: {}", e))
        })?;

        let tools = tools_response.tools.iter().map(convert_tool).collect();

        log::debug!(
            "Listed {} tools from MCP server",
            tools_response.tools.len()
        );
        Ok(tools)
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<MCPContent>, ChatError> {
        if !*self.connected.read().await {
            return Err(ChatError::MCPError("Not connected".to_string()));
        }

        let service = self
            .service
            .as_ref()
            .ok_or_else(|| ChatError::MCPError("Service not available".to_string()))?;

        let arguments = if arguments.is_null() {
            None
        } else {
            arguments.as_object().cloned()
        };

        let request = CallToolRequestParam {
            name: tool_name.to_string().into(),
            arguments,
        };

        let result = service.call_tool(request).await.map_err(|e| {
            ChatError::MCPError(format!("Failed to call tool '{}': {}", tool_name, e))
        })?;

        log::debug!("Tool '{}' executed successfully", tool_name);
        Ok(result.content.iter().map(convert_content).collect())
    }

    async fn is_connected(&self) -> bool {
        *self.connected.read().await && self.service.is_some()
    }
}

impl Drop for RMCPClient {
    fn drop(&mut self) {
        if let Some(service) = self.service.take() {
            // Spawn a task to cancel the service since we can't await in Drop
            tokio::spawn(async move {
                if let Err(e) = service.cancel().await {
                    log::warn!("Failed to cancel service during drop: {}", e);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::borrow::Cow;
    use std::sync::Arc;

    #[test]
    fn test_tool_conversion() {
        let rmcp_tool = Tool {
            name: Cow::from("search"),
            description: Some(Cow::from("Search the document store")),
            input_schema: Arc::new(
                json!({
                    "type": "object",
                    "properties": {
                        "q": {
                            "type": "string",
                            "description": "Search query"
                        }
                    },
                    "required": ["q"]
                })
                .as_object()
                .unwrap()
                .clone(),
            ),
            annotations: None,
        };

        let mcp_tool_info = convert_tool(&rmcp_tool);

        assert_eq!(mcp_tool_info.name, "search");
        assert_eq!(mcp_tool_info.description, "Search the document store");
        assert_eq!(mcp_tool_info.input_schema["type"], "object");
        assert!(mcp_tool_info.input_schema["properties"]["q"].is_object());
    }

    #[test]
    fn test_text_content_conversion() {
        let content = rmcp::model::Content {
            raw: RawContent::Text(rmcp::model::RawTextContent {
                text: "hello".to_string(),
            }),
            annotations: None,
        };

        assert_eq!(
            convert_content(&content),
            MCPContent::Text {
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_image_content_conversion() {
        let content = rmcp::model::Content {
            raw: RawContent::Image(rmcp::model::RawImageContent {
                data: "AAAA".to_string(),
                mime_type: "image/png".to_string(),
            }),
            annotations: None,
        };

        assert_eq!(
            convert_content(&content),
            MCPContent::Image {
                data: "AAAA".to_string(),
                mime_type: "image/png".to_string()
            }
        );
    }
}
