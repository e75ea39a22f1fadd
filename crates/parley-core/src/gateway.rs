//! Remote tool gateway over externally managed MCP sessions
//!
//! A pass-through keyed by connection name: the orchestration loop asks the
//! gateway which connection (if any) owns a tool name, and invokes tools on
//! the session that claimed them. The gateway caches each session's tool set
//! at registration so resolution is a scan over in-memory descriptors, never
//! a round-trip. Session lifecycle (connect/disconnect) belongs to the
//! embedder, not the gateway.

use serde_json::Value;
use std::sync::Arc;

use crate::errors::ChatError;
use crate::llm::ToolMetadata;
use crate::tools::mcp_client::{MCPClientTrait, MCPContent, MCPToolInfo};

struct GatewaySession {
    name: String,
    client: Arc<dyn MCPClientTrait>,
    tools: Vec<MCPToolInfo>,
}

#[derive(Default)]
pub struct MCPGateway {
    sessions: Vec<GatewaySession>,
}

impl MCPGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under `name`, listing its tools once and caching
    /// the descriptors. Re-registering a name replaces the previous session.
    pub async fn register(
        &mut self,
        name: impl Into<String>,
        client: Arc<dyn MCPClientTrait>,
    ) -> Result<(), ChatError> {
        let name = name.into();
        let tools = client.list_tools().await?;
        log::info!(
            "Registered MCP connection '{}' exposing {} tools",
            name,
            tools.len()
        );

        self.sessions.retain(|session| session.name != name);
        self.sessions.push(GatewaySession {
            name,
            client,
            tools,
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn MCPClientTrait>> {
        let index = self.sessions.iter().position(|s| s.name == name)?;
        Some(self.sessions.remove(index).client)
    }

    pub fn connection_names(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Scans registered tool sets, in registration order, for a connection
    /// exposing `tool_name`.
    pub fn resolve(&self, tool_name: &str) -> Option<&str> {
        self.sessions
            .iter()
            .find(|session| session.tools.iter().any(|tool| tool.name == tool_name))
            .map(|session| session.name.as_str())
    }

    /// Descriptors for every remote tool, for inclusion in the model request.
    pub fn tool_metadata(&self) -> Vec<ToolMetadata> {
        self.sessions
            .iter()
            .flat_map(|session| session.tools.iter())
            .map(|tool| ToolMetadata {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
            })
            .collect()
    }

    pub async fn invoke(
        &self,
        connection: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<MCPContent>, ChatError> {
        let session = self
            .sessions
            .iter()
            .find(|s| s.name == connection)
            .ok_or_else(|| {
                ChatError::MCPError(format!("Unknown MCP connection '{}'", connection))
            })?;

        session.client.call_tool(tool_name, arguments).await
    }
}
