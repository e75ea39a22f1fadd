//! Tool system for extending the chat front-end with external functionality
//!
//! This module provides the foundation for tool integration: a `Tool` trait
//! for built-in callables, and a registry mapping tool names to
//! implementations. The registry supplies tool schemas to the model and
//! executes resolved tool calls by name; remote MCP tools live behind the
//! gateway instead and are only described here via their schemas.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ChatError;
use crate::llm::ToolMetadata;

// Core Tool trait that all built-in tools implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, arguments: Value) -> Result<String, ChatError>;
}

// Tool registry for managing multiple tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.values().map(|tool| tool.metadata()).collect()
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Tool factory for creating common tools
pub struct ToolFactory;

impl ToolFactory {
    pub fn create_weather() -> Arc<dyn Tool> {
        Arc::new(weather::WeatherTool::new())
    }

    pub fn create_default_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Self::create_weather());
        registry
    }
}

// MCP (Model Context Protocol) client trait and implementations
pub mod mcp_client;
pub mod rmcp_client;

// Individual tool implementations
pub mod weather;

// Re-export commonly used items
pub use mcp_client::{MCPClientTrait, MCPContent, MCPToolInfo, MockMCPClient};
pub use rmcp_client::RMCPClient;
pub use weather::WeatherTool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_registry_creation() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.tool_count(), 0);
    }

    #[test]
    fn test_tool_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        let weather = ToolFactory::create_weather();

        registry.register_tool(weather.clone());
        assert_eq!(registry.tool_count(), 1);

        let retrieved = registry.get_tool("get_weather");
        assert!(retrieved.is_some());

        let nonexistent = registry.get_tool("nonexistent");
        assert!(nonexistent.is_none());
    }

    #[test]
    fn test_tool_registry_list_tools() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(ToolFactory::create_weather());

        let tools = registry.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_weather");
    }

    #[test]
    fn test_tool_registry_remove_and_clear() {
        let mut registry = ToolFactory::create_default_registry();
        assert_eq!(registry.tool_count(), 1);

        let removed = registry.remove_tool("get_weather");
        assert!(removed.is_some());
        assert_eq!(registry.tool_count(), 0);

        registry.register_tool(ToolFactory::create_weather());
        registry.clear();
        assert_eq!(registry.tool_count(), 0);
    }

    #[test]
    fn test_tool_factory_default_registry() {
        let registry = ToolFactory::create_default_registry();
        assert!(registry.get_tool("get_weather").is_some());
    }
}
