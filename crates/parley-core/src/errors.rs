//! Error types for failure handling across the chat front-end
//!
//! This module provides a unified error hierarchy that captures all failure
//! modes in streaming generation and tool execution. Errors are categorized by
//! their source (LLM endpoint, tools, MCP sessions, configuration) so callers
//! can decide which failures end a turn and which are fed back into the
//! conversation for the model to react to.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ChatError {
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("MCP client error: {0}")]
    MCPError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unsupported content type: {0}")]
    UnsupportedContent(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Generation cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::LLMError(err.to_string())
    }
}
