//! Language model provider abstractions.
//!
//! Defines the streaming LLM trait the orchestrator consumes, plus the tool
//! descriptor type advertised to the model. The only bundled provider speaks
//! the Azure OpenAI chat-completions protocol; anything that can produce an
//! ordered stream of [`ChatDelta`] events can stand in behind the trait,
//! which is also how tests script the endpoint.

use crate::core_types::{ChatDelta, Message};
use crate::errors::ChatError;
use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

pub mod providers;

pub use providers::AzureOpenAIClient;

/// Static description of a callable tool: name, human-readable description,
/// and a JSON schema for its parameters. Defined once per tool, never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Ordered, finite stream of completion events.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatDelta, ChatError>> + Send>>;

#[async_trait]
pub trait StreamingLLM: Send + Sync {
    /// Opens a streamed completion over the full message history. Parallel
    /// tool calls are disabled by contract: at most one tool call is
    /// delivered per stream.
    async fn stream_chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<ChatStream, ChatError>;
}
