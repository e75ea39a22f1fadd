//! Core library for Parley, a streaming tool-calling chat front-end.
//!
//! Parley relays a conversation between a user and a hosted chat-completion
//! deployment, streaming incremental text fragments to the UI while watching
//! the stream for tool calls. When the model requests one, the orchestrator
//! assembles the call from its deltas, executes it against a built-in tool or
//! a remote MCP session, appends the result to the conversation, and resumes
//! generation.
//!
//! # Architecture Overview
//!
//! - **Conversation session**: append-only, role-tagged message history; the
//!   sequence is the context sent on every request
//! - **Streaming orchestrator**: the delta-consumption loop, tool dispatch,
//!   active-stream bookkeeping, and cancellation
//! - **Tool registry**: built-in tools (weather lookup) with schemas and
//!   name-based execution
//! - **Remote tool gateway**: pass-through to externally managed MCP
//!   sessions, keyed by connection name
//! - **LLM integration**: Azure OpenAI chat-completions client consuming
//!   server-sent events
//! - **Configuration**: environment-backed endpoint settings, fatal when
//!   incomplete

pub mod config;
pub mod core_types;
pub mod errors;
pub mod gateway;
pub mod llm;
pub mod orchestrator;
pub mod session;
pub mod tools;

pub use config::AppConfig;
pub use errors::ChatError;
pub use gateway::MCPGateway;
pub use llm::{AzureOpenAIClient, StreamingLLM, ToolMetadata};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use session::ConversationSession;
pub use tools::{ToolFactory, ToolRegistry};
