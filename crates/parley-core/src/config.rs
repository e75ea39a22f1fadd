//! Environment-backed configuration.
//!
//! The model endpoint is configured entirely from the environment; all four
//! Azure values are required and their absence is a fatal startup error.
//! Everything else has a sensible default and can be overridden by the
//! embedder.

use crate::errors::ChatError;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Azure deployment name of the chat model.
    pub deployment: String,
    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub system_prompt: String,
    pub temperature: f32,
    /// Upper bound on consecutive tool-call turns per user message.
    /// `None` preserves the unbounded behavior.
    pub max_tool_turns: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ChatError> {
        Ok(Self {
            deployment: require_env("AZURE_OPENAI_MODEL")?,
            endpoint: require_env("AZURE_OPENAI_ENDPOINT")?,
            api_key: require_env("AZURE_OPENAI_API_KEY")?,
            api_version: require_env("AZURE_OPENAI_API_VERSION")?,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.0,
            max_tool_turns: None,
        })
    }
}

fn require_env(name: &str) -> Result<String, ChatError> {
    std::env::var(name).map_err(|_| {
        ChatError::ConfigError(format!("Missing required environment variable: {}", name))
    })
}
