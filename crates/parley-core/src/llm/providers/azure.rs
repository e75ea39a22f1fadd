use crate::config::AppConfig;
use crate::core_types::{ChatDelta, FinishReason, Message, Role, ToolCallDelta};
use crate::errors::ChatError;
use crate::llm::{ChatStream, StreamingLLM, ToolMetadata};
use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

/// Client for an Azure OpenAI chat-completions deployment. The deployment
/// name is part of the URL; the API key travels in the `api-key` header.
#[derive(Debug, Clone)]
pub struct AzureOpenAIClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    temperature: f32,
}

impl AzureOpenAIClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        api_version: String,
        deployment: String,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version,
            deployment,
            temperature: 0.0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.api_version.clone(),
            config.deployment.clone(),
        )
        .with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    fn build_request_body(&self, messages: &[Message], tools: Option<&[ToolMetadata]>) -> Value {
        let mut body = json!({
            "messages": self.format_messages(messages),
            "stream": true,
            "parallel_tool_calls": false,
            "temperature": self.temperature,
        });

        if let Some(tools) = tools {
            if !tools.is_empty() {
                let formatted_tools: Vec<Value> = tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.input_schema
                            }
                        })
                    })
                    .collect();
                body["tools"] = formatted_tools.into();
                body["tool_choice"] = "auto".into();
            }
        }

        body
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let mut message = json!({
                    "role": self.format_role(&msg.role),
                    "content": serde_json::to_value(&msg.content).unwrap_or(Value::Null)
                });

                if let Role::Tool = msg.role {
                    if let Some(tool_call_id) = &msg.tool_call_id {
                        message["tool_call_id"] = json!(tool_call_id);
                    }
                    if let Some(name) = &msg.name {
                        message["name"] = json!(name);
                    }
                }

                if let Role::Assistant = msg.role {
                    if let Some(tool_calls) = &msg.tool_calls {
                        if !tool_calls.is_empty() {
                            let formatted_tool_calls: Vec<Value> = tool_calls
                                .iter()
                                .map(|tc| {
                                    json!({
                                        "id": tc.id.clone().unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().to_string().replace("-", ""))),
                                        "type": "function",
                                        "function": {
                                            "name": tc.name,
                                            "arguments": tc.arguments.to_string()
                                        }
                                    })
                                })
                                .collect();
                            message["tool_calls"] = json!(formatted_tool_calls);
                            // An assistant turn that only carries a tool call
                            // goes out with a null content field.
                            if msg.content.is_empty() {
                                message["content"] = Value::Null;
                            }
                        }
                    }
                }

                message
            })
            .collect()
    }

    fn format_role(&self, role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

#[async_trait]
impl StreamingLLM for AzureOpenAIClient {
    async fn stream_chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<ChatStream, ChatError> {
        let url = self.completions_url();
        let body = self.build_request_body(&messages, tools.as_deref());

        log::debug!("Azure OpenAI streaming request to {}", url);
        log::debug!("Request messages: {} in context", messages.len());

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::LLMError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error while reading error response body".to_string());
            return Err(ChatError::LLMError(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let byte_stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()));
        let mut lines = StreamReader::new(byte_stream).lines();

        let stream = try_stream! {
            loop {
                let line = lines
                    .next_line()
                    .await
                    .map_err(|e| ChatError::LLMError(format!("Stream read failed: {}", e)))?;
                let Some(line) = line else { break };
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == "[DONE]" {
                    break;
                }
                if let Some(delta) = parse_chunk(data)? {
                    yield delta;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Deserialize)]
struct ChunkToolCall {
    id: Option<String>,
    function: Option<ChunkFunction>,
}

#[derive(Deserialize)]
struct ChunkFunction {
    name: Option<String>,
    arguments: Option<String>,
}

/// Maps one SSE `data:` payload to a [`ChatDelta`]. Events without a choice
/// payload are skipped, per the endpoint contract.
fn parse_chunk(data: &str) -> Result<Option<ChatDelta>, ChatError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| ChatError::ParsingError(format!("Invalid stream chunk: {}", e)))?;

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    let tool_call = choice.delta.tool_calls.and_then(|calls| {
        calls.into_iter().next().map(|call| {
            let (name, arguments) = match call.function {
                Some(function) => (function.name, function.arguments),
                None => (None, None),
            };
            ToolCallDelta {
                id: call.id,
                name,
                arguments,
            }
        })
    });

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("stop") => Some(FinishReason::Stop),
        Some("tool_calls") => Some(FinishReason::ToolCalls),
        _ => None,
    };

    Ok(Some(ChatDelta {
        content: choice.delta.content,
        tool_call,
        finish_reason,
    }))
}
