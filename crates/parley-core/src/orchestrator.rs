//! Streaming orchestration loop.
//!
//! Consumes the event stream of a completion request, incrementally
//! assembling tool-call arguments, emitting content fragments to the caller
//! as they arrive, executing the resolved tool when the endpoint signals a
//! completed call, and re-entering generation with the tool result in
//! context until the model stops without requesting another tool.
//!
//! Every model stream is a scoped resource: it is registered in an
//! active-set on acquisition and deregistered on every exit path (normal
//! completion, tool-call interruption, cancellation, consumer abandonment,
//! error). Cancellation is an explicit token checked at each suspension
//! point rather than exception-driven teardown.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core_types::{ContentItem, FinishReason, Message, ToolCallFragment};
use crate::errors::ChatError;
use crate::gateway::MCPGateway;
use crate::llm::{StreamingLLM, ToolMetadata};
use crate::session::ConversationSession;
use crate::tools::mcp_client::MCPContent;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Prepended to the context on every completion request; never stored in
    /// the session itself.
    pub system_prompt: Option<String>,
    /// Upper bound on consecutive tool-call turns per user message. `None`
    /// keeps the loop unbounded: generation repeats for as long as the model
    /// keeps requesting tools.
    pub max_tool_turns: Option<u32>,
}

/// Tracks streams currently open against the model endpoint. Registration
/// hands back an RAII guard, so a stream that leaves scope for any reason
/// leaves the set with it.
#[derive(Clone, Default)]
pub struct ActiveStreamSet {
    streams: Arc<Mutex<HashSet<u64>>>,
    next_id: Arc<AtomicU64>,
}

impl ActiveStreamSet {
    fn register(&self) -> StreamGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut streams) = self.streams.lock() {
            streams.insert(id);
        }
        StreamGuard {
            id,
            streams: Arc::clone(&self.streams),
        }
    }

    pub fn len(&self) -> usize {
        self.streams.lock().map(|streams| streams.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct StreamGuard {
    id: u64,
    streams: Arc<Mutex<HashSet<u64>>>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Ok(mut streams) = self.streams.lock() {
            streams.remove(&self.id);
        }
    }
}

enum StreamOutcome {
    /// `stop` finish reason: the collected text is the final answer.
    Stopped,
    /// Stream ran out without a finish reason.
    Ended,
    /// Transport failure; already logged, the turn ends silently.
    Failed,
    Cancelled,
    /// `tool_calls` finish reason with a completed argument buffer.
    ToolCall(ToolCallFragment),
}

pub struct Orchestrator {
    llm: Arc<dyn StreamingLLM>,
    registry: ToolRegistry,
    gateway: MCPGateway,
    config: OrchestratorConfig,
    active_streams: ActiveStreamSet,
    cancellation: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn StreamingLLM>,
        registry: ToolRegistry,
        gateway: MCPGateway,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            gateway,
            config,
            active_streams: ActiveStreamSet::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Token shared with the UI layer; cancelling it stops the active
    /// generation at its next suspension point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn active_stream_count(&self) -> usize {
        self.active_streams.len()
    }

    pub fn gateway(&self) -> &MCPGateway {
        &self.gateway
    }

    /// Built-in and remote tool descriptors, for the completion request.
    pub fn available_tools(&self) -> Vec<ToolMetadata> {
        let mut tools = self.registry.list_tools();
        tools.extend(self.gateway.tool_metadata());
        tools
    }

    /// Streams the response to one user input. Finite and not restartable
    /// mid-flight: fragments are emitted as they arrive, and the session has
    /// been extended with the full exchange once the stream is exhausted.
    pub fn generate_response<'a>(
        &'a self,
        session: &'a mut ConversationSession,
        user_input: String,
        tools: Vec<ToolMetadata>,
    ) -> impl Stream<Item = Result<String, ChatError>> + 'a {
        stream! {
            session.push_user(user_input);
            let mut turns: u32 = 0;

            'generation: loop {
                let mut request_messages = Vec::new();
                if let Some(prompt) = &self.config.system_prompt {
                    if !prompt.is_empty() {
                        request_messages.push(Message::system(prompt.clone()));
                    }
                }
                request_messages.extend_from_slice(session.messages());

                let response_stream = match self
                    .llm
                    .stream_chat(request_messages, Some(tools.clone()))
                    .await
                {
                    Ok(stream) => stream,
                    Err(e) => {
                        log::error!("Failed to open completion stream: {}", e);
                        break 'generation;
                    }
                };

                let mut collected_text: Vec<String> = Vec::new();
                let outcome;
                {
                    // The handle moves into this scope so it is closed, and
                    // its active-set entry released, before any tool runs.
                    let _guard = self.active_streams.register();
                    let mut response_stream = response_stream;

                    let mut fragment = ToolCallFragment::default();
                    let mut collecting_arguments = false;

                    outcome = loop {
                        let part = tokio::select! {
                            biased;
                            _ = self.cancellation.cancelled() => {
                                log::debug!("Generation cancelled, closing stream");
                                break StreamOutcome::Cancelled;
                            }
                            part = response_stream.next() => part,
                        };

                        let part = match part {
                            Some(Ok(part)) => part,
                            Some(Err(e)) => {
                                log::error!("Error while consuming completion stream: {}", e);
                                break StreamOutcome::Failed;
                            }
                            None => break StreamOutcome::Ended,
                        };

                        if let Some(text) = part.content {
                            collected_text.push(text.clone());
                            yield Ok(text);
                        }

                        if let Some(tool_delta) = part.tool_call {
                            if let Some(name) = tool_delta.name {
                                fragment.name = name;
                                fragment.id = tool_delta.id.unwrap_or_default();
                            }
                            if let Some(piece) = tool_delta.arguments {
                                fragment.arguments_buffer.push_str(&piece);
                                collecting_arguments = true;
                            }
                        }

                        match part.finish_reason {
                            Some(FinishReason::ToolCalls) if collecting_arguments => {
                                break StreamOutcome::ToolCall(std::mem::take(&mut fragment));
                            }
                            Some(FinishReason::Stop) => break StreamOutcome::Stopped,
                            _ => {}
                        }
                    };
                }

                match outcome {
                    StreamOutcome::Cancelled | StreamOutcome::Failed => return,
                    StreamOutcome::Stopped => {
                        let final_content = collected_text.join("");
                        if !final_content.trim().is_empty() {
                            session.push_assistant(final_content);
                        }
                        break 'generation;
                    }
                    StreamOutcome::Ended => break 'generation,
                    StreamOutcome::ToolCall(fragment) => {
                        let arguments: Value = match serde_json::from_str(&fragment.arguments_buffer)
                        {
                            Ok(value) => value,
                            Err(e) => {
                                yield Err(ChatError::ParsingError(format!(
                                    "Malformed arguments for tool '{}': {}",
                                    fragment.name, e
                                )));
                                return;
                            }
                        };

                        log::info!("Tool call requested: '{}'", fragment.name);
                        session.push(Message::assistant_tool_call(
                            fragment.id.clone(),
                            fragment.name.clone(),
                            arguments.clone(),
                        ));

                        let connection = self.gateway.resolve(&fragment.name).map(str::to_string);
                        let items = self
                            .call_tool(connection.as_deref(), &fragment.name, arguments)
                            .await;
                        session.push(Message::tool_result(fragment.id, fragment.name, items));

                        turns += 1;
                        if let Some(max) = self.config.max_tool_turns {
                            if turns >= max {
                                log::warn!(
                                    "Reached maximum of {} tool-call turns; ending generation",
                                    max
                                );
                                break 'generation;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Executes a resolved tool call and returns its content items. Failures
    /// never abort the conversation: they come back as a one-item text
    /// result so the model can react to them.
    pub async fn call_tool(
        &self,
        connection: Option<&str>,
        tool_name: &str,
        arguments: Value,
    ) -> Vec<ContentItem> {
        if let Some(tool) = self.registry.get_tool(tool_name) {
            return match tool.execute(arguments).await {
                Ok(text) => vec![ContentItem::text(text)],
                Err(e) => {
                    log::error!("Tool '{}' failed: {}", tool_name, e);
                    vec![ContentItem::text(e.to_string())]
                }
            };
        }

        match self.invoke_remote(connection, tool_name, arguments).await {
            Ok(items) => items,
            Err(e) => {
                log::error!("Remote tool '{}' invocation failed: {}", tool_name, e);
                vec![ContentItem::text(e.to_string())]
            }
        }
    }

    async fn invoke_remote(
        &self,
        connection: Option<&str>,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<ContentItem>, ChatError> {
        let connection = connection.ok_or_else(|| ChatError::ToolError {
            tool_name: tool_name.to_string(),
            message: "No registered tool or remote session exposes this name".to_string(),
        })?;

        let contents = self.gateway.invoke(connection, tool_name, arguments).await?;

        contents
            .into_iter()
            .map(|item| match item {
                MCPContent::Text { text } => Ok(ContentItem::text(text)),
                MCPContent::Image { data, mime_type } => Ok(ContentItem::image_url(format!(
                    "data:{};base64,{}",
                    mime_type, data
                ))),
                MCPContent::Unsupported { kind } => Err(ChatError::UnsupportedContent(kind)),
            })
            .collect()
    }
}
