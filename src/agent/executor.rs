//! The request/tool-execute/request loop for a single agent.

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::config::AgentConfig;
use super::state::ConversationState;
use crate::error::Result;
use crate::provider::ModelProvider;
use crate::tools::{ConfirmHandler, ToolRegistry, ToolResult};
use crate::types::{CompletionOptions, CompletionRequest, Message, Role, ToolCall};
use crate::util::preview;

/// Marker recorded when the task's tool budget is exhausted.
pub const MAX_TOOL_CALLS_MARKER: &str = "[Max tool calls reached]";

/// Maximum characters of tool output surfaced in status previews.
const TOOL_PREVIEW_CHARS: usize = 200;

/// Progress increment surfaced while a task runs in streaming mode.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Incremental assistant text from the provider.
    TextDelta { text: String },
    /// A tool is about to execute.
    ToolStart { name: String },
    /// A tool finished (or was declined / failed locally).
    ToolEnd {
        name: String,
        success: bool,
        preview: String,
    },
    /// The task's tool budget is exhausted; the task stops here.
    ToolCapReached,
    /// The model finished without requesting tools.
    TaskComplete { response: String },
}

/// Drives the turn loop for one agent over a [`ConversationState`].
///
/// Per task: request a completion, execute any requested tool calls strictly
/// in the order returned, and repeat until the model stops requesting tools
/// or a bound is reached. Provider faults propagate and end the task; tool
/// faults are recovered locally and the loop continues.
pub struct TurnExecutor {
    provider: Arc<dyn ModelProvider>,
    config: AgentConfig,
    tools: Arc<ToolRegistry>,
    confirm_handler: Option<Arc<dyn ConfirmHandler>>,
    state: ConversationState,
}

impl TurnExecutor {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        config: AgentConfig,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let state = ConversationState::new(&config.system_prompt);
        Self {
            provider,
            config,
            tools,
            confirm_handler: None,
            state,
        }
    }

    /// Install a confirmation handler for guarded tools.
    pub fn with_confirm_handler(mut self, handler: Arc<dyn ConfirmHandler>) -> Self {
        self.confirm_handler = Some(handler);
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Current conversation history.
    pub fn history(&self) -> &[Message] {
        self.state.messages()
    }

    /// Add an out-of-band context message to the conversation.
    pub fn add_context(&mut self, content: impl Into<String>, role: Role) {
        self.state.add_context(content, role);
    }

    /// Reset conversation state for a new conversation.
    pub fn reset(&mut self) {
        self.state.reset(&self.config.system_prompt);
    }

    /// Process one task without streaming.
    ///
    /// Returns the per-iteration status lines joined with newlines: assistant
    /// text for the final iteration, `"[ok] name | [failed] name"` summaries
    /// for tool iterations.
    pub async fn run_task(&mut self, user_text: &str) -> Result<String> {
        self.state.begin_task(user_text);
        let mut parts: Vec<String> = Vec::new();

        while !self.state.is_complete && self.state.iteration < self.config.max_iterations {
            self.state.iteration += 1;
            debug!(iteration = self.state.iteration, "requesting completion");

            let request = self.build_request();
            let response = self.provider.complete(&request).await?;
            self.state.push(Message::assistant(
                &response.content,
                Some(response.tool_calls.clone()),
            ));

            if response.tool_calls.is_empty() {
                self.state.is_complete = true;
                self.state.last_response = Some(response.content.clone());
                parts.push(response.content);
                break;
            }

            let mut statuses: Vec<String> = Vec::new();
            let mut capped = false;
            for call in &response.tool_calls {
                if self.state.tool_calls_this_turn >= self.config.max_tool_calls_per_turn {
                    warn!(
                        budget = self.config.max_tool_calls_per_turn,
                        "tool budget exhausted, stopping task"
                    );
                    statuses.push(MAX_TOOL_CALLS_MARKER.to_string());
                    capped = true;
                    break;
                }
                self.state.tool_calls_this_turn += 1;

                let result = self.run_single_tool(call).await;
                let marker = if result.success { "[ok]" } else { "[failed]" };
                statuses.push(format!("{marker} {}", call.name));
            }
            parts.push(statuses.join(" | "));

            if capped {
                break;
            }
        }

        Ok(parts.join("\n"))
    }

    /// Process one task, surfacing progress increments as they happen.
    ///
    /// Semantics are identical to [`run_task`](Self::run_task); only the
    /// surfacing differs: provider text is forwarded as [`TurnEvent::TextDelta`]
    /// chunks and tool status markers as their own events.
    pub fn stream_task<'a>(
        &'a mut self,
        user_text: &str,
    ) -> impl Stream<Item = Result<TurnEvent>> + 'a {
        let user_text = user_text.to_string();
        try_stream! {
            self.state.begin_task(user_text);

            'task: while !self.state.is_complete
                && self.state.iteration < self.config.max_iterations
            {
                self.state.iteration += 1;
                debug!(iteration = self.state.iteration, "requesting streaming completion");

                let request = self.build_request();
                let mut chunks = self.provider.stream(&request).await?;

                let mut content = String::new();
                let mut tool_calls: Vec<ToolCall> = Vec::new();
                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk?;
                    if let Some(text) = chunk.content {
                        if !text.is_empty() {
                            content.push_str(&text);
                            yield TurnEvent::TextDelta { text };
                        }
                    }
                    tool_calls.extend(chunk.tool_calls);
                    if chunk.finish_reason.is_some() {
                        break;
                    }
                }

                self.state
                    .push(Message::assistant(&content, Some(tool_calls.clone())));

                if tool_calls.is_empty() {
                    self.state.is_complete = true;
                    self.state.last_response = Some(content.clone());
                    yield TurnEvent::TaskComplete { response: content };
                    break 'task;
                }

                for call in &tool_calls {
                    if self.state.tool_calls_this_turn >= self.config.max_tool_calls_per_turn {
                        warn!(
                            budget = self.config.max_tool_calls_per_turn,
                            "tool budget exhausted, stopping task"
                        );
                        yield TurnEvent::ToolCapReached;
                        break 'task;
                    }
                    self.state.tool_calls_this_turn += 1;

                    yield TurnEvent::ToolStart {
                        name: call.name.clone(),
                    };
                    let result = self.run_single_tool(call).await;
                    let preview_text = if result.success {
                        preview(&result.output, TOOL_PREVIEW_CHARS)
                    } else {
                        result.error.clone().unwrap_or_default()
                    };
                    yield TurnEvent::ToolEnd {
                        name: call.name.clone(),
                        success: result.success,
                        preview: preview_text,
                    };
                }
            }
        }
    }

    fn build_request(&self) -> CompletionRequest {
        let tools = self.tools.schema_export();
        CompletionRequest {
            messages: self.state.messages().to_vec(),
            tools: if tools.is_empty() { None } else { Some(tools) },
            options: CompletionOptions::builder()
                .temperature(self.config.temperature)
                .build(),
        }
    }

    /// Execute one tool call and append the tool message.
    ///
    /// Declines and handler faults come back as failed results; neither
    /// aborts the task.
    async fn run_single_tool(&mut self, call: &ToolCall) -> ToolResult {
        info!(tool = %call.name, id = %call.id, "tool call");
        let confirm = if self.config.confirm_dangerous_tools {
            self.confirm_handler.as_deref()
        } else {
            None
        };
        let result = self.tools.execute(&call.name, &call.arguments, confirm).await;

        let content = if result.success {
            result.output.clone()
        } else {
            format!("Error: {}", result.error.as_deref().unwrap_or("unknown"))
        };
        self.state
            .push(Message::tool_result(&call.name, &call.id, content));
        result
    }
}
