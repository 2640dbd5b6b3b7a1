//! Shared test support: scripted providers and confirmation handlers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use tycho::error::{Result, TychoError};
use tycho::provider::ModelProvider;
use tycho::tools::ConfirmHandler;
use tycho::types::{
    CompletionRequest, CompletionResponse, FinishReason, StreamChunk, ToolCall,
};

/// What a [`MockProvider`] does once its scripted queue is exhausted.
enum Fallback {
    Text(String),
    Error(String),
    Exhausted,
}

/// Scripted in-process provider double.
///
/// Pops one scripted response per request and records the last message of
/// every request it sees (the rendered prompt, for orchestrator tests).
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<std::result::Result<CompletionResponse, String>>>,
    fallback: Fallback,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: Fallback::Exhausted,
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A provider that answers every request with the same text.
    pub fn always(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut provider = Self::new(name);
        provider.fallback = Fallback::Text(text.into());
        provider
    }

    /// A provider whose every request fails.
    pub fn failing(name: impl Into<String>, error: impl Into<String>) -> Self {
        let mut provider = Self::new(name);
        provider.fallback = Fallback::Error(error.into());
        provider
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(CompletionResponse::text(text)));
        self
    }

    pub fn with_tool_calls(self, content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(CompletionResponse::with_tool_calls(content, calls)));
        self
    }

    pub fn with_error(self, error: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(error.into()));
        self
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<dyn ModelProvider> {
        Arc::new(self)
    }

    /// The last message of every request seen so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of completion requests served.
    pub fn request_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn next_response(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        if let Some(last) = request.messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TychoError::provider(&self.name, message)),
            None => match &self.fallback {
                Fallback::Text(text) => Ok(CompletionResponse::text(text.clone())),
                Fallback::Error(message) => {
                    Err(TychoError::provider(&self.name, message.clone()))
                }
                Fallback::Exhausted => {
                    Err(TychoError::provider(&self.name, "script exhausted"))
                }
            },
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_response(request)
    }

    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.next_response(request)?;

        let mut chunks: Vec<Result<StreamChunk>> = Vec::new();
        if !response.content.is_empty() {
            // Split the content so callers see more than one delta.
            let midpoint = response.content.len() / 2;
            let split = (0..=midpoint)
                .rev()
                .find(|i| response.content.is_char_boundary(*i))
                .unwrap_or(0);
            let (head, tail) = response.content.split_at(split);
            for piece in [head, tail] {
                if !piece.is_empty() {
                    chunks.push(Ok(StreamChunk {
                        content: Some(piece.to_string()),
                        ..StreamChunk::default()
                    }));
                }
            }
        }
        if !response.tool_calls.is_empty() {
            chunks.push(Ok(StreamChunk {
                tool_calls: response.tool_calls.clone(),
                ..StreamChunk::default()
            }));
        }
        chunks.push(Ok(StreamChunk {
            finish_reason: Some(if response.tool_calls.is_empty() {
                FinishReason::Stop
            } else {
                FinishReason::ToolCalls
            }),
            ..StreamChunk::default()
        }));

        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Confirmation handler that approves everything.
pub struct ApproveAll;

#[async_trait]
impl ConfirmHandler for ApproveAll {
    async fn confirm(&self, _tool_name: &str, _arguments: &serde_json::Value) -> bool {
        true
    }
}

/// Confirmation handler that declines everything.
pub struct DeclineAll;

#[async_trait]
impl ConfirmHandler for DeclineAll {
    async fn confirm(&self, _tool_name: &str, _arguments: &serde_json::Value) -> bool {
        false
    }
}

/// Shorthand for building a tool call.
pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, arguments)
}
