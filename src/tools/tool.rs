//! Tool trait, closure-based tool wrapper, and the confirmation seam.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{ToolCategory, ToolParameter, ToolSchema};
use crate::error::Result;

/// Core tool trait — implement to expose an operation to the agent.
///
/// Implementations return the textual output on success and propagate faults
/// as errors; the registry converts both into [`super::ToolResult`] values.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    fn category(&self) -> ToolCategory {
        ToolCategory::System
    }

    /// Parameter descriptors used for schema export.
    fn parameters(&self) -> &[ToolParameter];

    /// Whether execution must be confirmed before running.
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Execute with the model-supplied arguments.
    async fn execute(&self, arguments: &serde_json::Value) -> Result<String>;

    /// Function-calling schema for this tool.
    fn schema(&self) -> ToolSchema {
        ToolSchema::from_parameters(self.name(), self.description(), self.parameters())
    }
}

/// Collects a yes/no decision before a guarded tool runs.
#[async_trait]
pub trait ConfirmHandler: Send + Sync {
    async fn confirm(&self, tool_name: &str, arguments: &serde_json::Value) -> bool;
}

type ToolHandler = dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = Result<String>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    name: String,
    description: String,
    category: ToolCategory,
    parameters: Vec<ToolParameter>,
    requires_confirmation: bool,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ToolParameter>,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            category: ToolCategory::System,
            parameters,
            requires_confirmation: false,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Mark this tool as requiring confirmation before execution.
    pub fn with_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> ToolCategory {
        self.category
    }

    fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<String> {
        (self.handler)(arguments.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("requires_confirmation", &self.requires_confirmation)
            .finish()
    }
}
