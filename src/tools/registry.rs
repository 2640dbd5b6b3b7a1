//! Central registry for all available tools.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::tool::{ConfirmHandler, Tool};
use super::types::{ToolCategory, ToolResult, ToolSchema};

/// Registry mapping tool names to implementations.
///
/// Built once at startup from an explicit list of tool definitions and passed
/// by reference into the turn executor; there is no process-wide table.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    by_category: HashMap<ToolCategory, Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tool definitions.
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool. A later registration under the same name replaces the
    /// earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.by_category
            .entry(tool.category())
            .or_default()
            .push(tool.name().to_string());
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// All tools in a category.
    pub fn by_category(&self, category: ToolCategory) -> Vec<&Arc<dyn Tool>> {
        self.by_category
            .get(&category)
            .map(|names| names.iter().filter_map(|n| self.tools.get(n)).collect())
            .unwrap_or_default()
    }

    /// All registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Export every tool's schema in a function-calling-compatible shape.
    pub fn schema_export(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    /// Execute a tool by name.
    ///
    /// Faults never escape this boundary: unknown tools, declined
    /// confirmations, and handler errors all come back as failed
    /// [`ToolResult`]s.
    pub async fn execute(
        &self,
        name: &str,
        arguments: &serde_json::Value,
        confirm: Option<&dyn ConfirmHandler>,
    ) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "unknown tool requested");
            return ToolResult::failure(format!("Unknown tool: {name}"));
        };

        if tool.requires_confirmation() {
            if let Some(handler) = confirm {
                if !handler.confirm(name, arguments).await {
                    info!(tool = name, "tool execution declined");
                    return ToolResult::failure("Tool execution cancelled by user");
                }
            }
        }

        info!(tool = name, "executing tool");
        match tool.execute(arguments).await {
            Ok(output) => ToolResult::ok(output),
            Err(err) => {
                warn!(tool = name, error = %err, "tool execution failed");
                ToolResult::failure(format!("Tool execution failed: {err}"))
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
