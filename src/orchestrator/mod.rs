//! Multi-agent orchestration: agent roles, execution results, strategies.

pub mod executor;
pub mod prompt;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::provider::ModelProvider;

pub use executor::{MergeStrategy, Orchestrator};
pub use prompt::render_template;

/// A named binding of a provider, a responsibility label, and a prompt
/// template.
#[derive(Clone)]
pub struct AgentRole {
    pub name: String,
    pub provider: Arc<dyn ModelProvider>,
    /// Free-form responsibility label, e.g. "implement" or "review".
    pub role: String,
    pub prompt_template: String,
    /// Successor in the continuous-mode chain.
    pub next_agent: Option<String>,
}

impl AgentRole {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            role: role.into(),
            prompt_template: "{task}".to_string(),
            next_agent: None,
        }
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_next_agent(mut self, next_agent: impl Into<String>) -> Self {
        self.next_agent = Some(next_agent.into());
        self
    }
}

impl std::fmt::Debug for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRole")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("next_agent", &self.next_agent)
            .finish()
    }
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ExecutionResult {
    pub agent_name: String,
    pub role: String,
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Position in the overall run.
    pub iteration: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExecutionResult {
    pub fn success(
        agent_name: impl Into<String>,
        role: impl Into<String>,
        content: impl Into<String>,
        iteration: usize,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            role: role.into(),
            success: true,
            content: content.into(),
            error: None,
            iteration,
            metadata: HashMap::new(),
        }
    }

    pub fn failure(
        agent_name: impl Into<String>,
        role: impl Into<String>,
        error: impl Into<String>,
        iteration: usize,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            role: role.into(),
            success: false,
            content: String::new(),
            error: Some(error.into()),
            iteration,
            metadata: HashMap::new(),
        }
    }
}

/// Aggregate result of a multi-agent run.
#[derive(Debug, Clone, Serialize, Default)]
pub struct WorkflowResult {
    pub success: bool,
    pub results: Vec<ExecutionResult>,
    pub final_output: String,
    pub total_iterations: usize,
}

impl WorkflowResult {
    /// An unsuccessful result carrying only an explanation, produced before
    /// any agent ran.
    pub fn rejected(final_output: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            final_output: final_output.into(),
            total_iterations: 0,
        }
    }
}
