//! Agent configuration.

/// Default system prompt for the coding agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert AI coding assistant. You help users with software development tasks.

You have access to tools for reading and writing files, editing code, running \
shell commands, and searching the codebase.

When helping users:
1. Understand the task clearly before acting
2. Use tools to inspect the codebase when needed
3. Make precise, targeted changes
4. Explain what you're doing and why
5. Verify your changes when possible

Be concise and helpful. Focus on solving the user's problem efficiently.";

/// Configuration for a [`super::TurnExecutor`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System prompt installed as the first conversation message.
    pub system_prompt: String,
    /// Maximum provider round-trips per task.
    pub max_iterations: usize,
    /// Maximum tool invocations per task. The budget spans every round-trip
    /// of the task, not a single provider response.
    pub max_tool_calls_per_turn: usize,
    pub temperature: f64,
    /// Whether guarded tools go through the confirmation handler.
    pub confirm_dangerous_tools: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: 20,
            max_tool_calls_per_turn: 10,
            temperature: 0.7,
            confirm_dangerous_tools: true,
        }
    }
}
