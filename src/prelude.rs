//! Convenience re-exports for common use.

pub use crate::agent::{AgentConfig, ConversationState, TurnEvent, TurnExecutor};
pub use crate::error::{Result, TychoError};
pub use crate::orchestrator::{
    AgentRole, ExecutionResult, MergeStrategy, Orchestrator, WorkflowResult,
};
pub use crate::provider::{ModelProvider, ProviderRegistry};
pub use crate::session::{Session, SessionMetadata, SessionStore};
pub use crate::tools::{ConfirmHandler, FnTool, Tool, ToolRegistry, ToolResult};
pub use crate::types::{
    CompletionOptions, CompletionRequest, CompletionResponse, FinishReason, Message, Role,
    StreamChunk, ToolCall, Usage,
};
pub use crate::workflow::{ExecutionMode, StopCondition, WorkflowConfig, WorkflowEngine, WorkflowStep};
