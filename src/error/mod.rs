//! Error types for Tycho.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TychoError>;

/// Primary error type for all Tycho operations.
#[derive(Error, Debug)]
pub enum TychoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {provider} — {message}")]
    Provider { provider: String, message: String },

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Workflow definition error: {0}")]
    WorkflowDefinition(#[from] serde_yaml::Error),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    ToolExecution,
    Timeout,
    Io,
    Serialization,
    Unknown,
}

impl TychoError {
    /// Shorthand for a provider fault.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a tool fault.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Provider { .. } => ErrorCategory::Provider,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Io(_) => ErrorCategory::Io,
            Self::Serialization(_) | Self::WorkflowDefinition(_) => ErrorCategory::Serialization,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Provider | ErrorCategory::Timeout | ErrorCategory::Io
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_route_recovery() {
        assert_eq!(
            TychoError::provider("mock", "boom").category(),
            ErrorCategory::Provider
        );
        assert_eq!(
            TychoError::tool("read_file", "missing").category(),
            ErrorCategory::ToolExecution
        );
        assert!(TychoError::Timeout(500).is_retryable());
        assert!(!TychoError::Configuration("bad".into()).is_retryable());
    }
}
