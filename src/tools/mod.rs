//! Tool system for function calling.

pub mod registry;
pub mod tool;
pub mod types;

pub use registry::ToolRegistry;
pub use tool::{ConfirmHandler, FnTool, Tool};
pub use types::{ParamKind, ToolCategory, ToolParameter, ToolResult, ToolSchema};
