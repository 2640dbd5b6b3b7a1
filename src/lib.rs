//! Tycho — multi-agent orchestration kernel for AI coding assistants.
//!
//! Coordinates calls to LLM backends to accomplish coding tasks: a
//! single-agent turn loop that alternates between completions and tool
//! execution, a multi-agent orchestrator with four execution strategies and
//! declarative stop conditions, and a session store with token-budget-aware
//! history compaction.
//!
//! Concrete provider backends and tool implementations live outside this
//! crate; both enter through the [`provider::ModelProvider`] and
//! [`tools::Tool`] traits.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tycho::prelude::*;
//!
//! # async fn example(provider: Arc<dyn ModelProvider>) -> tycho::error::Result<()> {
//! let tools = Arc::new(ToolRegistry::new());
//! let mut executor = TurnExecutor::new(provider, AgentConfig::default(), tools);
//! let summary = executor.run_task("add a --verbose flag to the CLI").await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;
pub mod workflow;
