//! Declarative workflows: configuration, stop conditions, engine.

pub mod config;
pub mod engine;
pub mod stop;

pub use config::{ExecutionMode, WorkflowConfig, WorkflowStep};
pub use engine::WorkflowEngine;
pub use stop::StopCondition;
