//! Declarative workflow configuration.
//!
//! The structures here mirror the external workflow definition files; YAML
//! parsing itself is plain serde.

use serde::Deserialize;
use strum::{Display, EnumString};

use super::stop::StopCondition;

const DEFAULT_MAX_ROUNDS: usize = 3;
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 300;

fn default_prompt_template() -> String {
    "{task}".to_string()
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_step_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_SECS
}

fn default_merge_strategy() -> String {
    "combine".to_string()
}

/// Workflow execution mode.
///
/// Unknown mode strings fall back to sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
    RoundRobin,
    Continuous,
}

impl<'de> serde::Deserialize<'de> for ExecutionMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mode = String::deserialize(deserializer)?;
        Ok(mode.to_lowercase().parse().unwrap_or_default())
    }
}

/// Single step in a workflow.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WorkflowStep {
    /// Agent name, matched against the provider map.
    pub agent: String,
    /// Responsibility label, e.g. "implement" or "review".
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    /// Per-step timeout in seconds.
    #[serde(default = "default_step_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub optional: bool,
}

/// Complete workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default, alias = "agents")]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub stop_conditions: Vec<StopCondition>,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_merge_strategy")]
    pub merge_strategy: String,
}
