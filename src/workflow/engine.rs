//! Load workflow definitions and execute them through the orchestrator.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use super::config::{ExecutionMode, WorkflowConfig};
use super::stop;
use crate::error::Result;
use crate::orchestrator::{
    executor::DEFAULT_TIMEOUT, AgentRole, ExecutionResult, MergeStrategy, Orchestrator,
    WorkflowResult,
};
use crate::provider::ProviderRegistry;

/// Compiles declarative workflow steps into agent roles and runs them.
pub struct WorkflowEngine {
    providers: ProviderRegistry,
    workflows: HashMap<String, WorkflowConfig>,
    continuous_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            providers,
            workflows: HashMap::new(),
            continuous_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the wall-clock bound for continuous runs.
    pub fn with_continuous_timeout(mut self, timeout: Duration) -> Self {
        self.continuous_timeout = timeout;
        self
    }

    /// Register a workflow configuration built in code.
    pub fn register_workflow(&mut self, config: WorkflowConfig) {
        self.workflows.insert(config.name.clone(), config);
    }

    /// Load one workflow definition from a YAML file.
    pub fn load_workflow(&mut self, path: &Path) -> Result<WorkflowConfig> {
        let config: WorkflowConfig = serde_yaml::from_str(&std::fs::read_to_string(path)?)?;
        info!(workflow = %config.name, path = %path.display(), "loaded workflow");
        self.workflows.insert(config.name.clone(), config.clone());
        Ok(config)
    }

    /// Load every `.yaml`/`.yml` workflow in a directory. Files that fail to
    /// parse are skipped. Returns the number loaded.
    pub fn load_workflows_dir(&mut self, directory: &Path) -> Result<usize> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if !matches!(extension, Some("yaml") | Some("yml")) {
                continue;
            }
            match self.load_workflow(&path) {
                Ok(_) => loaded += 1,
                Err(err) => warn!(path = %path.display(), error = %err, "failed to load workflow"),
            }
        }
        Ok(loaded)
    }

    pub fn get_workflow(&self, name: &str) -> Option<&WorkflowConfig> {
        self.workflows.get(name)
    }

    /// Names of all loaded workflows.
    pub fn list_workflows(&self) -> Vec<&str> {
        self.workflows.keys().map(|s| s.as_str()).collect()
    }

    /// Compile workflow steps into agent roles.
    ///
    /// Providers are resolved by exact name and then case-insensitive
    /// substring; steps with no matching provider are skipped. `next_agent`
    /// chains each step to its successor, closing the cycle back to the
    /// first step only in continuous mode.
    pub fn compile(&self, workflow: &WorkflowConfig) -> Vec<AgentRole> {
        let mut roles = Vec::new();

        for (i, step) in workflow.steps.iter().enumerate() {
            let Some(provider) = self.providers.resolve(&step.agent) else {
                warn!(agent = %step.agent, "no provider matches step, skipping");
                continue;
            };

            let next_agent = if i + 1 < workflow.steps.len() {
                Some(workflow.steps[i + 1].agent.clone())
            } else if workflow.mode == ExecutionMode::Continuous {
                Some(workflow.steps[0].agent.clone())
            } else {
                None
            };

            let mut role = AgentRole::new(&step.agent, provider, &step.role)
                .with_prompt_template(&step.prompt_template);
            role.next_agent = next_agent;
            roles.push(role);
        }

        roles
    }

    /// Execute a loaded workflow by name.
    pub async fn execute(&self, workflow_name: &str, task: &str) -> WorkflowResult {
        let Some(workflow) = self.workflows.get(workflow_name) else {
            return WorkflowResult::rejected(format!("Workflow not found: {workflow_name}"));
        };
        self.execute_workflow(workflow, task).await
    }

    /// Execute a workflow configuration.
    pub async fn execute_workflow(&self, workflow: &WorkflowConfig, task: &str) -> WorkflowResult {
        let roles = self.compile(workflow);
        if roles.is_empty() {
            return WorkflowResult::rejected("No valid agents found for workflow");
        }

        let orchestrator = Orchestrator::new(roles);
        let agent_order: Vec<String> = workflow.steps.iter().map(|s| s.agent.clone()).collect();
        let conditions = workflow.stop_conditions.as_slice();
        let check_stop =
            move |result: &ExecutionResult| stop::any_met(conditions, result);

        info!(workflow = %workflow.name, mode = %workflow.mode, "executing workflow");
        match workflow.mode {
            ExecutionMode::Sequential => orchestrator.execute_sequential(task, &agent_order).await,
            ExecutionMode::Parallel => {
                orchestrator
                    .execute_parallel(
                        task,
                        &agent_order,
                        MergeStrategy::from(workflow.merge_strategy.as_str()),
                    )
                    .await
            }
            ExecutionMode::RoundRobin => {
                let stop_check: Option<&(dyn Fn(&ExecutionResult) -> bool + Sync)> =
                    if conditions.is_empty() {
                        None
                    } else {
                        Some(&check_stop)
                    };
                orchestrator
                    .execute_round_robin(task, &agent_order, workflow.max_rounds, stop_check)
                    .await
            }
            ExecutionMode::Continuous => {
                orchestrator
                    .execute_continuous(task, &check_stop, self.continuous_timeout)
                    .await
            }
        }
    }
}
