//! The four multi-agent execution strategies.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::prompt::render_template;
use super::{AgentRole, ExecutionResult, WorkflowResult};
use crate::types::CompletionRequest;
use crate::util::truncate_chars;

/// Continuous-mode chain length cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default wall-clock bound for a continuous run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Queue poll interval for the continuous consumer.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Number of prior interactions surfaced in round-robin history digests.
const HISTORY_WINDOW: usize = 3;

/// Characters of each prior output surfaced in a history digest.
const HISTORY_PREVIEW_CHARS: usize = 200;

/// How successful parallel outputs are merged into one final output.
///
/// Anything other than `combine` or `best` falls back to taking the first
/// successful output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    #[default]
    Combine,
    Best,
    First,
}

impl From<&str> for MergeStrategy {
    fn from(value: &str) -> Self {
        match value {
            "combine" => Self::Combine,
            "best" => Self::Best,
            _ => Self::First,
        }
    }
}

/// One unit of continuous-mode work.
#[derive(Debug)]
struct WorkItem {
    task: String,
    target_agent: String,
    iteration: usize,
}

/// Executes a set of agent roles under one of four strategies.
///
/// Roles keep their configuration order, which decides sequential/round-robin
/// iteration and the continuous-mode seed agent.
pub struct Orchestrator {
    agents: HashMap<String, AgentRole>,
    order: Vec<String>,
    max_iterations: usize,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(agents: Vec<AgentRole>) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for agent in agents {
            if map.insert(agent.name.clone(), agent.clone()).is_none() {
                order.push(agent.name);
            }
        }
        Self {
            agents: map,
            order,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the continuous-mode chain cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the continuous-mode queue poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Configured agent names, in configuration order.
    pub fn agent_order(&self) -> &[String] {
        &self.order
    }

    /// Run agents one after another, chaining each output into the next
    /// prompt. The first failure (or unknown agent name) stops the run.
    pub async fn execute_sequential(&self, task: &str, agent_order: &[String]) -> WorkflowResult {
        let mut results: Vec<ExecutionResult> = Vec::new();
        let mut current_input = task.to_string();
        let mut previous_output = String::new();

        for (i, agent_name) in agent_order.iter().enumerate() {
            let Some(agent) = self.agents.get(agent_name) else {
                warn!(agent = %agent_name, "agent not found, stopping sequential run");
                results.push(ExecutionResult::failure(
                    agent_name,
                    "unknown",
                    format!("Agent not found: {agent_name}"),
                    i,
                ));
                break;
            };

            let prompt = render_template(
                &agent.prompt_template,
                &[
                    ("task", current_input.as_str()),
                    ("previous_output", previous_output.as_str()),
                ],
            );
            let result = self.invoke(agent, prompt, i).await;
            let succeeded = result.success;
            if succeeded {
                current_input = result.content.clone();
                previous_output = result.content.clone();
            }
            results.push(result);
            if !succeeded {
                break;
            }
        }

        let final_output = results
            .last()
            .filter(|r| r.success)
            .map(|r| r.content.clone())
            .unwrap_or_default();
        WorkflowResult {
            success: results.iter().all(|r| r.success),
            total_iterations: results.len(),
            final_output,
            results,
        }
    }

    /// Run every named agent concurrently on the same task and merge the
    /// successful outputs.
    ///
    /// All invocations are awaited as a whole; one agent's failure neither
    /// cancels nor hides its siblings, and the result list preserves the
    /// requested order.
    pub async fn execute_parallel(
        &self,
        task: &str,
        agent_names: &[String],
        merge_strategy: MergeStrategy,
    ) -> WorkflowResult {
        let invocations = agent_names.iter().map(|name| async move {
            let Some(agent) = self.agents.get(name) else {
                return ExecutionResult::failure(
                    name,
                    "unknown",
                    format!("Agent not found: {name}"),
                    0,
                );
            };
            let prompt = render_template(&agent.prompt_template, &[("task", task)]);
            self.invoke(agent, prompt, 0).await
        });
        let results = join_all(invocations).await;

        let successful: Vec<&ExecutionResult> = results.iter().filter(|r| r.success).collect();
        let final_output = match merge_strategy {
            MergeStrategy::Combine => successful
                .iter()
                .map(|r| format!("**{} ({}):**\n{}", r.agent_name, r.role, r.content))
                .collect::<Vec<_>>()
                .join("\n\n---\n\n"),
            MergeStrategy::Best => successful
                .iter()
                .max_by_key(|r| r.content.len())
                .map(|r| r.content.clone())
                .unwrap_or_default(),
            MergeStrategy::First => successful
                .first()
                .map(|r| r.content.clone())
                .unwrap_or_default(),
        };

        WorkflowResult {
            success: !successful.is_empty(),
            final_output,
            total_iterations: 1,
            results,
        }
    }

    /// Run agents in rounds over `agent_order`, refining a running state,
    /// until a stop condition fires or `max_rounds` is exhausted.
    ///
    /// Unknown agent names are skipped. Each prompt carries the original
    /// task, the running state, and a short digest of the last few outputs.
    pub async fn execute_round_robin(
        &self,
        task: &str,
        agent_order: &[String],
        max_rounds: usize,
        stop: Option<&(dyn Fn(&ExecutionResult) -> bool + Sync)>,
    ) -> WorkflowResult {
        let mut results: Vec<ExecutionResult> = Vec::new();
        let mut current_input = task.to_string();
        let mut history: Vec<(String, String)> = Vec::new();

        for round_num in 0..max_rounds {
            for agent_name in agent_order {
                let Some(agent) = self.agents.get(agent_name) else {
                    warn!(agent = %agent_name, "agent not found, skipping");
                    continue;
                };

                let history_text = history
                    .iter()
                    .rev()
                    .take(HISTORY_WINDOW)
                    .rev()
                    .map(|(agent, output)| {
                        format!(
                            "[{agent}]: {}...",
                            truncate_chars(output, HISTORY_PREVIEW_CHARS)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let round_label = (round_num + 1).to_string();
                let prompt = render_template(
                    &agent.prompt_template,
                    &[
                        ("task", task),
                        ("current_state", current_input.as_str()),
                        ("history", history_text.as_str()),
                        ("round", round_label.as_str()),
                    ],
                );

                let result = self.invoke(agent, prompt, results.len()).await;
                if result.success {
                    current_input = result.content.clone();
                    history.push((agent.name.clone(), result.content.clone()));
                    let stop_hit = stop.map(|check| check(&result)).unwrap_or(false);
                    results.push(result);
                    if stop_hit {
                        info!(round = round_num + 1, "stop condition met");
                        return WorkflowResult {
                            success: true,
                            final_output: current_input,
                            total_iterations: results.len(),
                            results,
                        };
                    }
                } else {
                    results.push(result);
                }
            }
        }

        WorkflowResult {
            success: results.iter().any(|r| r.success),
            total_iterations: results.len(),
            final_output: current_input,
            results,
        }
    }

    /// Run agents as a continuous pipeline over a work queue.
    ///
    /// The queue is seeded with the first "implement"-role agent (or the
    /// first configured agent) and each success enqueues its `next_agent`
    /// while under the chain cap. A single consumer drains the queue; because
    /// only the consumer enqueues, an expired poll means no further work can
    /// ever arrive and the run is complete. `timeout` bounds the whole run,
    /// discarding any item still in flight.
    pub async fn execute_continuous(
        &self,
        task: &str,
        stop: &(dyn Fn(&ExecutionResult) -> bool + Sync),
        timeout: Duration,
    ) -> WorkflowResult {
        let first_agent = self
            .order
            .iter()
            .find(|name| {
                self.agents
                    .get(*name)
                    .is_some_and(|agent| agent.role == "implement")
            })
            .or_else(|| self.order.first())
            .cloned();
        let Some(first_agent) = first_agent else {
            return WorkflowResult::rejected("No agents configured");
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<WorkItem>();
        let _ = tx.send(WorkItem {
            task: task.to_string(),
            target_agent: first_agent,
            iteration: 0,
        });

        let mut results: Vec<ExecutionResult> = Vec::new();
        let consumer = async {
            loop {
                let item = match tokio::time::timeout(self.poll_interval, rx.recv()).await {
                    Ok(Some(item)) => item,
                    // Nothing arrived within the grace period and the queue
                    // is empty; the consumer is the only producer, so the
                    // pipeline has drained.
                    Ok(None) | Err(_) => break,
                };

                let Some(agent) = self.agents.get(&item.target_agent) else {
                    warn!(agent = %item.target_agent, "dropping item for unknown agent");
                    continue;
                };

                let iteration_label = item.iteration.to_string();
                let prompt = render_template(
                    &agent.prompt_template,
                    &[
                        ("task", item.task.as_str()),
                        ("iteration", iteration_label.as_str()),
                    ],
                );
                let result = self.invoke(agent, prompt, item.iteration).await;

                if result.success {
                    let content = result.content.clone();
                    let stop_hit = stop(&result);
                    results.push(result);
                    if stop_hit {
                        info!(iteration = item.iteration, "stop condition met");
                        break;
                    }
                    if let Some(next_agent) = &agent.next_agent {
                        if item.iteration < self.max_iterations {
                            let _ = tx.send(WorkItem {
                                task: content,
                                target_agent: next_agent.clone(),
                                iteration: item.iteration + 1,
                            });
                        }
                    }
                } else {
                    results.push(result);
                }
            }
        };

        if tokio::time::timeout(timeout, consumer).await.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "continuous run timed out");
        }

        let final_output = results
            .iter()
            .rev()
            .find(|r| r.success)
            .map(|r| r.content.clone())
            .unwrap_or_default();
        WorkflowResult {
            success: results.iter().any(|r| r.success),
            total_iterations: results.len(),
            final_output,
            results,
        }
    }

    /// Invoke one agent's provider with a rendered prompt.
    ///
    /// Provider faults are recovered here into failed execution results; the
    /// strategies decide whether a failure ends the run.
    async fn invoke(&self, agent: &AgentRole, prompt: String, iteration: usize) -> ExecutionResult {
        debug!(agent = %agent.name, role = %agent.role, iteration, "invoking agent");
        let request = CompletionRequest::from_prompt(prompt);
        match agent.provider.complete(&request).await {
            Ok(response) => {
                ExecutionResult::success(&agent.name, &agent.role, response.content, iteration)
            }
            Err(err) => {
                warn!(agent = %agent.name, error = %err, "agent invocation failed");
                ExecutionResult::failure(&agent.name, &agent.role, err.to_string(), iteration)
            }
        }
    }
}
