//! Tests for the multi-agent execution strategies.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::MockProvider;
use tycho::orchestrator::{AgentRole, ExecutionResult, MergeStrategy, Orchestrator};
use tycho::workflow::StopCondition;

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn no_stop(_result: &ExecutionResult) -> bool {
    false
}

#[tokio::test]
async fn sequential_chains_each_output_into_the_next_prompt() {
    let coder = Arc::new(MockProvider::always("coder", "a patch"));
    let reviewer = Arc::new(MockProvider::always("reviewer", "reviewed patch"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("coder", coder.clone(), "implement"),
        AgentRole::new("reviewer", reviewer.clone(), "review")
            .with_prompt_template("Review this: {task}"),
    ]);

    let result = orchestrator
        .execute_sequential("add a flag", &names(&["coder", "reviewer"]))
        .await;

    assert!(result.success);
    assert_eq!(result.total_iterations, 2);
    assert_eq!(result.final_output, "reviewed patch");
    assert_eq!(reviewer.prompts(), vec!["Review this: a patch".to_string()]);
    assert_eq!(result.results[0].iteration, 0);
    assert_eq!(result.results[1].iteration, 1);
}

#[tokio::test]
async fn sequential_stops_at_the_first_failure() {
    let first = Arc::new(MockProvider::always("first", "ok"));
    let second = Arc::new(MockProvider::failing("second", "quota exceeded"));
    let third = Arc::new(MockProvider::always("third", "never"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("first", first.clone(), "implement"),
        AgentRole::new("second", second.clone(), "review"),
        AgentRole::new("third", third.clone(), "refine"),
    ]);

    let result = orchestrator
        .execute_sequential("task", &names(&["first", "second", "third"]))
        .await;

    assert!(!result.success);
    assert_eq!(result.total_iterations, 2);
    assert_eq!(result.results.len(), 2);
    assert!(!result.results[1].success);
    assert_eq!(result.final_output, "");
    assert_eq!(third.request_count(), 0);
}

#[tokio::test]
async fn sequential_stops_on_unknown_agent_without_a_provider_call() {
    let known = Arc::new(MockProvider::always("known", "ok"));
    let orchestrator =
        Orchestrator::new(vec![AgentRole::new("known", known.clone(), "implement")]);

    let result = orchestrator
        .execute_sequential("task", &names(&["ghost", "known"]))
        .await;

    assert!(!result.success);
    assert_eq!(result.results.len(), 1);
    assert_eq!(
        result.results[0].error.as_deref(),
        Some("Agent not found: ghost")
    );
    assert_eq!(known.request_count(), 0);
}

#[tokio::test]
async fn parallel_preserves_order_and_merges_successes() {
    let alpha = Arc::new(MockProvider::always("alpha", "alpha output"));
    let beta = Arc::new(MockProvider::failing("beta", "model offline"));
    let gamma = Arc::new(MockProvider::always("gamma", "gamma output"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("alpha", alpha, "implement"),
        AgentRole::new("beta", beta, "review"),
        AgentRole::new("gamma", gamma, "refine"),
    ]);

    let result = orchestrator
        .execute_parallel(
            "task",
            &names(&["alpha", "beta", "gamma"]),
            MergeStrategy::Combine,
        )
        .await;

    // One failure does not hide the siblings.
    assert!(result.success);
    assert_eq!(result.results.len(), 3);
    assert_eq!(result.results[0].agent_name, "alpha");
    assert_eq!(result.results[1].agent_name, "beta");
    assert_eq!(result.results[2].agent_name, "gamma");
    assert!(!result.results[1].success);
    assert_eq!(result.total_iterations, 1);

    assert!(result.final_output.contains("**alpha (implement):**\nalpha output"));
    assert!(result.final_output.contains("**gamma (refine):**\ngamma output"));
    assert!(!result.final_output.contains("beta"));
}

#[tokio::test]
async fn parallel_best_takes_the_longest_output() {
    let short = Arc::new(MockProvider::always("short", "brief"));
    let long = Arc::new(MockProvider::always("long", "a much longer answer"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("short", short, "implement"),
        AgentRole::new("long", long, "implement"),
    ]);

    let result = orchestrator
        .execute_parallel("task", &names(&["short", "long"]), MergeStrategy::Best)
        .await;

    assert_eq!(result.final_output, "a much longer answer");
}

#[tokio::test]
async fn parallel_unknown_strategy_takes_the_first_success() {
    assert_eq!(MergeStrategy::from("vote"), MergeStrategy::First);

    let a = Arc::new(MockProvider::failing("a", "down"));
    let b = Arc::new(MockProvider::always("b", "b wins"));
    let c = Arc::new(MockProvider::always("c", "c later"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("a", a, "implement"),
        AgentRole::new("b", b, "implement"),
        AgentRole::new("c", c, "implement"),
    ]);

    let result = orchestrator
        .execute_parallel("task", &names(&["a", "b", "c"]), MergeStrategy::First)
        .await;

    assert_eq!(result.final_output, "b wins");
}

#[tokio::test]
async fn parallel_all_failures_is_unsuccessful() {
    let a = Arc::new(MockProvider::failing("a", "down"));
    let orchestrator = Orchestrator::new(vec![AgentRole::new("a", a, "implement")]);

    let result = orchestrator
        .execute_parallel("task", &names(&["a", "missing"]), MergeStrategy::Combine)
        .await;

    assert!(!result.success);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.final_output, "");
}

#[tokio::test]
async fn round_robin_stops_immediately_on_a_matching_result() {
    let coder = Arc::new(MockProvider::always("coder", "updated the patch"));
    let reviewer = Arc::new(
        MockProvider::new("reviewer")
            .with_text("You should rework the error paths")
            .with_text("Looks solid. LGTM"),
    );
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("coder", coder.clone(), "implement"),
        AgentRole::new("reviewer", reviewer.clone(), "review"),
    ]);

    let conditions = [StopCondition::keyword("lgtm")];
    let check = |result: &ExecutionResult| conditions.iter().any(|c| c.is_met(result));
    let result = orchestrator
        .execute_round_robin("task", &names(&["coder", "reviewer"]), 3, Some(&check))
        .await;

    // Two full rounds ran; the keyword in the reviewer's second output ended
    // the run before round three.
    assert!(result.success);
    assert_eq!(result.total_iterations, 4);
    assert_eq!(result.final_output, "Looks solid. LGTM");
    assert_eq!(coder.request_count(), 2);
    assert_eq!(reviewer.request_count(), 2);
}

#[tokio::test]
async fn round_robin_prompts_carry_round_state_and_history() {
    let a = Arc::new(MockProvider::always("a", "output from a"));
    let b = Arc::new(MockProvider::always("b", "output from b"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("a", a.clone(), "implement")
            .with_prompt_template("round={round} task={task} state={current_state}"),
        AgentRole::new("b", b.clone(), "review")
            .with_prompt_template("history:\n{history}"),
    ]);

    let result = orchestrator
        .execute_round_robin("the task", &names(&["a", "b"]), 1, None)
        .await;

    assert!(result.success);
    assert_eq!(
        a.prompts(),
        vec!["round=1 task=the task state=the task".to_string()]
    );
    assert_eq!(b.prompts(), vec!["history:\n[a]: output from a...".to_string()]);
    assert_eq!(result.final_output, "output from b");
}

#[tokio::test]
async fn round_robin_skips_unknown_agents_and_keeps_going() {
    let a = Arc::new(MockProvider::always("a", "fine"));
    let orchestrator = Orchestrator::new(vec![AgentRole::new("a", a.clone(), "implement")]);

    let result = orchestrator
        .execute_round_robin("task", &names(&["ghost", "a"]), 2, None)
        .await;

    assert!(result.success);
    assert_eq!(result.results.len(), 2);
    assert!(result.results.iter().all(|r| r.agent_name == "a"));
}

#[tokio::test(start_paused = true)]
async fn continuous_two_node_cycle_respects_the_iteration_cap() {
    let implementer = Arc::new(MockProvider::always("implementer", "implementation"));
    let reviewer = Arc::new(MockProvider::always("reviewer", "still needs work"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("implementer", implementer, "implement").with_next_agent("reviewer"),
        AgentRole::new("reviewer", reviewer, "review").with_next_agent("implementer"),
    ])
    .with_max_iterations(3);

    let result = orchestrator
        .execute_continuous("build it", &no_stop, Duration::from_secs(300))
        .await;

    // Iterations 0..=3 ran; iteration 3 could not enqueue a successor.
    assert!(result.success);
    assert_eq!(result.results.len(), 4);
    let iterations: Vec<usize> = result.results.iter().map(|r| r.iteration).collect();
    assert_eq!(iterations, vec![0, 1, 2, 3]);
    assert_eq!(result.results[0].agent_name, "implementer");
    assert_eq!(result.results[1].agent_name, "reviewer");
    assert_eq!(result.final_output, "still needs work");
}

#[tokio::test(start_paused = true)]
async fn continuous_seeds_the_implement_role_first() {
    let reviewer = Arc::new(MockProvider::always("reviewer", "review"));
    let implementer = Arc::new(MockProvider::always("implementer", "impl"));
    // Reviewer is configured first, but the implement role seeds the queue.
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("reviewer", reviewer, "review"),
        AgentRole::new("implementer", implementer, "implement"),
    ]);

    let result = orchestrator
        .execute_continuous("task", &no_stop, Duration::from_secs(300))
        .await;

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].agent_name, "implementer");
}

#[tokio::test(start_paused = true)]
async fn continuous_stops_when_a_condition_matches() {
    let implementer = Arc::new(MockProvider::always("implementer", "implementation"));
    let reviewer = Arc::new(MockProvider::always("reviewer", "approved"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("implementer", implementer, "implement").with_next_agent("reviewer"),
        AgentRole::new("reviewer", reviewer, "review").with_next_agent("implementer"),
    ]);

    let conditions = [StopCondition::approval()];
    let check = |result: &ExecutionResult| conditions.iter().any(|c| c.is_met(result));
    let result = orchestrator
        .execute_continuous("task", &check, Duration::from_secs(300))
        .await;

    assert!(result.success);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.final_output, "approved");
}

#[tokio::test(start_paused = true)]
async fn continuous_failure_breaks_the_chain_but_not_the_result() {
    let implementer = Arc::new(MockProvider::always("implementer", "impl"));
    let reviewer = Arc::new(MockProvider::failing("reviewer", "overloaded"));
    let orchestrator = Orchestrator::new(vec![
        AgentRole::new("implementer", implementer, "implement").with_next_agent("reviewer"),
        AgentRole::new("reviewer", reviewer, "review").with_next_agent("implementer"),
    ]);

    let result = orchestrator
        .execute_continuous("task", &no_stop, Duration::from_secs(300))
        .await;

    // The failed reviewer enqueues nothing, so the run drains after two
    // results; one success still makes the aggregate successful.
    assert!(result.success);
    assert_eq!(result.results.len(), 2);
    assert!(!result.results[1].success);
    assert_eq!(result.final_output, "impl");
}

#[tokio::test(start_paused = true)]
async fn continuous_wall_clock_timeout_discards_inflight_work() {
    let slow = Arc::new(
        MockProvider::always("slow", "eventually")
            .with_delay(Duration::from_secs(600)),
    );
    let orchestrator =
        Orchestrator::new(vec![AgentRole::new("slow", slow, "implement")]);

    let result = orchestrator
        .execute_continuous("task", &no_stop, Duration::from_secs(30))
        .await;

    assert!(!result.success);
    assert!(result.results.is_empty());
    assert_eq!(result.final_output, "");
}
