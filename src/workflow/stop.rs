//! Stop conditions evaluated against execution results.

use serde::Deserialize;

use crate::orchestrator::ExecutionResult;

/// Words treated as suggestion indicators by `no_suggestions`.
const SUGGESTION_INDICATORS: [&str; 5] = ["should", "could", "recommend", "suggest", "consider"];

const DEFAULT_SUGGESTION_THRESHOLD: usize = 2;
const DEFAULT_ITERATION_THRESHOLD: usize = 10;

fn default_suggestion_threshold() -> usize {
    DEFAULT_SUGGESTION_THRESHOLD
}

fn default_iteration_threshold() -> usize {
    DEFAULT_ITERATION_THRESHOLD
}

/// A predicate over one [`ExecutionResult`] that ends a multi-agent run
/// early when it matches.
///
/// Conditions carrying an `agent` name only fire on results from that agent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopCondition {
    /// Case-insensitive substring match in the result content.
    Keyword {
        #[serde(alias = "keyword")]
        value: String,
        #[serde(default)]
        agent: Option<String>,
    },
    /// Fires when fewer than `threshold` suggestion indicator words appear
    /// in the content.
    NoSuggestions {
        #[serde(default = "default_suggestion_threshold", alias = "value")]
        threshold: usize,
        #[serde(default)]
        agent: Option<String>,
    },
    /// Fires when the content contains "approved" or "lgtm".
    Approval {
        #[serde(default)]
        agent: Option<String>,
    },
    /// Fires when the result's iteration index reaches `threshold`.
    MaxIterations {
        #[serde(default = "default_iteration_threshold", alias = "value")]
        threshold: usize,
        #[serde(default)]
        agent: Option<String>,
    },
}

impl StopCondition {
    pub fn keyword(value: impl Into<String>) -> Self {
        Self::Keyword {
            value: value.into(),
            agent: None,
        }
    }

    pub fn approval() -> Self {
        Self::Approval { agent: None }
    }

    pub fn max_iterations(threshold: usize) -> Self {
        Self::MaxIterations {
            threshold,
            agent: None,
        }
    }

    fn agent(&self) -> Option<&str> {
        match self {
            Self::Keyword { agent, .. }
            | Self::NoSuggestions { agent, .. }
            | Self::Approval { agent }
            | Self::MaxIterations { agent, .. } => agent.as_deref(),
        }
    }

    /// Whether this condition matches the given result.
    pub fn is_met(&self, result: &ExecutionResult) -> bool {
        if let Some(agent) = self.agent() {
            if agent != result.agent_name {
                return false;
            }
        }

        let content = result.content.to_lowercase();
        match self {
            Self::Keyword { value, .. } => content.contains(&value.to_lowercase()),
            Self::NoSuggestions { threshold, .. } => {
                let count = SUGGESTION_INDICATORS
                    .iter()
                    .filter(|indicator| content.contains(**indicator))
                    .count();
                count < *threshold
            }
            Self::Approval { .. } => content.contains("approved") || content.contains("lgtm"),
            Self::MaxIterations { threshold, .. } => result.iteration >= *threshold,
        }
    }
}

/// Whether any configured condition matches the result.
pub fn any_met(conditions: &[StopCondition], result: &ExecutionResult) -> bool {
    conditions.iter().any(|condition| condition.is_met(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(content: &str, iteration: usize) -> ExecutionResult {
        ExecutionResult::success("reviewer", "review", content, iteration)
    }

    #[test]
    fn keyword_matches_case_insensitively() {
        let condition = StopCondition::keyword("lgtm");
        assert!(condition.is_met(&result_with("Looks great. LGTM!", 0)));
        assert!(!condition.is_met(&result_with("needs work", 0)));
    }

    #[test]
    fn no_suggestions_counts_indicator_words() {
        let condition = StopCondition::NoSuggestions {
            threshold: 2,
            agent: None,
        };
        // "should" and "consider" present: two indicators, not below threshold.
        assert!(!condition.is_met(&result_with("You should consider a cache", 0)));
        // Only one indicator present.
        assert!(condition.is_met(&result_with("You should ship it", 0)));
        assert!(condition.is_met(&result_with("Clean. No notes.", 0)));
    }

    #[test]
    fn approval_accepts_either_phrase() {
        let condition = StopCondition::approval();
        assert!(condition.is_met(&result_with("Approved, merging now", 0)));
        assert!(condition.is_met(&result_with("lgtm", 0)));
        assert!(!condition.is_met(&result_with("rejected", 0)));
    }

    #[test]
    fn max_iterations_compares_result_index() {
        let condition = StopCondition::max_iterations(3);
        assert!(!condition.is_met(&result_with("x", 2)));
        assert!(condition.is_met(&result_with("x", 3)));
    }

    #[test]
    fn agent_filter_restricts_scope() {
        let condition = StopCondition::Keyword {
            value: "done".into(),
            agent: Some("other".into()),
        };
        assert!(!condition.is_met(&result_with("done", 0)));
    }

    #[test]
    fn deserializes_from_declarative_form() {
        let condition: StopCondition =
            serde_yaml::from_str("type: keyword\nkeyword: \"SHIP IT\"").unwrap();
        assert_eq!(
            condition,
            StopCondition::Keyword {
                value: "SHIP IT".into(),
                agent: None
            }
        );

        let condition: StopCondition =
            serde_yaml::from_str("type: no_suggestions\nvalue: 3").unwrap();
        assert_eq!(
            condition,
            StopCondition::NoSuggestions {
                threshold: 3,
                agent: None
            }
        );

        let condition: StopCondition = serde_yaml::from_str("type: approval").unwrap();
        assert_eq!(condition, StopCondition::Approval { agent: None });
    }
}
