//! Token estimation and history compaction.
//!
//! The token estimate is a deliberately coarse chars/4 heuristic, not a
//! tokenizer. Compaction keeps the system messages and a recent tail, and
//! replaces everything dropped with a one-message summary.

use crate::types::{Message, Role};
use crate::util::truncate_chars;

/// Maximum one-line previews included in a compaction summary.
const SUMMARY_PREVIEW_LIMIT: usize = 5;

/// Characters of each dropped message surfaced in its preview.
const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Estimate tokens for one message: chars/4 for the content, plus chars/4 of
/// the serialized tool calls when present.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let mut tokens = message.content.chars().count() / 4;
    if let Some(calls) = &message.tool_calls {
        let serialized = serde_json::to_string(calls).unwrap_or_default();
        tokens += serialized.chars().count() / 4;
    }
    tokens
}

/// Estimate tokens across a message list.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// The kept/removed split computed for a compaction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedCompaction {
    pub kept: Vec<Message>,
    pub removed: Vec<Message>,
}

/// Decide which messages a compaction keeps.
///
/// No-op when the list has at most `keep_last_n` messages. Otherwise keeps
/// every system message (when `keep_system`) plus the most recent
/// `keep_last_n` non-system messages; everything else is removed, oldest
/// first.
pub fn prepare_compaction(
    messages: &[Message],
    keep_system: bool,
    keep_last_n: usize,
) -> PreparedCompaction {
    if messages.len() <= keep_last_n {
        return PreparedCompaction {
            kept: messages.to_vec(),
            removed: Vec::new(),
        };
    }

    let protected = |message: &Message| keep_system && message.role == Role::System;
    let candidates = messages.iter().filter(|m| !protected(m)).count();
    let mut to_drop = candidates.saturating_sub(keep_last_n);

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for message in messages {
        if !protected(message) && to_drop > 0 {
            to_drop -= 1;
            removed.push(message.clone());
        } else {
            kept.push(message.clone());
        }
    }

    PreparedCompaction { kept, removed }
}

/// Synthesize the summary system message for a set of dropped messages.
///
/// Previews user and assistant messages only, up to [`SUMMARY_PREVIEW_LIMIT`]
/// lines of [`SUMMARY_PREVIEW_CHARS`] characters each. Returns `None` when
/// nothing was dropped.
pub fn summarize_removed(removed: &[Message]) -> Option<Message> {
    if removed.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = Vec::new();
    for message in removed {
        match message.role {
            Role::User => lines.push(format!(
                "User asked: {}...",
                truncate_chars(&message.content, SUMMARY_PREVIEW_CHARS)
            )),
            Role::Assistant => lines.push(format!(
                "Assistant: {}...",
                truncate_chars(&message.content, SUMMARY_PREVIEW_CHARS)
            )),
            _ => {}
        }
        if lines.len() == SUMMARY_PREVIEW_LIMIT {
            break;
        }
    }

    Some(Message::system(format!(
        "[Previous conversation summary ({} messages)]\n{}",
        removed.len(),
        lines.join("\n")
    )))
}
