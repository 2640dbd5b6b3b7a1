//! Conversation sessions: persistence and token-aware compaction.

pub mod compaction;
pub mod store;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Message;

pub use store::SessionStore;

/// Session metadata persisted alongside the message list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub title: String,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub total_tokens: usize,
}

/// A conversation session: metadata, owned message list, free-form context.
///
/// Owned by a single writer at a time; the store does not coordinate
/// concurrent mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub metadata: SessionMetadata,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl Session {
    pub fn new(metadata: SessionMetadata) -> Self {
        Self {
            metadata,
            messages: Vec::new(),
            context: HashMap::new(),
        }
    }
}
