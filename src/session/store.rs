//! Flat-file session store with auto-compaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::compaction::{estimate_tokens, prepare_compaction, summarize_removed};
use super::{Session, SessionMetadata};
use crate::error::Result;
use crate::types::{Message, Role};

const DEFAULT_MAX_TOKENS: usize = 100_000;
const DEFAULT_COMPACT_THRESHOLD: f64 = 0.8;
const DEFAULT_KEEP_LAST_N: usize = 10;

/// Persists sessions as one JSON file per id and compacts history under a
/// token budget.
///
/// Each session id is owned by a single process at a time; there is no
/// cross-process coordination.
pub struct SessionStore {
    storage_dir: PathBuf,
    max_tokens: usize,
    compact_threshold: f64,
    sessions: HashMap<String, Session>,
    id_counter: AtomicU64,
}

impl SessionStore {
    /// Open a store rooted at `storage_dir`, or the platform data directory
    /// (`tycho/sessions`) when `None`. Creates the directory if missing.
    pub fn new(storage_dir: Option<PathBuf>) -> Result<Self> {
        let storage_dir = match storage_dir {
            Some(dir) => dir,
            None => default_storage_dir(),
        };
        std::fs::create_dir_all(&storage_dir)?;

        Ok(Self {
            storage_dir,
            max_tokens: DEFAULT_MAX_TOKENS,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            sessions: HashMap::new(),
            id_counter: AtomicU64::new(0),
        })
    }

    /// Override the compaction budget.
    pub fn with_limits(mut self, max_tokens: usize, compact_threshold: f64) -> Self {
        self.max_tokens = max_tokens;
        self.compact_threshold = compact_threshold;
        self
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Create a new session with a fresh id and current timestamps.
    ///
    /// The returned session is owned by the caller; mutate it and hand it
    /// back through [`save`](Self::save).
    pub fn create(
        &mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
        title: impl Into<String>,
    ) -> Session {
        let now = Utc::now();
        let id = self.generate_id();
        let title = {
            let title = title.into();
            if title.is_empty() {
                format!("Session {}", &id[..6])
            } else {
                title
            }
        };

        let session = Session::new(SessionMetadata {
            id: id.clone(),
            created_at: now,
            updated_at: now,
            provider: provider.into(),
            model: model.into(),
            title,
            message_count: 0,
            total_tokens: 0,
        });
        debug!(id = %id, "created session");
        self.sessions.insert(id, session.clone());
        session
    }

    /// Get a session by id, loading from disk if it is not cached. Unknown
    /// ids yield `None`, never an error.
    pub fn get(&mut self, session_id: &str) -> Option<&Session> {
        if !self.sessions.contains_key(session_id) {
            match self.load(session_id) {
                Ok(Some(_)) => {}
                Ok(None) => return None,
                Err(err) => {
                    warn!(id = session_id, error = %err, "failed to load session");
                    return None;
                }
            }
        }
        self.sessions.get(session_id)
    }

    /// Persist a session, refreshing `updated_at`, `message_count`, and the
    /// token estimate. Returns the file path written.
    pub fn save(&mut self, mut session: Session) -> Result<PathBuf> {
        session.metadata.updated_at = Utc::now();
        session.metadata.message_count = session.messages.len();
        session.metadata.total_tokens = estimate_tokens(&session.messages);

        let path = self.session_path(&session.metadata.id);
        std::fs::write(&path, serde_json::to_string_pretty(&session)?)?;
        debug!(id = %session.metadata.id, path = %path.display(), "saved session");

        self.sessions.insert(session.metadata.id.clone(), session);
        Ok(path)
    }

    /// Load a session from disk. A missing file yields `Ok(None)`.
    pub fn load(&mut self, session_id: &str) -> Result<Option<Session>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }

        let session: Session = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        debug!(id = session_id, "loaded session");
        self.sessions.insert(session_id.to_string(), session.clone());
        Ok(Some(session))
    }

    /// Delete a session from disk and cache. Returns whether anything was
    /// removed.
    pub fn delete(&mut self, session_id: &str) -> bool {
        let path = self.session_path(session_id);
        let on_disk = path.exists();
        if on_disk {
            if let Err(err) = std::fs::remove_file(&path) {
                warn!(id = session_id, error = %err, "failed to delete session file");
            }
        }
        self.sessions.remove(session_id).is_some() || on_disk
    }

    /// List session metadata, most recently updated first. Unreadable files
    /// are skipped.
    pub fn list_sessions(&self, limit: usize) -> Vec<SessionMetadata> {
        let mut sessions: Vec<SessionMetadata> = Vec::new();

        let Ok(entries) = std::fs::read_dir(&self.storage_dir) else {
            return sessions;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .ok()
                .and_then(|data| serde_json::from_str::<Session>(&data).ok());
            match parsed {
                Some(session) => sessions.push(session.metadata),
                None => warn!(path = %path.display(), "skipping unreadable session file"),
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        sessions
    }

    /// Whether the session's estimated tokens have crossed the compaction
    /// threshold.
    pub fn should_compact(&self, session: &Session) -> bool {
        let tokens = estimate_tokens(&session.messages);
        tokens >= (self.max_tokens as f64 * self.compact_threshold) as usize
    }

    /// Compact with the default parameters: keep system messages, keep the
    /// last 10 non-system messages, summarize what was dropped.
    pub fn compact(&self, session: &mut Session) {
        self.compact_with(session, true, DEFAULT_KEEP_LAST_N, true);
    }

    /// Compact a session's history in place.
    ///
    /// No-op when the message count is at most `keep_last_n`. Records the
    /// compaction timestamp and removed-message count in the session context.
    pub fn compact_with(
        &self,
        session: &mut Session,
        keep_system: bool,
        keep_last_n: usize,
        summarize: bool,
    ) {
        let prepared = prepare_compaction(&session.messages, keep_system, keep_last_n);
        if prepared.removed.is_empty() {
            return;
        }

        let mut messages = prepared.kept;
        if summarize {
            if let Some(summary) = summarize_removed(&prepared.removed) {
                let insert_idx = usize::from(
                    messages.first().map(|m| m.role) == Some(Role::System),
                );
                messages.insert(insert_idx, summary);
            }
        }

        debug!(
            id = %session.metadata.id,
            removed = prepared.removed.len(),
            "compacted session"
        );
        session.messages = messages;
        session.context.insert(
            "compacted_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );
        session.context.insert(
            "removed_messages".to_string(),
            serde_json::json!(prepared.removed.len()),
        );
    }

    /// Append a message, compacting afterwards if the budget says so.
    pub fn add_message(&self, session: &mut Session, message: Message, auto_compact: bool) {
        session.messages.push(message);
        if auto_compact && self.should_compact(session) {
            self.compact(session);
        }
    }

    /// Opaque session id: timestamp-derived hash, unique per store instance.
    fn generate_id(&self) -> String {
        let counter = self.id_counter.fetch_add(1, Ordering::Relaxed);
        let seed = format!("{}-{counter}", Utc::now().to_rfc3339());
        let digest = Sha256::digest(seed.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        hex[..12].to_string()
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{session_id}.json"))
    }
}

fn default_storage_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tycho")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| PathBuf::from(".tycho/sessions"))
}
