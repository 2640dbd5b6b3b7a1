//! Model provider trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{CompletionRequest, CompletionResponse, StreamChunk};

/// Core trait implemented by all model providers.
///
/// Concrete vendor backends (request shaping, transport, auth) live outside
/// this crate; callers depend only on this interface.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g. "claude", "codex", "gemini").
    fn name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate a completion (non-streaming).
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Generate a completion (streaming). The returned stream is finite and
    /// not restartable.
    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>>;

    /// Check whether this provider is configured and reachable.
    async fn is_available(&self) -> bool;
}

/// Registry mapping provider names to instances.
///
/// Constructed once and passed by reference into the workflow engine; there
/// is no process-wide singleton.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Look up a provider by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve a provider for an agent name: exact match first, then the
    /// first registered name containing `name` as a case-insensitive
    /// substring. Map iteration order decides ties and is not stable.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        if let Some(provider) = self.providers.get(name) {
            return Some(provider.clone());
        }
        let needle = name.to_lowercase();
        self.providers
            .iter()
            .find(|(key, _)| key.to_lowercase().contains(&needle))
            .map(|(_, provider)| provider.clone())
    }

    /// All registered provider names.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl From<HashMap<String, Arc<dyn ModelProvider>>> for ProviderRegistry {
    fn from(providers: HashMap<String, Arc<dyn ModelProvider>>) -> Self {
        Self { providers }
    }
}
