//! Temporary object URLs that feed a selected file to the decoder.
//!
//! A host UI hands the decoder a URL rather than the bytes themselves, and
//! every URL created for a confirm attempt must be released exactly once.
//! [`ObjectUrl`] owns that obligation: it revokes on drop, so every exit path
//! (success, error, or an abandoned future) releases it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Opaque handle to content registered with a [`SourceRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(String);

impl SourceUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and releases object URLs for in-memory file content.
pub trait SourceRegistry: Send + Sync {
    /// Register content and return a URL that resolves to it.
    fn create(&self, content: Arc<[u8]>) -> SourceUrl;

    /// Look up live content. Revoked URLs resolve to `None`.
    fn resolve(&self, url: &SourceUrl) -> Option<Arc<[u8]>>;

    /// Release a URL.
    fn revoke(&self, url: &SourceUrl);
}

/// A created URL that is revoked when dropped.
pub struct ObjectUrl {
    registry: Arc<dyn SourceRegistry>,
    url: SourceUrl,
}

impl ObjectUrl {
    /// Register `content` and take ownership of the resulting URL.
    pub fn create(registry: Arc<dyn SourceRegistry>, content: Arc<[u8]>) -> Self {
        let url = registry.create(content);
        tracing::trace!("Created object URL {}", url);
        Self { registry, url }
    }

    pub fn url(&self) -> &SourceUrl {
        &self.url
    }

    /// Resolve the URL through its registry.
    pub fn resolve(&self) -> Option<Arc<[u8]>> {
        self.registry.resolve(&self.url)
    }

    /// Release the URL now rather than at end of scope.
    pub fn revoke(self) {
        drop(self);
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        tracing::trace!("Revoking object URL {}", self.url);
        self.registry.revoke(&self.url);
    }
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    live: HashMap<SourceUrl, Arc<[u8]>>,
    created: u64,
    revoked: u64,
}

/// In-process registry that also counts creations and revocations.
#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Counters stay meaningful even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// URLs created so far.
    pub fn created_count(&self) -> u64 {
        self.lock().created
    }

    /// Revocations of live URLs so far.
    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }

    /// URLs created but not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }
}

impl SourceRegistry for MemoryRegistry {
    fn create(&self, content: Arc<[u8]>) -> SourceUrl {
        let mut state = self.lock();
        state.next_id += 1;
        state.created += 1;
        let url = SourceUrl(format!("blob:avatar/{}", state.next_id));
        state.live.insert(url.clone(), content);
        url
    }

    fn resolve(&self, url: &SourceUrl) -> Option<Arc<[u8]>> {
        self.lock().live.get(url).cloned()
    }

    fn revoke(&self, url: &SourceUrl) {
        let mut state = self.lock();
        if state.live.remove(url).is_some() {
            state.revoked += 1;
        } else {
            tracing::warn!("Revoke of unknown or already revoked URL {}", url);
        }
    }
}
