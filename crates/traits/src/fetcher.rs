//! SubtreeFetcher trait for abstracting lazy subtree loading.
//!
//! The tree store never touches the network or filesystem itself; it asks a
//! fetcher for the raw payload behind a subtree token and decodes it.

use async_trait::async_trait;
use navtree_types::Node;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for subtree fetch operations.
///
/// `Clone` so that every caller waiting on a coalesced fetch receives the
/// same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Subtree not found: {0}")]
    NotFound(String),

    #[error("Subtree '{token}' unavailable: {message}")]
    Unavailable { token: String, message: String },

    #[error("Fetching subtree '{token}' timed out after {after_ms} ms")]
    TimedOut { token: String, after_ms: u64 },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

/// Raw subtree payload text (a JSON array, or a generated `var x = [...];` script).
pub type SharedPayload = Arc<str>;

/// A source of subtree payloads keyed by reference token.
///
/// # Implementations
///
/// - `InMemorySubtreeFetcher`: pre-populated payloads (tests, embedded data)
/// - `FilesystemSubtreeFetcher` (navtree-resource): generated `<token>.js` files
#[async_trait]
pub trait SubtreeFetcher: Send + Sync + Debug {
    /// Fetch the payload for `token`.
    async fn fetch(&self, token: &str) -> Result<SharedPayload, FetchError>;

    /// Returns a human-readable name for this fetcher (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory subtree fetcher.
///
/// Also counts fetches, which lets callers verify that repeated expansion is
/// served from the tree store's cache.
#[derive(Debug, Default)]
pub struct InMemorySubtreeFetcher {
    payloads: RwLock<HashMap<String, SharedPayload>>,
    fetches: AtomicUsize,
}

impl InMemorySubtreeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw payload text under `token`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` if the internal lock is poisoned.
    pub fn add(&self, token: impl Into<String>, payload: impl Into<SharedPayload>) -> Result<(), FetchError> {
        let token = token.into();
        let mut payloads = self.payloads.write().map_err(|_| FetchError::Unavailable {
            token: token.clone(),
            message: "payload store lock poisoned".to_string(),
        })?;
        payloads.insert(token, payload.into());
        Ok(())
    }

    /// Register already-built nodes under `token`, encoded in object form.
    pub fn add_nodes(&self, token: impl Into<String>, nodes: &[Node]) -> Result<(), FetchError> {
        let token = token.into();
        let text = serde_json::to_string(nodes).map_err(|e| FetchError::Unavailable {
            token: token.clone(),
            message: e.to_string(),
        })?;
        self.add(token, text)
    }

    /// Remove a payload. Returns `None` if absent or the lock is poisoned.
    pub fn remove(&self, token: &str) -> Option<SharedPayload> {
        self.payloads.write().ok()?.remove(token)
    }

    /// Number of `fetch` calls served so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.payloads.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubtreeFetcher for InMemorySubtreeFetcher {
    async fn fetch(&self, token: &str) -> Result<SharedPayload, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let payloads = self.payloads.read().map_err(|_| FetchError::Unavailable {
            token: token.to_string(),
            message: "payload store lock poisoned".to_string(),
        })?;
        payloads
            .get(token)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(token.to_string()))
    }

    fn name(&self) -> &'static str {
        "InMemorySubtreeFetcher"
    }
}
