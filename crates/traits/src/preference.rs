//! Storage for the panel-synchronisation preference.
//!
//! The preference itself is session-scoped; a shell that wants it to survive
//! restarts plugs in a persistent store.

use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Failed to persist sync preference: {0}")]
    Persist(String),
}

pub trait SyncPreferenceStore: Send + Sync + Debug {
    /// The stored preference, or `None` if nothing has been saved yet.
    fn load(&self) -> Option<bool>;

    fn save(&self, enabled: bool) -> Result<(), PreferenceError>;
}

/// Keeps the preference for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    value: RwLock<Option<bool>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(enabled: bool) -> Self {
        Self {
            value: RwLock::new(Some(enabled)),
        }
    }
}

impl SyncPreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> Option<bool> {
        self.value.read().ok().and_then(|v| *v)
    }

    fn save(&self, enabled: bool) -> Result<(), PreferenceError> {
        let mut value = self
            .value
            .write()
            .map_err(|_| PreferenceError::Persist("preference lock poisoned".to_string()))?;
        *value = Some(enabled);
        Ok(())
    }
}
