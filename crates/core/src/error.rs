//! Unified error type for session-level operations.

use navtree_index::IndexError;
use navtree_source::SourceError;
use navtree_store::StoreError;
use navtree_traits::PreferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("Failed to load navigation bundle: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Preference(#[from] PreferenceError),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}
