//! # navtree-core
//!
//! Integration layer of the navigation panel:
//! - **sync**: the sync controller (follow content-panel navigation or not)
//! - **bridge**: the panel bridge between content panel, tree widget and store
//! - **config**: session configuration, including the toggle status strings
//! - **session**: builds one session's store, index, controller and bridge
//! - **error**: the session-level error type

// Re-export foundation crates
pub use navtree_index as index;
pub use navtree_source as source;
pub use navtree_store as store;
pub use navtree_traits as traits;
pub use navtree_types as types;

pub mod bridge;
pub mod config;
pub mod error;
mod expand;
pub mod session;
pub mod sync;

pub use bridge::{ChannelSink, PageChanged, PanelBridge, PanelEvent, PanelSink};
pub use config::{NavConfig, SyncMessages};
pub use error::NavError;
pub use session::{NavSession, NavSessionBuilder};
pub use sync::{ExpandFailure, SyncController, SyncOutcome, SyncState, SyncToggle};

pub use index::{IndexError, IndexTable};
pub use source::{BundleSource, NavBundle};
pub use store::{StoreError, TreeStore};
pub use traits::{
    FetchError, InMemoryPreferenceStore, InMemorySubtreeFetcher, SubtreeFetcher,
    SyncPreferenceStore,
};
pub use types::{IndexEntry, Node, NodeChildren, NodePath, NodeView};
