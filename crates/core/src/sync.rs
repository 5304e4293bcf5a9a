//! Panel synchronisation.
//!
//! While synced, every content-panel navigation expands the tree down to the
//! entry for the displayed page. While unsynced, navigation leaves the tree alone.

use crate::config::SyncMessages;
use crate::expand::{expand_within, resolve_within};
use navtree_index::IndexTable;
use navtree_store::{StoreError, TreeStore};
use navtree_traits::SyncPreferenceStore;
use navtree_types::{IndexEntry, NodePath, split_fragment};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    Synced,
    Unsynced,
}

impl SyncState {
    fn from_enabled(enabled: bool) -> Self {
        if enabled {
            SyncState::Synced
        } else {
            SyncState::Unsynced
        }
    }

    pub fn is_synced(self) -> bool {
        self == SyncState::Synced
    }
}

/// Result of flipping the sync toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncToggle {
    pub state: SyncState,
    pub message: String,
}

/// An ancestor that could not be expanded while following a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandFailure {
    pub path: NodePath,
    pub error: StoreError,
}

/// What a synced navigation did to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The index entry that governed the lookup, if any.
    pub matched: Option<IndexEntry>,
    /// The node to highlight, or the unloadable subtree when `failure` is set.
    pub path: NodePath,
    /// Ancestors expanded, outermost first.
    pub expanded: Vec<NodePath>,
    /// Set when a subtree on the way failed to load; expansion stops there.
    pub failure: Option<ExpandFailure>,
}

impl SyncOutcome {
    /// True when every ancestor expanded and the node can be highlighted.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct SyncController {
    synced: AtomicBool,
    messages: SyncMessages,
    preference: Arc<dyn SyncPreferenceStore>,
    fetch_timeout: Option<Duration>,
}

impl fmt::Debug for SyncController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncController")
            .field("state", &self.state())
            .field("messages", &self.messages)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl SyncController {
    /// Starts from the saved preference, falling back to `default_enabled`.
    pub fn new(
        messages: SyncMessages,
        default_enabled: bool,
        preference: Arc<dyn SyncPreferenceStore>,
    ) -> Self {
        let enabled = preference.load().unwrap_or(default_enabled);
        Self {
            synced: AtomicBool::new(enabled),
            messages,
            preference,
            fetch_timeout: None,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_enabled(self.synced.load(Ordering::SeqCst))
    }

    /// The status string for the current state.
    pub fn status_message(&self) -> &str {
        self.message_for(self.state())
    }

    fn message_for(&self, state: SyncState) -> &str {
        match state {
            SyncState::Synced => &self.messages.sync_enabled,
            SyncState::Unsynced => &self.messages.sync_disabled,
        }
    }

    /// Flips the state. Never refused; a failure to persist is only logged.
    pub fn toggle(&self) -> SyncToggle {
        let enabled = !self.synced.fetch_xor(true, Ordering::SeqCst);
        if let Err(e) = self.preference.save(enabled) {
            log::warn!("Sync preference not saved: {}", e);
        }
        let state = SyncState::from_enabled(enabled);
        log::debug!("Panel synchronisation is now {:?}", state);
        SyncToggle {
            state,
            message: self.message_for(state).to_string(),
        }
    }

    /// Finds the tree path for `url` among the nodes loaded so far.
    ///
    /// Tries the governing index entry first, then the URL itself, then the
    /// URL with its anchor stripped. Never fetches.
    pub fn locate(
        &self,
        url: &str,
        index: &IndexTable,
        store: &TreeStore,
    ) -> Option<(Option<IndexEntry>, NodePath)> {
        let matched = index.lookup(url).cloned();
        let path = find_loaded(url, matched.as_ref(), store)?;
        Some((matched, path))
    }

    /// Reacts to a content-panel navigation.
    ///
    /// When the page is indexed but not among the loaded nodes, unresolved
    /// subtrees are fetched in pre-order until it turns up. If it never does
    /// and a subtree failed to load, the outcome points at that subtree.
    ///
    /// Returns `Ok(None)` when unsynced or when no tree node matches.
    ///
    /// # Errors
    ///
    /// Only `StoreError::InvalidPath`, which means the store changed shape
    /// under a path it just produced. Fetch failures are reported in the outcome.
    pub async fn on_page_changed(
        &self,
        url: &str,
        index: &IndexTable,
        store: &TreeStore,
    ) -> Result<Option<SyncOutcome>, StoreError> {
        if !self.state().is_synced() {
            log::debug!("Ignoring navigation to '{}' while unsynced", url);
            return Ok(None);
        }
        let matched = index.lookup(url).cloned();
        let (path, blocked) = match find_loaded(url, matched.as_ref(), store) {
            Some(path) => (path, None),
            None if matched.is_some() => match self.search_deferred(url, matched.as_ref(), store).await? {
                Search::Found(path) => (path, None),
                Search::Blocked(failure) => (failure.path.clone(), Some(failure)),
                Search::Missing => {
                    log::debug!("'{}' is indexed but in no subtree", url);
                    return Ok(None);
                }
            },
            None => {
                log::debug!("No tree entry for '{}'", url);
                return Ok(None);
            }
        };

        let mut expanded = Vec::with_capacity(path.len().saturating_sub(1));
        let mut failure = None;
        for depth in 1..path.len() {
            let ancestor = &path[..depth];
            match expand_within(store, ancestor, self.fetch_timeout).await {
                Ok(_) => expanded.push(ancestor.to_vec()),
                Err(error @ StoreError::InvalidPath { .. }) => return Err(error),
                Err(error) => {
                    log::warn!("Sync stopped at {:?}: {}", ancestor, error);
                    failure = Some(ExpandFailure {
                        path: ancestor.to_vec(),
                        error,
                    });
                    break;
                }
            }
        }

        Ok(Some(SyncOutcome {
            matched,
            path,
            expanded,
            failure: failure.or(blocked),
        }))
    }

    async fn search_deferred(
        &self,
        url: &str,
        matched: Option<&IndexEntry>,
        store: &TreeStore,
    ) -> Result<Search, StoreError> {
        let mut skipped: Vec<NodePath> = Vec::new();
        let mut blocked = None;
        while let Some(next) = store.next_deferred(&skipped) {
            match resolve_within(store, &next, self.fetch_timeout).await {
                Ok(_) => {
                    if let Some(path) = find_loaded(url, matched, store) {
                        return Ok(Search::Found(path));
                    }
                }
                Err(error @ StoreError::InvalidPath { .. }) => return Err(error),
                Err(error @ StoreError::Fetch { .. }) => {
                    log::warn!("Skipping subtree at {:?} while locating '{}': {}", next, url, error);
                    if blocked.is_none() {
                        blocked = Some(ExpandFailure {
                            path: next.clone(),
                            error,
                        });
                    }
                    skipped.push(next);
                }
                // The node is now a leaf and will not be offered again.
                Err(error @ StoreError::MalformedSubtree { .. }) => {
                    log::warn!("Skipping subtree at {:?} while locating '{}': {}", next, url, error);
                }
            }
        }
        Ok(blocked.map_or(Search::Missing, Search::Blocked))
    }
}

enum Search {
    Found(NodePath),
    /// Not found, and this subtree could not be loaded.
    Blocked(ExpandFailure),
    Missing,
}

fn find_loaded(url: &str, matched: Option<&IndexEntry>, store: &TreeStore) -> Option<NodePath> {
    matched
        .and_then(|entry| store.find_path_for(&entry.fragment))
        .or_else(|| store.find_path_for(url))
        .or_else(|| match split_fragment(url) {
            (page, Some(_)) => store.find_path_for(page),
            (_, None) => None,
        })
}
