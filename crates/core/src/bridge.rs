//! The panel bridge.
//!
//! The only component that talks to both sides: it forwards content-panel
//! navigations to the sync controller, forwards tree-widget clicks to the
//! store, and turns the results into [`PanelEvent`]s for the UI.

use crate::error::NavError;
use crate::expand::expand_within;
use crate::sync::{SyncController, SyncOutcome, SyncState, SyncToggle};
use navtree_index::IndexTable;
use navtree_store::{StoreError, TreeStore};
use navtree_types::{NodePath, NodeView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fired by the content panel whenever the displayed page changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageChanged {
    pub url: String,
}

impl PageChanged {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Render events for the tree widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelEvent {
    /// Scroll to and highlight the node.
    Highlight { path: NodePath },
    Expanded { path: NodePath, children: Vec<NodeView> },
    Collapsed { path: NodePath },
    /// The node could not be expanded; the UI may offer a retry.
    ExpandFailed { path: NodePath, message: String },
    SyncStatus { state: SyncState, message: String },
}

/// Receiver of render events.
pub trait PanelSink: Send + Sync {
    fn emit(&self, event: PanelEvent);
}

impl<F> PanelSink for F
where
    F: Fn(PanelEvent) + Send + Sync,
{
    fn emit(&self, event: PanelEvent) {
        self(event)
    }
}

/// Delivers events over an `async-channel` to a UI task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: async_channel::Sender<PanelEvent>,
}

impl ChannelSink {
    pub fn unbounded() -> (Self, async_channel::Receiver<PanelEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl PanelSink for ChannelSink {
    fn emit(&self, event: PanelEvent) {
        if let Err(e) = self.tx.try_send(event) {
            log::debug!("Dropping panel event, receiver gone: {:?}", e.into_inner());
        }
    }
}

pub struct PanelBridge {
    store: Arc<TreeStore>,
    index: Arc<IndexTable>,
    sync: Arc<SyncController>,
    sink: Arc<dyn PanelSink>,
    fetch_timeout: Option<Duration>,
}

impl fmt::Debug for PanelBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelBridge")
            .field("store", &self.store)
            .field("index_entries", &self.index.len())
            .field("sync", &self.sync)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl PanelBridge {
    pub fn new(
        store: Arc<TreeStore>,
        index: Arc<IndexTable>,
        sync: Arc<SyncController>,
        sink: Arc<dyn PanelSink>,
    ) -> Self {
        Self {
            store,
            index,
            sync,
            sink,
            fetch_timeout: None,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Content panel navigated to `notification.url`.
    ///
    /// Emits `Expanded` for every ancestor the controller opened, then
    /// `Highlight`, or `ExpandFailed` if an ancestor could not be loaded.
    pub async fn page_changed(&self, notification: PageChanged) -> Result<Option<SyncOutcome>, NavError> {
        let outcome = self
            .sync
            .on_page_changed(&notification.url, &self.index, &self.store)
            .await?;
        let Some(outcome) = outcome else {
            return Ok(None);
        };

        for ancestor in &outcome.expanded {
            self.sink.emit(PanelEvent::Expanded {
                path: ancestor.clone(),
                children: self.store.children_views(ancestor)?,
            });
        }
        match &outcome.failure {
            None => self.sink.emit(PanelEvent::Highlight {
                path: outcome.path.clone(),
            }),
            Some(failure) => self.sink.emit(PanelEvent::ExpandFailed {
                path: failure.path.clone(),
                message: failure.error.to_string(),
            }),
        }
        Ok(Some(outcome))
    }

    /// The user opened a node in the tree widget.
    ///
    /// Fetch and payload failures are also emitted as `ExpandFailed`; an
    /// invalid path is only returned, since it signals a wiring bug.
    pub async fn expand(&self, path: &[usize]) -> Result<Vec<NodeView>, NavError> {
        match expand_within(&self.store, path, self.fetch_timeout).await {
            Ok(_) => {
                let children = self.store.children_views(path)?;
                self.sink.emit(PanelEvent::Expanded {
                    path: path.to_vec(),
                    children: children.clone(),
                });
                Ok(children)
            }
            Err(error @ StoreError::InvalidPath { .. }) => Err(error.into()),
            Err(error) => {
                self.sink.emit(PanelEvent::ExpandFailed {
                    path: path.to_vec(),
                    message: error.to_string(),
                });
                Err(error.into())
            }
        }
    }

    /// The user closed a node in the tree widget.
    pub fn collapse(&self, path: &[usize]) -> Result<(), NavError> {
        self.store.collapse(path)?;
        self.sink.emit(PanelEvent::Collapsed {
            path: path.to_vec(),
        });
        Ok(())
    }

    /// The user clicked the sync toggle.
    pub fn toggle_sync(&self) -> SyncToggle {
        let toggle = self.sync.toggle();
        self.sink.emit(PanelEvent::SyncStatus {
            state: toggle.state,
            message: toggle.message.clone(),
        });
        toggle
    }

    /// Views for the initial render of the root list.
    pub fn root_views(&self) -> Vec<NodeView> {
        self.store.root_views()
    }
}
