//! Session wiring.
//!
//! A [`NavSession`] is owned by the documentation-browser shell: it is built
//! once from the startup bundle and dropped with the session.

use crate::bridge::{PanelBridge, PanelEvent, PanelSink};
use crate::config::NavConfig;
use crate::error::NavError;
use crate::sync::SyncController;
use navtree_index::IndexTable;
use navtree_source::{BundleSource, NavBundle};
use navtree_store::TreeStore;
use navtree_traits::{InMemoryPreferenceStore, SubtreeFetcher, SyncPreferenceStore};
use std::sync::Arc;

#[derive(Debug)]
pub struct NavSession {
    config: NavConfig,
    store: Arc<TreeStore>,
    index: Arc<IndexTable>,
    sync: Arc<SyncController>,
    bridge: PanelBridge,
}

impl NavSession {
    pub fn builder() -> NavSessionBuilder {
        NavSessionBuilder::new()
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<IndexTable> {
        &self.index
    }

    pub fn sync(&self) -> &Arc<SyncController> {
        &self.sync
    }

    pub fn bridge(&self) -> &PanelBridge {
        &self.bridge
    }
}

#[derive(Default)]
pub struct NavSessionBuilder {
    config: Option<NavConfig>,
    bundle: Option<NavBundle>,
    fetcher: Option<Arc<dyn SubtreeFetcher>>,
    preference: Option<Arc<dyn SyncPreferenceStore>>,
    sink: Option<Arc<dyn PanelSink>>,
}

impl NavSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: NavConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_bundle(mut self, bundle: NavBundle) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn with_source(self, source: &dyn BundleSource) -> Result<Self, NavError> {
        log::debug!("Loading navigation bundle from {}", source.name());
        Ok(self.with_bundle(source.load()?))
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SubtreeFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_preference_store(mut self, preference: Arc<dyn SyncPreferenceStore>) -> Self {
        self.preference = Some(preference);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn PanelSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the session.
    ///
    /// A malformed index does not fail the build: it is logged and replaced
    /// by an empty index, leaving sync to match page URLs directly.
    pub fn build(self) -> Result<NavSession, NavError> {
        let bundle = self
            .bundle
            .ok_or_else(|| NavError::Config("No navigation bundle provided".to_string()))?;
        let fetcher = self
            .fetcher
            .ok_or_else(|| NavError::Config("No subtree fetcher provided".to_string()))?;
        let preference = self
            .preference
            .unwrap_or_else(|| Arc::new(InMemoryPreferenceStore::new()));
        let sink = self.sink.unwrap_or_else(|| {
            Arc::new(|event: PanelEvent| log::trace!("Unobserved panel event: {:?}", event))
        });

        let mut config = self.config.unwrap_or_default();
        config.merge_bundle_messages(&bundle.messages);

        let index = IndexTable::load(bundle.index).unwrap_or_else(|e| {
            log::warn!("Ignoring nav index: {}", e);
            IndexTable::default()
        });

        let store = Arc::new(TreeStore::new(bundle.root, fetcher));
        let index = Arc::new(index);
        let sync = Arc::new(
            SyncController::new(
                config.sync_messages.clone(),
                config.sync_by_default,
                preference,
            )
            .with_fetch_timeout(config.fetch_timeout()),
        );
        let bridge = PanelBridge::new(store.clone(), index.clone(), sync.clone(), sink)
            .with_fetch_timeout(config.fetch_timeout());

        Ok(NavSession {
            config,
            store,
            index,
            sync,
            bridge,
        })
    }
}
