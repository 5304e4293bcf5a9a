//! # navtree
//!
//! Client-side navigation data for generated API documentation: the nav
//! tree with lazily fetched subtrees, the sparse nav index, panel
//! synchronisation and the bridge that feeds a tree widget.
//!
//! ## Example
//!
//! ```ignore
//! use navtree::{ChannelSink, NavConfig, PageChanged};
//! use std::sync::Arc;
//!
//! let (sink, events) = ChannelSink::unbounded();
//! let session = navtree::html_dir_session("docs/html", NavConfig::default().with_env_overrides()?)?
//!     .with_sink(Arc::new(sink))
//!     .build()?;
//!
//! session.bridge().expand(&[0]).await?;
//! session.bridge().page_changed(PageChanged::new("group__netbuf.html")).await?;
//! ```

pub use navtree_core::*;
pub use navtree_resource::{FilesystemPreferenceStore, FilesystemSubtreeFetcher};
pub use navtree_source::{FileSource, JsonSource, ScriptSource};

use std::path::Path;
use std::sync::Arc;

/// Name of the generated bundle script inside an HTML output directory.
pub const NAVTREE_DATA_FILE: &str = "navtreedata.js";

/// Prepares a session for a generated HTML directory.
///
/// Reads `navtreedata.js` from `dir` and fetches subtrees from the
/// `<token>.js` files next to it. The returned builder can still take a sink
/// and a preference store.
pub fn html_dir_session<P: AsRef<Path>>(
    dir: P,
    config: NavConfig,
) -> Result<NavSessionBuilder, NavError> {
    let dir = dir.as_ref();
    log::debug!("Opening navigation data in {}", dir.display());
    NavSession::builder()
        .with_config(config)
        .with_fetcher(Arc::new(FilesystemSubtreeFetcher::new(dir)))
        .with_source(&FileSource::new(dir.join(NAVTREE_DATA_FILE)))
}
