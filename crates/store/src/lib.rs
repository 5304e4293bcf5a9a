//! # navtree-store
//!
//! Owns the navigation hierarchy for one browser session.
//!
//! Nodes live in an arena addressed by index. A node whose children are a
//! subtree reference stays unresolved until it is first expanded; the payload
//! is then fetched, decoded and spliced in place, so later expansions are
//! served from memory. Concurrent expansions of the same reference share a
//! single in-flight fetch.

mod error;
mod store;

pub use error::StoreError;
pub use store::TreeStore;
