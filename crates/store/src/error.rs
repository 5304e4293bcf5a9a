use navtree_traits::FetchError;
use navtree_types::{NodePath, PayloadError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The path does not address a materialized node. This means the caller and
    /// the store disagree about the tree shape.
    #[error("Invalid node path {path:?}: nothing at depth {depth}")]
    InvalidPath { path: NodePath, depth: usize },

    /// The subtree could not be fetched; the node stays unresolved and collapsed.
    #[error("Failed to fetch subtree '{token}': {source}")]
    Fetch {
        token: String,
        #[source]
        source: FetchError,
    },

    /// The subtree payload was unusable; the node has been turned into a leaf.
    #[error("Malformed subtree '{token}': {source}")]
    MalformedSubtree {
        token: String,
        #[source]
        source: PayloadError,
    },
}
