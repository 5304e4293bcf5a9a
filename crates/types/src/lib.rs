//! Foundation data types for the navigation panel.
//!
//! - [`Node`] / [`NodeChildren`]: one entry of the nav tree, possibly with a
//!   lazily fetched subtree.
//! - [`IndexEntry`]: one representative anchor of the sparse nav index.
//! - [`NodeView`]: what the tree widget renders for a node.
//! - [`payload`]: decoding of the generator's node/index payloads.
//! - [`script`]: extraction of `var NAME = ...;` assignments from generated scripts.

pub mod index;
pub mod node;
pub mod payload;
pub mod script;

pub use index::{IndexEntry, split_fragment};
pub use node::{Node, NodeChildren, NodePath, NodeView};
pub use payload::{
    PayloadError, decode_index, decode_node, decode_nodes, decode_nodes_lossy, decode_subtree,
};
