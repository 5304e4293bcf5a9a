//! Filesystem implementations of the navtree platform traits.
//!
//! ## Available Implementations
//!
//! - [`FilesystemSubtreeFetcher`]: Loads generated `<token>.js` / `<token>.json` subtree files
//! - [`FilesystemPreferenceStore`]: Persists the sync preference in a small file
//!
//! ## Re-exports
//!
//! For convenience, the in-memory variants from navtree-traits:
//! - [`InMemorySubtreeFetcher`]
//! - [`InMemoryPreferenceStore`]

mod filesystem;
mod preference;

pub use filesystem::FilesystemSubtreeFetcher;
pub use preference::FilesystemPreferenceStore;

pub use navtree_traits::{InMemoryPreferenceStore, InMemorySubtreeFetcher};
