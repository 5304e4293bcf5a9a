pub mod fetcher;
pub mod preference;

pub use fetcher::{FetchError, InMemorySubtreeFetcher, SharedPayload, SubtreeFetcher};
pub use preference::{InMemoryPreferenceStore, PreferenceError, SyncPreferenceStore};
