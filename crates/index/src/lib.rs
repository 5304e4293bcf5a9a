//! The nav index.
//!
//! The generator does not index every anchor; it samples representative
//! ones and assigns them strictly increasing slots. Looking up an arbitrary
//! URL therefore falls back from an exact match to the highest-slot entry on
//! the same page.

use navtree_types::{IndexEntry, split_fragment};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Malformed index: slot {slot} at position {position} does not follow slot {previous}")]
    MalformedIndex {
        position: usize,
        slot: u32,
        previous: u32,
    },
}

/// Immutable, validated nav index.
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
    /// Full fragment -> position in `entries`.
    exact: HashMap<String, usize>,
    /// Page URL -> position of the highest-slot entry on that page.
    by_url: HashMap<String, usize>,
}

impl IndexTable {
    /// Validates and indexes `entries`.
    ///
    /// # Errors
    ///
    /// `IndexError::MalformedIndex` if a slot is not strictly greater than the
    /// one before it (this covers duplicates).
    pub fn load(entries: Vec<IndexEntry>) -> Result<Self, IndexError> {
        for (position, pair) in entries.windows(2).enumerate() {
            if pair[1].slot <= pair[0].slot {
                return Err(IndexError::MalformedIndex {
                    position: position + 1,
                    slot: pair[1].slot,
                    previous: pair[0].slot,
                });
            }
        }

        let mut exact = HashMap::with_capacity(entries.len());
        let mut by_url = HashMap::new();
        // Slots ascend, so later inserts win and each map keeps the greatest slot.
        for (position, entry) in entries.iter().enumerate() {
            exact.insert(entry.fragment.clone(), position);
            by_url.insert(entry.url().to_string(), position);
        }

        log::debug!(
            "Loaded nav index: {} entries across {} pages",
            entries.len(),
            by_url.len()
        );
        Ok(Self {
            entries,
            exact,
            by_url,
        })
    }

    /// Builds a table from bare fragments, assigning slots by position.
    pub fn from_fragments<I, S>(fragments: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = fragments
            .into_iter()
            .zip(0u32..)
            .map(|(fragment, slot)| IndexEntry::new(slot, fragment))
            .collect();
        Self::load(entries)
    }

    /// Finds the entry governing `fragment`.
    ///
    /// An exact fragment match wins. Otherwise the entry with the greatest slot
    /// whose page URL equals the page URL of `fragment` is returned.
    pub fn lookup(&self, fragment: &str) -> Option<&IndexEntry> {
        if let Some(&position) = self.exact.get(fragment) {
            return self.entries.get(position);
        }
        let (url, _) = split_fragment(fragment);
        self.by_url
            .get(url)
            .and_then(|&position| self.entries.get(position))
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
