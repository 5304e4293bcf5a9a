use serde::Serialize;

/// One representative anchor of the nav index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// 0-based ordinal, strictly increasing across the index.
    pub slot: u32,
    /// Page URL, optionally followed by `#anchor`.
    pub fragment: String,
}

impl IndexEntry {
    pub fn new(slot: u32, fragment: impl Into<String>) -> Self {
        Self {
            slot,
            fragment: fragment.into(),
        }
    }

    /// The page portion of the fragment (everything before `#`).
    pub fn url(&self) -> &str {
        split_fragment(&self.fragment).0
    }

    pub fn anchor(&self) -> Option<&str> {
        split_fragment(&self.fragment).1
    }
}

/// Splits `page.html#anchor` into `("page.html", Some("anchor"))`.
pub fn split_fragment(fragment: &str) -> (&str, Option<&str>) {
    match fragment.split_once('#') {
        Some((url, anchor)) => (url, Some(anchor)),
        None => (fragment, None),
    }
}
