//! Startup payload sources.
//!
//! A documentation browser session starts from one bundle: the root tree
//! payload, the sparse nav index and, optionally, the two sync status strings.
//!
//! ## Available Sources
//!
//! - `ScriptSource`: generated `navtreedata.js` text
//!   (`var NAVTREE = [...]; var NAVTREEINDEX = [...]; var SYNCONMSG = '...';`)
//! - `JsonSource`: `{"root": [...], "index": [...], "messages": {...}}`
//! - `FileSource`: either of the above read from disk, picked by extension
//!
//! ## Example
//!
//! ```ignore
//! use navtree_source::{BundleSource, FileSource};
//!
//! let bundle = FileSource::new("html/navtreedata.js").load()?;
//! println!("{} root nodes, {} index entries", bundle.root.len(), bundle.index.len());
//! ```

use navtree_types::script::{find_assignment, parse_string_literal};
use navtree_types::{IndexEntry, Node, PayloadError, decode_index, decode_nodes_lossy};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Malformed navigation payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Payload(PayloadError::from(err))
    }
}

/// Status strings shipped with the generated data. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleMessages {
    /// Shown while synchronisation is on (it invites the user to disable it).
    pub sync_on: Option<String>,
    /// Shown while synchronisation is off.
    pub sync_off: Option<String>,
}

/// Everything a navigation session is initialised from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavBundle {
    pub root: Vec<Node>,
    /// Index entries in payload order. Slot ordering is validated by the index table.
    pub index: Vec<IndexEntry>,
    pub messages: BundleMessages,
}

impl NavBundle {
    /// Parses a generated `navtreedata.js` script.
    ///
    /// `NAVTREE` is required; the index and the messages are optional.
    /// Malformed tree entries are dropped or kept as leaves, never fatal.
    pub fn from_script(text: &str) -> Result<Self, SourceError> {
        let tree = find_assignment(text, "NAVTREE")
            .ok_or_else(|| PayloadError::MissingAssignment("NAVTREE".to_string()))?;
        let root = decode_root(&serde_json::from_str(tree)?)?;

        let index = match find_assignment(text, "NAVTREEINDEX") {
            Some(expr) => decode_index(&serde_json::from_str(expr)?)?,
            None => {
                log::debug!("Navigation script has no NAVTREEINDEX; sync lookups will miss");
                Vec::new()
            }
        };

        let messages = BundleMessages {
            sync_on: find_assignment(text, "SYNCONMSG")
                .map(parse_string_literal)
                .transpose()?,
            sync_off: find_assignment(text, "SYNCOFFMSG")
                .map(parse_string_literal)
                .transpose()?,
        };

        Ok(Self {
            root,
            index,
            messages,
        })
    }

    /// Decodes the JSON bundle form. Only `root` is required.
    pub fn from_json(value: &Value) -> Result<Self, SourceError> {
        let root = match value.get("root") {
            Some(root) => decode_root(root)?,
            None => {
                return Err(PayloadError::NotAnArray {
                    expected: "root nodes",
                    found: "nothing",
                }
                .into());
            }
        };
        let index = match value.get("index") {
            Some(index) => decode_index(index)?,
            None => Vec::new(),
        };
        let message = |key: &str| {
            value
                .get("messages")
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Ok(Self {
            root,
            index,
            messages: BundleMessages {
                sync_on: message("syncOn"),
                sync_off: message("syncOff"),
            },
        })
    }
}

/// Decodes the root payload. Malformed entries are logged and recovered so
/// that the rest of the tree stays usable.
fn decode_root(value: &Value) -> Result<Vec<Node>, PayloadError> {
    let (root, issues) = decode_nodes_lossy(value)?;
    for issue in &issues {
        log::warn!("Recovered malformed navigation entry: {}", issue);
    }
    Ok(root)
}

/// A source that produces the startup bundle.
pub trait BundleSource {
    fn load(&self) -> Result<NavBundle, SourceError>;

    /// Returns a human-readable name for this source (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Generated `navtreedata.js` text held in memory.
pub struct ScriptSource {
    text: String,
}

impl ScriptSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl BundleSource for ScriptSource {
    fn load(&self) -> Result<NavBundle, SourceError> {
        NavBundle::from_script(&self.text)
    }

    fn name(&self) -> &'static str {
        "ScriptSource"
    }
}

/// A JSON bundle held in memory.
pub struct JsonSource {
    value: Value,
}

impl JsonSource {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl BundleSource for JsonSource {
    fn load(&self) -> Result<NavBundle, SourceError> {
        NavBundle::from_json(&self.value)
    }

    fn name(&self) -> &'static str {
        "JsonSource"
    }
}

/// Reads a bundle from disk. `.js` files are parsed as generated scripts,
/// anything else as JSON.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BundleSource for FileSource {
    fn load(&self) -> Result<NavBundle, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let is_script = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("js"));

        let bundle = if is_script {
            NavBundle::from_script(&text)?
        } else {
            NavBundle::from_json(&serde_json::from_str(&text)?)?
        };
        log::debug!(
            "Loaded navigation bundle from {}: {} root nodes, {} index entries",
            self.path.display(),
            bundle.root.len(),
            bundle.index.len()
        );
        Ok(bundle)
    }

    fn name(&self) -> &'static str {
        "FileSource"
    }
}

// Blanket implementation for Box<dyn BundleSource>
impl BundleSource for Box<dyn BundleSource> {
    fn load(&self) -> Result<NavBundle, SourceError> {
        (**self).load()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
