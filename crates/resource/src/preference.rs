//! File-backed sync preference.

use navtree_traits::{PreferenceError, SyncPreferenceStore};
use std::path::{Path, PathBuf};

/// Stores the preference as `1` or `0` in a single file.
///
/// A missing or unreadable file means "no preference saved".
#[derive(Debug)]
pub struct FilesystemPreferenceStore {
    path: PathBuf,
}

impl FilesystemPreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncPreferenceStore for FilesystemPreferenceStore {
    fn load(&self) -> Option<bool> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match contents.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other => {
                log::warn!(
                    "Ignoring unrecognised sync preference '{}' in {}",
                    other,
                    self.path.display()
                );
                None
            }
        }
    }

    fn save(&self, enabled: bool) -> Result<(), PreferenceError> {
        std::fs::write(&self.path, if enabled { "1" } else { "0" })
            .map_err(|e| PreferenceError::Persist(format!("{}: {}", self.path.display(), e)))
    }
}
