//! Filesystem-based subtree fetcher.
//!
//! The documentation generator writes every lazily loaded subtree next to the
//! HTML pages as `<token>.js`. This fetcher resolves tokens to those files.
//! File access goes through `tokio::fs`, so fetches must run inside a Tokio runtime.
//!
//! # Security
//!
//! Tokens are validated so that resolved paths stay within the base
//! directory (no `../` escapes, no absolute paths).

use async_trait::async_trait;
use navtree_traits::{FetchError, SharedPayload, SubtreeFetcher};
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 2] = ["js", "json"];

/// A subtree fetcher that reads generated subtree files from a directory.
#[derive(Debug)]
pub struct FilesystemSubtreeFetcher {
    base_path: PathBuf,
    /// Canonicalized base path for security checks
    canonical_base: Option<PathBuf>,
}

impl FilesystemSubtreeFetcher {
    /// Creates a fetcher rooted at `base_path`, usually the generated HTML directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves `token` to an existing `<token>.js` or `<token>.json` file.
    ///
    /// Returns `None` if the token would escape the base directory or no file exists.
    async fn resolve_token(&self, token: &str) -> Option<PathBuf> {
        if token.is_empty() || Path::new(token).is_absolute() {
            return None;
        }
        if Path::new(token)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return None;
        }

        for ext in EXTENSIONS {
            let candidate = self.base_path.join(format!("{token}.{ext}"));
            let Ok(canonical) = tokio::fs::canonicalize(&candidate).await else {
                continue;
            };
            match &self.canonical_base {
                Some(base) if !canonical.starts_with(base) => continue,
                _ => return Some(canonical),
            }
        }
        None
    }
}

#[async_trait]
impl SubtreeFetcher for FilesystemSubtreeFetcher {
    async fn fetch(&self, token: &str) -> Result<SharedPayload, FetchError> {
        let path = self
            .resolve_token(token)
            .await
            .ok_or_else(|| FetchError::NotFound(token.to_string()))?;

        log::debug!("Reading subtree '{}' from {}", token, path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map(SharedPayload::from)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::NotFound(token.to_string())
                } else {
                    FetchError::Unavailable {
                        token: token.to_string(),
                        message: e.to_string(),
                    }
                }
            })
    }

    fn name(&self) -> &'static str {
        "FilesystemSubtreeFetcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_generated_script() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("globals_defs.js"),
            "var globals_defs =\n[\n    [ \"a\", \"globals_defs.html\", null ]\n];",
        )
        .unwrap();

        let fetcher = FilesystemSubtreeFetcher::new(dir.path());
        let payload = fetcher.fetch("globals_defs").await.unwrap();
        let nodes = navtree_types::decode_subtree(&payload).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].target.as_deref(), Some("globals_defs.html"));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("files.json"), "[]").unwrap();

        let fetcher = FilesystemSubtreeFetcher::new(dir.path());
        assert_eq!(&*fetcher.fetch("files").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_fetch_missing_token() {
        let dir = tempdir().unwrap();
        let fetcher = FilesystemSubtreeFetcher::new(dir.path());

        let result = fetcher.fetch("annotated_dup").await;
        assert!(matches!(result, Err(FetchError::NotFound(t)) if t == "annotated_dup"));
    }

    #[tokio::test]
    async fn test_fetch_blocks_path_traversal() {
        let outer = tempdir().unwrap();
        let base = outer.path().join("html");
        fs::create_dir(&base).unwrap();
        fs::write(outer.path().join("secret.js"), "[]").unwrap();

        let fetcher = FilesystemSubtreeFetcher::new(&base);
        assert!(fetcher.fetch("../secret").await.is_err());
        assert!(fetcher.fetch("/etc/passwd").await.is_err());
        assert!(fetcher.fetch("").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_nested_token() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nav")).unwrap();
        fs::write(dir.path().join("nav/modules.js"), "var modules = [];").unwrap();

        let fetcher = FilesystemSubtreeFetcher::new(dir.path());
        assert!(fetcher.fetch("nav/modules").await.is_ok());
    }

    #[tokio::test]
    async fn test_fetches_interleave_on_one_task() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("modules.js"), "var modules = [];").unwrap();
        fs::write(dir.path().join("files.js"), "var files = [];").unwrap();

        let fetcher = FilesystemSubtreeFetcher::new(dir.path());
        let (modules, files) = tokio::join!(fetcher.fetch("modules"), fetcher.fetch("files"));
        assert_eq!(&*modules.unwrap(), "var modules = [];");
        assert_eq!(&*files.unwrap(), "var files = [];");
    }
}
