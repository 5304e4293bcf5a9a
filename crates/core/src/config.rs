//! Session configuration.
//!
//! ```json
//! {
//!   "syncMessages": {
//!     "syncEnabled": "click to disable panel synchronisation",
//!     "syncDisabled": "click to enable panel synchronisation"
//!   },
//!   "syncByDefault": true,
//!   "fetchTimeoutMs": 5000
//! }
//! ```
//!
//! Every field is optional. `NAVTREE_SYNC_DEFAULT` and
//! `NAVTREE_FETCH_TIMEOUT_MS` override the file values.

use crate::error::NavError;
use navtree_source::BundleMessages;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SYNC_ENABLED_MESSAGE: &str = "click to disable panel synchronisation";
pub const DEFAULT_SYNC_DISABLED_MESSAGE: &str = "click to enable panel synchronisation";

const ENV_SYNC_DEFAULT: &str = "NAVTREE_SYNC_DEFAULT";
const ENV_FETCH_TIMEOUT: &str = "NAVTREE_FETCH_TIMEOUT_MS";

/// The two status strings of the sync toggle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncMessages {
    /// Shown after synchronisation has been switched on.
    pub sync_enabled: String,
    /// Shown after synchronisation has been switched off.
    pub sync_disabled: String,
}

impl Default for SyncMessages {
    fn default() -> Self {
        Self {
            sync_enabled: DEFAULT_SYNC_ENABLED_MESSAGE.to_string(),
            sync_disabled: DEFAULT_SYNC_DISABLED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavConfig {
    pub sync_messages: SyncMessages,
    /// Initial sync state when no saved preference exists.
    pub sync_by_default: bool,
    /// Upper bound on a single subtree fetch. `None` waits indefinitely.
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            sync_messages: SyncMessages::default(),
            sync_by_default: true,
            fetch_timeout_ms: None,
        }
    }
}

impl NavConfig {
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies `NAVTREE_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, NavError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, NavError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SYNC_DEFAULT) {
            self.sync_by_default = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                other => {
                    return Err(NavError::Config(format!(
                        "{ENV_SYNC_DEFAULT} must be a boolean, got '{other}'"
                    )));
                }
            };
        }
        if let Some(raw) = lookup(ENV_FETCH_TIMEOUT) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                NavError::Config(format!("{ENV_FETCH_TIMEOUT} must be milliseconds, got '{raw}'"))
            })?;
            self.fetch_timeout_ms = (ms > 0).then_some(ms);
        }
        Ok(self)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Adopts the generator's status strings for any message still at its default.
    pub fn merge_bundle_messages(&mut self, messages: &BundleMessages) {
        if let Some(on) = &messages.sync_on
            && self.sync_messages.sync_enabled == DEFAULT_SYNC_ENABLED_MESSAGE
        {
            self.sync_messages.sync_enabled = on.clone();
        }
        if let Some(off) = &messages.sync_off
            && self.sync_messages.sync_disabled == DEFAULT_SYNC_DISABLED_MESSAGE
        {
            self.sync_messages.sync_disabled = off.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NavConfig::default();
        assert!(config.sync_by_default);
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(config.sync_messages.sync_enabled, DEFAULT_SYNC_ENABLED_MESSAGE);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NavConfig::from_json(r#"{"syncMessages": {"syncDisabled": "sync is off"}, "fetchTimeoutMs": 250}"#)
            .unwrap();
        assert_eq!(config.sync_messages.sync_enabled, DEFAULT_SYNC_ENABLED_MESSAGE);
        assert_eq!(config.sync_messages.sync_disabled, "sync is off");
        assert_eq!(config.fetch_timeout(), Some(Duration::from_millis(250)));
        assert!(config.sync_by_default);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(NavConfig::from_json("{"), Err(NavError::Json(_))));
    }

    #[test]
    fn test_overrides() {
        let config = NavConfig::default()
            .with_overrides(overrides(&[(ENV_SYNC_DEFAULT, "off"), (ENV_FETCH_TIMEOUT, "1500")]))
            .unwrap();
        assert!(!config.sync_by_default);
        assert_eq!(config.fetch_timeout_ms, Some(1500));

        let config = config
            .with_overrides(overrides(&[(ENV_FETCH_TIMEOUT, "0")]))
            .unwrap();
        assert_eq!(config.fetch_timeout_ms, None);
    }

    #[test]
    fn test_bad_overrides() {
        let result = NavConfig::default().with_overrides(overrides(&[(ENV_SYNC_DEFAULT, "sometimes")]));
        assert!(matches!(result, Err(NavError::Config(_))));

        let result = NavConfig::default().with_overrides(overrides(&[(ENV_FETCH_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(NavError::Config(_))));
    }

    #[test]
    fn test_bundle_messages_only_replace_defaults() {
        let mut config = NavConfig::from_json(r#"{"syncMessages": {"syncEnabled": "custom on"}}"#).unwrap();
        config.merge_bundle_messages(&BundleMessages {
            sync_on: Some("generated on".to_string()),
            sync_off: Some("generated off".to_string()),
        });
        assert_eq!(config.sync_messages.sync_enabled, "custom on");
        assert_eq!(config.sync_messages.sync_disabled, "generated off");
    }
}
