//! # Tracker configuration: `tracker.toml`
//!
//! Tuning for the on-device tracker, read from an optional TOML file next to the
//! stored data.
//!
//! ## Structure
//!
//! ```toml
//! [caps]
//! diapers = 30        # entries kept per category, oldest dropped
//! feedings = 30
//! naps = 20
//! milestones = 50
//! moods = 50
//! pumping = 30
//!
//! [refresh]
//! interval_secs = 5   # history/summary safety-net refresh
//! ```
//!
//! Every field has a default, so a missing or empty file is the default configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Top-level configuration stored in `tracker.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub caps: Caps,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Maximum entries kept per category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    pub diapers: usize,
    pub feedings: usize,
    pub naps: usize,
    pub milestones: usize,
    pub moods: usize,
    pub pumping: usize,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            diapers: 30,
            feedings: 30,
            naps: 20,
            milestones: 50,
            moods: 50,
            pumping: 30,
        }
    }
}

impl Caps {
    pub fn for_category(&self, category: Category) -> usize {
        match category {
            Category::Diaper => self.diapers,
            Category::Feeding => self.feedings,
            Category::Nap => self.naps,
            Category::Milestone => self.milestones,
            Category::Mood => self.moods,
            Category::Pumping => self.pumping,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between safety-net refreshes. Writes through the app refresh immediately.
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    5
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
        }
    }
}

impl RefreshConfig {
    /// Never zero; a zero setting falls back to one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl TrackerConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "tracker.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load `tracker.toml` from `dir`, falling back to defaults when absent or invalid.
    pub async fn load(dir: &std::path::Path) -> Self {
        let path = dir.join(Self::filename());
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Self::from_toml(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid tracker config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = TrackerConfig::from_toml("").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.caps.for_category(Category::Nap), 20);
        assert_eq!(config.caps.for_category(Category::Milestone), 50);
        assert_eq!(config.refresh.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_override() {
        let config = TrackerConfig::from_toml("[caps]\nnaps = 3\n[refresh]\ninterval_secs = 0\n")
            .unwrap();
        assert_eq!(config.caps.naps, 3);
        assert_eq!(config.caps.diapers, 30);
        assert_eq!(config.refresh.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = TrackerConfig::default();
        config.caps.moods = 7;
        let parsed = TrackerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[tokio::test]
    async fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(TrackerConfig::load(dir.path()).await, TrackerConfig::default());

        std::fs::write(dir.path().join("tracker.toml"), "[caps]\nfeedings = 4\n").unwrap();
        assert_eq!(TrackerConfig::load(dir.path()).await.caps.feedings, 4);

        std::fs::write(dir.path().join("tracker.toml"), "caps = 1").unwrap();
        assert_eq!(TrackerConfig::load(dir.path()).await, TrackerConfig::default());
    }
}
