//! # Filesystem-backed key-value store
//!
//! [`FileStore`] keeps each key in its own file so values survive app restarts on
//! desktop and mobile.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── logs_diapers.json
//! ├── token.json
//! └── ...
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a crash mid-write
//! leaves the previous value intact.
//!
//! ## Platform data directories
//!
//! [`FileStore::default_dir`] uses [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS / iOS | `~/Library/Application Support/mybean/` |
//! | Linux | `~/.local/share/mybean/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\mybean\` |
//! | Android | App-internal storage (via `dirs`) |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::kv::{validate_key, KeyValueStore};

const APP_DIR: &str = "mybean";

/// Filesystem-backed KeyValueStore for desktop and mobile persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Platform data directory, scoped to a user when one is given.
    pub fn default_dir(user_id: Option<i64>) -> PathBuf {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        match user_id {
            Some(id) => base.join(id.to_string()),
            None => base,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.base).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested");

        let store = FileStore::new(&base);
        assert_eq!(store.get("token").await.unwrap(), None);
        store.set("token", "abc".into()).await.unwrap();
        assert!(base.join("token.json").exists());
        assert!(!base.join("token.json.tmp").exists());

        let reopened = FileStore::new(&base);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));

        reopened.remove("token").await.unwrap();
        reopened.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.set("../escape", "x".into()).await.is_err());
        assert!(store.get("a/b").await.is_err());
    }

    #[test]
    fn test_default_dir_is_user_scoped() {
        let shared = FileStore::default_dir(None);
        let scoped = FileStore::default_dir(Some(42));
        assert!(shared.ends_with("mybean"));
        assert_eq!(scoped, shared.join("42"));
    }
}
