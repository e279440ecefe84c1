//! # Device key-value storage
//!
//! Everything the app keeps on the device (activity logs, the session, the community
//! cache) is a string value under a well-known key. [`KeyValueStore`] is the seam:
//! [`MemoryStore`](crate::MemoryStore) for tests, [`FileStore`](crate::FileStore) on
//! desktop and mobile, and [`ObservedStore`](crate::ObservedStore) wrapping either to
//! announce writes.
//!
//! Keys are restricted to ASCII letters, digits, `_` and `-` so they map one-to-one
//! onto file names.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Async string store keyed by short identifiers.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: &str, value: String)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Read and decode a JSON value; `None` when the key is absent.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    store.set(key, serde_json::to_string(value)?).await
}

/// A stored array before its elements are decoded.
#[derive(Debug, PartialEq)]
pub enum StoredList {
    Missing,
    Items(Vec<Value>),
    /// The value is not a JSON array; kept verbatim.
    Unreadable(String),
}

pub async fn read_list<S: KeyValueStore>(store: &S, key: &str) -> Result<StoredList, StoreError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(StoredList::Missing);
    };
    Ok(match serde_json::from_str(&raw) {
        Ok(items) => StoredList::Items(items),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored list is not a JSON array");
            StoredList::Unreadable(raw)
        }
    })
}

/// Decode each element on its own, skipping (and logging) the ones that do not fit `T`.
pub fn decode_items<T: DeserializeOwned>(key: &str, items: &[Value]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key, index, error = %e, "skipping unreadable list element");
                None
            }
        })
        .collect()
}

/// Decode a JSON array element by element.
///
/// A missing or unreadable value reads as empty and a bad element is skipped, so one
/// corrupt record never hides its siblings or the other keys.
pub async fn get_list<S, T>(store: &S, key: &str) -> Result<Vec<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    Ok(match read_list(store, key).await? {
        StoredList::Items(items) => decode_items(key, &items),
        StoredList::Missing | StoredList::Unreadable(_) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("logs_diapers").is_ok());
        assert!(validate_key("surveyCompleted").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../token").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        assert_eq!(get_json::<_, Vec<i64>>(&store, "ids").await.unwrap(), None);

        set_json(&store, "ids", &[3, 1, 2]).await.unwrap();
        assert_eq!(get_json(&store, "ids").await.unwrap(), Some(vec![3, 1, 2]));
        assert_eq!(get_list::<_, i64>(&store, "ids").await.unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_corrupt_list_reads_empty() {
        let store = MemoryStore::new();
        store.set("ids", "{not json".into()).await.unwrap();
        assert!(get_list::<_, i64>(&store, "ids").await.unwrap().is_empty());
        assert!(get_json::<_, Vec<i64>>(&store, "ids").await.is_err());
        assert_eq!(
            read_list(&store, "ids").await.unwrap(),
            StoredList::Unreadable("{not json".into())
        );
    }

    #[tokio::test]
    async fn test_bad_elements_are_skipped_individually() {
        let store = MemoryStore::new();
        store.set("ids", r#"[3, "x", null, 1]"#.into()).await.unwrap();
        assert_eq!(get_list::<_, i64>(&store, "ids").await.unwrap(), vec![3, 1]);
        assert_eq!(read_list(&store, "missing").await.unwrap(), StoredList::Missing);
    }
}
