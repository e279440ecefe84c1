//! Write notifications for a [`KeyValueStore`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Wraps a store and bumps a revision counter after every successful write.
///
/// Subscribers see the latest revision through a `watch` channel, so a burst of
/// writes wakes them once.
#[derive(Clone, Debug)]
pub struct ObservedStore<S> {
    inner: S,
    revision: Arc<watch::Sender<u64>>,
}

impl<S: KeyValueStore> ObservedStore<S> {
    pub fn new(inner: S) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner,
            revision: Arc::new(revision),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl<S: KeyValueStore> KeyValueStore for ObservedStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.set(key, value).await?;
        self.bump();
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await?;
        self.bump();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_writes_bump_revision() {
        let store = ObservedStore::new(MemoryStore::new());
        let mut changes = store.subscribe();
        assert_eq!(store.revision(), 0);

        store.set("token", "abc".into()).await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), 1);

        // Reads do not notify.
        store.get("token").await.unwrap();
        assert!(!changes.has_changed().unwrap());

        store.remove("token").await.unwrap();
        assert_eq!(store.revision(), 2);
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_notify() {
        let store = ObservedStore::new(MemoryStore::new());
        assert!(store.set("bad key", String::new()).await.is_err());
        assert_eq!(store.revision(), 0);
    }
}
