//! The on-device activity log: one capped JSON array per category, newest first.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Caps;
use crate::error::StoreError;
use crate::kv::{decode_items, get_list, read_list, set_json, KeyValueStore, StoredList};
use crate::models::{DiaperLog, FeedingLog, LogEntry, MilestoneLog, MoodLog, NapLog, PumpLog};

/// Typed access to the per-category log arrays of one store.
#[derive(Clone, Debug)]
pub struct ActivityLog<S> {
    store: S,
    caps: Caps,
    /// Serialises read-modify-write appends made through this handle and its clones.
    appends: Arc<Mutex<()>>,
}

/// Every category array, read in one pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub diapers: Vec<DiaperLog>,
    pub feedings: Vec<FeedingLog>,
    pub naps: Vec<NapLog>,
    pub milestones: Vec<MilestoneLog>,
    pub moods: Vec<MoodLog>,
    pub pumping: Vec<PumpLog>,
}

impl<S: KeyValueStore> ActivityLog<S> {
    pub fn new(store: S) -> Self {
        Self::with_caps(store, Caps::default())
    }

    pub fn with_caps(store: S, caps: Caps) -> Self {
        Self {
            store,
            caps,
            appends: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    /// Entries of one category, newest first. Elements that do not decode are skipped.
    pub async fn entries<T: LogEntry>(&self) -> Result<Vec<T>, StoreError> {
        get_list(&self.store, T::CATEGORY.key()).await
    }

    /// Prepend `entry`, dropping the oldest entries beyond the category cap.
    /// Returns the decodable part of the stored array.
    ///
    /// Stored elements that do not decode are written back untouched. A value that is
    /// not an array at all is moved to `<key>-unreadable` before a new array starts.
    pub async fn append<T: LogEntry>(&self, entry: T) -> Result<Vec<T>, StoreError> {
        let _guard = self.appends.lock().await;
        let key = T::CATEGORY.key();

        let mut items = match read_list(&self.store, key).await? {
            StoredList::Missing => Vec::new(),
            StoredList::Items(items) => items,
            StoredList::Unreadable(raw) => {
                let backup = format!("{key}-unreadable");
                tracing::warn!(key, backup = %backup, "moving unreadable log aside");
                self.store.set(&backup, raw).await?;
                Vec::new()
            }
        };
        items.insert(0, serde_json::to_value(&entry)?);
        items.truncate(self.caps.for_category(T::CATEGORY));
        set_json(&self.store, key, &items).await?;

        tracing::debug!(category = %T::CATEGORY, len = items.len(), "logged activity");
        Ok(decode_items(key, &items))
    }

    /// Drop every entry of one category.
    pub async fn clear<T: LogEntry>(&self) -> Result<(), StoreError> {
        let _guard = self.appends.lock().await;
        self.store.remove(T::CATEGORY.key()).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            diapers: self.entries().await?,
            feedings: self.entries().await?,
            naps: self.entries().await?,
            milestones: self.entries().await?,
            moods: self.entries().await?,
            pumping: self.entries().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::aggregate;
    use crate::models::{DiaperKind, Mood};
    use crate::MemoryStore;

    fn diaper(time: &str) -> DiaperLog {
        DiaperLog {
            time: time.into(),
            kind: DiaperKind::Pee,
            color: None,
            consistency: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_append_prepends_and_caps() {
        let caps = Caps {
            diapers: 2,
            ..Caps::default()
        };
        let log = ActivityLog::with_caps(MemoryStore::new(), caps);

        log.append(diaper("2024-01-01T08:00:00Z")).await.unwrap();
        log.append(diaper("2024-01-01T09:00:00Z")).await.unwrap();
        let stored = log.append(diaper("2024-01-01T10:00:00Z")).await.unwrap();

        let times: Vec<&str> = stored.iter().map(|d| d.time.as_str()).collect();
        assert_eq!(times, ["2024-01-01T10:00:00Z", "2024-01-01T09:00:00Z"]);
        assert_eq!(log.entries::<DiaperLog>().await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_corrupt_category_does_not_affect_others() {
        let store = MemoryStore::new();
        store.set("logs_diapers", "[{\"oops\"".into()).await.unwrap();
        let log = ActivityLog::new(store.clone());

        log.append(MoodLog {
            time: "2024-01-01T10:00:00Z".into(),
            mood: Mood::Calm,
            notes: None,
        })
        .await
        .unwrap();

        let snapshot = log.snapshot().await.unwrap();
        assert!(snapshot.diapers.is_empty());
        assert_eq!(snapshot.moods.len(), 1);

        // The unreadable value is kept aside, not overwritten.
        log.append(diaper("2024-01-02T10:00:00Z")).await.unwrap();
        assert_eq!(log.entries::<DiaperLog>().await.unwrap().len(), 1);
        assert_eq!(
            store.get("logs_diapers-unreadable").await.unwrap().as_deref(),
            Some("[{\"oops\"")
        );
    }

    #[tokio::test]
    async fn test_bad_entry_keeps_its_siblings() {
        let store = MemoryStore::new();
        store
            .set(
                "logs_diapers",
                r#"[{"time":"2024-01-02T10:00:00.000Z","type":"pee"},{"time":null,"type":"poop"},{"time":"2024-01-01T10:00:00Z","type":"sideways"}]"#
                    .into(),
            )
            .await
            .unwrap();
        let log = ActivityLog::new(store.clone());

        let history = aggregate(&log.snapshot().await.unwrap());
        let times: Vec<&str> = history.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(times, ["2024-01-02T10:00:00.000Z", ""]);

        let stored = log.append(diaper("2024-01-03T10:00:00Z")).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].time, "2024-01-02T10:00:00.000Z");

        // The undecodable element survives the rewrite.
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&store.get("logs_diapers").await.unwrap().unwrap()).unwrap();
        assert_eq!(raw.len(), 4);
        assert_eq!(raw[3]["type"], "sideways");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let log = ActivityLog::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..10 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(diaper(&format!("2024-01-01T10:{i:02}:00Z")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(log.entries::<DiaperLog>().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_clear() {
        let log = ActivityLog::new(MemoryStore::new());
        log.append(diaper("2024-01-01T10:00:00Z")).await.unwrap();
        log.clear::<DiaperLog>().await.unwrap();
        assert!(log.entries::<DiaperLog>().await.unwrap().is_empty());
    }
}
