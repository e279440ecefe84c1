//! # Live history feed
//!
//! [`HistoryFeed`] keeps the merged history and today's summary current for the UI.
//! A background task recomputes them:
//!
//! - once at start;
//! - after every write to the [`ObservedStore`] backing the log;
//! - on a fixed interval, which catches writes made by another process to a shared
//!   [`FileStore`](crate::FileStore).
//!
//! The latest [`Feed`] is published through a `watch` channel. Dropping the
//! [`HistoryFeed`] stops the task.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::StoreError;
use crate::history::{aggregate, HistoryEntry};
use crate::kv::KeyValueStore;
use crate::log::ActivityLog;
use crate::observed::ObservedStore;
use crate::summary::TodaySummary;

/// Derived views of the activity log at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub entries: Vec<HistoryEntry>,
    pub today: TodaySummary,
    pub refreshed_at: DateTime<Utc>,
}

impl Feed {
    /// Read the log and compute the views. `now` carries the device's UTC offset, which
    /// decides the calendar day of "today".
    pub async fn load<S: KeyValueStore>(
        log: &ActivityLog<S>,
        now: DateTime<FixedOffset>,
    ) -> Result<Self, StoreError> {
        let snapshot = log.snapshot().await?;
        Ok(Self {
            entries: aggregate(&snapshot),
            today: TodaySummary::compute(&snapshot, now.date_naive(), *now.offset()),
            refreshed_at: now.with_timezone(&Utc),
        })
    }
}

pub struct HistoryFeed {
    feed: watch::Receiver<Feed>,
    task: JoinHandle<()>,
}

impl HistoryFeed {
    /// Start the refresher. Must be called within a Tokio runtime.
    ///
    /// `offset` is the device's UTC offset, e.g. `*chrono::Local::now().offset()`.
    pub fn spawn<S: KeyValueStore>(
        log: ActivityLog<ObservedStore<S>>,
        interval: Duration,
        offset: FixedOffset,
    ) -> Self {
        let (sender, feed) = watch::channel(Feed::default());
        let mut revisions = log.store().subscribe();

        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // The first tick completes immediately.
                tokio::select! {
                    _ = tick.tick() => {}
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                match Feed::load(&log, Utc::now().with_timezone(&offset)).await {
                    Ok(next) => {
                        if sender.send(next).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "history refresh failed"),
                }
            }
            tracing::debug!("history feed stopped");
        });

        Self { feed, task }
    }

    /// The most recently computed feed.
    pub fn latest(&self) -> Feed {
        self.feed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Feed> {
        self.feed.clone()
    }
}

impl Drop for HistoryFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mood, MoodLog};
    use crate::MemoryStore;

    const WAIT: Duration = Duration::from_secs(5);

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn mood(time: &str) -> MoodLog {
        MoodLog {
            time: time.into(),
            mood: Mood::Calm,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_feed_load_uses_today() {
        let log = ActivityLog::new(MemoryStore::new());
        let now = Utc::now();
        log.append(mood(&now.to_rfc3339())).await.unwrap();

        let feed = Feed::load(&log, now.with_timezone(&utc())).await.unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.refreshed_at, now);
        assert_eq!(feed.today, TodaySummary::default());
    }

    #[tokio::test]
    async fn test_refreshes_on_write() {
        let log = ActivityLog::new(ObservedStore::new(MemoryStore::new()));
        // Long interval: only the initial tick and writes can refresh.
        let feed = HistoryFeed::spawn(log.clone(), Duration::from_secs(3600), utc());
        let mut updates = feed.subscribe();

        log.append(mood("2024-01-01T10:00:00Z")).await.unwrap();
        log.append(mood("2024-01-02T10:00:00Z")).await.unwrap();

        let latest = tokio::time::timeout(WAIT, updates.wait_for(|f| f.entries.len() == 2))
            .await
            .expect("feed did not refresh")
            .unwrap()
            .clone();
        assert_eq!(latest.entries[0].timestamp, "2024-01-02T10:00:00Z");
        assert_eq!(feed.latest().entries.len(), 2);
    }

    #[tokio::test]
    async fn test_interval_catches_unobserved_writes() {
        let shared = MemoryStore::new();
        let log = ActivityLog::new(ObservedStore::new(shared.clone()));
        let feed = HistoryFeed::spawn(log, Duration::from_millis(20), utc());
        let mut updates = feed.subscribe();

        // Another writer on the same storage, bypassing the observed wrapper.
        ActivityLog::new(shared)
            .append(mood("2024-01-01T10:00:00Z"))
            .await
            .unwrap();

        tokio::time::timeout(WAIT, updates.wait_for(|f| f.entries.len() == 1))
            .await
            .expect("interval refresh did not run")
            .unwrap();
    }
}
