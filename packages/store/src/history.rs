//! # History: every category merged into one feed
//!
//! [`aggregate`] flattens a [`Snapshot`] into [`HistoryEntry`] values and orders them
//! newest first by their primary timestamp. Entries keep an id of the form
//! `<prefix>_<index>`, the index being the position in the stored array.
//!
//! Timestamps come from several writers, so [`parse_timestamp`] accepts:
//!
//! - RFC 3339 (`2024-01-01T10:00:00.000Z`), written for "now" events;
//! - `YYYY-MM-DD HH:MM`, written by the nap picker;
//! - `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS[.fff]`;
//! - `YYYY-MM-DD`, written for milestones.
//!
//! Values without an offset are read as UTC. Anything else sorts as the Unix epoch,
//! i.e. last, and the sort is stable so such entries keep their relative order.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::log::Snapshot;
use crate::models::{Activity, Category, LogEntry};

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// One row of the merged history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub timestamp: String,
    pub data: Activity,
}

impl HistoryEntry {
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.parsed_timestamp().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

fn push_all<T: LogEntry>(out: &mut Vec<HistoryEntry>, logs: &[T]) {
    let category = T::CATEGORY;
    out.extend(logs.iter().enumerate().map(|(index, log)| HistoryEntry {
        id: format!("{}_{index}", category.id_prefix()),
        category,
        timestamp: log.timestamp().to_string(),
        data: log.clone().into_activity(),
    }));
}

/// Merge all categories, newest first.
pub fn aggregate(snapshot: &Snapshot) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();
    push_all(&mut entries, &snapshot.diapers);
    push_all(&mut entries, &snapshot.feedings);
    push_all(&mut entries, &snapshot.naps);
    push_all(&mut entries, &snapshot.milestones);
    push_all(&mut entries, &snapshot.moods);
    push_all(&mut entries, &snapshot.pumping);

    entries.sort_by_cached_key(|entry| Reverse(entry.sort_key()));
    entries
}

/// Category selector of the history screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryFilter {
    #[default]
    All,
    Only(Category),
}

impl HistoryFilter {
    pub fn matches(self, entry: &HistoryEntry) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Only(category) => entry.category == category,
        }
    }

    pub fn apply(self, entries: &[HistoryEntry]) -> Vec<&HistoryEntry> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}
