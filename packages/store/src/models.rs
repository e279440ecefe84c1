//! # Activity log entries
//!
//! One record type per tracked category. Field names and enum spellings match the
//! JSON the app has always written (`volumeOz`, `nextInHours`, lower-case enum values,
//! `AM`/`PM`), so existing device data keeps decoding.
//!
//! | Category | Record | Key | Timestamp field | Default cap |
//! |----------|--------|-----|-----------------|-------------|
//! | diaper | [`DiaperLog`] | `logs_diapers` | `time` | 30 |
//! | feeding | [`FeedingLog`] | `logs_feedings` | `time` | 30 |
//! | nap | [`NapLog`] | `logs_naps` | `start` | 20 |
//! | milestone | [`MilestoneLog`] | `logs_milestones` | `date` | 50 |
//! | mood | [`MoodLog`] | `logs_mood` | `time` | 50 |
//! | pumping | [`PumpLog`] | `logs_pumping` | `time` | 30 |

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// A tracked activity category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Diaper,
    Feeding,
    Nap,
    Milestone,
    Mood,
    Pumping,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Diaper,
        Category::Feeding,
        Category::Nap,
        Category::Milestone,
        Category::Mood,
        Category::Pumping,
    ];

    /// Storage key holding the category's array.
    pub fn key(self) -> &'static str {
        match self {
            Category::Diaper => "logs_diapers",
            Category::Feeding => "logs_feedings",
            Category::Nap => "logs_naps",
            Category::Milestone => "logs_milestones",
            Category::Mood => "logs_mood",
            Category::Pumping => "logs_pumping",
        }
    }

    /// Prefix of history entry ids (`<prefix>_<index>`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            Category::Pumping => "pump",
            other => other.as_str(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Diaper => "diaper",
            Category::Feeding => "feeding",
            Category::Nap => "nap",
            Category::Milestone => "milestone",
            Category::Mood => "mood",
            Category::Pumping => "pumping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `null` or an absent timestamp reads as `""`, which sorts as the epoch.
fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A record stored in one category array.
pub trait LogEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const CATEGORY: Category;

    /// The field the history is ordered by.
    fn timestamp(&self) -> &str;

    fn into_activity(self) -> Activity;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperKind {
    Pee,
    Poop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoolColor {
    Yellow,
    Green,
    Brown,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    Runny,
    Normal,
    Firm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiaperLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    #[serde(rename = "type")]
    pub kind: DiaperKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<StoolColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<Consistency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedingMethod {
    Breast,
    Formula,
    Mixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedingLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    pub method: FeedingMethod,
    /// Free text as entered, e.g. `"4 oz"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_in_hours: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NapLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub start: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub date: String,
    pub milestone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Fussy,
    Sleeping,
    Crying,
    Calm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meridiem {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpLog {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    /// Free text as entered; `"0"` when left blank.
    pub volume_oz: String,
    pub side: Side,
    pub ampm: Meridiem,
}

/// Any log record, tagged with its category.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Activity {
    Diaper(DiaperLog),
    Feeding(FeedingLog),
    Nap(NapLog),
    Milestone(MilestoneLog),
    Mood(MoodLog),
    Pumping(PumpLog),
}

impl Activity {
    pub fn category(&self) -> Category {
        match self {
            Activity::Diaper(_) => Category::Diaper,
            Activity::Feeding(_) => Category::Feeding,
            Activity::Nap(_) => Category::Nap,
            Activity::Milestone(_) => Category::Milestone,
            Activity::Mood(_) => Category::Mood,
            Activity::Pumping(_) => Category::Pumping,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Activity::Diaper(log) => log.timestamp(),
            Activity::Feeding(log) => log.timestamp(),
            Activity::Nap(log) => log.timestamp(),
            Activity::Milestone(log) => log.timestamp(),
            Activity::Mood(log) => log.timestamp(),
            Activity::Pumping(log) => log.timestamp(),
        }
    }
}

macro_rules! log_entry {
    ($record:ty, $category:ident, $field:ident) => {
        impl LogEntry for $record {
            const CATEGORY: Category = Category::$category;

            fn timestamp(&self) -> &str {
                &self.$field
            }

            fn into_activity(self) -> Activity {
                Activity::$category(self)
            }
        }
    };
}

log_entry!(DiaperLog, Diaper, time);
log_entry!(FeedingLog, Feeding, time);
log_entry!(NapLog, Nap, start);
log_entry!(MilestoneLog, Milestone, date);
log_entry!(MoodLog, Mood, time);
log_entry!(PumpLog, Pumping, time);
