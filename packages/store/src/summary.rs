//! Today's totals for the home screen.
//!
//! Stored timestamps are UTC; "today" is the calendar day at the device's UTC offset,
//! so an entry logged at 20:00 in UTC-5 counts for that evening and not the next day.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::history::parse_timestamp;
use crate::log::Snapshot;

/// Counts for one local calendar day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub diapers: usize,
    pub feedings: usize,
    pub sleep_minutes: i64,
}

fn local_day(raw: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|at| at.with_timezone(offset).date_naive())
}

impl TodaySummary {
    /// Diapers and feedings logged on `day` at `offset`, plus the minutes of naps that
    /// started on it. Naps whose bounds do not parse or end before they start count for
    /// nothing.
    pub fn compute(snapshot: &Snapshot, day: NaiveDate, offset: FixedOffset) -> Self {
        let on_day = |raw: &str| local_day(raw, &offset) == Some(day);
        let diapers = snapshot.diapers.iter().filter(|d| on_day(&d.time)).count();
        let feedings = snapshot.feedings.iter().filter(|f| on_day(&f.time)).count();
        let sleep_minutes = snapshot
            .naps
            .iter()
            .filter_map(|nap| {
                let start = parse_timestamp(&nap.start)?;
                let end = parse_timestamp(&nap.end)?;
                (start.with_timezone(&offset).date_naive() == day && end >= start)
                    .then(|| (end - start).num_minutes())
            })
            .sum();

        Self {
            diapers,
            feedings,
            sleep_minutes,
        }
    }

    /// `45m`, `2h` or `1h 30m`.
    pub fn sleep_label(&self) -> String {
        let minutes = self.sleep_minutes;
        if minutes < 60 {
            return format!("{minutes}m");
        }
        let (hours, rest) = (minutes / 60, minutes % 60);
        if rest > 0 {
            format!("{hours}h {rest}m")
        } else {
            format!("{hours}h")
        }
    }
}
