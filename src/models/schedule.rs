//! Daily play window model and its wire/cache representation.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Seconds in one day; start times must fall below this bound.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Scheduler record as served by the remote API and stored in the cache.
///
/// Unknown fields are kept in `extra` so the cache holds the record verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleRecord {
    /// Window start as `HH:MM:SS` local time.
    pub start_time: String,
    /// Window length as `HH:MM:SS`.
    pub play_time: String,
    /// Weekday ordinals, 0 = Sunday through 6 = Saturday. Absent or null
    /// means every day.
    #[serde(default)]
    pub day_of_week: Option<Vec<u8>>,
    /// Fields this agent does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The daily interval during which playback is permitted.
///
/// The window never wraps past midnight: `end_seconds` may exceed
/// [`SECONDS_PER_DAY`], in which case the tail simply never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    /// Start as seconds since local midnight.
    pub start_seconds: u32,
    /// Window length in seconds.
    pub duration_seconds: u32,
    /// Permitted weekdays; empty means every day.
    pub days_of_week: Vec<Weekday>,
}

impl ScheduleWindow {
    /// Construct a window from raw parts.
    #[must_use]
    pub fn new(start_seconds: u32, duration_seconds: u32, days_of_week: Vec<Weekday>) -> Self {
        Self {
            start_seconds,
            duration_seconds,
            days_of_week,
        }
    }

    /// Inclusive end of the window in seconds since midnight (not wrapped).
    #[must_use]
    pub fn end_seconds(&self) -> u64 {
        u64::from(self.start_seconds) + u64::from(self.duration_seconds)
    }

    /// Whether the window applies on `day`.
    #[must_use]
    pub fn applies_on(&self, day: Weekday) -> bool {
        self.days_of_week.is_empty() || self.days_of_week.contains(&day)
    }
}

impl TryFrom<&ScheduleRecord> for ScheduleWindow {
    type Error = AppError;

    fn try_from(record: &ScheduleRecord) -> Result<Self> {
        let start_seconds = parse_clock(&record.start_time)?;
        if start_seconds >= SECONDS_PER_DAY {
            return Err(AppError::Schedule(format!(
                "start_time {} is past the end of the day",
                record.start_time
            )));
        }
        let duration_seconds = parse_clock(&record.play_time)?;

        let ordinals = record.day_of_week.as_deref().unwrap_or_default();
        let mut days_of_week = Vec::with_capacity(ordinals.len());
        for &ordinal in ordinals {
            let day = weekday_from_sunday_ordinal(ordinal).ok_or_else(|| {
                AppError::Schedule(format!("day_of_week {ordinal} is not in 0..=6"))
            })?;
            if !days_of_week.contains(&day) {
                days_of_week.push(day);
            }
        }

        Ok(Self::new(start_seconds, duration_seconds, days_of_week))
    }
}

/// Parse `HH:MM:SS` (or `HH:MM`) into a number of seconds.
///
/// Hours are not bounded so the same parser serves durations.
///
/// # Errors
///
/// Returns `AppError::Schedule` if the value is not a clock string.
pub fn parse_clock(raw: &str) -> Result<u32> {
    let invalid = || AppError::Schedule(format!("invalid clock value {raw:?}"));

    let parts: Vec<&str> = raw.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }

    let mut fields = [0_u32; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part.trim().parse().map_err(|_| invalid())?;
    }
    let [hours, minutes, seconds] = fields;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(invalid)
}

/// Map a Sunday-based ordinal (0 = Sunday) onto [`Weekday`].
#[must_use]
pub fn weekday_from_sunday_ordinal(ordinal: u8) -> Option<Weekday> {
    match ordinal {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
