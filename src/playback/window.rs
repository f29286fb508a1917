//! Play-window evaluation.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::models::schedule::ScheduleWindow;

/// Whether `now` falls inside the daily window described by `schedule`.
///
/// Pure: no clock reads, no I/O. The bounds are inclusive on both ends and
/// are not wrapped across midnight. A missing schedule is never inside the
/// window, so playback never starts without one.
#[must_use]
pub fn is_inside_window(now: NaiveDateTime, schedule: Option<&ScheduleWindow>) -> bool {
    let Some(schedule) = schedule else {
        return false;
    };

    if !schedule.applies_on(now.weekday()) {
        return false;
    }

    let seconds_of_day = u64::from(now.num_seconds_from_midnight());
    u64::from(schedule.start_seconds) <= seconds_of_day && seconds_of_day <= schedule.end_seconds()
}
