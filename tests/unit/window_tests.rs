//! Unit tests for play-window evaluation.

use chrono::{NaiveDate, NaiveDateTime, Weekday};

use dormicast::models::schedule::ScheduleWindow;
use dormicast::playback::window::is_inside_window;

/// 2024-01-01 is a Monday.
fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .expect("valid datetime")
}

fn monday_eight_for_ten_minutes() -> ScheduleWindow {
    ScheduleWindow::new(8 * 3600, 600, vec![Weekday::Mon])
}

#[test]
fn inside_window_on_scheduled_day() {
    let window = monday_eight_for_ten_minutes();
    assert!(is_inside_window(at(1, 8, 5, 0), Some(&window)));
}

#[test]
fn after_window_end_is_outside() {
    let window = monday_eight_for_ten_minutes();
    assert!(!is_inside_window(at(1, 8, 11, 0), Some(&window)));
}

#[test]
fn other_weekday_is_outside() {
    let window = monday_eight_for_ten_minutes();
    assert!(!is_inside_window(at(2, 8, 5, 0), Some(&window)));
}

#[test]
fn bounds_are_inclusive() {
    let window = monday_eight_for_ten_minutes();
    assert!(!is_inside_window(at(1, 7, 59, 59), Some(&window)));
    assert!(is_inside_window(at(1, 8, 0, 0), Some(&window)));
    assert!(is_inside_window(at(1, 8, 10, 0), Some(&window)));
    assert!(!is_inside_window(at(1, 8, 10, 1), Some(&window)));
}

#[test]
fn missing_schedule_is_never_inside() {
    assert!(!is_inside_window(at(1, 8, 5, 0), None));
}

#[test]
fn empty_day_list_means_every_day() {
    let window = ScheduleWindow::new(8 * 3600, 600, Vec::new());
    for day in 1..=7 {
        assert!(is_inside_window(at(day, 8, 5, 0), Some(&window)), "day {day}");
    }
}

#[test]
fn window_does_not_wrap_past_midnight() {
    // 23:00 for two hours on Mondays.
    let window = ScheduleWindow::new(23 * 3600, 7200, vec![Weekday::Mon]);
    assert!(is_inside_window(at(1, 23, 59, 59), Some(&window)));
    assert!(!is_inside_window(at(2, 0, 30, 0), Some(&window)), "Tuesday tail");

    let every_day = ScheduleWindow::new(23 * 3600, 7200, Vec::new());
    assert!(!is_inside_window(at(2, 0, 30, 0), Some(&every_day)));
}

#[test]
fn zero_length_window_matches_only_its_start() {
    let window = ScheduleWindow::new(12 * 3600, 0, Vec::new());
    assert!(is_inside_window(at(3, 12, 0, 0), Some(&window)));
    assert!(!is_inside_window(at(3, 12, 0, 1), Some(&window)));
}

#[test]
fn full_day_sweep_matches_exactly_the_window() {
    let window = monday_eight_for_ten_minutes();
    let start = at(1, 0, 0, 0);
    let mut inside = 0;
    for minute in 0..(24 * 60) {
        let now = start + chrono::Duration::minutes(minute);
        if is_inside_window(now, Some(&window)) {
            inside += 1;
        }
    }
    // 08:00 through 08:10 inclusive.
    assert_eq!(inside, 11);
}
