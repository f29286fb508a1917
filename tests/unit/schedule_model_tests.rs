//! Unit tests for schedule records and their conversion to windows.

use chrono::Weekday;

use dormicast::models::schedule::{
    parse_clock, weekday_from_sunday_ordinal, ScheduleRecord, ScheduleWindow,
};
use dormicast::AppError;

fn record(json: serde_json::Value) -> ScheduleRecord {
    serde_json::from_value(json).expect("schedule record")
}

#[test]
fn parses_clock_values() {
    assert_eq!(parse_clock("08:00:00").unwrap(), 28_800);
    assert_eq!(parse_clock("00:10:00").unwrap(), 600);
    assert_eq!(parse_clock("07:30").unwrap(), 27_000);
    assert_eq!(parse_clock(" 01:02:03 ").unwrap(), 3723);
}

#[test]
fn durations_may_exceed_a_day() {
    assert_eq!(parse_clock("25:00:00").unwrap(), 90_000);
}

#[test]
fn rejects_malformed_clock_values() {
    for raw in ["", "8", "08:60:00", "08:00:60", "aa:bb:cc", "1:2:3:4", "-1:00:00"] {
        let err = parse_clock(raw).expect_err(raw);
        assert!(matches!(err, AppError::Schedule(_)), "{raw}: {err:?}");
    }
}

#[test]
fn sunday_is_ordinal_zero() {
    assert_eq!(weekday_from_sunday_ordinal(0), Some(Weekday::Sun));
    assert_eq!(weekday_from_sunday_ordinal(1), Some(Weekday::Mon));
    assert_eq!(weekday_from_sunday_ordinal(6), Some(Weekday::Sat));
    assert_eq!(weekday_from_sunday_ordinal(7), None);
}

#[test]
fn record_converts_to_window() {
    let rec = record(serde_json::json!({
        "start_time": "08:00:00",
        "play_time": "00:10:00",
        "day_of_week": [1, 3, 1],
    }));

    let window = ScheduleWindow::try_from(&rec).expect("valid window");
    assert_eq!(window.start_seconds, 28_800);
    assert_eq!(window.duration_seconds, 600);
    assert_eq!(window.end_seconds(), 29_400);
    assert_eq!(window.days_of_week, vec![Weekday::Mon, Weekday::Wed]);
    assert!(window.applies_on(Weekday::Wed));
    assert!(!window.applies_on(Weekday::Sun));
}

#[test]
fn missing_days_means_every_day() {
    let rec = record(serde_json::json!({
        "start_time": "20:00:00",
        "play_time": "01:00:00",
    }));

    let window = ScheduleWindow::try_from(&rec).expect("valid window");
    assert!(window.days_of_week.is_empty());
    assert!(window.applies_on(Weekday::Sat));
}

#[test]
fn null_days_means_every_day() {
    let rec = record(serde_json::json!({
        "start_time": "20:00:00",
        "play_time": "01:00:00",
        "day_of_week": null,
    }));
    assert_eq!(rec.day_of_week, None);

    let window = ScheduleWindow::try_from(&rec).expect("valid window");
    assert!(window.days_of_week.is_empty());
    assert!(window.applies_on(Weekday::Mon));
    assert!(window.applies_on(Weekday::Sun));
}

#[test]
fn start_past_end_of_day_is_rejected() {
    let rec = record(serde_json::json!({
        "start_time": "24:00:00",
        "play_time": "00:10:00",
        "day_of_week": [],
    }));

    assert!(matches!(
        ScheduleWindow::try_from(&rec),
        Err(AppError::Schedule(_))
    ));
}

#[test]
fn unknown_weekday_is_rejected() {
    let rec = record(serde_json::json!({
        "start_time": "08:00:00",
        "play_time": "00:10:00",
        "day_of_week": [7],
    }));

    let err = ScheduleWindow::try_from(&rec).expect_err("day 7 is invalid");
    assert!(err.to_string().contains("day_of_week 7"), "{err}");
}

#[test]
fn unknown_fields_survive_round_trip() {
    let raw = serde_json::json!({
        "id": 42,
        "start_time": "08:00:00",
        "play_time": "00:10:00",
        "day_of_week": [1],
        "label": "morning",
    });
    let rec = record(raw.clone());

    assert_eq!(rec.extra.get("label"), Some(&serde_json::json!("morning")));
    assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
}
