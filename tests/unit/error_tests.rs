//! Unit tests for `AppError` display prefixes and conversions.

use dormicast::AppError;

#[test]
fn every_variant_has_its_prefix() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Spawn("x".into()), "spawn: x"),
        (AppError::Busy("x".into()), "busy: x"),
        (AppError::Cancelled("x".into()), "cancelled: x"),
        (AppError::Sync("x".into()), "sync: x"),
        (AppError::Cache("x".into()), "cache: x"),
        (AppError::Schedule("x".into()), "schedule: x"),
        (AppError::Dependency("x".into()), "dependency: x"),
        (AppError::Search("x".into()), "search: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn io_error_converts_to_io_variant() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = AppError::from(io);
    assert!(matches!(err, AppError::Io(ref msg) if msg == "gone"));
}

#[test]
fn json_error_converts_to_cache_variant() {
    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = AppError::from(json);
    assert!(err.to_string().starts_with("cache: invalid json"), "{err}");
}

#[test]
fn toml_error_converts_to_config_variant() {
    let toml = toml::from_str::<toml::Value>("= 1").unwrap_err();
    assert!(matches!(AppError::from(toml), AppError::Config(_)));
}

#[test]
fn messages_do_not_end_with_period() {
    let err = AppError::Busy("player already running track abc".into());
    assert!(!err.to_string().ends_with('.'));
}
