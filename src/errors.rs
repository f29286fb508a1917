//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// External player could not be launched.
    Spawn(String),
    /// The process supervisor already owns a live player process.
    Busy(String),
    /// Playback was stopped before the player could be launched.
    Cancelled(String),
    /// Remote catalog or schedule refresh failure.
    Sync(String),
    /// Local cache read, write, or parse failure.
    Cache(String),
    /// Schedule record could not be interpreted.
    Schedule(String),
    /// Required external executable is missing or unusable.
    Dependency(String),
    /// Manual search through the resolver tool failed.
    Search(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Busy(msg) => write!(f, "busy: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::Sync(msg) => write!(f, "sync: {msg}"),
            Self::Cache(msg) => write!(f, "cache: {msg}"),
            Self::Schedule(msg) => write!(f, "schedule: {msg}"),
            Self::Dependency(msg) => write!(f, "dependency: {msg}"),
            Self::Search(msg) => write!(f, "search: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Sync(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Cache(format!("invalid json: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
