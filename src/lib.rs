#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod deps;
pub mod errors;
pub mod models;
pub mod playback;
pub mod prompt;
pub mod search;
pub mod sync;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
