//! Startup check for the external executables.
//!
//! Missing or unusable executables are the only fatal condition of the
//! agent: the binary logs the diagnostic and exits non-zero.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::info;

use crate::config::GlobalConfig;
use crate::{AppError, Result};

/// Upper bound for a `--version` check.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Versions reported by the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    /// First line of `yt-dlp --version`.
    pub resolver_version: String,
    /// First line of `<player> --version`.
    pub player_version: String,
}

/// Verify that the resolver and the player can be launched.
///
/// # Errors
///
/// Returns `AppError::Dependency` naming the first tool that is missing,
/// times out, or exits non-zero.
pub async fn check_dependencies(config: &GlobalConfig) -> Result<DependencyReport> {
    let resolver_version = query_version("yt-dlp", &config.resolver.ytdlp_path).await?;
    let player_version = query_version("player", &config.player.path).await?;

    info!(
        resolver = config.resolver.ytdlp_path,
        resolver_version, "resolver found"
    );
    info!(
        player = config.player.path,
        player_version, "player found"
    );

    Ok(DependencyReport {
        resolver_version,
        player_version,
    })
}

/// Run `<path> --version` and return the first non-empty output line.
///
/// # Errors
///
/// Returns `AppError::Dependency` if the check cannot run or fails.
pub async fn query_version(name: &str, path: &str) -> Result<String> {
    let mut cmd = Command::new(path);
    cmd.arg("--version").stdin(Stdio::null()).kill_on_drop(true);

    let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
        .await
        .map_err(|_| AppError::Dependency(format!("{name} at {path} did not answer --version")))?
        .map_err(|err| AppError::Dependency(format!("{name} not found at {path}: {err}")))?;

    if !output.status.success() {
        return Err(AppError::Dependency(format!(
            "{name} at {path} exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_owned())
}
