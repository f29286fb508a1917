//! Manual search through the resolver tool.
//!
//! Used only by the interactive `dormicast-ctl` mode; the scheduled agent
//! never searches.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info_span, Instrument};

use crate::models::track::Track;
use crate::{AppError, Result};

/// Search for `query` and return up to `limit` tracks.
///
/// An empty query returns no results without invoking the tool.
///
/// # Errors
///
/// Returns `AppError::Search` if the tool cannot run or exits non-zero.
pub async fn search_tracks(ytdlp_path: &str, query: &str, limit: u32) -> Result<Vec<Track>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let output = Command::new(ytdlp_path)
        .arg(format!("ytsearch{limit}:{query}"))
        .args(["--get-id", "--get-title", "--no-warnings"])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .instrument(info_span!("search", query))
        .await
        .map_err(|err| AppError::Search(format!("failed to run {ytdlp_path}: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Search(format!(
            "{ytdlp_path} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let tracks = parse_search_output(&String::from_utf8_lossy(&output.stdout));
    debug!(query, results = tracks.len(), "search finished");
    Ok(tracks)
}

/// Parse resolver output made of alternating title and id lines.
///
/// A trailing title without an id, or a pair with an empty member, is
/// dropped.
#[must_use]
pub fn parse_search_output(stdout: &str) -> Vec<Track> {
    let lines: Vec<&str> = stdout.trim().lines().map(str::trim).collect();
    lines
        .chunks_exact(2)
        .filter(|pair| !pair[0].is_empty() && !pair[1].is_empty())
        .map(|pair| Track::new(pair[1], pair[0]))
        .collect()
}
