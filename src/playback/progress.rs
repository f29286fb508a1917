//! Best-effort playback progress from the player's human-readable output.
//!
//! Two line shapes are recognised:
//!
//! | Line contains               | Updates              |
//! |-----------------------------|----------------------|
//! | `Duration: H:MM:SS`         | duration             |
//! | `AV: H:MM:SS [/ H:MM:SS]`   | position [+ duration] |
//!
//! Anything else is ignored. Output without progress is not an error.

use std::sync::OnceLock;
use std::time::Duration;

use futures_util::StreamExt;
use regex::Regex;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tracing::debug;

use crate::models::schedule::parse_clock;

/// Longest output chunk accepted before the reader gives up.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Latest known position of the playing track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackProgress {
    /// Track being played.
    pub track_id: String,
    /// Elapsed playback time.
    pub position: Option<Duration>,
    /// Total length, when the player reported it.
    pub duration: Option<Duration>,
}

impl PlaybackProgress {
    /// Empty progress for a freshly started track.
    #[must_use]
    pub fn new(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            position: None,
            duration: None,
        }
    }

    /// Apply one output line; returns `true` if anything changed.
    pub fn apply_line(&mut self, line: &str) -> bool {
        let (duration_re, position_re) = patterns();
        let mut changed = false;

        if let Some(duration) = duration_re
            .and_then(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .and_then(|m| clock(m.as_str()))
        {
            changed |= self.duration.replace(duration) != Some(duration);
        }

        if let Some(caps) = position_re.and_then(|re| re.captures(line)) {
            if let Some(position) = caps.get(1).and_then(|m| clock(m.as_str())) {
                changed |= self.position.replace(position) != Some(position);
            }
            if let Some(total) = caps.get(2).and_then(|m| clock(m.as_str())) {
                changed |= self.duration.replace(total) != Some(total);
            }
        }

        changed
    }
}

fn patterns() -> (Option<&'static Regex>, Option<&'static Regex>) {
    static DURATION: OnceLock<Option<Regex>> = OnceLock::new();
    static POSITION: OnceLock<Option<Regex>> = OnceLock::new();
    let duration = DURATION
        .get_or_init(|| Regex::new(r"Duration:\s*(\d+:\d{2}:\d{2})").ok())
        .as_ref();
    let position = POSITION
        .get_or_init(|| {
            Regex::new(r"AV:\s*(\d+:\d{2}:\d{2})(?:\.\d+)?(?:\s*/\s*(\d+:\d{2}:\d{2}))?").ok()
        })
        .as_ref();
    (duration, position)
}

fn clock(raw: &str) -> Option<Duration> {
    parse_clock(raw).ok().map(|secs| Duration::from_secs(u64::from(secs)))
}

/// Read `output` chunk by chunk (split on `\n` or `\r`) and publish every
/// progress change for `track_id` into `progress`.
///
/// Returns when the stream ends or yields an error.
pub async fn pump_output<R>(
    track_id: String,
    output: R,
    progress: &watch::Sender<Option<PlaybackProgress>>,
) where
    R: AsyncRead + Unpin,
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\r\n".to_vec(), Vec::new(), MAX_LINE_BYTES);
    let mut lines = FramedRead::new(output, codec);

    while let Some(chunk) = lines.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                debug!(track_id, %err, "player output reader stopped");
                break;
            }
        };
        let line = String::from_utf8_lossy(&chunk);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        progress.send_if_modified(|current| {
            let entry = current.get_or_insert_with(|| PlaybackProgress::new(track_id.clone()));
            if entry.track_id != track_id {
                *entry = PlaybackProgress::new(track_id.clone());
            }
            let changed = entry.apply_line(line);
            if changed {
                debug!(
                    track_id,
                    position = ?entry.position,
                    duration = ?entry.duration,
                    "playback progress"
                );
            }
            changed
        });
    }
}
