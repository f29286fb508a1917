//! Track model and the catalog transform that produces playable tracks.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Catalog entry as served by the remote API and stored in the cache.
///
/// Unknown fields are kept in `extra` so the cache holds the record verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SongRecord {
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Source link the track id is extracted from.
    #[serde(default)]
    pub youtube_link: Option<String>,
    /// Fields this agent does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A playable track: an opaque source reference plus a display title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// Source reference handed to the player; never empty.
    pub id: String,
    /// Display string.
    pub title: String,
}

impl Track {
    /// Construct a track.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?:youtu\.be/|youtube\.com/(?:watch\?v=|v/|embed/))([^?&]+)").ok()
        })
        .as_ref()
}

/// Extract the video identifier from a share, watch, or embed link.
#[must_use]
pub fn extract_video_id(link: &str) -> Option<String> {
    link_pattern()?
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|id| !id.is_empty())
}

/// Turn cached catalog records into playable tracks, preserving order.
///
/// Records without a link or whose link yields no id are dropped.
#[must_use]
pub fn resolve_tracks(records: &[SongRecord]) -> Vec<Track> {
    records
        .iter()
        .filter_map(|record| {
            let id = record.youtube_link.as_deref().and_then(extract_video_id)?;
            Some(Track::new(id, record.title.clone()))
        })
        .collect()
}
