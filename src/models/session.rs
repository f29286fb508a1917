//! Playback session model and lifecycle outcomes.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::track::Track;

/// Externally visible phase of the session controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session exists.
    Idle,
    /// A session is playing.
    Active,
    /// Stop was requested; waiting for the sequencer to acknowledge.
    StopPending,
}

/// Result of playing a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Player exited with code 0.
    Completed,
    /// Player exited with a non-zero code, or was killed by an outside signal.
    Failed(Option<i32>),
    /// Playback was cancelled through the supervisor.
    Cancelled,
}

/// How a sequencer run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOutcome {
    /// Every track was attempted.
    Exhausted,
    /// A stop request ended the run early.
    StoppedByRequest,
}

/// Summary returned by the sequencer when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    /// Session that produced the report.
    pub session_id: Uuid,
    /// Terminal outcome.
    pub outcome: SequenceOutcome,
    /// Ids of the tracks handed to the player, in order.
    pub started: Vec<String>,
    /// Tracks that played to completion.
    pub completed: usize,
    /// Tracks skipped after a failure.
    pub failed: usize,
}

/// One run of the playlist, from start until exhausted or stopped.
///
/// Owned by the sequencer while it runs; the controller keeps only a clone
/// of the stop token.
#[derive(Debug)]
pub struct PlaybackSession {
    id: Uuid,
    tracks: Vec<Track>,
    cursor: usize,
    stop: CancellationToken,
}

impl PlaybackSession {
    /// Create a session positioned at the first track.
    #[must_use]
    pub fn new(tracks: Vec<Track>, stop: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
            cursor: 0,
            stop,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ordered track list.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Index of the next track to play.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Track under the cursor, if any remain.
    #[must_use]
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    /// Move the cursor past the current track.
    pub fn advance(&mut self) {
        if self.cursor < self.tracks.len() {
            self.cursor += 1;
        }
    }

    /// Token observed by the sequencer and every player it starts.
    #[must_use]
    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}
