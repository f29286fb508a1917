//! Track sequencer. Plays a session's tracks one at a time.
//!
//! A failing track is logged and skipped, never retried, and never ends the
//! session. A stop request, observed either at the top of the loop or as a
//! `Cancelled` player outcome, ends the run before another track starts.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use super::supervisor::ProcessSupervisor;
use crate::models::session::{PlaybackOutcome, PlaybackSession, SequenceOutcome, SequenceReport};
use crate::AppError;

/// Drives a [`PlaybackSession`] through the process supervisor.
pub struct TrackSequencer {
    supervisor: Arc<ProcessSupervisor>,
}

impl TrackSequencer {
    /// Create a sequencer over `supervisor`.
    #[must_use]
    pub fn new(supervisor: Arc<ProcessSupervisor>) -> Self {
        Self { supervisor }
    }

    /// Supervisor used for every track.
    #[must_use]
    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    /// Play `session` from its cursor until exhausted or stopped.
    pub async fn run(&self, session: PlaybackSession) -> SequenceReport {
        let span = info_span!("sequencer", session_id = %session.id());
        self.run_inner(session).instrument(span).await
    }

    async fn run_inner(&self, mut session: PlaybackSession) -> SequenceReport {
        let mut started = Vec::new();
        let mut completed = 0;
        let mut failed = 0;

        let outcome = loop {
            if session.stop_requested() {
                break SequenceOutcome::StoppedByRequest;
            }
            let Some(track) = session.current().cloned() else {
                break SequenceOutcome::Exhausted;
            };

            let handle = match self.supervisor.start(&track, session.stop_token()) {
                Ok(handle) => handle,
                Err(AppError::Cancelled(reason)) => {
                    info!(track_id = track.id, reason, "stop observed at track start");
                    break SequenceOutcome::StoppedByRequest;
                }
                Err(err) => {
                    warn!(track_id = track.id, %err, "track could not be started; skipping");
                    failed += 1;
                    session.advance();
                    continue;
                }
            };
            started.push(track.id.clone());
            info!(
                track_id = track.id,
                title = track.title,
                position = session.cursor() + 1,
                total = session.tracks().len(),
                "playing track"
            );

            match self.supervisor.wait(handle).await {
                PlaybackOutcome::Completed => {
                    info!(track_id = track.id, "track finished");
                    completed += 1;
                }
                PlaybackOutcome::Failed(exit_code) => {
                    warn!(track_id = track.id, ?exit_code, "track failed; skipping");
                    failed += 1;
                }
                PlaybackOutcome::Cancelled => {
                    info!(track_id = track.id, "track cancelled");
                    break SequenceOutcome::StoppedByRequest;
                }
            }
            session.advance();
        };

        info!(?outcome, completed, failed, "session ended");

        SequenceReport {
            session_id: session.id(),
            outcome,
            started,
            completed,
            failed,
        }
    }
}
