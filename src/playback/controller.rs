//! Session controller, the single owner of "is a session running".
//!
//! State machine:
//!
//! ```text
//! Idle ──launch (window inside, tracks non-empty)──▶ Active
//! Active ──sequencer finished──▶ Idle
//! Active ──window closed / stop requested──▶ StopPending
//! StopPending ──sequencer acknowledged──▶ Idle
//! ```
//!
//! Every transition happens under one async mutex, so the launch tick and
//! the watchdog tick can interleave freely without creating two sessions or
//! losing a stop. Timers only call the transition methods here; they never
//! touch session fields.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::sequencer::TrackSequencer;
use super::supervisor::ProcessSupervisor;
use super::window::is_inside_window;
use crate::models::schedule::ScheduleWindow;
use crate::models::session::{PlaybackSession, SequenceReport, SessionPhase};
use crate::models::track::Track;
use crate::Result;

/// Result of a launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchDecision {
    /// A new session was started.
    Launched(Uuid),
    /// A session is already active or stopping; nothing was done.
    AlreadyRunning,
    /// The window is closed (or there is no valid schedule).
    OutsideWindow,
    /// The cached catalog could not be read.
    CatalogUnavailable,
    /// The catalog holds no playable track.
    NoTracks,
}

/// Result of a watchdog evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogDecision {
    /// No session exists.
    Idle,
    /// A session is active and the window is still open.
    WindowOpen,
    /// The window closed; the active session was asked to stop.
    StopRequested(Uuid),
    /// A stop was already requested and is awaiting acknowledgement.
    StopPending(Uuid),
}

/// Controller-side view of a running session.
#[derive(Debug)]
struct LiveSession {
    id: Uuid,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
enum ControllerState {
    Idle,
    Active(LiveSession),
    StopPending(LiveSession),
}

impl ControllerState {
    fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::Active(_) => SessionPhase::Active,
            Self::StopPending(_) => SessionPhase::StopPending,
        }
    }
}

/// Process-wide session state machine.
pub struct SessionController {
    sequencer: TrackSequencer,
    state: Mutex<ControllerState>,
    phase: watch::Sender<SessionPhase>,
    last_report: std::sync::Mutex<Option<SequenceReport>>,
}

impl SessionController {
    /// Create an idle controller playing through `supervisor`.
    #[must_use]
    pub fn new(supervisor: Arc<ProcessSupervisor>) -> Arc<Self> {
        let (phase, _) = watch::channel(SessionPhase::Idle);
        Arc::new(Self {
            sequencer: TrackSequencer::new(supervisor),
            state: Mutex::new(ControllerState::Idle),
            phase,
            last_report: std::sync::Mutex::new(None),
        })
    }

    /// Current phase.
    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase()
    }

    /// Watch phase changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Report of the most recently finished session.
    #[must_use]
    pub fn last_report(&self) -> Option<SequenceReport> {
        self.last_report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Attempt the `Idle → Active` transition.
    ///
    /// `resolve_tracks` is called only when a session would actually start,
    /// so the track list always comes from the latest cache. A read failure
    /// skips this attempt instead of failing.
    pub async fn try_launch<F>(
        self: &Arc<Self>,
        now: NaiveDateTime,
        schedule: Option<&ScheduleWindow>,
        resolve_tracks: F,
    ) -> LaunchDecision
    where
        F: FnOnce() -> Result<Vec<Track>>,
    {
        let mut state = self.state.lock().await;

        if !matches!(*state, ControllerState::Idle) {
            debug!(phase = ?state.phase(), "session already running; launch skipped");
            return LaunchDecision::AlreadyRunning;
        }

        if !is_inside_window(now, schedule) {
            return LaunchDecision::OutsideWindow;
        }

        let tracks = match resolve_tracks() {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!(%err, "cached catalog unavailable; launch skipped");
                return LaunchDecision::CatalogUnavailable;
            }
        };
        if tracks.is_empty() {
            info!("window open but catalog has no playable tracks");
            return LaunchDecision::NoTracks;
        }

        let stop = CancellationToken::new();
        let session = PlaybackSession::new(tracks, stop.clone());
        let id = session.id();
        info!(session_id = %id, tracks = session.tracks().len(), "starting playback session");

        let controller = Arc::clone(self);
        let task = tokio::spawn(
            async move {
                let report = controller.sequencer.run(session).await;
                controller.finish(report).await;
            }
            .instrument(info_span!("session_controller", session_id = %id)),
        );

        *state = ControllerState::Active(LiveSession {
            id,
            stop,
            task: Some(task),
        });
        self.phase.send_replace(SessionPhase::Active);

        LaunchDecision::Launched(id)
    }

    /// Re-evaluate the window and stop the active session if it closed.
    pub async fn watchdog(
        &self,
        now: NaiveDateTime,
        schedule: Option<&ScheduleWindow>,
    ) -> WatchdogDecision {
        let mut state = self.state.lock().await;
        let id = match &*state {
            ControllerState::Idle => return WatchdogDecision::Idle,
            ControllerState::StopPending(live) => return WatchdogDecision::StopPending(live.id),
            ControllerState::Active(live) => live.id,
        };

        if is_inside_window(now, schedule) {
            return WatchdogDecision::WindowOpen;
        }

        info!(session_id = %id, "play window closed; stopping session");
        self.begin_stop(&mut state);
        WatchdogDecision::StopRequested(id)
    }

    /// Ask the active session to stop regardless of the window.
    ///
    /// Idempotent: returns `false` if there was nothing left to stop.
    pub async fn request_stop(&self) -> bool {
        let mut state = self.state.lock().await;
        if matches!(*state, ControllerState::Active(_)) {
            self.begin_stop(&mut state);
            true
        } else {
            false
        }
    }

    /// Stop any session and wait for its sequencer to acknowledge.
    pub async fn shutdown(&self) {
        let task = {
            let mut state = self.state.lock().await;
            if matches!(*state, ControllerState::Active(_)) {
                self.begin_stop(&mut state);
            }
            match &mut *state {
                ControllerState::StopPending(live) | ControllerState::Active(live) => {
                    live.task.take()
                }
                ControllerState::Idle => None,
            }
        };

        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(%err, "playback session task ended abnormally");
            }
        }
    }

    /// `Active → StopPending`: flag the session and cancel the in-flight player.
    fn begin_stop(&self, state: &mut ControllerState) {
        let ControllerState::Active(live) = std::mem::replace(state, ControllerState::Idle) else {
            return;
        };
        live.stop.cancel();
        self.sequencer.supervisor().cancel();
        *state = ControllerState::StopPending(live);
        self.phase.send_replace(SessionPhase::StopPending);
    }

    /// `Active | StopPending → Idle` once the sequencer reports.
    async fn finish(&self, report: SequenceReport) {
        let mut state = self.state.lock().await;
        let current = match &*state {
            ControllerState::Active(live) | ControllerState::StopPending(live) => Some(live.id),
            ControllerState::Idle => None,
        };

        if current == Some(report.session_id) {
            info!(
                session_id = %report.session_id,
                outcome = ?report.outcome,
                "playback session released"
            );
            *state = ControllerState::Idle;
            self.phase.send_replace(SessionPhase::Idle);
        } else {
            debug!(session_id = %report.session_id, "stale session report ignored");
        }

        *self
            .last_report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(report);
    }
}
