//! Process supervisor. Owns at most one external player process.
//!
//! [`ProcessSupervisor::start`] spawns the player and registers it in a
//! single slot; a second `start` while the slot is occupied fails with
//! `AppError::Busy`. [`ProcessSupervisor::wait`] resolves exactly once,
//! either when the process exits or when its cancellation token fires, and
//! releases the slot on every path. [`ProcessSupervisor::cancel`] is
//! idempotent and may race freely with a natural exit.
//!
//! Each handle's token is a child of a caller-supplied parent token, so a
//! cancelled session also cancels any player started after the fact.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::player::PlayerCommand;
use super::progress::{pump_output, PlaybackProgress};
use crate::models::session::PlaybackOutcome;
use crate::models::track::Track;
use crate::{AppError, Result};

/// Time allowed for the output reader to drain after the player exits.
const OUTPUT_DRAIN: Duration = Duration::from_millis(250);

/// Registry entry for the live process.
#[derive(Debug)]
struct LiveProcess {
    serial: u64,
    track_id: String,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<LiveProcess>>>;

/// Handle to the single live player process.
///
/// Dropping the handle kills the process (`kill_on_drop`) and frees the
/// supervisor slot.
#[derive(Debug)]
pub struct ProcessHandle {
    serial: u64,
    track: Track,
    child: Child,
    cancel: CancellationToken,
    output: Option<JoinHandle<()>>,
    slot: Slot,
}

impl ProcessHandle {
    /// Track being played.
    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(output) = self.output.take() {
            output.abort();
        }
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|live| live.serial == self.serial) {
            *slot = None;
        }
    }
}

/// Owner of zero-or-one external player process.
pub struct ProcessSupervisor {
    player: Arc<dyn PlayerCommand>,
    stop_grace: Duration,
    slot: Slot,
    next_serial: AtomicU64,
    progress: Arc<watch::Sender<Option<PlaybackProgress>>>,
}

impl ProcessSupervisor {
    /// Create an idle supervisor.
    #[must_use]
    pub fn new(player: Arc<dyn PlayerCommand>, stop_grace: Duration) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            player,
            stop_grace,
            slot: Arc::new(Mutex::new(None)),
            next_serial: AtomicU64::new(1),
            progress: Arc::new(progress),
        }
    }

    /// Subscribe to best-effort progress of the playing track.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Option<PlaybackProgress>> {
        self.progress.subscribe()
    }

    /// Id of the track currently owned by the supervisor, if any.
    #[must_use]
    pub fn active_track(&self) -> Option<String> {
        self.lock_slot().as_ref().map(|live| live.track_id.clone())
    }

    /// Whether no process is currently owned.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.lock_slot().is_none()
    }

    /// Spawn the player for `track`.
    ///
    /// The handle's cancellation token is a child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Busy` if a previous handle is still live,
    /// `AppError::Cancelled` if `parent` is already cancelled, or
    /// `AppError::Spawn` if the executable cannot be launched.
    pub fn start(&self, track: &Track, parent: &CancellationToken) -> Result<ProcessHandle> {
        let mut slot = self.lock_slot();
        if let Some(live) = slot.as_ref() {
            return Err(AppError::Busy(format!(
                "player already running track {}",
                live.track_id
            )));
        }

        let mut cmd = self.player.command(track);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Last check before the process exists; a later stop goes through `wait`.
        if parent.is_cancelled() {
            return Err(AppError::Cancelled(format!(
                "stop requested before track {} started",
                track.id
            )));
        }

        let mut child = cmd.spawn().map_err(|err| {
            AppError::Spawn(format!(
                "failed to launch {}: {err}",
                self.player.program()
            ))
        })?;

        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let cancel = parent.child_token();
        let output = self.spawn_output_reader(track, &mut child);

        info!(
            track_id = track.id,
            title = track.title,
            pid = child.id().unwrap_or(0),
            player = self.player.program(),
            "player process spawned"
        );

        *slot = Some(LiveProcess {
            serial,
            track_id: track.id.clone(),
            cancel: cancel.clone(),
        });

        Ok(ProcessHandle {
            serial,
            track: track.clone(),
            child,
            cancel,
            output: Some(output),
            slot: Arc::clone(&self.slot),
        })
    }

    /// Suspend until the process exits or is cancelled.
    ///
    /// Exit code 0 maps to `Completed`, any other exit to `Failed`, and a
    /// fired cancellation token to `Cancelled` after the process has been
    /// terminated. The handle is released before this returns.
    pub async fn wait(&self, handle: ProcessHandle) -> PlaybackOutcome {
        let span = info_span!("supervisor", track_id = %handle.track.id);
        self.wait_inner(handle).instrument(span).await
    }

    async fn wait_inner(&self, mut handle: ProcessHandle) -> PlaybackOutcome {
        let track_id = handle.track.id.clone();
        let cancel = handle.cancel.clone();

        let exited = tokio::select! {
            biased;
            status = handle.child.wait() => Some(status),
            () = cancel.cancelled() => None,
        };

        let outcome = match exited {
            Some(Ok(status)) if status.success() => PlaybackOutcome::Completed,
            Some(Ok(status)) => PlaybackOutcome::Failed(status.code()),
            Some(Err(err)) => {
                warn!(track_id, %err, "error waiting for player process");
                PlaybackOutcome::Failed(None)
            }
            None => {
                self.terminate(&mut handle.child, &track_id).await;
                PlaybackOutcome::Cancelled
            }
        };

        if let Some(mut output) = handle.output.take() {
            if tokio::time::timeout(OUTPUT_DRAIN, &mut output).await.is_err() {
                output.abort();
            }
        }
        drop(handle);
        self.progress.send_replace(None);

        debug!(track_id, ?outcome, "player process released");
        outcome
    }

    /// Start `track` and wait for the outcome.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`ProcessSupervisor::start`].
    pub async fn play(&self, track: &Track, parent: &CancellationToken) -> Result<PlaybackOutcome> {
        let handle = self.start(track, parent)?;
        Ok(self.wait(handle).await)
    }

    /// Cancel the live process, if any.
    ///
    /// Idempotent: returns `false` when nothing was running or the process
    /// was already cancelled.
    pub fn cancel(&self) -> bool {
        let slot = self.lock_slot();
        match slot.as_ref() {
            Some(live) if !live.cancel.is_cancelled() => {
                info!(track_id = live.track_id, "cancelling player process");
                live.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<LiveProcess>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_output_reader(&self, track: &Track, child: &mut Child) -> JoinHandle<()> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let progress = Arc::clone(&self.progress);
        let track_id = track.id.clone();

        progress.send_replace(Some(PlaybackProgress::new(track_id.clone())));

        tokio::spawn(async move {
            let out = async {
                if let Some(stdout) = stdout {
                    pump_output(track_id.clone(), stdout, &progress).await;
                }
            };
            let err = async {
                if let Some(stderr) = stderr {
                    pump_output(track_id.clone(), stderr, &progress).await;
                }
            };
            tokio::join!(out, err);
        })
    }

    /// Ask the process to exit, escalating to a kill after the grace period.
    async fn terminate(&self, child: &mut Child, track_id: &str) {
        send_terminate(child, track_id);

        match tokio::time::timeout(self.stop_grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(track_id, ?status, "player process stopped");
            }
            Ok(Err(err)) => {
                warn!(track_id, %err, "error waiting for cancelled player process");
            }
            Err(_) => {
                warn!(
                    track_id,
                    grace = ?self.stop_grace,
                    "player ignored termination signal, forcing kill"
                );
                if let Err(err) = child.kill().await {
                    warn!(track_id, %err, "failed to force-kill player process");
                }
            }
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child, track_id: &str) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        warn!(track_id, %err, "failed to send SIGTERM to player process");
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, track_id: &str) {
    if let Err(err) = child.start_kill() {
        warn!(track_id, %err, "failed to stop player process");
    }
}
