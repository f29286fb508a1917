//! Agent loop: the two periodic ticks around the session controller.
//!
//! The sync-and-launch tick refreshes the cache and attempts to start a
//! session; the stop-watchdog tick stops the session once the window
//! closes. Both run until the shared `CancellationToken` fires, after
//! which any running session is stopped and awaited.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::config::GlobalConfig;
use crate::models::schedule::ScheduleWindow;
use crate::playback::controller::{LaunchDecision, SessionController, WatchdogDecision};
use crate::sync::cache::JsonCache;
use crate::sync::client::CatalogSource;
use crate::sync::sync_once;

/// Source of the local wall-clock time used for window evaluation.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// [`Clock`] backed by the system's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Periods of the two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickIntervals {
    /// Sync-and-launch period.
    pub sync: Duration,
    /// Stop-watchdog period.
    pub watchdog: Duration,
}

impl From<&GlobalConfig> for TickIntervals {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            sync: config.intervals.sync(),
            watchdog: config.intervals.watchdog(),
        }
    }
}

/// Join handles for the two background ticks.
#[derive(Debug)]
pub struct AgentTasks {
    /// Sync-and-launch loop.
    pub sync: JoinHandle<()>,
    /// Stop-watchdog loop.
    pub watchdog: JoinHandle<()>,
}

/// Process-wide agent: owns the controller and drives both ticks.
pub struct Agent {
    source: Arc<dyn CatalogSource>,
    cache: JsonCache,
    controller: Arc<SessionController>,
    clock: Arc<dyn Clock>,
    intervals: TickIntervals,
}

impl Agent {
    /// Assemble an agent from its collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: JsonCache,
        controller: Arc<SessionController>,
        clock: Arc<dyn Clock>,
        intervals: TickIntervals,
    ) -> Self {
        Self {
            source,
            cache,
            controller,
            clock,
            intervals,
        }
    }

    /// Shared session controller.
    #[must_use]
    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// One sync-and-launch tick.
    ///
    /// A failed refresh is logged and the previous cache is used as-is.
    pub async fn sync_tick(&self) -> LaunchDecision {
        if let Err(err) = sync_once(self.source.as_ref(), &self.cache).await {
            warn!(%err, "sync failed; keeping cached catalog and schedule");
        }

        let schedule = self.cached_schedule();
        let now = self.clock.now();
        let decision = self
            .controller
            .try_launch(now, schedule.as_ref(), || self.cache.load_tracks())
            .await;

        if let LaunchDecision::Launched(session_id) = decision {
            info!(%session_id, "launch tick started a session");
        }
        decision
    }

    /// One stop-watchdog tick.
    pub async fn watchdog_tick(&self) -> WatchdogDecision {
        let schedule = self.cached_schedule();
        let now = self.clock.now();
        self.controller.watchdog(now, schedule.as_ref()).await
    }

    /// Spawn both ticks; they run until `cancel` fires.
    #[must_use]
    pub fn spawn(self: &Arc<Self>, cancel: &CancellationToken) -> AgentTasks {
        let agent = Arc::clone(self);
        let ct = cancel.clone();
        let sync = tokio::spawn(
            async move {
                agent
                    .tick_loop(agent.intervals.sync, &ct, || agent.sync_tick())
                    .await;
            }
            .instrument(info_span!("sync_tick")),
        );

        let agent = Arc::clone(self);
        let ct = cancel.clone();
        let watchdog = tokio::spawn(
            async move {
                agent
                    .tick_loop(agent.intervals.watchdog, &ct, || agent.watchdog_tick())
                    .await;
            }
            .instrument(info_span!("watchdog_tick")),
        );

        AgentTasks { sync, watchdog }
    }

    /// Run both ticks until `cancel` fires, then stop any session and wait
    /// for it to wind down.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let tasks = self.spawn(&cancel);
        info!(
            sync = ?self.intervals.sync,
            watchdog = ?self.intervals.watchdog,
            "agent loop started"
        );

        cancel.cancelled().await;
        let (sync, watchdog) = tokio::join!(tasks.sync, tasks.watchdog);
        for (tick, joined) in [("sync", sync), ("watchdog", watchdog)] {
            if let Err(err) = joined {
                warn!(tick, %err, "tick loop ended abnormally");
            }
        }

        self.controller.shutdown().await;
        info!("agent loop stopped");
    }

    async fn tick_loop<F, Fut, T>(&self, period: Duration, cancel: &CancellationToken, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = tick() => {}
            }
        }
        info!("tick loop shutting down");
    }

    /// Authoritative schedule from the cache; unreadable means none.
    fn cached_schedule(&self) -> Option<ScheduleWindow> {
        match self.cache.load_schedule() {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!(%err, "no valid cached schedule; treating window as closed");
                None
            }
        }
    }
}
