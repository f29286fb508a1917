//! Integration tests for the process supervisor.
//!
//! Validates exit-code mapping, the single-process slot, cancellation
//! unblocking a pending wait, idempotent cancel, SIGTERM escalation, and
//! progress publication.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use dormicast::models::session::PlaybackOutcome;
use dormicast::AppError;

use super::test_helpers::{
    script_supervisor, supervisor_with, track, wait_for_track, ScriptPlayer, LONG_TRACK,
};

#[tokio::test]
async fn zero_exit_completes_and_releases_slot() {
    let supervisor = script_supervisor();
    let outcome = supervisor
        .play(&track("exit 0"), &CancellationToken::new())
        .await
        .expect("player starts");

    assert_eq!(outcome, PlaybackOutcome::Completed);
    assert!(supervisor.is_idle(), "handle must be released after wait");
}

#[tokio::test]
async fn non_zero_exit_reports_failure_code() {
    let supervisor = script_supervisor();
    let outcome = supervisor
        .play(&track("exit 3"), &CancellationToken::new())
        .await
        .expect("player starts");

    assert_eq!(outcome, PlaybackOutcome::Failed(Some(3)));
    assert!(supervisor.is_idle());
}

#[tokio::test]
async fn missing_executable_is_spawn_error() {
    let supervisor = script_supervisor();
    let err = supervisor
        .start(&track("missing:player"), &CancellationToken::new())
        .expect_err("spawn must fail");

    assert!(matches!(err, AppError::Spawn(_)), "got {err:?}");
    assert!(supervisor.is_idle(), "failed spawn must not occupy the slot");
}

#[tokio::test]
async fn second_start_while_live_is_busy() {
    let supervisor = script_supervisor();
    let parent = CancellationToken::new();

    let handle = supervisor
        .start(&track(LONG_TRACK), &parent)
        .expect("first start");
    let err = supervisor
        .start(&track("exit 0"), &parent)
        .expect_err("second start must be rejected");
    assert!(matches!(err, AppError::Busy(_)), "got {err:?}");

    assert!(supervisor.cancel());
    assert_eq!(supervisor.wait(handle).await, PlaybackOutcome::Cancelled);

    let outcome = supervisor
        .play(&track("exit 0"), &parent)
        .await
        .expect("slot is free again");
    assert_eq!(outcome, PlaybackOutcome::Completed);
}

#[tokio::test]
async fn cancel_unblocks_pending_wait() {
    let supervisor = script_supervisor();
    let waiter = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            supervisor
                .play(&track(LONG_TRACK), &CancellationToken::new())
                .await
        })
    };

    wait_for_track(&supervisor, LONG_TRACK).await;
    let started = Instant::now();
    assert!(supervisor.cancel(), "a live process should be cancelled");

    let outcome = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("wait must unblock")
        .expect("task joins")
        .expect("player started");

    assert_eq!(outcome, PlaybackOutcome::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(supervisor.is_idle());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let supervisor = script_supervisor();
    assert!(!supervisor.cancel(), "cancel with nothing running is a no-op");

    let handle = supervisor
        .start(&track(LONG_TRACK), &CancellationToken::new())
        .expect("start");
    assert!(supervisor.cancel());
    assert!(!supervisor.cancel(), "second cancel is a no-op");
    assert_eq!(supervisor.wait(handle).await, PlaybackOutcome::Cancelled);
    assert!(!supervisor.cancel(), "cancel after release is a no-op");
}

#[tokio::test]
async fn cancel_racing_natural_exit_resolves_once() {
    let supervisor = script_supervisor();
    let handle = supervisor
        .start(&track("exit 0"), &CancellationToken::new())
        .expect("start");

    // Let the process exit before anyone waits on it.
    tokio::time::sleep(Duration::from_millis(200)).await;
    supervisor.cancel();

    let outcome = supervisor.wait(handle).await;
    assert!(
        matches!(outcome, PlaybackOutcome::Completed | PlaybackOutcome::Cancelled),
        "got {outcome:?}"
    );
    assert!(supervisor.is_idle());
    assert!(!supervisor.cancel());
}

#[tokio::test]
async fn cancelled_parent_refuses_to_spawn() {
    let supervisor = script_supervisor();
    let parent = CancellationToken::new();
    parent.cancel();

    let result = supervisor.start(&track(LONG_TRACK), &parent);

    assert!(matches!(result, Err(AppError::Cancelled(_))), "got {result:?}");
    assert!(supervisor.is_idle());
    assert_eq!(supervisor.active_track(), None);
}

#[tokio::test]
async fn process_ignoring_sigterm_is_killed_after_grace() {
    let grace = Duration::from_millis(300);
    let supervisor = supervisor_with(ScriptPlayer::default(), grace);
    let script = "trap '' TERM; while :; do sleep 0.1; done";
    let handle = supervisor
        .start(&track(script), &CancellationToken::new())
        .expect("start");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    supervisor.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), supervisor.wait(handle))
        .await
        .expect("forced kill must end the wait");

    assert_eq!(outcome, PlaybackOutcome::Cancelled);
    assert!(started.elapsed() >= grace, "kill should follow the grace period");
    assert!(supervisor.is_idle());
}

#[tokio::test]
async fn dropping_handle_releases_slot() {
    let supervisor = script_supervisor();
    let handle = supervisor
        .start(&track(LONG_TRACK), &CancellationToken::new())
        .expect("start");
    assert_eq!(supervisor.active_track().as_deref(), Some(LONG_TRACK));

    drop(handle);
    assert!(supervisor.is_idle());
}

#[tokio::test]
async fn progress_is_published_from_player_output() {
    let supervisor = script_supervisor();
    let mut progress = supervisor.progress();
    let script = "echo 'Duration: 00:03:00'; echo 'AV: 00:00:05 / 00:03:00'; exec sleep 30";
    let handle = supervisor
        .start(&track(script), &CancellationToken::new())
        .expect("start");

    let seen = tokio::time::timeout(
        Duration::from_secs(5),
        progress.wait_for(|p| {
            p.as_ref().and_then(|p| p.position) == Some(Duration::from_secs(5))
        }),
    )
    .await
    .expect("progress arrives")
    .expect("sender alive")
    .clone();

    let seen = seen.expect("progress present");
    assert_eq!(seen.track_id, script);
    assert_eq!(seen.duration, Some(Duration::from_secs(180)));

    supervisor.cancel();
    assert_eq!(supervisor.wait(handle).await, PlaybackOutcome::Cancelled);
    assert!(supervisor.progress().borrow().is_none());
}
