//! Unit tests for the playback session model.

use tokio_util::sync::CancellationToken;

use dormicast::models::session::{PlaybackSession, SequenceOutcome, SessionPhase};
use dormicast::models::track::Track;

#[test]
fn cursor_walks_the_track_list_once() {
    let mut session = PlaybackSession::new(
        vec![Track::new("a", "A"), Track::new("b", "B")],
        CancellationToken::new(),
    );

    assert_eq!(session.cursor(), 0);
    assert_eq!(session.current().map(|t| t.id.as_str()), Some("a"));
    session.advance();
    assert_eq!(session.current().map(|t| t.id.as_str()), Some("b"));
    session.advance();
    assert!(session.current().is_none());
    session.advance();
    assert_eq!(session.cursor(), 2, "cursor never runs past the end");
}

#[test]
fn stop_flag_follows_the_token() {
    let stop = CancellationToken::new();
    let session = PlaybackSession::new(Vec::new(), stop.clone());

    assert!(!session.stop_requested());
    stop.cancel();
    assert!(session.stop_requested());
    assert!(session.stop_token().is_cancelled());
}

#[test]
fn sessions_get_distinct_ids() {
    let a = PlaybackSession::new(Vec::new(), CancellationToken::new());
    let b = PlaybackSession::new(Vec::new(), CancellationToken::new());
    assert_ne!(a.id(), b.id());
}

#[test]
fn phases_serialize_in_snake_case() {
    assert_eq!(
        serde_json::to_string(&SessionPhase::StopPending).unwrap(),
        "\"stop_pending\""
    );
    assert_eq!(
        serde_json::to_string(&SequenceOutcome::StoppedByRequest).unwrap(),
        "\"stopped_by_request\""
    );
}
