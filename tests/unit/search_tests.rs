//! Unit tests for manual search output parsing.

use dormicast::search::{parse_search_output, search_tracks};
use dormicast::AppError;

#[test]
fn pairs_titles_with_ids() {
    let stdout = "First Song\nid001\nSecond Song\nid002\n";
    let tracks = parse_search_output(stdout);

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "id001");
    assert_eq!(tracks[0].title, "First Song");
    assert_eq!(tracks[1].id, "id002");
}

#[test]
fn trailing_title_without_id_is_dropped() {
    let tracks = parse_search_output("Only Song\nid001\nDangling title\n");
    assert_eq!(tracks.len(), 1);
}

#[test]
fn empty_output_yields_nothing() {
    assert!(parse_search_output("").is_empty());
    assert!(parse_search_output("\n\n").is_empty());
}

#[tokio::test]
async fn empty_query_skips_the_tool() {
    let tracks = search_tracks("/nonexistent/yt-dlp", "   ", 5)
        .await
        .expect("empty query never runs the tool");
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn missing_tool_is_search_error() {
    let err = search_tracks("/nonexistent/yt-dlp", "lullaby", 5)
        .await
        .expect_err("tool missing");
    assert!(matches!(err, AppError::Search(_)), "{err:?}");
}
