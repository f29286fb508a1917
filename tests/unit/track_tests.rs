//! Unit tests for link parsing and catalog resolution.

use dormicast::models::track::{extract_video_id, resolve_tracks, SongRecord};

fn record(title: &str, link: Option<&str>) -> SongRecord {
    serde_json::from_value(serde_json::json!({
        "title": title,
        "youtube_link": link,
    }))
    .expect("song record")
}

#[test]
fn extracts_id_from_supported_link_shapes() {
    let cases = [
        ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        ("https://youtube.com/watch?v=abc123&t=42", "abc123"),
        ("https://youtu.be/xyz789?si=share", "xyz789"),
        ("https://www.youtube.com/embed/emb_1", "emb_1"),
        ("http://youtube.com/v/old-style", "old-style"),
    ];
    for (link, id) in cases {
        assert_eq!(extract_video_id(link).as_deref(), Some(id), "{link}");
    }
}

#[test]
fn unsupported_links_yield_nothing() {
    for link in ["", "https://example.com/watch?v=abc", "https://youtube.com/", "not a link"] {
        assert_eq!(extract_video_id(link), None, "{link}");
    }
}

#[test]
fn resolve_keeps_order_and_drops_unplayable_records() {
    let records = vec![
        record("First", Some("https://youtu.be/one")),
        record("No link", None),
        record("Bad link", Some("https://example.com/two")),
        record("Third", Some("https://www.youtube.com/watch?v=three")),
    ];

    let tracks = resolve_tracks(&records);
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["one", "three"]);
    assert_eq!(tracks[0].title, "First");
    assert_eq!(tracks[1].title, "Third");
}

#[test]
fn record_keeps_unknown_fields() {
    let raw = serde_json::json!({
        "id": 7,
        "title": "Lullaby",
        "youtube_link": "https://youtu.be/abc",
        "artist": "Someone",
    });
    let rec: SongRecord = serde_json::from_value(raw.clone()).unwrap();

    assert_eq!(rec.extra.len(), 2);
    assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
}

#[test]
fn record_without_title_defaults_to_empty() {
    let rec: SongRecord =
        serde_json::from_value(serde_json::json!({ "youtube_link": "https://youtu.be/abc" }))
            .unwrap();
    assert!(rec.title.is_empty());
    assert_eq!(resolve_tracks(&[rec])[0].id, "abc");
}
