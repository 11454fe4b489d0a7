// tests/feed_pagination.rs
//
// Cursor pagination: the three-post scenario, tiling over the fixture for every page
// size, and stale-cursor handling in both modes.

mod common;

use chronicle_engine::{EngineOptions, QueryError};
use common::*;

fn three_posts(opts: EngineOptions) -> chronicle_engine::Engine {
    engine_from(
        raw(
            vec![era("e")],
            vec![profile("x", "e")],
            vec![
                post("first", "x", "e", "2024-01-01T00:00:00Z"),
                post("third", "x", "e", "2024-01-03T00:00:00Z"),
                post("second", "x", "e", "2024-01-02T00:00:00Z"),
            ],
        ),
        opts,
    )
}

#[test]
fn oversized_limit_after_a_cursor_returns_the_rest() {
    let engine = three_posts(EngineOptions::default());
    let seg = engine.feed_segment(Some("third"), usize::MAX).unwrap();
    assert_eq!(post_ids(&seg.posts), ["second", "first"]);
    assert!(!seg.has_more);
    assert_eq!(seg.next_cursor, None);
}

#[test]
fn three_post_scenario() {
    let engine = three_posts(EngineOptions::default());

    let page1 = engine.feed_segment(None, 2).unwrap();
    assert_eq!(post_ids(&page1.posts), ["third", "second"]);
    assert!(page1.has_more);
    assert_eq!(page1.next_cursor.as_deref(), Some("second"));

    let page2 = engine.feed_segment(page1.next_cursor.as_deref(), 2).unwrap();
    assert_eq!(post_ids(&page2.posts), ["first"]);
    assert!(!page2.has_more);
    assert_eq!(page2.next_cursor, None);
    assert_eq!(page2.cursor.as_deref(), Some("second"));
}

#[test]
fn segments_tile_the_canonical_order_for_every_limit() {
    let engine = fixture_engine();
    let expected: Vec<String> = engine.corpus().posts().iter().map(|p| p.id.clone()).collect();

    for limit in 1..=expected.len() + 1 {
        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let seg = engine.feed_segment(cursor.as_deref(), limit).unwrap();
            assert!(seg.posts.len() <= limit);
            seen.extend(post_ids(&seg.posts));
            if !seg.has_more {
                assert!(seg.next_cursor.is_none());
                break;
            }
            cursor = seg.next_cursor;
            assert!(cursor.is_some(), "has_more without a cursor at limit {limit}");
        }
        assert_eq!(seen, expected, "limit {limit}");
    }
}

#[test]
fn zero_limit_is_clamped_to_one() {
    let engine = three_posts(EngineOptions::default());
    let seg = engine.feed_segment(None, 0).unwrap();
    assert_eq!(seg.posts.len(), 1);
    assert!(seg.has_more);
}

#[test]
fn cursor_on_last_post_yields_empty_final_segment() {
    let engine = three_posts(EngineOptions::default());
    let seg = engine.feed_segment(Some("first"), 5).unwrap();
    assert!(seg.posts.is_empty());
    assert!(!seg.has_more);
}

#[test]
fn stale_cursor_restarts_when_lenient() {
    let engine = three_posts(EngineOptions::default());
    let seg = engine.feed_segment(Some("deleted-post"), 2).unwrap();
    assert_eq!(seg.cursor, None);
    assert_eq!(post_ids(&seg.posts), ["third", "second"]);
}

#[test]
fn stale_cursor_fails_when_strict() {
    let engine = three_posts(EngineOptions {
        strict: true,
        ..EngineOptions::default()
    });
    assert_eq!(
        engine.feed_segment(Some("deleted-post"), 2).unwrap_err(),
        QueryError::UnknownCursor("deleted-post".into())
    );
}

#[test]
fn segments_carry_the_corpus_version() {
    let engine = fixture_engine();
    let seg = engine.feed_segment(None, 3).unwrap();
    assert_eq!(seg.corpus_version, engine.corpus().version());

    let other = three_posts(EngineOptions::default());
    assert_ne!(other.feed_segment(None, 3).unwrap().corpus_version, seg.corpus_version);
}
