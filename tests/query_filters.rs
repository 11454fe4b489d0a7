// tests/query_filters.rs
//
// Facet filters, search and lookups against the fixture corpus.

mod common;

use chronicle_engine::{Accuracy, PostFilters, PostType, QueryError};
use common::*;

#[test]
fn no_filters_returns_whole_corpus_in_canonical_order() {
    let engine = fixture_engine();
    let all = engine.posts(&PostFilters::default()).unwrap();
    let stored: Vec<String> = engine.corpus().posts().iter().map(|p| p.id.clone()).collect();
    assert_eq!(post_ids(&all), stored);
}

#[test]
fn era_and_author_facets() {
    let engine = fixture_engine();
    assert_eq!(engine.posts(&PostFilters::default().era("civil-war")).unwrap().len(), 4);
    assert_eq!(
        post_ids(&engine.posts(&PostFilters::default().author("hamilton")).unwrap()),
        ["p-ham-3", "p-ham-1", "p-ham-2"]
    );
}

#[test]
fn hashtag_facet_ignores_case_and_hash_prefix() {
    let engine = fixture_engine();
    for tag in ["liberty", "#Liberty", "LIBERTY"] {
        let got = engine.posts(&PostFilters::default().hashtag(tag)).unwrap();
        assert_eq!(post_ids(&got), ["p-linc-1", "p-jeff-2", "p-jeff-1", "p-ghost-1"], "tag {tag}");
    }
}

#[test]
fn multi_valued_facets_match_any_value() {
    let engine = fixture_engine();
    let got = engine
        .posts(&PostFilters::default().types([PostType::Article, PostType::Quote]))
        .unwrap();
    assert_eq!(got.len(), 5);
    assert!(got.iter().all(|p| matches!(p.kind, PostType::Article | PostType::Quote)));

    let verified = engine
        .posts(&PostFilters::default().accuracy([Accuracy::Verified]))
        .unwrap();
    assert_eq!(
        post_ids(&verified),
        ["p-grant-1", "p-linc-1", "p-linc-2", "p-ham-1", "p-jeff-1"]
    );
}

#[test]
fn facets_combine_with_and() {
    let engine = fixture_engine();
    let got = engine
        .posts(
            &PostFilters::default()
                .era("revolution")
                .accuracy([Accuracy::Verified, Accuracy::Documented])
                .hashtag("independence"),
        )
        .unwrap();
    assert_eq!(post_ids(&got), ["p-wash-1", "p-jeff-1", "p-adams-1"]);
}

#[test]
fn date_range_is_inclusive_and_accepts_years() {
    let engine = fixture_engine();
    let got = engine.posts(&PostFilters::default().between("1790", "1790")).unwrap();
    assert_eq!(post_ids(&got), ["p-jeff-2", "p-ham-3", "p-ham-1", "p-ham-2"]);

    let day = engine
        .posts(&PostFilters::default().between("1863-01-01", "1863-01-01"))
        .unwrap();
    assert_eq!(post_ids(&day), ["p-doug-1", "p-linc-2"]);
}

#[test]
fn every_filtered_post_satisfies_its_facets() {
    let engine = fixture_engine();
    let all = engine.posts(&PostFilters::default()).unwrap();
    let filters = PostFilters::default()
        .era("revolution")
        .types([PostType::Status, PostType::Tweet]);
    let got = engine.posts(&filters).unwrap();
    assert!(!got.is_empty());
    for p in &got {
        assert_eq!(p.era, "revolution");
        assert!(matches!(p.kind, PostType::Status | PostType::Tweet));
        assert!(all.iter().any(|q| q.id == p.id));
    }
}

#[test]
fn unparseable_dates_are_ignored_when_lenient() {
    let engine = fixture_engine();
    let mut f = PostFilters::default();
    f.start_date = Some("soon".into());
    assert_eq!(engine.posts(&f).unwrap().len(), 13);
}

#[test]
fn unparseable_dates_fail_when_strict() {
    let engine = strict_fixture_engine();
    let mut f = PostFilters::default();
    f.end_date = Some("the day after tomorrow".into());
    assert_eq!(
        engine.posts(&f).unwrap_err(),
        QueryError::InvalidFilter {
            field: "endDate",
            value: "the day after tomorrow".into()
        }
    );
}

#[test]
fn free_text_search_covers_content_titles_and_tags() {
    let engine = fixture_engine();
    let got = engine.posts(&PostFilters::default().search("declaration")).unwrap();
    assert_eq!(post_ids(&got), ["p-wash-1", "p-jeff-1"]);
}

#[test]
fn site_search_spans_posts_profiles_and_eras() {
    let engine = fixture_engine();
    let r = engine.search("Independence", 10);
    assert_eq!(post_ids(&r.posts), ["p-wash-1", "p-jeff-1", "p-adams-1"]);
    assert!(r.profiles.is_empty());
    assert_eq!(r.eras.len(), 1);

    let r = engine.search("declaration", 1);
    assert_eq!(r.posts.len(), 1);
    assert_eq!(profile_ids(&r.profiles), ["jefferson"]);

    assert!(engine.search("   ", 10).is_empty());
}

#[test]
fn handle_lookup_ignores_case_and_at_prefix() {
    let engine = fixture_engine();
    for h in ["AlexHamilton", "@alexhamilton", "  @ALEXHAMILTON "] {
        assert_eq!(engine.profile_by_handle(h).map(|p| p.id.as_str()), Some("hamilton"), "{h}");
    }
    assert_eq!(engine.profile("hamilton").unwrap().handle, "@AlexHamilton");
    assert!(engine.profile_by_handle("@nobody").is_none());
}

#[test]
fn lookups_return_none_for_unknown_ids() {
    let engine = fixture_engine();
    assert!(engine.post("p-nope").is_none());
    assert!(engine.profile("nobody").is_none());
    assert!(engine.era("bronze-age").is_none());
    assert!(engine.posts_by_author("nobody").is_empty());
}

#[test]
fn profiles_by_era() {
    let engine = fixture_engine();
    let got = engine.profiles_by_era("civil-war");
    assert_eq!(profile_ids(&got), ["lincoln", "grant", "douglass"]);
}

#[test]
fn threads_follow_position_and_replies_follow_canonical_order() {
    let engine = fixture_engine();
    assert_eq!(post_ids(&engine.thread("t-credit")), ["p-ham-2", "p-ham-3"]);
    assert_eq!(post_ids(&engine.replies("p-linc-2")), ["p-doug-1"]);
    assert!(engine.replies("p-grant-1").is_empty());
}

fn assert_canonical(posts: &[&chronicle_engine::Post]) {
    assert!(
        posts.windows(2).all(|w| w[0].canonical_cmp(w[1]).is_le()),
        "not in canonical order: {:?}",
        post_ids(posts)
    );
}

#[test]
fn combined_facets_are_a_subset_of_each_single_facet() {
    let engine = fixture_engine();
    let facets: Vec<fn(PostFilters) -> PostFilters> = vec![
        |f: PostFilters| f.era("revolution"),
        |f: PostFilters| f.author("hamilton"),
        |f: PostFilters| f.types([PostType::Article, PostType::Tweet]),
        |f: PostFilters| f.accuracy([Accuracy::Verified, Accuracy::Documented]),
        |f: PostFilters| f.hashtag("liberty"),
        |f: PostFilters| f.between("1776", "1790"),
        |f: PostFilters| f.search("the"),
    ];

    let singles: Vec<Vec<String>> = facets
        .iter()
        .map(|apply| {
            let got = engine.posts(&apply(PostFilters::default())).unwrap();
            assert_canonical(&got);
            post_ids(&got)
        })
        .collect();

    // Every pair and every consecutive triple.
    let mut combos: Vec<Vec<usize>> = Vec::new();
    for i in 0..facets.len() {
        for j in i + 1..facets.len() {
            combos.push(vec![i, j]);
        }
        if i + 2 < facets.len() {
            combos.push(vec![i, i + 1, i + 2]);
        }
    }

    for combo in combos {
        let filters = combo
            .iter()
            .fold(PostFilters::default(), |f, &i| facets[i](f));
        let got = engine.posts(&filters).unwrap();
        assert_canonical(&got);
        let ids = post_ids(&got);
        for &i in &combo {
            assert!(
                ids.iter().all(|id| singles[i].contains(id)),
                "combo {combo:?} returned {ids:?}, not within facet {i}: {:?}",
                singles[i]
            );
        }
    }
}
