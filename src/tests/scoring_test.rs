//! Scoring engine blend and fallback tests.

use crate::catalog::InMemoryCatalog;
use crate::popularity::PopularityTracker;
use crate::profile::ProfileStore;
use crate::scoring::{ScoringEngine, ScoringWeights};
use crate::transition::{TableScope, TransitionModel};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

const HALF_LIFE: f64 = 7.0 * 24.0 * 3600.0;

struct Fixture {
    transitions: Arc<TransitionModel>,
    popularity: Arc<PopularityTracker>,
    profiles: Arc<ProfileStore>,
    catalog: Arc<InMemoryCatalog>,
    scoring: ScoringEngine,
}

fn fixture() -> Fixture {
    let transitions = Arc::new(TransitionModel::new(TableScope::Global));
    let popularity = Arc::new(PopularityTracker::new());
    let profiles = Arc::new(ProfileStore::new(0, 3, 1));
    let catalog = Arc::new(InMemoryCatalog::new());
    let scoring = ScoringEngine::new(
        ScoringWeights::default(),
        HALF_LIFE,
        Arc::clone(&transitions),
        Arc::clone(&popularity),
        Arc::clone(&profiles),
        catalog.clone(),
    );
    Fixture {
        transitions,
        popularity,
        profiles,
        catalog,
        scoring,
    }
}

#[test]
fn test_blended_score_exact_value() {
    let f = fixture();
    let now = Utc::now();

    // u1's cursor is view:x with a certain transition to view:y.
    f.transitions.observe("u1", "view:x".to_string());
    f.transitions.observe("u1", "view:y".to_string());
    f.transitions.observe("u1", "view:x".to_string());

    f.popularity.record("y");
    f.catalog.add_item("y", "books");
    f.profiles
        .update("u1", HashMap::from([("books".to_string(), 0.5)]), 1)
        .unwrap();
    f.scoring.touch("u1", "y", now);

    let ranked = f.scoring.score_candidates(Some("u1"), &["y".to_string()], now);
    assert_eq!(ranked.len(), 1);
    // 0.4*1.0 (transition) + 0.2*1.0 (decay) + 0.2*0.5 (pref) + 0.2*1.0 (pop)
    assert!((ranked[0].raw_score - 0.9).abs() < 1e-9);
    assert_eq!(ranked[0].rank, 1);
}

#[test]
fn test_cold_start_renormalization() {
    let f = fixture();
    let now = Utc::now();

    f.popularity.record("hot");

    // No cursor for this user: transition term dropped, remaining weights
    // renormalized by (w2 + w3 + w4).
    let ranked = f
        .scoring
        .score_candidates(Some("newcomer"), &["hot".to_string()], now);
    assert!((ranked[0].raw_score - 0.2 / 0.6).abs() < 1e-9);
}

#[test]
fn test_missing_preference_is_neutral() {
    let f = fixture();
    let now = Utc::now();

    f.popularity.record("a");
    f.popularity.record("b");
    f.catalog.add_item("a", "books");
    // b has no catalog entry at all; both users lack preference weights.

    let ranked = f
        .scoring
        .score_candidates(Some("u1"), &["a".to_string(), "b".to_string()], now);
    // Equal popularity, zero preference either way: a full tie, broken by
    // ascending item id.
    assert_eq!(ranked[0].item_id, "a");
    assert_eq!(ranked[1].item_id, "b");
    assert!((ranked[0].raw_score - ranked[1].raw_score).abs() < 1e-12);
}

#[test]
fn test_ties_break_by_ascending_item_id() {
    let f = fixture();
    let now = Utc::now();

    let items = vec!["c".to_string(), "a".to_string(), "b".to_string()];
    let ranked = f.scoring.score_candidates(Some("u1"), &items, now);
    let order: Vec<&str> = ranked.iter().map(|c| c.item_id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn test_duplicate_candidates_collapse() {
    let f = fixture();
    let items = vec!["a".to_string(), "a".to_string(), "b".to_string()];
    let ranked = f.scoring.score_candidates(None, &items, Utc::now());
    assert_eq!(ranked.len(), 2);
}

#[test]
fn test_anonymous_scoring_zeroes_personalization() {
    let f = fixture();
    let now = Utc::now();

    f.popularity.record("x");
    f.catalog.add_item("x", "books");
    f.profiles
        .update("u1", HashMap::from([("books".to_string(), 5.0)]), 1)
        .unwrap();
    f.scoring.touch("u1", "x", now);

    let anonymous = f.scoring.score_candidates(None, &["x".to_string()], now);
    // Only the popularity term survives for anonymous callers.
    assert!((anonymous[0].raw_score - 0.2 / 0.6).abs() < 1e-9);
}

#[test]
fn test_category_ranking_filters_catalog() {
    let f = fixture();

    f.catalog.add_item("book1", "books");
    f.catalog.add_item("book2", "books");
    f.catalog.add_item("pan", "kitchen");
    f.popularity.record("book2");
    f.popularity.record("pan");

    let ranked = f.scoring.category_ranking("books", None, Utc::now());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].item_id, "book2");
    assert!(ranked.iter().all(|c| c.item_id.starts_with("book")));
}

#[test]
fn test_popular_ranking_ignores_personalization() {
    let f = fixture();

    f.popularity.record("a");
    f.popularity.record("a");
    f.popularity.record("b");
    f.profiles
        .update("u1", HashMap::from([("books".to_string(), 100.0)]), 1)
        .unwrap();

    let ranked = f.scoring.popular_ranking(5);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].item_id, "a");
    assert_eq!(ranked[0].raw_score, 1.0);
    assert_eq!(ranked[1].item_id, "b");
    assert_eq!(ranked[1].raw_score, 0.5);
}

#[test]
fn test_recency_decay_orders_recent_first() {
    let f = fixture();
    let now = Utc::now();

    f.scoring.touch("u1", "fresh", now);
    f.scoring
        .touch("u1", "stale", now - chrono::Duration::days(60));

    let ranked = f.scoring.score_candidates(
        Some("u1"),
        &["stale".to_string(), "fresh".to_string()],
        now,
    );
    assert_eq!(ranked[0].item_id, "fresh");
    assert!(ranked[0].raw_score > ranked[1].raw_score);
}
