//! End-to-end scenarios over the public engine API.

use markov_recommender::{
    BehaviorEvent, BehaviorType, InMemoryCatalog, InMemoryEventLog, RecommenderConfig,
    RecommenderEngine, ScoringWeights, TableScope,
};
use std::collections::HashMap;
use std::sync::Arc;

fn event(user: &str, behavior: BehaviorType, item: &str) -> BehaviorEvent {
    BehaviorEvent::new(user, behavior, item)
}

fn browse_and_buy_catalog() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.add_item("novel", "books");
    catalog.add_item("cookbook", "books");
    catalog.add_item("skillet", "kitchen");
    catalog
}

fn seeded_engine(catalog: Arc<InMemoryCatalog>, seed: u64) -> RecommenderEngine {
    let config = RecommenderConfig::default();
    let base_scale = config.base_noise_scale;
    RecommenderEngine::new(config, catalog, Arc::new(InMemoryEventLog::new()))
        .unwrap()
        .with_noise_seed(base_scale, seed)
}

#[test]
fn test_record_then_recommend_full_flow() {
    let engine = seeded_engine(browse_and_buy_catalog(), 11);

    // A browsing session that repeatedly moves view -> purchase.
    for _ in 0..5 {
        engine.record_behavior(&event("alice", BehaviorType::View, "novel")).unwrap();
        engine.record_behavior(&event("alice", BehaviorType::Purchase, "novel")).unwrap();
    }
    engine.record_behavior(&event("alice", BehaviorType::View, "novel")).unwrap();
    engine
        .update_profile("alice", HashMap::from([("books".to_string(), 1.0)]), 1)
        .unwrap();

    let recs = engine.generate_recommendations("alice", 3, None);
    assert!(!recs.is_empty());
    assert_eq!(recs[0].rank, 1);
    // The chain, recency, preference, and popularity all point at the novel.
    assert_eq!(recs[0].item_id, "novel");
}

#[test]
fn test_higher_privacy_level_perturbs_more() {
    // Same history, same seed, different privacy levels: the noisy scores
    // must deviate at least as much in expectation at the higher level.
    let deviation = |level: i32, seed: u64| -> f64 {
        let engine = seeded_engine(browse_and_buy_catalog(), seed);
        for _ in 0..4 {
            engine.record_behavior(&event("u", BehaviorType::View, "novel")).unwrap();
            engine.record_behavior(&event("u", BehaviorType::Click, "cookbook")).unwrap();
        }
        engine.update_profile("u", HashMap::new(), level).unwrap();

        (0..200)
            .flat_map(|_| engine.generate_recommendations("u", 5, None))
            .map(|c| (c.noisy_score - c.raw_score).abs())
            .sum::<f64>()
    };

    let low = deviation(1, 3);
    let high = deviation(3, 3);
    assert!(high >= low, "level 3 deviation {high} < level 1 deviation {low}");
}

#[test]
fn test_privacy_level_zero_keeps_raw_ranking() {
    let engine = seeded_engine(browse_and_buy_catalog(), 5);

    engine.record_behavior(&event("bob", BehaviorType::View, "novel")).unwrap();
    engine.record_behavior(&event("bob", BehaviorType::View, "skillet")).unwrap();
    engine.update_profile("bob", HashMap::new(), 0).unwrap();

    let recs = engine.generate_recommendations("bob", 5, None);
    for candidate in &recs {
        assert_eq!(candidate.noisy_score, candidate.raw_score);
    }
    // Order must follow raw scores exactly.
    for pair in recs.windows(2) {
        assert!(pair[0].raw_score >= pair[1].raw_score);
    }
}

#[test]
fn test_per_user_table_scope_isolation() {
    let config = RecommenderConfig {
        table_scope: TableScope::PerUser,
        ..RecommenderConfig::default()
    };
    let engine = RecommenderEngine::new(
        config,
        browse_and_buy_catalog(),
        Arc::new(InMemoryEventLog::new()),
    )
    .unwrap();

    engine.record_behavior(&event("u1", BehaviorType::View, "novel")).unwrap();
    engine.record_behavior(&event("u1", BehaviorType::Purchase, "novel")).unwrap();
    engine.record_behavior(&event("u1", BehaviorType::View, "novel")).unwrap();

    // u2 lands on the same state but learns nothing from u1's chain.
    engine.record_behavior(&event("u2", BehaviorType::View, "novel")).unwrap();

    assert_eq!(engine.predict_next("u1", 1).len(), 1);
    assert!(engine.predict_next("u2", 1).is_empty());
}

#[test]
fn test_custom_weights_respected() {
    // Popularity-only weighting turns the blended scorer into a popularity
    // ranking even for warm users.
    let config = RecommenderConfig {
        weights: ScoringWeights {
            transition: 0.0,
            recency: 0.0,
            preference: 0.0,
            popularity: 1.0,
        },
        base_noise_scale: 0.0,
        ..RecommenderConfig::default()
    };
    let engine = RecommenderEngine::new(
        config,
        browse_and_buy_catalog(),
        Arc::new(InMemoryEventLog::new()),
    )
    .unwrap();

    engine.record_behavior(&event("u1", BehaviorType::View, "novel")).unwrap();
    engine.record_behavior(&event("u1", BehaviorType::View, "skillet")).unwrap();
    engine.record_behavior(&event("u2", BehaviorType::View, "skillet")).unwrap();

    let recs = engine.generate_recommendations("u1", 2, None);
    assert_eq!(recs[0].item_id, "skillet");
}

#[test]
fn test_snapshot_restore_across_engines() {
    let engine = seeded_engine(browse_and_buy_catalog(), 1);
    engine.record_behavior(&event("u1", BehaviorType::View, "novel")).unwrap();
    engine.record_behavior(&event("u1", BehaviorType::Purchase, "novel")).unwrap();
    let bytes = engine.snapshot_model_bytes().unwrap();

    let replacement = seeded_engine(browse_and_buy_catalog(), 1);
    replacement.restore_model_bytes(&bytes).unwrap();

    assert_eq!(
        replacement.transition_distribution("view:novel"),
        engine.transition_distribution("view:novel")
    );
}

#[test]
fn test_popular_path_is_noise_free_and_deterministic() {
    let engine = seeded_engine(browse_and_buy_catalog(), 99);
    for _ in 0..3 {
        engine.record_behavior(&event("u1", BehaviorType::View, "novel")).unwrap();
    }
    engine.record_behavior(&event("u2", BehaviorType::View, "skillet")).unwrap();

    let first = engine.popular_recommendations(5);
    let second = engine.popular_recommendations(5);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].item_id, "novel");
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.noisy_score, b.noisy_score);
        assert_eq!(a.rank, b.rank);
    }
}
