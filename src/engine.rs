//! Recommendation Orchestrator
//!
//! Top-level entry point. Composes encoder, transition model, scoring engine,
//! and privacy noise into the two public operations: record behavior and
//! generate recommendations, plus the popular/category paths and profile
//! management.

use crate::catalog::Catalog;
use crate::encoder;
use crate::error::Result;
use crate::event_log::EventLog;
use crate::noise::PrivacyNoise;
use crate::popularity::PopularityTracker;
use crate::profile::{ProfileStore, UserProfile};
use crate::scoring::ScoringEngine;
use crate::transition::{TableSnapshot, TransitionModel};
use crate::types::{BehaviorEvent, Candidate, ChainState, ModelStats, RecommendationContext};
use crate::RecommenderConfig;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Size of the derived candidate pool before scoring and truncation.
const CANDIDATE_POOL: usize = 50;

pub struct RecommenderEngine {
    transitions: Arc<TransitionModel>,
    popularity: Arc<PopularityTracker>,
    profiles: Arc<ProfileStore>,
    scoring: ScoringEngine,
    noise: PrivacyNoise,
    catalog: Arc<dyn Catalog>,
    event_log: Arc<dyn EventLog>,
}

impl RecommenderEngine {
    pub fn new(
        config: RecommenderConfig,
        catalog: Arc<dyn Catalog>,
        event_log: Arc<dyn EventLog>,
    ) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let transitions = Arc::new(TransitionModel::new(config.table_scope));
        let popularity = Arc::new(PopularityTracker::new());
        let profiles = Arc::new(ProfileStore::new(
            config.min_privacy_level,
            config.max_privacy_level,
            config.default_privacy_level,
        ));
        let scoring = ScoringEngine::new(
            config.weights,
            config.half_life_secs,
            Arc::clone(&transitions),
            Arc::clone(&popularity),
            Arc::clone(&profiles),
            Arc::clone(&catalog),
        );
        let noise = PrivacyNoise::new(config.base_noise_scale);

        Ok(Self {
            transitions,
            popularity,
            profiles,
            scoring,
            noise,
            catalog,
            event_log,
        })
    }

    /// Replace the noise source with a fixed-seed one. For reproducible
    /// output in tests and offline evaluation.
    pub fn with_noise_seed(mut self, base_scale: f64, seed: u64) -> Self {
        self.noise = PrivacyNoise::with_seed(base_scale, seed);
        self
    }

    /// Record one behavior event: validate, append to the external log, then
    /// update transition counts, popularity, and the recency index.
    pub fn record_behavior(&self, event: &BehaviorEvent) -> Result<ChainState> {
        let state = encoder::encode(event)?;

        self.event_log.append(event);
        self.transitions.observe(&event.user_id, state.clone());
        self.popularity.record(&event.item_id);
        self.scoring.touch(&event.user_id, &event.item_id, event.timestamp);

        debug!(user_id = %event.user_id, state = %state, "behavior recorded");
        Ok(state)
    }

    /// Ranked, noise-perturbed recommendations for a user. Unknown users
    /// degrade to cold-start defaults; this operation never fails.
    pub fn generate_recommendations(
        &self,
        user_id: &str,
        num_recommendations: usize,
        context: Option<RecommendationContext>,
    ) -> Vec<Candidate> {
        let now = Utc::now();
        let context = context.unwrap_or_default();

        let mut pool = context.candidate_items.unwrap_or_default();
        if pool.is_empty() {
            for (state, _) in self.transitions.predict_next(user_id, CANDIDATE_POOL) {
                if let Some(item) = encoder::item_of(&state) {
                    pool.push(item.to_string());
                }
            }
            for (item, _) in self.popularity.top_items(CANDIDATE_POOL) {
                pool.push(item);
            }
        }
        if let Some(category) = &context.category {
            pool.retain(|item| self.catalog.category_of(item).as_deref() == Some(category));
        }

        let mut ranked = self.scoring.score_candidates(Some(user_id), &pool, now);

        let privacy_level = self.profiles.get(user_id).privacy_level;
        self.noise.perturb_ranking(&mut ranked, privacy_level);
        ranked.truncate(num_recommendations);

        info!(
            user_id,
            privacy_level,
            returned = ranked.len(),
            "recommendations generated"
        );
        ranked
    }

    /// Pure popularity ranking for anonymous or cold callers. No
    /// personalization, no privacy noise.
    pub fn popular_recommendations(&self, top_k: usize) -> Vec<Candidate> {
        self.scoring.popular_ranking(top_k)
    }

    /// Blended ranking over one catalog category. Personalization and noise
    /// apply only when a user is supplied.
    pub fn category_recommendations(
        &self,
        category: &str,
        top_k: usize,
        user_id: Option<&str>,
    ) -> Vec<Candidate> {
        let mut ranked = self.scoring.category_ranking(category, user_id, Utc::now());

        // Noise before truncation, so which items make the top-k is itself
        // decided on noisy scores.
        if let Some(user) = user_id {
            let privacy_level = self.profiles.get(user).privacy_level;
            self.noise.perturb_ranking(&mut ranked, privacy_level);
        }
        ranked.truncate(top_k);
        ranked
    }

    /// Top-k predicted next states for a user's cursor.
    pub fn predict_next(&self, user_id: &str, top_k: usize) -> Vec<(ChainState, f64)> {
        self.transitions.predict_next(user_id, top_k)
    }

    /// Greedy most-likely behavior sequence from a starting state, up to
    /// `length` steps, stopping at dead ends.
    pub fn generate_sequence(
        &self,
        user_id: &str,
        start_state: &str,
        length: usize,
    ) -> Vec<ChainState> {
        self.transitions.generate_sequence(user_id, start_state, length)
    }

    /// Current maximum-likelihood distribution for a state in the shared
    /// table, in first-observation order.
    pub fn transition_distribution(&self, state: &str) -> Vec<(ChainState, f64)> {
        self.transitions.distribution(state)
    }

    pub fn get_profile(&self, user_id: &str) -> Arc<UserProfile> {
        self.profiles.get(user_id)
    }

    pub fn update_profile(
        &self,
        user_id: &str,
        preferences: std::collections::HashMap<String, f64>,
        privacy_level: i32,
    ) -> Result<Arc<UserProfile>> {
        self.profiles.update(user_id, preferences, privacy_level)
    }

    /// Popularity counter for an item with privacy noise applied, for
    /// aggregate exports that leave the scoring boundary.
    pub fn noisy_popularity_count(&self, item_id: &str, privacy_level: i32) -> f64 {
        self.noise.noisy_count(self.popularity.count(item_id), privacy_level)
    }

    /// Rebuild a user's chain contribution by replaying their logged
    /// history. Alternative to incremental maintenance; intended for a
    /// freshly constructed or reset engine, since replay increments the same
    /// counters `record_behavior` does.
    pub fn rebuild_from_log(&self, user_id: &str) -> Result<usize> {
        let events = self.event_log.fetch_sequence(user_id);
        for event in &events {
            let state = encoder::encode(event)?;
            self.transitions.observe(&event.user_id, state);
            self.popularity.record(&event.item_id);
            self.scoring.touch(&event.user_id, &event.item_id, event.timestamp);
        }
        info!(user_id, replayed = events.len(), "model rebuilt from event log");
        Ok(events.len())
    }

    pub fn snapshot_model(&self) -> TableSnapshot {
        self.transitions.snapshot()
    }

    pub fn snapshot_model_bytes(&self) -> Result<Vec<u8>> {
        self.transitions.snapshot_bytes()
    }

    pub fn restore_model(&self, snapshot: &TableSnapshot) -> Result<()> {
        self.transitions.restore(snapshot)
    }

    pub fn restore_model_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.transitions.restore_bytes(bytes)
    }

    pub fn model_stats(&self) -> ModelStats {
        self.transitions.stats()
    }
}
