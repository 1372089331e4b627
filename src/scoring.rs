//! Scoring Engine
//!
//! Blends transition likelihood, recency decay, historical preference, and
//! item popularity into one ranked candidate list. The popular-items path is
//! a separate, simpler ranking with no personalization and no noise.

use crate::catalog::Catalog;
use crate::encoder;
use crate::popularity::PopularityTracker;
use crate::profile::ProfileStore;
use crate::transition::TransitionModel;
use crate::types::Candidate;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Blend weights for the four score terms. Fixed configuration constants,
/// non-negative, summing to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// w1: transition probability from the user's cursor state.
    pub transition: f64,
    /// w2: exponential recency decay of the user's last interaction.
    pub recency: f64,
    /// w3: stored preference weight for the item's category.
    pub preference: f64,
    /// w4: relative item popularity.
    pub popularity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            transition: 0.4,
            recency: 0.2,
            preference: 0.2,
            popularity: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.transition < 0.0 || self.recency < 0.0 || self.preference < 0.0 || self.popularity < 0.0
        {
            return Err("all scoring weights must be non-negative".to_string());
        }
        let sum = self.transition + self.recency + self.preference + self.popularity;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("scoring weights must sum to 1, got {sum}"));
        }
        Ok(())
    }
}

pub struct ScoringEngine {
    weights: ScoringWeights,
    half_life_secs: f64,
    transitions: Arc<TransitionModel>,
    popularity: Arc<PopularityTracker>,
    profiles: Arc<ProfileStore>,
    catalog: Arc<dyn Catalog>,
    /// (user, item) -> timestamp of that user's most recent event on the
    /// item. Feeds the recency term.
    last_interaction: DashMap<(String, String), DateTime<Utc>>,
}

impl ScoringEngine {
    pub fn new(
        weights: ScoringWeights,
        half_life_secs: f64,
        transitions: Arc<TransitionModel>,
        popularity: Arc<PopularityTracker>,
        profiles: Arc<ProfileStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            weights,
            half_life_secs,
            transitions,
            popularity,
            profiles,
            catalog,
            last_interaction: DashMap::new(),
        }
    }

    /// Record the time of a user's latest interaction with an item.
    pub fn touch(&self, user_id: &str, item_id: &str, at: DateTime<Utc>) {
        self.last_interaction
            .insert((user_id.to_string(), item_id.to_string()), at);
    }

    /// `exp(-age / half_life)`, 0.0 when the user never touched the item
    /// (the maximum-age sentinel).
    fn time_decay(&self, user_id: &str, item_id: &str, now: DateTime<Utc>) -> f64 {
        let key = (user_id.to_string(), item_id.to_string());
        match self.last_interaction.get(&key) {
            Some(last) => {
                let age_secs = (now - *last).num_seconds().max(0) as f64;
                (-age_secs / self.half_life_secs).exp()
            }
            None => 0.0,
        }
    }

    /// Score candidate items for a user, descending, ties broken by
    /// ascending item id. With no user, the personalization terms are zeroed
    /// and the cold-start renormalization applies.
    pub fn score_candidates(
        &self,
        user_id: Option<&str>,
        candidate_items: &[String],
        now: DateTime<Utc>,
    ) -> Vec<Candidate> {
        let w = &self.weights;

        // Transition probabilities from the user's cursor, collapsed to
        // items: a candidate's probability is the strongest next-state
        // referencing it.
        let mut item_probs: HashMap<String, f64> = HashMap::new();
        if let Some(user) = user_id {
            if let Some(cursor) = self.transitions.cursor(user) {
                for (state, prob) in self.transitions.user_distribution(user, &cursor) {
                    if let Some(item) = encoder::item_of(&state) {
                        let entry = item_probs.entry(item.to_string()).or_insert(0.0);
                        if prob > *entry {
                            *entry = prob;
                        }
                    }
                }
            }
        }
        let has_transition_signal = !item_probs.is_empty();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates = Vec::with_capacity(candidate_items.len());

        for item in candidate_items {
            if !seen.insert(item.as_str()) {
                continue;
            }

            let pop = self.popularity.score(item);
            let (decay, pref) = match user_id {
                Some(user) => {
                    let pref = self
                        .catalog
                        .category_of(item)
                        .map(|category| self.profiles.preference_weight(user, &category))
                        .unwrap_or(0.0);
                    (self.time_decay(user, item, now), pref)
                }
                None => (0.0, 0.0),
            };

            let raw_score = if has_transition_signal {
                let p = item_probs.get(item.as_str()).copied().unwrap_or(0.0);
                w.transition * p + w.recency * decay + w.preference * pref + w.popularity * pop
            } else {
                // Cold start: no distribution for the current state. Drop
                // the transition term and renormalize the rest so the score
                // range stays comparable.
                let remainder = w.recency + w.preference + w.popularity;
                if remainder > 0.0 {
                    (w.recency * decay + w.preference * pref + w.popularity * pop) / remainder
                } else {
                    0.0
                }
            };

            candidates.push(Candidate::new(item.clone(), raw_score));
        }

        candidates.sort_by(|a, b| {
            b.raw_score
                .partial_cmp(&a.raw_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        for (index, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = index + 1;
        }
        candidates
    }

    /// Pure popularity ranking. Deliberately not a parameterization of the
    /// blended scorer: no personalization, no privacy noise.
    pub fn popular_ranking(&self, top_k: usize) -> Vec<Candidate> {
        self.popularity
            .top_items(top_k)
            .into_iter()
            .enumerate()
            .map(|(index, (item, score))| {
                let mut candidate = Candidate::new(item, score);
                candidate.rank = index + 1;
                candidate
            })
            .collect()
    }

    /// Blended scoring over every item of one catalog category. The caller
    /// truncates after any noise pass, so selection happens on noisy scores.
    pub fn category_ranking(
        &self,
        category: &str,
        user_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<Candidate> {
        let items = self.catalog.items_by_category(category);
        self.score_candidates(user_id, &items, now)
    }
}
