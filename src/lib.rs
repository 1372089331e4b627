//! Privacy-preserving behavior-sequence recommender.
//!
//! Predicts a user's next action with a first-order Markov chain over
//! `behavior:item` states, blends the prediction with recency, preference,
//! and popularity signals into a ranked list, and perturbs outgoing scores
//! with calibrated Laplace noise.

pub mod catalog;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod noise;
pub mod popularity;
pub mod profile;
pub mod scoring;
pub mod transition;
pub mod types;

// Re-export key types
pub use catalog::{Catalog, InMemoryCatalog};
pub use engine::RecommenderEngine;
pub use error::{RecommenderError, Result};
pub use event_log::{EventLog, InMemoryEventLog};
pub use noise::PrivacyNoise;
pub use popularity::PopularityTracker;
pub use profile::{ProfileStore, UserProfile};
pub use scoring::{ScoringEngine, ScoringWeights};
pub use transition::{TableScope, TableSnapshot, TransitionModel};
pub use types::{
    BehaviorEvent, BehaviorType, Candidate, ChainState, ModelStats, RecommendationContext,
};

use serde::{Deserialize, Serialize};

/// Engine configuration, consumed at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Blend weights for the scoring terms (must sum to 1).
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Half-life of the recency decay, in seconds (default: 7 days).
    pub half_life_secs: f64,
    /// Laplace scale per privacy level unit.
    pub base_noise_scale: f64,
    /// Inclusive privacy level bounds.
    pub min_privacy_level: i32,
    pub max_privacy_level: i32,
    /// Level assumed for users who never set one.
    pub default_privacy_level: i32,
    /// Whether the transition table is shared across users (default) or
    /// kept per user.
    #[serde(default)]
    pub table_scope: TableScope,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            half_life_secs: 7.0 * 24.0 * 3600.0,
            base_noise_scale: 0.05,
            min_privacy_level: 0,
            max_privacy_level: 3,
            default_privacy_level: 1,
            table_scope: TableScope::Global,
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.weights.validate()?;
        if self.half_life_secs <= 0.0 {
            return Err(format!(
                "half_life_secs must be positive, got {}",
                self.half_life_secs
            ));
        }
        if self.base_noise_scale < 0.0 {
            return Err("base_noise_scale must be non-negative".to_string());
        }
        if self.min_privacy_level > self.max_privacy_level {
            return Err(format!(
                "privacy level bounds are inverted: [{}, {}]",
                self.min_privacy_level, self.max_privacy_level
            ));
        }
        if self.default_privacy_level < self.min_privacy_level
            || self.default_privacy_level > self.max_privacy_level
        {
            return Err(format!(
                "default privacy level {} outside [{}, {}]",
                self.default_privacy_level, self.min_privacy_level, self.max_privacy_level
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
