//! Privacy Noise Layer
//!
//! Perturbs scores (and optionally aggregated counts) with zero-mean Laplace
//! noise before they leave the scoring boundary. Noise scale is
//! `base_scale * privacy_level`, so a higher level always means equal or
//! greater expected noise.
//!
//! The random source is owned here and seedable, so tests can fix the seed
//! and assert reproducible output. Noisy scores are clamped to be
//! non-negative; clamping after additive noise slightly biases values near
//! zero, an accepted trade-off for keeping the score range valid.

use crate::types::Candidate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub struct PrivacyNoise {
    base_scale: f64,
    rng: Mutex<StdRng>,
}

impl PrivacyNoise {
    pub fn new(base_scale: f64) -> Self {
        Self {
            base_scale,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed-seed source for reproducible output.
    pub fn with_seed(base_scale: f64, seed: u64) -> Self {
        Self {
            base_scale,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// One draw from Laplace(0, scale) via inverse CDF.
    fn laplace(&self, scale: f64) -> f64 {
        if scale <= 0.0 {
            return 0.0;
        }
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let u: f64 = rng.gen::<f64>() - 0.5;
        // Guard the log argument away from zero at |u| = 0.5.
        -scale * u.signum() * (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE).ln()
    }

    /// Perturb one score. Level 0 passes the score through unchanged; the
    /// result is clamped to be non-negative.
    pub fn apply(&self, score: f64, privacy_level: i32) -> f64 {
        let scale = self.base_scale * privacy_level.max(0) as f64;
        (score + self.laplace(scale)).max(0.0)
    }

    /// Perturb an aggregated count for analytics-style exports.
    pub fn noisy_count(&self, count: u64, privacy_level: i32) -> f64 {
        self.apply(count as f64, privacy_level)
    }

    /// Apply noise to every candidate, then re-derive the ranking from the
    /// noisy scores. Re-sorting is what makes the layer perturb output
    /// order, not just the displayed numbers.
    pub fn perturb_ranking(&self, candidates: &mut Vec<Candidate>, privacy_level: i32) {
        for candidate in candidates.iter_mut() {
            candidate.noisy_score = self.apply(candidate.raw_score, privacy_level);
        }
        candidates.sort_by(|a, b| {
            b.noisy_score
                .partial_cmp(&a.noisy_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        for (index, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = index + 1;
        }
    }
}
