//! Preference Profile store
//!
//! Per-user preference weights plus a user-controlled privacy level. Updates
//! replace the whole record behind an `Arc` swap, so a concurrent reader sees
//! either the old record or the new one, never a mix.

use crate::error::{RecommenderError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Category (or item) -> caller-supplied weight. Positive favors,
    /// negative penalizes.
    pub preferences: HashMap<String, f64>,
    pub privacy_level: i32,
    pub updated_at: DateTime<Utc>,
}

pub struct ProfileStore {
    profiles: DashMap<String, Arc<UserProfile>>,
    min_level: i32,
    max_level: i32,
    default_level: i32,
}

impl ProfileStore {
    pub fn new(min_level: i32, max_level: i32, default_level: i32) -> Self {
        Self {
            profiles: DashMap::new(),
            min_level,
            max_level,
            default_level,
        }
    }

    /// Fetch a user's profile. Never fails: an absent user gets an empty
    /// default profile at the system default privacy level, created and
    /// stored on first access so repeated reads return the same record.
    pub fn get(&self, user_id: &str) -> Arc<UserProfile> {
        let profile = self.profiles.entry(user_id.to_string()).or_insert_with(|| {
            Arc::new(UserProfile {
                user_id: user_id.to_string(),
                preferences: HashMap::new(),
                privacy_level: self.default_level,
                updated_at: Utc::now(),
            })
        });
        Arc::clone(profile.value())
    }

    /// Replace a user's preferences and privacy level as one unit.
    ///
    /// An out-of-bound level is rejected before any mutation; the stored
    /// profile is left exactly as it was.
    pub fn update(
        &self,
        user_id: &str,
        preferences: HashMap<String, f64>,
        privacy_level: i32,
    ) -> Result<Arc<UserProfile>> {
        if privacy_level < self.min_level || privacy_level > self.max_level {
            return Err(RecommenderError::InvalidPrivacyLevel {
                level: privacy_level,
                min: self.min_level,
                max: self.max_level,
            });
        }

        let profile = Arc::new(UserProfile {
            user_id: user_id.to_string(),
            preferences,
            privacy_level,
            updated_at: Utc::now(),
        });
        self.profiles.insert(user_id.to_string(), Arc::clone(&profile));

        info!(user_id, privacy_level, "profile updated");
        Ok(profile)
    }

    /// Preference weight for a category, 0.0 when unset (neutral).
    pub fn preference_weight(&self, user_id: &str, category: &str) -> f64 {
        self.profiles
            .get(user_id)
            .and_then(|p| p.preferences.get(category).copied())
            .unwrap_or(0.0)
    }
}
