//! Shared domain types for the behavior-sequence recommender.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Discrete chain state label: `"{behavior}:{item_id}"`.
pub type ChainState = String;

/// Behavior kinds tracked by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorType {
    View,
    Click,
    Like,
    Share,
    Purchase,
    AddToCart,
    Search,
    Follow,
}

impl BehaviorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorType::View => "view",
            BehaviorType::Click => "click",
            BehaviorType::Like => "like",
            BehaviorType::Share => "share",
            BehaviorType::Purchase => "purchase",
            BehaviorType::AddToCart => "add_to_cart",
            BehaviorType::Search => "search",
            BehaviorType::Follow => "follow",
        }
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed user action. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub user_id: String,
    pub item_id: String,
    pub behavior: BehaviorType,
    /// Item category, when the caller knows it at record time.
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl BehaviorEvent {
    pub fn new(user_id: impl Into<String>, behavior: BehaviorType, item_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            behavior,
            category: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Optional request-scoped hints for recommendation generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationContext {
    /// Restrict candidates to one category.
    pub category: Option<String>,
    /// Explicit candidate pool supplied by the caller. When absent the engine
    /// derives the pool from predicted next states and popular items.
    pub candidate_items: Option<Vec<String>>,
}

/// A ranked recommendation. Ephemeral, rebuilt per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: String,
    pub raw_score: f64,
    /// Score after privacy noise. Equal to `raw_score` until noise is applied.
    pub noisy_score: f64,
    /// 1-based position in the final (noisy) ordering.
    pub rank: usize,
}

impl Candidate {
    pub fn new(item_id: impl Into<String>, raw_score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            raw_score,
            noisy_score: raw_score,
            rank: 0,
        }
    }
}

/// Aggregate shape of the transition model, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    /// Total observed transitions across all rows.
    pub transition_total: u64,
    /// Number of states with at least one outgoing transition.
    pub state_count: usize,
    /// Mean distinct next-states per state (0.0 for an empty model).
    pub mean_out_degree: f64,
}
