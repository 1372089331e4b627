//! Popularity Tracker
//!
//! Item-level counters independent of any per-user sequence. Scores are
//! normalized by the current maximum count, so they are relative to the
//! moment of the call, not absolute.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct PopularityTracker {
    counts: DashMap<String, u64>,
    /// Highest count seen so far; the normalization denominator.
    max_count: AtomicU64,
}

impl PopularityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for an item. One atomic increment-and-create on
    /// a single map entry.
    pub fn record(&self, item_id: &str) {
        let current = {
            let mut entry = self.counts.entry(item_id.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        self.max_count.fetch_max(current, Ordering::Relaxed);
    }

    pub fn count(&self, item_id: &str) -> u64 {
        self.counts.get(item_id).map(|c| *c).unwrap_or(0)
    }

    /// Relative popularity in [0, 1], normalized by the maximum counter
    /// observed so far. 0.0 when nothing has been recorded.
    pub fn score(&self, item_id: &str) -> f64 {
        let max = self.max_count.load(Ordering::Relaxed);
        if max == 0 {
            return 0.0;
        }
        self.count(item_id) as f64 / max as f64
    }

    /// Top-k items by count, ties broken by ascending item id.
    pub fn top_items(&self, top_k: usize) -> Vec<(String, f64)> {
        let max = self.max_count.load(Ordering::Relaxed);
        if max == 0 {
            return Vec::new();
        }

        let mut items: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items.truncate(top_k);

        items
            .into_iter()
            .map(|(item, count)| (item, count as f64 / max as f64))
            .collect()
    }
}
