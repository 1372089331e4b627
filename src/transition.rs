//! Transition Model
//!
//! First-order Markov chain over chain states. Keeps a shared transition
//! table (count per observed state pair) and a compact per-user cursor: the
//! last state seen for each user. The cursor is the sufficient statistic for
//! prediction; full event history stays in the external log.
//!
//! The table is global across users by default so rare users benefit from
//! population-level patterns. `TableScope::PerUser` keys rows by user instead.

use crate::error::{RecommenderError, Result};
use crate::types::{ChainState, ModelStats};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snapshot format understood by this build.
const SNAPSHOT_VERSION: u32 = 1;

/// Row key shared by all users under `TableScope::Global`.
const SHARED_SCOPE: &str = "*";

/// Whether the transition table is shared across users or kept per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableScope {
    #[default]
    Global,
    PerUser,
}

/// One table row: observed next-states with counts, in first-observation
/// order. The order is the deterministic tie-break for equal probabilities.
#[derive(Debug, Default, Clone)]
struct Row {
    next: Vec<(ChainState, u64)>,
    total: u64,
}

impl Row {
    fn increment(&mut self, state: &str) {
        match self.next.iter_mut().find(|(s, _)| s == state) {
            Some((_, count)) => *count += 1,
            None => self.next.push((state.to_string(), 1)),
        }
        self.total += 1;
    }
}

/// Versioned key-count dump of the table. Round-trips losslessly, including
/// first-observation order within each row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub version: u32,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub scope: String,
    pub state: ChainState,
    pub next: ChainState,
    pub count: u64,
}

pub struct TransitionModel {
    scope: TableScope,
    /// (scope key, state) -> row. Dashmap shard locks give per-row
    /// consistency; reads of one row never block writes to another.
    rows: DashMap<(String, ChainState), Row>,
    cursors: DashMap<String, ChainState>,
}

impl TransitionModel {
    pub fn new(scope: TableScope) -> Self {
        Self {
            scope,
            rows: DashMap::new(),
            cursors: DashMap::new(),
        }
    }

    fn scope_key(&self, user_id: &str) -> String {
        match self.scope {
            TableScope::Global => SHARED_SCOPE.to_string(),
            TableScope::PerUser => user_id.to_string(),
        }
    }

    /// Record one observed state for a user.
    ///
    /// Fixed update order: cursor read, table increment, cursor write. The
    /// first event for a user only sets the cursor.
    pub fn observe(&self, user_id: &str, state: ChainState) {
        let prior = self.cursors.get(user_id).map(|c| c.value().clone());

        if let Some(prior) = prior {
            let key = (self.scope_key(user_id), prior);
            self.rows.entry(key).or_default().increment(&state);
        }

        self.cursors.insert(user_id.to_string(), state);
    }

    /// Maximum-likelihood distribution over next states for a state in the
    /// shared table, in first-observation order. Empty for unseen states.
    ///
    /// Recomputed from current counts on every call; never cached.
    pub fn distribution(&self, state: &str) -> Vec<(ChainState, f64)> {
        self.distribution_in(SHARED_SCOPE, state)
    }

    /// Distribution for a state in the scope that applies to `user_id`.
    pub fn user_distribution(&self, user_id: &str, state: &str) -> Vec<(ChainState, f64)> {
        self.distribution_in(&self.scope_key(user_id), state)
    }

    fn distribution_in(&self, scope: &str, state: &str) -> Vec<(ChainState, f64)> {
        let key = (scope.to_string(), state.to_string());
        match self.rows.get(&key) {
            Some(row) if row.total > 0 => {
                let total = row.total as f64;
                row.next
                    .iter()
                    .map(|(next, count)| (next.clone(), *count as f64 / total))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Last-seen chain state for a user, if any events were observed.
    pub fn cursor(&self, user_id: &str) -> Option<ChainState> {
        self.cursors.get(user_id).map(|c| c.value().clone())
    }

    /// Top-k next states for the user's current cursor, probability
    /// descending. Stable sort keeps first-observation order on ties. Empty
    /// when the user has no cursor or the cursor state has no outgoing
    /// transitions.
    pub fn predict_next(&self, user_id: &str, top_k: usize) -> Vec<(ChainState, f64)> {
        let Some(cursor) = self.cursor(user_id) else {
            return Vec::new();
        };

        let mut ranked = self.user_distribution(user_id, &cursor);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        ranked
    }

    /// Greedy walk of most-likely next states from a starting state, up to
    /// `length` steps. Each step takes the highest-probability successor
    /// (ties by first-observation order) and continues from it; the walk
    /// stops early at a state with no outgoing transitions.
    pub fn generate_sequence(
        &self,
        user_id: &str,
        start_state: &str,
        length: usize,
    ) -> Vec<ChainState> {
        let mut sequence = Vec::with_capacity(length);
        let mut current = start_state.to_string();

        for _ in 0..length {
            let mut ranked = self.user_distribution(user_id, &current);
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            let Some((next, _)) = ranked.into_iter().next() else {
                break;
            };
            sequence.push(next.clone());
            current = next;
        }
        sequence
    }

    /// Dump the whole table as a versioned key-count snapshot.
    pub fn snapshot(&self) -> TableSnapshot {
        let mut entries = Vec::new();
        for row in self.rows.iter() {
            let (scope, state) = row.key();
            for (next, count) in &row.value().next {
                entries.push(SnapshotEntry {
                    scope: scope.clone(),
                    state: state.clone(),
                    next: next.clone(),
                    count: *count,
                });
            }
        }
        TableSnapshot {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    /// Replace the table contents from a snapshot. Cursors are untouched;
    /// they are per-process state, not part of the dump.
    pub fn restore(&self, snapshot: &TableSnapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RecommenderError::SnapshotVersion(snapshot.version));
        }

        self.rows.clear();
        for entry in &snapshot.entries {
            let key = (entry.scope.clone(), entry.state.clone());
            let mut row = self.rows.entry(key).or_default();
            match row.next.iter_mut().find(|(s, _)| s == &entry.next) {
                Some((_, count)) => *count += entry.count,
                None => row.next.push((entry.next.clone(), entry.count)),
            }
            row.total += entry.count;
        }

        debug!(entries = snapshot.entries.len(), "transition table restored");
        Ok(())
    }

    /// Compact binary encoding of a snapshot.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.snapshot())
            .map_err(|e| RecommenderError::SnapshotDecode(e.to_string()))
    }

    pub fn restore_bytes(&self, bytes: &[u8]) -> Result<()> {
        let snapshot: TableSnapshot = bincode::deserialize(bytes)
            .map_err(|e| RecommenderError::SnapshotDecode(e.to_string()))?;
        self.restore(&snapshot)
    }

    pub fn stats(&self) -> ModelStats {
        let mut transition_total = 0u64;
        let mut out_degree_total = 0usize;
        let state_count = self.rows.len();

        for row in self.rows.iter() {
            transition_total += row.value().total;
            out_degree_total += row.value().next.len();
        }

        let mean_out_degree = if state_count == 0 {
            0.0
        } else {
            out_degree_total as f64 / state_count as f64
        };

        ModelStats {
            transition_total,
            state_count,
            mean_out_degree,
        }
    }

    /// Drop all counts and cursors. The only way either is ever destroyed.
    pub fn reset(&self) {
        self.rows.clear();
        self.cursors.clear();
    }
}
