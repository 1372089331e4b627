//! Event Store Adapter
//!
//! Append-only log of behavior events, owned by an external store. The core
//! appends at record time and only reads back when rebuilding the transition
//! model from history instead of maintaining it incrementally.

use crate::types::BehaviorEvent;
use dashmap::DashMap;

pub trait EventLog: Send + Sync {
    /// Fire-and-forget append. The core never reads this path back on the
    /// hot path.
    fn append(&self, event: &BehaviorEvent);

    /// A user's events ordered by timestamp ascending.
    fn fetch_sequence(&self, user_id: &str) -> Vec<BehaviorEvent>;
}

#[derive(Default)]
pub struct InMemoryEventLog {
    events: DashMap<String, Vec<BehaviorEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: &BehaviorEvent) {
        self.events
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
    }

    fn fetch_sequence(&self, user_id: &str) -> Vec<BehaviorEvent> {
        let mut sequence = self
            .events
            .get(user_id)
            .map(|events| events.value().clone())
            .unwrap_or_default();
        sequence.sort_by_key(|event| event.timestamp);
        sequence
    }
}
