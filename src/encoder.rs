//! State Encoder
//!
//! Maps a raw behavior event to a discrete chain state `"{behavior}:{item}"`.
//! Pure, no shared state.

use crate::error::{RecommenderError, Result};
use crate::types::{BehaviorEvent, BehaviorType, ChainState};

/// Separator between the behavior label and the item id inside a state.
const STATE_SEPARATOR: char = ':';

/// Encode an event into its chain state.
///
/// Total for any event with a non-empty item id; the behavior side is an enum
/// and cannot be malformed. Rejected events cause no mutation anywhere.
pub fn encode(event: &BehaviorEvent) -> Result<ChainState> {
    if event.item_id.trim().is_empty() {
        return Err(RecommenderError::InvalidEvent(
            "item_id must be a non-empty string".to_string(),
        ));
    }
    Ok(state_for(event.behavior, &event.item_id))
}

/// Build a chain state directly from its components.
pub fn state_for(behavior: BehaviorType, item_id: &str) -> ChainState {
    format!("{}{}{}", behavior, STATE_SEPARATOR, item_id)
}

/// Item id referenced by a chain state, if the state is well-formed.
pub fn item_of(state: &str) -> Option<&str> {
    state
        .split_once(STATE_SEPARATOR)
        .map(|(_, item)| item)
        .filter(|item| !item.is_empty())
}
