//! Change detection between polls
//!
//! Tracks the last observed gold value and the highest received-item index
//! already granted, so that re-delivered items are not granted twice.

use serde::{Deserialize, Serialize};

use crate::classify::ItemCode;

/// One item delivered by the multiworld service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedItemRecord {
    /// Position in the session's received-items log, from 0
    pub index: u64,
    pub item: ItemCode,
    /// Slot of the player whose world held the item
    pub player: i64,
    /// Location the item was found at
    pub location: i64,
}

/// Gold on hand changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub value: u32,
}

/// What the client has seen so far in the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationState {
    pub last_gold: Option<u32>,
    pub last_processed: Option<u64>,
}

impl ObservationState {
    /// Resume from a previously persisted processed index
    pub fn resumed(last_processed: Option<u64>) -> Self {
        Self {
            last_gold: None,
            last_processed,
        }
    }

    /// Whether a record has not been granted yet
    pub fn is_pending(&self, record: &ReceivedItemRecord) -> bool {
        self.last_processed.map_or(true, |last| record.index > last)
    }

    /// Records past the processed index, in ascending index order
    pub fn pending(&self, items: &[ReceivedItemRecord]) -> Vec<ReceivedItemRecord> {
        let mut pending: Vec<_> = items.iter().filter(|r| self.is_pending(r)).copied().collect();
        pending.sort_by_key(|r| r.index);
        pending
    }

    /// Advance the processed index; never moves backwards
    pub fn mark_processed(&mut self, index: u64) {
        self.last_processed = Some(self.last_processed.map_or(index, |last| last.max(index)));
    }

    /// Record a gold reading, returning an event if it differs from the last one
    pub fn observe_gold(&mut self, value: u32) -> Option<ChangeEvent> {
        if self.last_gold == Some(value) {
            return None;
        }
        self.last_gold = Some(value);
        Some(ChangeEvent { value })
    }
}

/// Compare a fresh gold reading against the last observation.
///
/// The first reading of a session always counts as a change.
pub fn poll_currency(
    state: ObservationState,
    value: u32,
) -> (ObservationState, Option<ChangeEvent>) {
    let mut next = state;
    let event = next.observe_gold(value);
    (next, event)
}

/// Every record past the processed index, in ascending order, with the
/// state advanced to the highest returned index.
///
/// Pure: calling it twice with the same state returns the same records.
pub fn drain_new_items(
    state: ObservationState,
    items: &[ReceivedItemRecord],
) -> (ObservationState, Vec<ReceivedItemRecord>) {
    let pending = state.pending(items);
    let mut next = state;
    if let Some(last) = pending.last() {
        next.mark_processed(last.index);
    }
    (next, pending)
}
