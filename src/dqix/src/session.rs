//! One polling pass of a connected session.
//!
//! A pass reads gold, reports a change, then grants every received item past
//! the processed index. Transport failures abort the pass without advancing
//! the index so the next tick retries; any other grant failure drops the item
//! and moves on.

use std::convert::Infallible;
use std::fmt;

use tracing::{debug, info, warn};

use crate::classify::KeyItems;
use crate::grant::{grant_item, GrantError};
use crate::inventory::Inventory;
use crate::memory::{MemoryAccess, MemoryError};
use crate::poller::{ChangeEvent, ObservationState, ReceivedItemRecord};

/// Readiness flags from the multiworld connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub connected: bool,
    pub slot_data_loaded: bool,
}

impl SessionStatus {
    pub fn ready() -> Self {
        Self {
            connected: true,
            slot_data_loaded: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.connected && self.slot_data_loaded
    }
}

/// Receives a short human-readable message for every granted item
pub trait MessageSink {
    fn display(&mut self, message: &str);
}

/// Discards messages
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn display(&mut self, _message: &str) {}
}

impl MessageSink for Vec<String> {
    fn display(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Persists the processed index after each item
pub trait CheckpointStore {
    type Error: fmt::Display;

    fn store(&mut self, last_processed: u64) -> Result<(), Self::Error>;
}

/// Keeps nothing; a restart replays the whole received-items log
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCheckpoint;

impl CheckpointStore for NoCheckpoint {
    type Error = Infallible;

    fn store(&mut self, _last_processed: u64) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Summary of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// The session was not ready and nothing was read
    pub skipped: bool,
    pub gold_change: Option<ChangeEvent>,
    pub granted: usize,
    /// Items permanently lost (full bag, unknown code, ...)
    pub dropped: usize,
}

pub struct Session<M, S, C> {
    inventory: Inventory<M>,
    state: ObservationState,
    key_items: KeyItems,
    messages: S,
    checkpoint: C,
}

impl<M: MemoryAccess, S: MessageSink, C: CheckpointStore> Session<M, S, C> {
    pub fn new(inventory: Inventory<M>, key_items: KeyItems, messages: S, checkpoint: C) -> Self {
        Self {
            inventory,
            state: ObservationState::default(),
            key_items,
            messages,
            checkpoint,
        }
    }

    /// Start from a restored state instead of "nothing seen"
    #[must_use]
    pub fn with_state(mut self, state: ObservationState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> ObservationState {
        self.state
    }

    pub fn inventory(&self) -> &Inventory<M> {
        &self.inventory
    }

    pub fn messages(&self) -> &S {
        &self.messages
    }

    /// Run one pass against the current received-items log
    pub async fn pass(
        &mut self,
        status: SessionStatus,
        items: &[ReceivedItemRecord],
    ) -> Result<PassReport, MemoryError> {
        let mut report = PassReport::default();
        if !status.is_ready() {
            report.skipped = true;
            return Ok(report);
        }

        let gold = self.inventory.read_gold().await?;
        report.gold_change = self.state.observe_gold(gold);
        if let Some(event) = report.gold_change {
            info!(gold = event.value, "Money on hand changed");
        }

        for record in self.state.pending(items) {
            match grant_item(&mut self.inventory, &self.key_items, record.item).await {
                Ok(outcome) => {
                    info!(index = record.index, item = record.item, %outcome, "Granted item");
                    self.messages.display(&format!(
                        "Received item {} from player {} ({})",
                        record.item, record.player, outcome
                    ));
                    report.granted += 1;
                }
                Err(GrantError::Transport(err)) => {
                    debug!(index = record.index, %err, "Transport failed, aborting pass");
                    return Err(err);
                }
                Err(err) => {
                    warn!(index = record.index, item = record.item, dropped = true, %err, "Item dropped");
                    report.dropped += 1;
                }
            }

            self.state.mark_processed(record.index);
            if let Err(err) = self.checkpoint.store(record.index) {
                warn!(index = record.index, %err, "Failed to persist processed index");
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Category, GameLayout, CATEGORY_TABLES, GOLD_AT_HAND, MAIN_RAM_SIZE};
    use crate::memory::RamImage;

    #[derive(Default)]
    struct Recorded(Vec<u64>);

    impl CheckpointStore for Recorded {
        type Error = Infallible;

        fn store(&mut self, last_processed: u64) -> Result<(), Self::Error> {
            self.0.push(last_processed);
            Ok(())
        }
    }

    fn ram() -> RamImage {
        let mut ram = RamImage::zeroed(MAIN_RAM_SIZE as usize);
        for (_, table) in CATEGORY_TABLES {
            ram.fill(table.item_codes.base_address, table.capacity as usize * 2, 0xFF)
                .unwrap();
        }
        ram.poke(GOLD_AT_HAND.address, &500_000u32.to_le_bytes())
            .unwrap();
        ram
    }

    fn session(ram: RamImage) -> Session<RamImage, Vec<String>, Recorded> {
        Session::new(
            Inventory::new(ram, GameLayout::dqix()),
            KeyItems::new(),
            Vec::new(),
            Recorded::default(),
        )
    }

    fn record(index: u64, item: u32) -> ReceivedItemRecord {
        ReceivedItemRecord {
            index,
            item,
            player: 2,
            location: 77,
        }
    }

    #[tokio::test]
    async fn test_pass_skipped_until_ready() {
        let mut s = session(ram());
        let status = SessionStatus {
            connected: true,
            slot_data_loaded: false,
        };

        let report = s.pass(status, &[record(0, 13005)]).await.unwrap();
        assert!(report.skipped);
        assert_eq!(s.state(), ObservationState::default());
        assert!(s.inventory().memory().writes().is_empty());
    }

    #[tokio::test]
    async fn test_pass_grants_and_checkpoints() {
        let mut s = session(ram());
        let items = [record(0, 13005), record(1, 13005), record(2, 100001)];

        let report = s.pass(SessionStatus::ready(), &items).await.unwrap();
        assert_eq!(report.gold_change, Some(ChangeEvent { value: 500_000 }));
        assert_eq!(report.granted, 3);
        assert_eq!(report.dropped, 0);
        assert_eq!(s.state().last_processed, Some(2));
        assert_eq!(s.checkpoint.0, vec![0, 1, 2]);
        assert_eq!(s.messages().len(), 3);
        assert!(s.messages()[0].contains("13005"));

        let torso = s.inventory().read_table(Category::Torso).await.unwrap();
        assert_eq!(torso.len(), 1);
        assert_eq!(torso[0].count, 2);

        // Same log again: nothing new, gold changed by the pouch
        let report = s.pass(SessionStatus::ready(), &items).await.unwrap();
        assert_eq!(report.granted, 0);
        assert_eq!(report.gold_change, Some(ChangeEvent { value: 500_500 }));

        let report = s.pass(SessionStatus::ready(), &items).await.unwrap();
        assert_eq!(report.gold_change, None);
    }

    #[tokio::test]
    async fn test_unknown_item_is_dropped_and_index_advances() {
        let mut s = session(ram());

        let report = s
            .pass(SessionStatus::ready(), &[record(0, 42), record(1, 22001)])
            .await
            .unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(report.granted, 1);
        assert_eq!(s.state().last_processed, Some(1));
    }

    #[tokio::test]
    async fn test_full_bag_is_dropped_and_index_advances() {
        let mut ram = ram();
        let shields = *GameLayout::dqix().table(Category::Shields).unwrap();
        for slot in 0..shields.capacity {
            let code = 21000 + slot as u16;
            ram.poke(shields.item_codes.address_of(slot), &code.to_le_bytes())
                .unwrap();
            ram.poke(shields.counts.address_of(slot), &[1]).unwrap();
        }
        let mut s = session(ram);

        let report = s
            .pass(SessionStatus::ready(), &[record(0, 21500), record(1, 13005)])
            .await
            .unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(report.granted, 1);
        assert_eq!(s.state().last_processed, Some(1));
        assert_eq!(s.checkpoint.0, vec![0, 1]);
        assert_eq!(s.messages().len(), 1);

        let table = s.inventory().read_table(Category::Shields).await.unwrap();
        assert_eq!(table.len(), shields.capacity as usize);
        assert!(table.iter().all(|slot| slot.item != 21500));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_without_advancing() {
        let mut ram = ram();
        ram.set_offline(true);
        let mut s = session(ram);

        assert!(s.pass(SessionStatus::ready(), &[record(0, 13005)]).await.is_err());
        assert_eq!(s.state(), ObservationState::default());
        assert!(s.checkpoint.0.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_mid_batch_keeps_granted_items() {
        let mut ram = ram();
        // First allocation takes two writes, the second item's writes fail
        ram.fail_after_writes(2);
        let mut s = session(ram);

        let items = [record(0, 13005), record(1, 16001)];
        assert!(s.pass(SessionStatus::ready(), &items).await.is_err());
        assert_eq!(s.state().last_processed, Some(0));
        assert_eq!(s.checkpoint.0, vec![0]);
    }

    #[tokio::test]
    async fn test_resumed_session_skips_processed_items() {
        let mut s = session(ram()).with_state(ObservationState::resumed(Some(0)));

        let report = s
            .pass(SessionStatus::ready(), &[record(0, 13005), record(1, 13006)])
            .await
            .unwrap();
        assert_eq!(report.granted, 1);
        let torso = s.inventory().read_table(Category::Torso).await.unwrap();
        assert_eq!(torso[0].item, 13006);
    }
}
