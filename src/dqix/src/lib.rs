//! # dqix
//!
//! Dragon Quest IX inventory engine for multiworld item sync.
//!
//! This library provides functionality to:
//! - Classify multiworld item codes (equipment, bag items, gold, experience)
//! - Describe the bag tables and gold counters of the game's main RAM
//! - Grant items by finding or allocating a bag slot and updating its count
//! - Detect gold changes and newly received items between polls
//!
//! Memory is reached through the [`MemoryAccess`] trait, so the same engine
//! runs against an emulator connection, a RAM file, or an in-memory image.
//!
//! ## Example
//!
//! ```no_run
//! use dqix::{grant_item, GameLayout, Inventory, KeyItems, RamImage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ram = RamImage::new(std::fs::read("main_ram.bin")?, 0);
//! let mut inventory = Inventory::new(ram, GameLayout::dqix());
//!
//! // Give the player one piece of torso equipment
//! let outcome = grant_item(&mut inventory, &KeyItems::new(), 13005).await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod grant;
pub mod inventory;
pub mod layout;
pub mod memory;
pub mod poller;
pub mod session;

// Re-export commonly used items
#[doc(inline)]
pub use classify::{
    classify_equipment, classify_item, experience_reward, gold_reward, EquipmentCategory,
    ItemCode, ItemKind, KeyItems,
};
#[doc(inline)]
pub use grant::{grant_item, GrantError, GrantOutcome};
#[doc(inline)]
pub use inventory::{ExperienceUpdate, Inventory, Slot, SlotUpdate};
#[doc(inline)]
pub use layout::{
    Category, CategoryTable, ExperienceLayout, GameLayout, LayoutError, MemoryRegion,
    ScalarField, CATEGORY_TABLES, EMPTY_SLOT, GOLD_AT_HAND, GOLD_IN_BANK, MAIN_RAM_SIZE, MAX_GOLD,
    MAX_STACK,
};
#[doc(inline)]
pub use memory::{MemoryAccess, MemoryError, RamImage};
#[doc(inline)]
pub use poller::{drain_new_items, poll_currency, ChangeEvent, ObservationState, ReceivedItemRecord};
#[doc(inline)]
pub use session::{
    CheckpointStore, MessageSink, NoCheckpoint, NullSink, PassReport, Session, SessionStatus,
};
