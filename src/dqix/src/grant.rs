//! Granting received items
//!
//! Routes a received item code to the operation that applies it: a bag slot,
//! the gold counter, or party experience.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::classify::{
    classify_equipment, classify_item, experience_reward, gold_reward, ItemCode, ItemKind,
    KeyItems,
};
use crate::inventory::{ExperienceUpdate, Inventory, SlotUpdate};
use crate::layout::Category;
use crate::memory::{MemoryAccess, MemoryError};

#[derive(Error, Debug)]
pub enum GrantError {
    #[error("Memory transport failed: {0}")]
    Transport(#[from] MemoryError),

    #[error("No empty slot in {category} for item {item}")]
    CapacityExceeded { category: Category, item: ItemCode },

    #[error("Item {0} matches no item range")]
    Unclassifiable(ItemCode),

    #[error("Equipment {0} matches no equipment category")]
    UnknownEquipment(ItemCode),

    #[error("Item {0} has no reward amount")]
    NoReward(ItemCode),

    #[error("Experience offsets are not configured")]
    ExperienceUnavailable,

    #[error("Layout has no {0} table")]
    MissingTable(Category),
}

impl GrantError {
    /// Transport failures are retried on the next poll; everything else drops the item
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// What granting an item did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Slot {
        category: Category,
        update: SlotUpdate,
    },
    Gold {
        gained: u32,
        total: u32,
    },
    Experience {
        amount: u32,
        updates: Vec<ExperienceUpdate>,
    },
}

impl fmt::Display for GrantOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot {
                category,
                update: SlotUpdate::Allocated { slot },
            } => write!(f, "new {} slot {}", category, slot),
            Self::Slot {
                category,
                update:
                    SlotUpdate::Stacked {
                        slot,
                        count,
                        saturated,
                    },
            } => {
                write!(f, "{} slot {} now x{}", category, slot, count)?;
                if *saturated {
                    write!(f, " (stack full)")?;
                }
                Ok(())
            }
            Self::Gold { gained, total } => write!(f, "{} gold, {} on hand", gained, total),
            Self::Experience { amount, updates } => {
                write!(f, "{} experience for {} party members", amount, updates.len())
            }
        }
    }
}

/// Apply one received item to the game's memory
pub async fn grant_item<M: MemoryAccess>(
    inventory: &mut Inventory<M>,
    key_items: &KeyItems,
    item: ItemCode,
) -> Result<GrantOutcome, GrantError> {
    let Some(kind) = classify_item(item, key_items) else {
        warn!(item, "Could not determine the item type");
        return Err(GrantError::Unclassifiable(item));
    };

    match kind {
        ItemKind::Currency => {
            let gained = gold_reward(item).ok_or_else(|| {
                warn!(item, "Gold item has no reward tier");
                GrantError::NoReward(item)
            })?;
            let field = inventory.layout().gold_at_hand;
            let total = inventory.add_currency(field, i64::from(gained)).await?;
            Ok(GrantOutcome::Gold { gained, total })
        }
        ItemKind::Experience => {
            let amount = experience_reward(item).ok_or_else(|| {
                warn!(item, "Experience item has no reward tier");
                GrantError::NoReward(item)
            })?;
            let updates = inventory.add_experience(amount).await?;
            Ok(GrantOutcome::Experience { amount, updates })
        }
        ItemKind::Equipment => {
            let Some(equipment) = classify_equipment(item) else {
                warn!(item, "Could not determine the equipment type");
                return Err(GrantError::UnknownEquipment(item));
            };
            let category = Category::from(equipment);
            let update = inventory.add_slot_item(category, item).await?;
            Ok(GrantOutcome::Slot { category, update })
        }
        ItemKind::KeyItem => {
            let update = inventory.add_slot_item(Category::Important, item).await?;
            Ok(GrantOutcome::Slot {
                category: Category::Important,
                update,
            })
        }
        ItemKind::Consumable => {
            let update = inventory.add_slot_item(Category::Common, item).await?;
            Ok(GrantOutcome::Slot {
                category: Category::Common,
                update,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GameLayout, CATEGORY_TABLES, GOLD_AT_HAND, MAIN_RAM_SIZE};
    use crate::memory::RamImage;

    fn inventory() -> Inventory<RamImage> {
        let mut ram = RamImage::zeroed(MAIN_RAM_SIZE as usize);
        for (_, table) in CATEGORY_TABLES {
            ram.fill(table.item_codes.base_address, table.capacity as usize * 2, 0xFF)
                .unwrap();
        }
        Inventory::new(ram, GameLayout::dqix())
    }

    fn keys() -> KeyItems {
        [22400].into_iter().collect()
    }

    async fn grant(inv: &mut Inventory<RamImage>, item: ItemCode) -> Result<GrantOutcome, GrantError> {
        grant_item(inv, &keys(), item).await
    }

    #[tokio::test]
    async fn test_equipment_goes_to_its_bag() {
        let mut inv = inventory();

        let cases = [
            (13005, Category::Torso),
            (19100, Category::Weapons),
            (21001, Category::Shields),
            (12150, Category::Headwear),
            (18001, Category::Accessories),
        ];
        for (item, category) in cases {
            let outcome = grant(&mut inv, item).await.unwrap();
            assert_eq!(
                outcome,
                GrantOutcome::Slot {
                    category,
                    update: SlotUpdate::Allocated { slot: 0 }
                }
            );
        }
    }

    #[tokio::test]
    async fn test_bag_items_split_by_key_set() {
        let mut inv = inventory();

        let key = grant(&mut inv, 22400).await.unwrap();
        assert!(matches!(
            key,
            GrantOutcome::Slot {
                category: Category::Important,
                ..
            }
        ));

        let common = grant(&mut inv, 22001).await.unwrap();
        assert!(matches!(
            common,
            GrantOutcome::Slot {
                category: Category::Common,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_gold_pouch() {
        let mut inv = inventory();

        let outcome = grant(&mut inv, 100002).await.unwrap();
        assert_eq!(
            outcome,
            GrantOutcome::Gold {
                gained: 5000,
                total: 5000
            }
        );
        let outcome = grant(&mut inv, 100000).await.unwrap();
        assert_eq!(outcome, GrantOutcome::Gold { gained: 50, total: 5050 });

        let ram = inv.into_memory();
        assert_eq!(ram.peek(GOLD_AT_HAND.address, 4).unwrap(), &5050u32.to_le_bytes());
    }

    #[tokio::test]
    async fn test_unclassifiable_items_do_not_mutate() {
        let mut inv = inventory();

        assert!(matches!(
            grant(&mut inv, 5).await,
            Err(GrantError::Unclassifiable(5))
        ));
        assert!(matches!(
            grant(&mut inv, 14500).await,
            Err(GrantError::UnknownEquipment(14500))
        ));
        assert!(matches!(
            grant(&mut inv, 100007).await,
            Err(GrantError::NoReward(100007))
        ));
        assert!(inv.memory().writes().is_empty());
    }

    #[tokio::test]
    async fn test_experience_without_layout() {
        let mut inv = inventory();
        assert!(matches!(
            grant(&mut inv, 100011).await,
            Err(GrantError::ExperienceUnavailable)
        ));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = GrantOutcome::Slot {
            category: Category::Torso,
            update: SlotUpdate::Stacked {
                slot: 2,
                count: 99,
                saturated: true,
            },
        };
        assert_eq!(outcome.to_string(), "torso slot 2 now x99 (stack full)");
        assert_eq!(
            GrantOutcome::Gold {
                gained: 50,
                total: 150
            }
            .to_string(),
            "50 gold, 150 on hand"
        );
    }
}
