//! Slot allocation and record updates against the bag tables.
//!
//! `Inventory` owns its memory backend, and every mutating operation takes
//! `&mut self`. A table is read in full and then written based on that
//! snapshot, so two allocations against the same table must never interleave;
//! exclusive ownership is what rules that out.

use tracing::{debug, warn};

use crate::classify::ItemCode;
use crate::grant::GrantError;
use crate::layout::{Category, GameLayout, ScalarField, MAX_GOLD, MAX_STACK, PARTY_SIZE};
use crate::memory::{MemoryAccess, MemoryResult};

/// An occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: u32,
    pub item: ItemCode,
    pub count: u8,
}

/// What `add_slot_item` changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// An existing stack grew (or was already full when `saturated`)
    Stacked { slot: u32, count: u8, saturated: bool },
    /// A free slot now holds one of the item
    Allocated { slot: u32 },
}

impl SlotUpdate {
    pub fn slot(&self) -> u32 {
        match self {
            Self::Stacked { slot, .. } | Self::Allocated { slot } => *slot,
        }
    }

    pub fn count(&self) -> u8 {
        match self {
            Self::Stacked { count, .. } => *count,
            Self::Allocated { .. } => 1,
        }
    }
}

/// Experience written for one party member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceUpdate {
    pub member: usize,
    pub vocation: u8,
    pub experience: u32,
}

/// Game inventory accessed through a memory backend
pub struct Inventory<M> {
    memory: M,
    layout: GameLayout,
}

impl<M: MemoryAccess> Inventory<M> {
    pub fn new(memory: M, layout: GameLayout) -> Self {
        Self { memory, layout }
    }

    pub fn layout(&self) -> &GameLayout {
        &self.layout
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Read every occupied slot of a table
    pub async fn read_table(&self, category: Category) -> Result<Vec<Slot>, GrantError> {
        let table = *self
            .layout
            .table(category)
            .ok_or(GrantError::MissingTable(category))?;

        let items = self
            .memory
            .read_segments(
                table.item_codes.base_address,
                table.capacity,
                table.item_codes.element_width,
            )
            .await?;
        let counts = self
            .memory
            .read_segments(table.counts.base_address, table.capacity, table.counts.element_width)
            .await?;

        Ok(items
            .into_iter()
            .zip(counts)
            .enumerate()
            .filter(|(_, (item, _))| *item != table.empty_sentinel)
            .map(|(index, (item, count))| Slot {
                index: index as u32,
                item,
                count: count as u8,
            })
            .collect())
    }

    /// Add one unit of `item` to a table, stacking onto an existing slot or
    /// claiming the first free one.
    ///
    /// A full stack silently absorbs the unit. With no matching and no free
    /// slot nothing is written and `CapacityExceeded` is returned.
    pub async fn add_slot_item(
        &mut self,
        category: Category,
        item: ItemCode,
    ) -> Result<SlotUpdate, GrantError> {
        let table = *self
            .layout
            .table(category)
            .ok_or(GrantError::MissingTable(category))?;

        let slots = self
            .memory
            .read_segments(
                table.item_codes.base_address,
                table.capacity,
                table.item_codes.element_width,
            )
            .await?;

        if let Some(slot) = slots.iter().position(|&code| code == item) {
            let slot = slot as u32;
            let address = table.counts.address_of(slot);
            let old = self.memory.read_uint(address, table.counts.element_width).await?;
            let count = old.saturating_add(1).min(u32::from(MAX_STACK));
            self.memory
                .write_uint(address, table.counts.element_width, count)
                .await?;

            debug!(%category, item, slot, count, "Stacked item");
            return Ok(SlotUpdate::Stacked {
                slot,
                count: count as u8,
                saturated: old >= u32::from(MAX_STACK),
            });
        }

        let Some(slot) = slots.iter().position(|&code| code == table.empty_sentinel) else {
            warn!(%category, item, dropped = true, "No empty slot in inventory, item lost");
            return Err(GrantError::CapacityExceeded { category, item });
        };

        // Count first: if the code write fails the slot still reads as empty
        let slot = slot as u32;
        self.memory
            .write_uint(table.counts.address_of(slot), table.counts.element_width, 1)
            .await?;
        self.memory
            .write_uint(
                table.item_codes.address_of(slot),
                table.item_codes.element_width,
                item,
            )
            .await?;

        debug!(%category, item, slot, "Allocated slot");
        Ok(SlotUpdate::Allocated { slot })
    }

    /// Current gold on hand
    pub async fn read_gold(&self) -> MemoryResult<u32> {
        let field = self.layout.gold_at_hand;
        self.memory.read_uint(field.address, field.width).await
    }

    /// Add `delta` to a gold counter, clamping to `0..=MAX_GOLD`. Returns the new value.
    pub async fn add_currency(&mut self, field: ScalarField, delta: i64) -> MemoryResult<u32> {
        let old = self.memory.read_uint(field.address, field.width).await?;
        let value = (i64::from(old) + delta).clamp(0, i64::from(MAX_GOLD)) as u32;
        self.memory.write_uint(field.address, field.width, value).await?;

        debug!(address = field.address, old, value, "Updated gold");
        Ok(value)
    }

    /// Add `amount` experience to the current vocation of every party member that has one.
    ///
    /// Everything is read before the first write, so a failed read changes nothing.
    /// A failure between two member writes still leaves the earlier members updated.
    pub async fn add_experience(&mut self, amount: u32) -> Result<Vec<ExperienceUpdate>, GrantError> {
        let exp = self
            .layout
            .experience
            .ok_or(GrantError::ExperienceUnavailable)?;

        let mut updates = Vec::new();
        for member in 0..PARTY_SIZE {
            let vocation = self.memory.read_uint(exp.vocation_addresses[member], 1).await? as u8;
            if vocation == 0 {
                debug!(member, "No vocation assigned, skipping");
                continue;
            }
            if vocation > exp.max_vocation {
                warn!(member, vocation, max = exp.max_vocation, "Vocation id out of range, skipping");
                continue;
            }

            let address = exp.experience_address(member, vocation);
            let current = self.memory.read_uint(address, 4).await?;
            updates.push(ExperienceUpdate {
                member,
                vocation,
                experience: current.saturating_add(amount),
            });
        }

        for update in &updates {
            let address = exp.experience_address(update.member, update.vocation);
            self.memory.write_uint(address, 4, update.experience).await?;
            debug!(
                member = update.member,
                vocation = update.vocation,
                experience = update.experience,
                "Granted experience"
            );
        }
        Ok(updates)
    }
}
