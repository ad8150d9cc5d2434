//! Inspect command handler

use crate::ram_file::FileRam;
use anyhow::{Context, Result};
use dqix::{classify_equipment, Category, GameLayout, Inventory, MemoryAccess};
use std::path::Path;

/// Handle the inspect command
pub async fn handle(ram_path: &Path, layout: GameLayout, only: Option<Category>) -> Result<()> {
    let ram = FileRam::open_read_only(ram_path)?;
    let inventory = Inventory::new(ram, layout);
    print_inventory(&inventory, only).await
}

/// Print gold and the occupied slots of each bag
pub async fn print_inventory<M: MemoryAccess>(
    inventory: &Inventory<M>,
    only: Option<Category>,
) -> Result<()> {
    let layout = inventory.layout();
    let memory = inventory.memory();

    if only.is_none() {
        let at_hand = memory
            .read_uint(layout.gold_at_hand.address, layout.gold_at_hand.width)
            .await
            .context("Failed to read gold on hand")?;
        let in_bank = memory
            .read_uint(layout.gold_in_bank.address, layout.gold_in_bank.width)
            .await
            .context("Failed to read gold in bank")?;
        println!("Gold: {} on hand, {} in bank", at_hand, in_bank);
        println!();
    }

    let categories: Vec<Category> = match only {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    for category in categories {
        let Some(table) = layout.table(category) else {
            continue;
        };
        let slots = inventory
            .read_table(category)
            .await
            .with_context(|| format!("Failed to read {} table", category))?;

        println!("{} ({}/{} slots used)", category, slots.len(), table.capacity);
        for slot in &slots {
            // Flag equipment sitting in a bag its code doesn't belong to
            let misplaced = classify_equipment(slot.item)
                .map(Category::from)
                .is_some_and(|expected| expected != category);
            println!(
                "  [{:>3}] {:>6} x{:<2}{}",
                slot.index,
                slot.item,
                slot.count,
                if misplaced { "  (unexpected bag)" } else { "" }
            );
        }
    }

    Ok(())
}
