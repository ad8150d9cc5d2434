//! Layout command handler

use anyhow::{Context, Result};
use dqix::{Category, GameLayout};

/// Print the memory layout and validate it
pub fn handle(layout: &GameLayout, json: bool) -> Result<()> {
    layout.validate().context("Memory layout is invalid")?;

    if json {
        println!("{}", serde_json::to_string_pretty(layout)?);
        return Ok(());
    }

    println!("{:<12} {:>10} {:>10} {:>6}", "Bag", "Items", "Counts", "Slots");
    for category in Category::ALL {
        if let Some(table) = layout.table(category) {
            println!(
                "{:<12} {:#010x} {:#010x} {:>6}",
                category.name(),
                table.item_codes.base_address,
                table.counts.base_address,
                table.capacity
            );
        }
    }
    println!();
    println!("Gold on hand: {:#010x}", layout.gold_at_hand.address);
    println!("Gold in bank: {:#010x}", layout.gold_in_bank.address);

    match &layout.experience {
        Some(exp) => {
            for member in 0..exp.vocation_addresses.len() {
                println!(
                    "Member {} vocation: {:#010x}, experience: {:#010x}",
                    member, exp.vocation_addresses[member], exp.experience_bases[member]
                );
            }
        }
        None => println!("Experience offsets: not configured"),
    }

    println!();
    println!("Layout OK");
    Ok(())
}
