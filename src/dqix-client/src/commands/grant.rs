//! Grant command handler
//!
//! Applies item codes to a RAM file once, outside of a multiworld session.

use crate::ram_file::FileRam;
use anyhow::{bail, Context, Result};
use dqix::{grant_item, GameLayout, Inventory, ItemCode, KeyItems, MemoryAccess, RamImage};
use std::fs;
use std::path::Path;

/// Handle the grant command
pub async fn handle(
    ram_path: &Path,
    layout: GameLayout,
    key_items: &KeyItems,
    items: &[ItemCode],
    dry_run: bool,
) -> Result<()> {
    layout.validate().context("Memory layout is invalid")?;

    if dry_run {
        let data = fs::read(ram_path)
            .with_context(|| format!("Failed to read RAM file: {}", ram_path.display()))?;
        let mut inventory = Inventory::new(RamImage::new(data, 0), layout);
        let granted = grant_all(&mut inventory, key_items, items).await?;

        let writes = inventory.memory().writes().len();
        println!(
            "Dry run: {} of {} items would be granted ({} writes), {} left untouched",
            granted,
            items.len(),
            writes,
            ram_path.display()
        );
        return Ok(());
    }

    let mut inventory = Inventory::new(FileRam::open(ram_path)?, layout);
    let granted = grant_all(&mut inventory, key_items, items).await?;
    println!("Granted {} of {} items", granted, items.len());
    Ok(())
}

/// Grant each item in order, reporting per-item results.
///
/// Returns how many were applied. A transport failure stops immediately.
pub async fn grant_all<M: MemoryAccess>(
    inventory: &mut Inventory<M>,
    key_items: &KeyItems,
    items: &[ItemCode],
) -> Result<usize> {
    let mut granted = 0;
    for &item in items {
        match grant_item(inventory, key_items, item).await {
            Ok(outcome) => {
                println!("{}: {}", item, outcome);
                granted += 1;
            }
            Err(err) if err.is_transport() => bail!("Memory access failed: {}", err),
            Err(err) => println!("{}: not granted ({})", item, err),
        }
    }
    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqix::{Category, CATEGORY_TABLES, MAIN_RAM_SIZE};
    use tempfile::TempDir;

    fn empty_ram_bytes() -> Vec<u8> {
        let mut data = vec![0u8; MAIN_RAM_SIZE as usize];
        for (_, table) in CATEGORY_TABLES {
            let start = table.item_codes.base_address as usize;
            let end = start + table.capacity as usize * 2;
            data[start..end].fill(0xFF);
        }
        data
    }

    #[tokio::test]
    async fn test_grant_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main_ram.bin");
        fs::write(&path, empty_ram_bytes()).unwrap();

        handle(&path, GameLayout::dqix(), &KeyItems::new(), &[13005, 13005, 7], false)
            .await
            .unwrap();

        let ram = FileRam::open_read_only(&path).unwrap();
        let inventory = Inventory::new(ram, GameLayout::dqix());
        let torso = inventory.read_table(Category::Torso).await.unwrap();
        assert_eq!(torso.len(), 1);
        assert_eq!(torso[0].item, 13005);
        assert_eq!(torso[0].count, 2);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main_ram.bin");
        let original = empty_ram_bytes();
        fs::write(&path, &original).unwrap();

        handle(&path, GameLayout::dqix(), &KeyItems::new(), &[13005, 100003], true)
            .await
            .unwrap();

        assert!(fs::read(&path).unwrap() == original);
    }

    #[tokio::test]
    async fn test_grant_all_stops_on_transport_failure() {
        let mut ram = RamImage::new(empty_ram_bytes(), 0);
        ram.set_offline(true);
        let mut inventory = Inventory::new(ram, GameLayout::dqix());

        assert!(grant_all(&mut inventory, &KeyItems::new(), &[13005])
            .await
            .is_err());
    }
}
