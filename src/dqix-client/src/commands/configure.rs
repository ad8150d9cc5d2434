//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting client defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Values the `configure` subcommand may set
#[derive(Debug, Default)]
pub struct ConfigureArgs {
    pub ram: Option<PathBuf>,
    pub feed: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub interval: Option<u64>,
}

impl ConfigureArgs {
    fn is_empty(&self) -> bool {
        self.ram.is_none()
            && self.feed.is_none()
            && self.checkpoint.is_none()
            && self.interval.is_none()
    }
}

/// Handle the configure command
pub fn handle(config_path: Option<&Path>, args: ConfigureArgs, show: bool) -> Result<()> {
    let mut config = Config::load(config_path)?;

    if show {
        show_config(&config, config_path);
        return Ok(());
    }

    if args.is_empty() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, args);
    let saved = config.save(config_path)?;
    println!("Config saved to: {}", saved.display());

    Ok(())
}

fn apply(config: &mut Config, args: ConfigureArgs) {
    if let Some(ram) = args.ram {
        config.ram = Some(ram);
    }
    if let Some(feed) = args.feed {
        config.feed = Some(feed);
    }
    if let Some(checkpoint) = args.checkpoint {
        config.checkpoint = Some(checkpoint);
    }
    if let Some(interval) = args.interval {
        config.poll_interval_ms = Some(interval);
    }
}

/// Display current configuration
fn show_config(config: &Config, config_path: Option<&Path>) {
    let show_path = |label: &str, path: &Option<PathBuf>| match path {
        Some(p) => println!("{}: {}", label, p.display()),
        None => println!("{}: (not set)", label),
    };

    show_path("RAM file", &config.ram);
    show_path("Feed", &config.feed);
    show_path("Checkpoint", &config.checkpoint);
    println!("Poll interval: {} ms", config.poll_interval().as_millis());
    println!("Key items: {}", config.key_items.len());
    println!(
        "Experience offsets: {}",
        if config.experience.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );

    let path = config_path
        .map(Path::to_path_buf)
        .or_else(|| Config::config_path().ok());
    if let Some(path) = path {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: dqix configure [--ram PATH] [--feed PATH] [--checkpoint PATH] [--interval MS]");
    println!("       dqix configure --show");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configure_merges_into_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        handle(
            Some(&path),
            ConfigureArgs {
                ram: Some(PathBuf::from("ram.bin")),
                ..Default::default()
            },
            false,
        )
        .unwrap();
        handle(
            Some(&path),
            ConfigureArgs {
                interval: Some(1000),
                ..Default::default()
            },
            false,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ram, Some(PathBuf::from("ram.bin")));
        assert_eq!(config.poll_interval_ms, Some(1000));
    }

    #[test]
    fn test_configure_without_values_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        handle(Some(&path), ConfigureArgs::default(), false).unwrap();
        assert!(!path.exists());
    }
}
