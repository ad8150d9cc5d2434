//! Configuration management for the dqix client

use anyhow::{Context, Result};
use dqix::{ExperienceLayout, GameLayout, KeyItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Poll interval used when none is configured
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Main RAM file shared with the emulator
    pub ram: Option<PathBuf>,
    /// Received-items feed written by the multiworld connection
    pub feed: Option<PathBuf>,
    /// Where the processed index is persisted
    pub checkpoint: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    /// Bag-range codes stored in the important-items table
    #[serde(default, skip_serializing_if = "KeyItems::is_empty")]
    pub key_items: KeyItems,
    /// Party vocation and experience offsets for the game build in use
    pub experience: Option<ExperienceLayout>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("dqix");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from `path` (or the default location), or defaults if it doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to `path` (or the default location)
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(config_path)
    }

    /// Built-in layout plus any configured experience offsets
    pub fn layout(&self) -> GameLayout {
        let layout = GameLayout::dqix();
        match self.experience {
            Some(experience) => layout.with_experience(experience),
            None => layout,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }
}

/// Pick the CLI value if given, otherwise the configured one
pub fn resolve(cli: Option<PathBuf>, configured: &Option<PathBuf>, what: &str) -> Result<PathBuf> {
    cli.or_else(|| configured.clone()).with_context(|| {
        format!(
            "No {} path given. Pass --{} or run `dqix configure --{} <PATH>`",
            what, what, what
        )
    })
}
