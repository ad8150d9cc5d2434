//! Received-items feed
//!
//! The multiworld connection writes a JSON snapshot of its readiness flags and
//! the full received-items log; the client re-reads it every tick.

use anyhow::{Context, Result};
use dqix::{ReceivedItemRecord, SessionStatus};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub slot_data_loaded: bool,
    #[serde(default)]
    pub items: Vec<ReceivedItemRecord>,
}

impl FeedSnapshot {
    /// Read the feed; a missing file means "not connected yet"
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse feed {}", path.display()))
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            connected: self.connected,
            slot_data_loaded: self.slot_data_loaded,
        }
    }
}
