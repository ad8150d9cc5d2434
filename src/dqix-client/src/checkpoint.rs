//! Processed-index checkpoint
//!
//! Persists the highest granted received-item index so a restarted client
//! resumes where it stopped instead of granting the whole log again.

use anyhow::{Context, Result};
use dqix::CheckpointStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_processed: Option<u64>,
}

/// Checkpoint stored as JSON next to the feed
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default checkpoint location for a feed file
    pub fn path_for_feed(feed: &Path) -> PathBuf {
        feed.with_extension("checkpoint.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint, or an empty one if none was written yet
    pub fn load(&self) -> Result<Checkpoint> {
        if !self.path.exists() {
            return Ok(Checkpoint::default());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint {}", self.path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse checkpoint {}", self.path.display()))
    }

    fn write(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_string_pretty(checkpoint)?;

        // Write then rename so a crash never leaves a truncated checkpoint
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl CheckpointStore for FileCheckpoint {
    type Error = anyhow::Error;

    fn store(&mut self, last_processed: u64) -> Result<()> {
        self.write(&Checkpoint {
            last_processed: Some(last_processed),
        })
    }
}
