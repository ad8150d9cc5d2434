//! CLI argument definitions for dqix

use clap::{Parser, Subcommand};
use dqix::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dqix")]
#[command(about = "Live multiworld item sync for Dragon Quest IX", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "DQIX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the game and grant received items as they arrive
    Watch {
        /// Main RAM file shared with the emulator
        #[arg(short, long, env = "DQIX_RAM")]
        ram: Option<PathBuf>,

        /// Received-items feed (JSON)
        #[arg(short, long, env = "DQIX_FEED")]
        feed: Option<PathBuf>,

        /// Checkpoint file (default: next to the feed)
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Poll interval in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Grant item codes directly
    Grant {
        /// Main RAM file
        #[arg(short, long, env = "DQIX_RAM")]
        ram: Option<PathBuf>,

        /// Item codes to grant, in order
        #[arg(required = true)]
        items: Vec<u32>,

        /// Apply to a copy in memory and report, without touching the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Show bag contents and gold
    Inspect {
        /// Main RAM file
        #[arg(short, long, env = "DQIX_RAM")]
        ram: Option<PathBuf>,

        /// Only show one bag (common, weapons, shields, torso, legs, headwear,
        /// arms, footwear, accessories, important)
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Print the memory layout and check it for overlaps
    Layout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure default paths and polling
    Configure {
        /// Default main RAM file
        #[arg(long)]
        ram: Option<PathBuf>,

        /// Default received-items feed
        #[arg(long)]
        feed: Option<PathBuf>,

        /// Default checkpoint file
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Default poll interval in milliseconds
        #[arg(long)]
        interval: Option<u64>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
