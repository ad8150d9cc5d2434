mod checkpoint;
mod cli;
mod commands;
mod config;
mod feed;
mod ram_file;

use anyhow::Result;
use checkpoint::FileCheckpoint;
use clap::Parser;
use config::{resolve, Config};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dqix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Configure {
            ram,
            feed,
            checkpoint,
            interval,
            show,
        } => {
            let args = commands::configure::ConfigureArgs {
                ram,
                feed,
                checkpoint,
                interval,
            };
            commands::configure::handle(config_path, args, show)?;
        }

        Commands::Layout { json } => {
            let config = Config::load(config_path)?;
            commands::layout::handle(&config.layout(), json)?;
        }

        Commands::Inspect { ram, category } => {
            let config = Config::load(config_path)?;
            let ram = resolve(ram, &config.ram, "ram")?;
            commands::inspect::handle(&ram, config.layout(), category).await?;
        }

        Commands::Grant {
            ram,
            items,
            dry_run,
        } => {
            let config = Config::load(config_path)?;
            let ram = resolve(ram, &config.ram, "ram")?;
            commands::grant::handle(&ram, config.layout(), &config.key_items, &items, dry_run)
                .await?;
        }

        Commands::Watch {
            ram,
            feed,
            checkpoint,
            interval,
            once,
        } => {
            let config = Config::load(config_path)?;
            let ram = resolve(ram, &config.ram, "ram")?;
            let feed = resolve(feed, &config.feed, "feed")?;
            let checkpoint = checkpoint
                .or_else(|| config.checkpoint.clone())
                .unwrap_or_else(|| FileCheckpoint::path_for_feed(&feed));
            let interval = interval
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.poll_interval());

            let opts = commands::watch::WatchOptions {
                ram,
                feed,
                checkpoint,
                interval,
                once,
            };
            commands::watch::handle(opts, config.layout(), config.key_items).await?;
        }
    }

    Ok(())
}
