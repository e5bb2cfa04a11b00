#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Tint Tap experience.

mod best_score;
mod play;
mod preview;

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tint_tap_core::{GameConfig, Level};
use tint_tap_rendering_macroquad::MacroquadBackend;
use tracing_subscriber::EnvFilter;

use crate::best_score::BestScoreFile;

/// Find the odd tiles before the bonus clock runs out.
#[derive(Debug, Parser)]
#[command(name = "tint-tap", version)]
struct Cli {
    /// Game configuration in TOML; built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Open the game window.
    Play {
        /// Seed for level generation and gimmicks; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// File that persists the best score between runs.
        #[arg(long)]
        best_score_file: Option<PathBuf>,
        /// Enable level and gimmick shortcuts.
        #[arg(long)]
        dev: bool,
    },
    /// Print a generated level with true-color swatches.
    Preview {
        /// Level to generate.
        #[arg(long)]
        level: u32,
        /// Seed for the generator.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the difficulty tier of each level.
    Schedule {
        /// First level to list.
        #[arg(long, default_value_t = 1)]
        from: u32,
        /// Last level to list; defaults to the configured final level.
        #[arg(long)]
        to: Option<u32>,
    },
}

/// Entry point for the Tint Tap command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    match cli.command.unwrap_or(CliCommand::Play {
        seed: None,
        best_score_file: None,
        dev: false,
    }) {
        CliCommand::Play {
            seed,
            best_score_file,
            dev,
        } => play::run(
            MacroquadBackend::new().with_dev_keys(dev),
            config,
            seed.unwrap_or_else(fresh_seed),
            best_score_file.map(BestScoreFile::new),
        ),
        CliCommand::Preview { level, seed } => {
            print!("{}", preview::render_level(&config, Level::new(level), seed)?);
            Ok(())
        }
        CliCommand::Schedule { from, to } => {
            let to = to.unwrap_or(config.max_level);
            if from > to {
                bail!("--from ({from}) must not exceed --to ({to})");
            }
            print!(
                "{}",
                preview::render_schedule(&config, Level::new(from), Level::new(to))
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fresh_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
