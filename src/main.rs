use anyhow::{anyhow, Result};
use chordtrainer::{AppConfig, ReplOptions};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Interactive piano chord-progression trainer
#[derive(Parser, Debug)]
#[command(name = "chordtrainer", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Style pattern file to merge over the built-in styles
    #[arg(short, long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Seed for reproducible progressions
    #[arg(long)]
    seed: Option<u64>,
}

fn setup_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing: {err}"))?;
    Ok(())
}

fn main() -> Result<()> {
    setup_tracing()?;
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(patterns) = cli.patterns {
        config.patterns_path = Some(patterns);
    }

    chordtrainer::start(
        config,
        ReplOptions {
            no_audio: cli.no_audio,
            seed: cli.seed,
        },
    )
}
