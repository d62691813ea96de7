//! Command-line driver for the continuous double auction environment.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cda_protocol::parse_script;
use cda_sim::config::SimConfig;
use cda_sim::runner;

#[derive(Parser)]
#[clap(name = "cda-sim")]
#[clap(about = "Run continuous double auction episodes with random or scripted traders")]
struct Cli {
    /// TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Replay this CSV action script instead of random traders
    #[clap(short = 'S', long)]
    script: Option<PathBuf>,

    /// Number of traders
    #[clap(short = 'n', long)]
    traders: Option<u32>,

    /// Steps per episode
    #[clap(short, long)]
    max_step: Option<u32>,

    /// Episodes to run (random mode)
    #[clap(short, long)]
    episodes: Option<u32>,

    /// Seed for arrival order and agents
    #[clap(short, long)]
    seed: Option<u64>,

    /// Print the environment after every step
    #[clap(short, long)]
    render: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = SimConfig::load(cli.config.as_deref())?;
    if let Some(n) = cli.traders {
        config.env.num_traders = n;
    }
    if let Some(max_step) = cli.max_step {
        config.env.max_step = max_step;
    }
    if let Some(episodes) = cli.episodes {
        config.episodes = episodes;
    }
    if let Some(seed) = cli.seed {
        config.env.seed = seed;
    }

    info!(
        traders = config.env.num_traders,
        max_step = config.env.max_step,
        tick_size = config.env.tick_size,
        seed = config.env.seed,
        "starting cda-sim"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            let steps = parse_script(&text).with_context(|| format!("parsing script {}", path.display()))?;
            let summary = runner::run_script(&config.env, &steps, cli.render, &mut out)?;
            writeln!(out, "{}", summary.to_line())?;
        }
        None => {
            runner::run_random(&config, cli.render, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
