#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line host for Sunfield.

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use sunfield_session::Game;
use sunfield_store::FileStore;
use sunfield_system_bootstrap::{Bootstrap, StartupConfig};
use sunfield_world::query;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG: &str = include_str!("../assets/default_config.txt");

/// Runs a Sunfield farm for a number of turns and prints the result.
#[derive(Debug, Parser)]
#[command(name = "sunfield", version, about)]
struct Args {
    /// Startup configuration file; the bundled farm is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding save slots and the autosave.
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,
    /// Number of turns to simulate.
    #[arg(long, default_value_t = 1)]
    turns: u32,
    /// Seed for the simulation's random draws.
    #[arg(long)]
    seed: Option<u64>,
    /// Save slot to load before simulating.
    #[arg(long, conflicts_with = "resume")]
    load_slot: Option<u32>,
    /// Continue from the autosave, if one exists.
    #[arg(long)]
    resume: bool,
    /// Write the session into its save slot after simulating.
    #[arg(long)]
    save: bool,
}

/// Entry point for the Sunfield command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let text = match &args.config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => DEFAULT_CONFIG.to_owned(),
    };
    let mut config = StartupConfig::parse(&text).context("invalid startup configuration")?;
    if let Some(seed) = args.seed {
        config = config.with_rng_seed(seed);
    }

    let world = Bootstrap.world(&config);
    let store = FileStore::open(&args.save_dir)
        .with_context(|| format!("failed to open save directory {}", args.save_dir.display()))?;
    let mut game = Game::new(world, store).context("failed to start session")?;

    if let Some(slot) = args.load_slot {
        if !game
            .load_from(slot)
            .with_context(|| format!("failed to load slot {slot}"))?
        {
            bail!("save slot {slot} is empty");
        }
    } else if args.resume && !game.load_autosave().context("failed to load autosave")? {
        info!("no autosave found, starting a new farm");
    }

    for _ in 0..args.turns {
        let _ = game.advance_turn().context("failed to advance turn")?;
        if game.has_won() {
            break;
        }
    }

    if args.save {
        let slot = game.save().context("failed to save session")?;
        println!("saved to slot {slot}");
    }

    println!("turn {}", game.turn());
    print!("{}", query::render_text(game.world()));
    print!("{}", query::inventory_summary(game.world()));
    if game.has_won() {
        println!(
            "harvest goal of {} seeds reached",
            query::seeds_to_win(game.world())
        );
    }
    Ok(())
}
