#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that turns startup configuration into a playable world.

mod config;

pub use config::{ConfigError, StartupConfig, MAX_SEEDS_TO_WIN, MAX_SUN_RANGE};

use sunfield_core::Cell;
use sunfield_world::{World, WorldConfig};
use tracing::info;

/// Prepares the initial world from validated settings.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Parses configuration text and builds the world it describes.
    pub fn load(&self, text: &str) -> Result<World, ConfigError> {
        let config = StartupConfig::parse(text)?;
        Ok(self.world(&config))
    }

    /// Derives the world construction parameters from startup settings.
    #[must_use]
    pub fn world_config(&self, config: &StartupConfig) -> WorldConfig {
        WorldConfig {
            columns: config.columns,
            rows: config.rows,
            parameters: config.parameters(),
            conditions: config.conditions.clone(),
            seeds_to_win: config.seeds_to_win,
            starting_seeds: config.starting_seeds.clone(),
            player_start: Cell::new(0, 0),
            rng_seed: config.rng_seed,
        }
    }

    /// Builds a fresh world at turn zero.
    #[must_use]
    pub fn world(&self, config: &StartupConfig) -> World {
        info!(
            columns = config.columns,
            rows = config.rows,
            sun_range = config.sun_range,
            water_rate = config.water_rate,
            seeds_to_win = config.seeds_to_win,
            conditions = config.conditions.len(),
            "bootstrapping world"
        );
        World::new(self.world_config(config))
    }
}
