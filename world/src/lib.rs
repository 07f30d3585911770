#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Sunfield.

mod board;
mod player;

pub use board::Board;
pub use player::Player;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sunfield_core::{
    catalog, BoardParameters, Cell, Command, Condition, Event, Inventory, Rejection, SpeciesId,
    TileContent, WorldSnapshot, DEFAULT_TILE_SIZE,
};
use sunfield_system_growth::{Growth, GrowthOutcome};
use thiserror::Error;
use tracing::debug;

const DEFAULT_GRID_COLUMNS: u32 = 25;
const DEFAULT_GRID_ROWS: u32 = 18;
const DEFAULT_SUN_RANGE: u32 = 3;
const DEFAULT_WATER_RATE: f64 = 0.5;
const DEFAULT_SEEDS_TO_WIN: u32 = 20;
const DEFAULT_STARTING_SEEDS: u32 = 3;
/// Seed used for random draws unless the host provides one.
pub const DEFAULT_RNG_SEED: u64 = 0x5eed_f1e1_d0c0_ffee;

/// Everything required to construct a fresh world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Number of board columns.
    pub columns: u32,
    /// Number of board rows.
    pub rows: u32,
    /// Baseline sun range and water rate.
    pub parameters: BoardParameters,
    /// Timed overrides of the baseline parameters.
    pub conditions: Vec<Condition>,
    /// Total seeds the player must hold to win.
    pub seeds_to_win: u32,
    /// Seeds granted to the player at the start of the game.
    pub starting_seeds: Vec<(SpeciesId, u32)>,
    /// Tile the player starts on.
    pub player_start: Cell,
    /// Seed for every random draw made by the simulation.
    pub rng_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            parameters: BoardParameters {
                sun_range: DEFAULT_SUN_RANGE,
                water_rate: DEFAULT_WATER_RATE,
            },
            conditions: Vec::new(),
            seeds_to_win: DEFAULT_SEEDS_TO_WIN,
            starting_seeds: catalog::ids()
                .map(|species| (species, DEFAULT_STARTING_SEEDS))
                .collect(),
            player_start: Cell::new(0, 0),
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

/// Reasons a snapshot cannot be restored into an existing world.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    /// The snapshot describes a board of different dimensions.
    #[error("snapshot board is {found_columns}x{found_rows}, world is {columns}x{rows}")]
    DimensionMismatch {
        /// Columns of the live world.
        columns: u32,
        /// Rows of the live world.
        rows: u32,
        /// Columns recorded in the snapshot.
        found_columns: u32,
        /// Rows recorded in the snapshot.
        found_rows: u32,
    },
    /// The snapshot's tile list does not cover the board exactly.
    #[error("snapshot holds {found} tiles, expected {expected}")]
    TileCount {
        /// Tiles required by the board dimensions.
        expected: usize,
        /// Tiles present in the snapshot.
        found: usize,
    },
}

/// Represents the authoritative Sunfield world state.
#[derive(Debug)]
pub struct World {
    board: Board,
    player: Player,
    parameters: BoardParameters,
    conditions: Vec<Condition>,
    seeds_to_win: u32,
    rng: ChaCha8Rng,
    growth: Growth,
    outcomes: Vec<GrowthOutcome>,
}

impl World {
    /// Creates a new world ready for simulation.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let mut inventory = Inventory::new();
        for &(species, count) in &config.starting_seeds {
            inventory.add_seeds(species, count);
        }
        Self {
            board: Board::new(config.columns, config.rows, config.parameters.sun_range),
            player: Player::new(config.player_start, DEFAULT_TILE_SIZE, inventory),
            parameters: config.parameters,
            conditions: config.conditions,
            seeds_to_win: config.seeds_to_win,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            growth: Growth::new(),
            outcomes: Vec::new(),
        }
    }

    fn tick(&mut self, turn: u32, out_events: &mut Vec<Event>) {
        let parameters = self.parameters.effective_at(&self.conditions, turn);

        self.board.move_sun(parameters.sun_range);
        out_events.push(Event::SunMoved {
            position: self.board.sun_position(),
        });
        self.board
            .update_sun_tiles(parameters.sun_range, &mut self.rng);
        self.board.hydrate(parameters.water_rate, &mut self.rng);

        self.outcomes.clear();
        self.growth
            .handle(self.board.view(), &mut self.rng, &mut self.outcomes);
        self.board.apply_growth(&self.outcomes, out_events);

        debug!(
            turn,
            sun_position = self.board.sun_position(),
            sun_range = parameters.sun_range,
            water_rate = parameters.water_rate,
            plants = self.outcomes.len(),
            "simulated turn"
        );
        out_events.push(Event::TurnSimulated { turn, parameters });
    }

    fn sow(&mut self, cell: Cell, species: SpeciesId) -> Result<Event, Rejection> {
        if !catalog::contains(species) {
            return Err(Rejection::UnknownSpecies);
        }
        let tile = self.board.tile(cell).ok_or(Rejection::OutOfBounds)?;
        if tile.content != TileContent::Empty {
            return Err(Rejection::Occupied);
        }
        if self.player.inventory().seed_count(species) == 0 {
            return Err(Rejection::NoSeed);
        }
        if !self.board.sow(cell, species) {
            return Err(Rejection::Occupied);
        }
        let _ = self.player.inventory_mut().take_seed(species);
        Ok(Event::Sown { cell, species })
    }

    fn reap(&mut self, cell: Cell) -> Result<Event, Rejection> {
        let tile = self.board.tile(cell).ok_or(Rejection::OutOfBounds)?;
        let species = tile.plant.ok_or(Rejection::NoPlant)?;
        let rewards = self.board.reap(cell).ok_or(Rejection::Immature)?;
        self.player.inventory_mut().collect(rewards);
        Ok(Event::Reaped {
            cell,
            species,
            rewards: rewards.to_vec(),
        })
    }

    fn irrigate(&mut self, cell: Cell) -> Result<Event, Rejection> {
        let tile = self.board.tile(cell).ok_or(Rejection::OutOfBounds)?;
        if tile.content == TileContent::Water || !self.board.irrigate(cell) {
            return Err(Rejection::AlreadyWater);
        }
        Ok(Event::Irrigated { cell })
    }

    fn till(&mut self, cell: Cell) -> Result<Event, Rejection> {
        let tile = self.board.tile(cell).ok_or(Rejection::OutOfBounds)?;
        if tile.content == TileContent::Empty || !self.board.till(cell) {
            return Err(Rejection::AlreadyEmpty);
        }
        Ok(Event::Tilled { cell })
    }

    fn dehydrate(&mut self, cell: Cell, amount: f64) -> Result<Event, Rejection> {
        if self.board.tile(cell).is_none() {
            return Err(Rejection::OutOfBounds);
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(Rejection::InvalidAmount);
        }
        self.board.dehydrate(cell, amount);
        let water = self.board.tile(cell).map_or(0.0, |tile| tile.water);
        Ok(Event::Dehydrated { cell, water })
    }

    fn move_player(&mut self, rows: i32, cols: i32) -> Result<Event, Rejection> {
        let from = self.player.cell();
        let to = from.offset(rows, cols);
        if self.board.tile(to).is_none() {
            return Err(Rejection::OutOfBounds);
        }
        self.player.move_to(to);
        Ok(Event::PlayerMoved { from, to })
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and report
/// [`Event::Rejected`] instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::Tick { turn } => {
            world.tick(turn, out_events);
            return;
        }
        Command::Sow { cell, species } => world.sow(cell, species),
        Command::Reap { cell } => world.reap(cell),
        Command::Irrigate { cell } => world.irrigate(cell),
        Command::Till { cell } => world.till(cell),
        Command::Dehydrate { cell, amount } => world.dehydrate(cell, amount),
        Command::MovePlayer { rows, cols } => world.move_player(rows, cols),
    };

    match outcome {
        Ok(event) => out_events.push(event),
        Err(reason) => {
            debug!(?command, ?reason, "command rejected");
            out_events.push(Event::Rejected { command, reason });
        }
    }
}

/// Replaces the board and player with the state captured in `snapshot`.
///
/// The world is left untouched when the snapshot does not match its board.
pub fn restore(world: &mut World, snapshot: WorldSnapshot) -> Result<(), RestoreError> {
    let columns = world.board.columns();
    let rows = world.board.rows();
    if snapshot.columns != columns || snapshot.rows != rows {
        return Err(RestoreError::DimensionMismatch {
            columns,
            rows,
            found_columns: snapshot.columns,
            found_rows: snapshot.rows,
        });
    }
    let expected = columns as usize * rows as usize;
    if snapshot.tiles.len() != expected {
        return Err(RestoreError::TileCount {
            expected,
            found: snapshot.tiles.len(),
        });
    }

    world.board = Board::from_parts(columns, rows, snapshot.sun_position, snapshot.tiles);
    world.player = Player::from_snapshot(snapshot.player);
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::fmt::Write as _;

    use super::{Board, Player, World};
    use sunfield_core::{
        catalog, BoardParameters, Cell, Condition, Inventory, Tile, TileContent, WorldSnapshot,
    };

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        &world.board
    }

    /// Returns the tile at `cell`, or `None` outside the board.
    #[must_use]
    pub fn tile(world: &World, cell: Cell) -> Option<&Tile> {
        world.board.tile(cell)
    }

    /// Signed column the sun is centred on.
    #[must_use]
    pub fn sun_position(world: &World) -> i32 {
        world.board.sun_position()
    }

    /// Provides read-only access to the player.
    #[must_use]
    pub fn player(world: &World) -> &Player {
        &world.player
    }

    /// Seeds and crops carried by the player.
    #[must_use]
    pub fn inventory(world: &World) -> &Inventory {
        world.player.inventory()
    }

    /// Baseline parameters loaded at startup.
    #[must_use]
    pub fn baseline_parameters(world: &World) -> BoardParameters {
        world.parameters
    }

    /// Parameters in force on the provided turn.
    #[must_use]
    pub fn parameters_at(world: &World, turn: u32) -> BoardParameters {
        world.parameters.effective_at(&world.conditions, turn)
    }

    /// Timed overrides loaded at startup.
    #[must_use]
    pub fn conditions(world: &World) -> &[Condition] {
        &world.conditions
    }

    /// Total seeds the player must hold to win.
    #[must_use]
    pub fn seeds_to_win(world: &World) -> u32 {
        world.seeds_to_win
    }

    /// Reports whether the player holds enough seeds to win.
    #[must_use]
    pub fn has_won(world: &World) -> bool {
        world.player.inventory().total_seeds() >= u64::from(world.seeds_to_win)
    }

    /// Captures the complete board and player state.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        WorldSnapshot {
            columns: world.board.columns(),
            rows: world.board.rows(),
            sun_position: world.board.sun_position(),
            tiles: world.board.tiles().to_vec(),
            player: world.player.snapshot(),
        }
    }

    /// Renders the board as text: sprites for plants, `~` for water, `.` for soil.
    #[must_use]
    pub fn render_text(world: &World) -> String {
        let mut text = String::new();
        let width = world.board.columns().max(1) as usize;
        for row in world.board.tiles().chunks(width) {
            for tile in row {
                match (tile.content, tile.plant) {
                    (TileContent::Planted, Some(species)) => {
                        text.push_str(catalog::display_sprite(species, tile.growth));
                    }
                    (TileContent::Water, _) => text.push('~'),
                    _ => text.push('.'),
                }
            }
            text.push('\n');
        }
        text
    }

    /// Summarises the inventory, one line per species with seeds or crops.
    #[must_use]
    pub fn inventory_summary(world: &World) -> String {
        let inventory = world.player.inventory();
        let mut summary = String::new();
        for species in catalog::ids() {
            let seeds = inventory.seed_count(species);
            let crops = inventory.crop_count(species);
            if seeds == 0 && crops == 0 {
                continue;
            }
            let _ = writeln!(
                summary,
                "{}: {seeds} seeds, {crops} crops",
                catalog::name(species)
            );
        }
        if summary.is_empty() {
            summary.push_str("Empty\n");
        } else {
            let _ = writeln!(
                summary,
                "Total: {} seeds, {} crops",
                inventory.total_seeds(),
                inventory.total_crops()
            );
        }
        summary
    }
}
