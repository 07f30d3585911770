#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sunfield farming simulation.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, the turn store, and pure systems. Hosts submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what actually changed. Systems read immutable [`TileView`]
//! snapshots and never hold a reference to the world itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod catalog;

/// Upper bound for the water stored on a single tile.
pub const MAX_HYDRATION: f64 = 4.0;

/// Multiplicative growth bonus granted per neighbouring friend plant.
pub const GLOBAL_FRIEND_RATE: f64 = 0.05;

/// Largest accepted number of rows or columns for a board.
pub const MAX_GRID_EXTENT: u32 = 64;

/// Default edge length of a tile in host pixels.
pub const DEFAULT_TILE_SIZE: f64 = 32.0;

/// Location of a single board tile expressed as row and column indices.
///
/// Coordinates are signed so that hosts can describe cells that fall outside
/// the board; every accessor treats those as absent rather than failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    row: i32,
    col: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    /// Returns the cell shifted by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, rows: i32, cols: i32) -> Self {
        Self {
            row: self.row.saturating_add(rows),
            col: self.col.saturating_add(cols),
        }
    }

    /// Computes the Chebyshev distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Enumerates the eight Moore-neighbourhood cells around this cell.
    ///
    /// Bounds are not checked; callers filter against their grid.
    pub fn neighbors(self) -> impl Iterator<Item = Cell> {
        MOORE_OFFSETS
            .iter()
            .map(move |&(rows, cols)| self.offset(rows, cols))
    }
}

static MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Stable identifier of a plant species, assigned by catalog order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(u32);

impl SpeciesId {
    /// Creates a species identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Mutually exclusive occupancy state of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileContent {
    /// Bare soil that accepts seeds and irrigation.
    Empty,
    /// Soil holding a plant.
    Planted,
    /// Irrigation channel that hydrates its neighbours every turn.
    Water,
}

impl TileContent {
    /// Numeric code stored in the binary snapshot layout.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Planted => 1,
            Self::Water => 2,
        }
    }

    /// Resolves a numeric layout code back into a content value.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Planted),
            2 => Some(Self::Water),
            _ => None,
        }
    }
}

/// Environmental and occupancy state of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Cell the tile occupies.
    pub cell: Cell,
    /// Occupancy of the tile.
    pub content: TileContent,
    /// Sunlight received this turn; recomputed on every tick.
    pub sun: f64,
    /// Accumulated water, kept within `[0, MAX_HYDRATION]`.
    pub water: f64,
    /// Species planted on the tile, present iff `content` is `Planted`.
    pub plant: Option<SpeciesId>,
    /// Growth stage of the plant, bounded by the species' growth cap.
    pub growth: u32,
}

impl Tile {
    /// Creates a dry, unlit, empty tile at the provided cell.
    #[must_use]
    pub const fn empty(cell: Cell) -> Self {
        Self {
            cell,
            content: TileContent::Empty,
            sun: 0.0,
            water: 0.0,
            plant: None,
            growth: 0,
        }
    }

    /// Reports whether the tile currently holds a plant.
    #[must_use]
    pub const fn is_planted(&self) -> bool {
        self.plant.is_some()
    }
}

/// Yield granted when a mature plant is reaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardToken {
    /// One seed of the referenced species.
    Seed(SpeciesId),
    /// One harvested crop of the referenced species.
    Crop(SpeciesId),
}

impl RewardToken {
    /// Species referenced by the token.
    #[must_use]
    pub const fn species(&self) -> SpeciesId {
        match self {
            Self::Seed(species) | Self::Crop(species) => *species,
        }
    }
}

impl std::fmt::Display for RewardToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seed(species) => write!(f, "{}Seed", species.get()),
            Self::Crop(species) => write!(f, "{}Crop", species.get()),
        }
    }
}

impl std::str::FromStr for RewardToken {
    type Err = catalog::CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || catalog::CatalogError::MalformedToken(value.to_owned());
        let (digits, kind) = if let Some(digits) = value.strip_suffix("Seed") {
            (digits, RewardToken::Seed as fn(SpeciesId) -> RewardToken)
        } else if let Some(digits) = value.strip_suffix("Crop") {
            (digits, RewardToken::Crop as fn(SpeciesId) -> RewardToken)
        } else {
            return Err(malformed());
        };
        let id = digits.parse::<u32>().map_err(|_| malformed())?;
        Ok(kind(SpeciesId::new(id)))
    }
}

/// Seed and crop counts held by the player, keyed by species.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    seeds: BTreeMap<SpeciesId, u32>,
    crops: BTreeMap<SpeciesId, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of seeds held for the species.
    #[must_use]
    pub fn seed_count(&self, species: SpeciesId) -> u32 {
        self.seeds.get(&species).copied().unwrap_or(0)
    }

    /// Number of harvested crops held for the species.
    #[must_use]
    pub fn crop_count(&self, species: SpeciesId) -> u32 {
        self.crops.get(&species).copied().unwrap_or(0)
    }

    /// Adds seeds of the species to the inventory.
    pub fn add_seeds(&mut self, species: SpeciesId, count: u32) {
        add_to(&mut self.seeds, species, count);
    }

    /// Adds harvested crops of the species to the inventory.
    pub fn add_crops(&mut self, species: SpeciesId, count: u32) {
        add_to(&mut self.crops, species, count);
    }

    /// Removes a single seed of the species, reporting whether one was held.
    pub fn take_seed(&mut self, species: SpeciesId) -> bool {
        let Some(count) = self.seeds.get_mut(&species) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            let _ = self.seeds.remove(&species);
        }
        true
    }

    /// Credits every reward token: seeds to the seed pouch, crops to the crop pouch.
    pub fn collect(&mut self, rewards: &[RewardToken]) {
        for token in rewards {
            match *token {
                RewardToken::Seed(species) => self.add_seeds(species, 1),
                RewardToken::Crop(species) => self.add_crops(species, 1),
            }
        }
    }

    /// Total seeds held across all species.
    #[must_use]
    pub fn total_seeds(&self) -> u64 {
        self.seeds.values().map(|&count| u64::from(count)).sum()
    }

    /// Total harvested crops held across all species.
    #[must_use]
    pub fn total_crops(&self) -> u64 {
        self.crops.values().map(|&count| u64::from(count)).sum()
    }

    /// Non-empty seed entries in ascending species order.
    pub fn seeds(&self) -> impl Iterator<Item = (SpeciesId, u32)> + '_ {
        self.seeds.iter().map(|(&species, &count)| (species, count))
    }

    /// Non-empty crop entries in ascending species order.
    pub fn crops(&self) -> impl Iterator<Item = (SpeciesId, u32)> + '_ {
        self.crops.iter().map(|(&species, &count)| (species, count))
    }
}

fn add_to(pouch: &mut BTreeMap<SpeciesId, u32>, species: SpeciesId, count: u32) {
    if count == 0 {
        return;
    }
    let entry = pouch.entry(species).or_insert(0);
    *entry = entry.saturating_add(count);
}

/// Board parameters that timed conditions may override.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardParameters {
    /// Number of columns on either side of the sun that receive light.
    pub sun_range: u32,
    /// Baseline water added to each neighbour of an irrigated tile per turn.
    pub water_rate: f64,
}

impl BoardParameters {
    /// Resolves the parameters in force for the provided turn.
    ///
    /// A condition is active for `turn_start <= turn < turn_end`; overlapping
    /// conditions apply in declaration order so the later one wins. Outside
    /// every window the baseline is returned unchanged.
    #[must_use]
    pub fn effective_at(&self, conditions: &[Condition], turn: u32) -> Self {
        let mut effective = *self;
        for condition in conditions.iter().filter(|c| c.is_active(turn)) {
            match condition.parameter {
                ConditionParameter::SunRange => {
                    effective.sun_range = condition.value.round().max(0.0) as u32;
                }
                ConditionParameter::WaterRate => effective.water_rate = condition.value,
            }
        }
        effective
    }
}

/// Board parameter targeted by a timed condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionParameter {
    /// Overrides [`BoardParameters::sun_range`].
    SunRange,
    /// Overrides [`BoardParameters::water_rate`].
    WaterRate,
}

/// Timed override of a board parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Parameter replaced while the condition is active.
    pub parameter: ConditionParameter,
    /// Replacement value.
    pub value: f64,
    /// First turn on which the override applies.
    pub turn_start: u32,
    /// Turn on which the baseline is restored.
    pub turn_end: u32,
}

impl Condition {
    /// Reports whether the override is in force on the provided turn.
    #[must_use]
    pub const fn is_active(&self, turn: u32) -> bool {
        self.turn_start <= turn && turn < self.turn_end
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Plants a seed from the player's inventory on an empty tile.
    Sow {
        /// Tile receiving the seed.
        cell: Cell,
        /// Species to plant.
        species: SpeciesId,
    },
    /// Harvests a mature plant, crediting its reward to the player.
    Reap {
        /// Tile holding the plant.
        cell: Cell,
    },
    /// Turns a tile into an irrigation channel, clearing any plant.
    Irrigate {
        /// Tile to irrigate.
        cell: Cell,
    },
    /// Clears a tile back to bare soil.
    Till {
        /// Tile to till.
        cell: Cell,
    },
    /// Removes water from a tile.
    Dehydrate {
        /// Tile losing water.
        cell: Cell,
        /// Amount of water to remove.
        amount: f64,
    },
    /// Moves the player by whole tiles.
    MovePlayer {
        /// Row delta, positive moving down the board.
        rows: i32,
        /// Column delta, positive moving right.
        cols: i32,
    },
    /// Runs the per-turn environmental update for the provided turn index.
    Tick {
        /// Turn being simulated, used to resolve timed conditions.
        turn: u32,
    },
}

/// Reasons a tile mutation may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The cell lies outside the board.
    OutOfBounds,
    /// The tile is not empty, so nothing can be sown on it.
    Occupied,
    /// The tile is already bare soil.
    AlreadyEmpty,
    /// The tile is already an irrigation channel.
    AlreadyWater,
    /// The tile holds no plant.
    NoPlant,
    /// The plant has not reached its growth cap.
    Immature,
    /// The player holds no seed of the requested species.
    NoSeed,
    /// The species identifier is not part of the catalog.
    UnknownSpecies,
    /// The water amount is negative or not a finite number.
    InvalidAmount,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a seed was planted.
    Sown {
        /// Tile that received the seed.
        cell: Cell,
        /// Species planted.
        species: SpeciesId,
    },
    /// Confirms that a mature plant was harvested.
    Reaped {
        /// Tile the plant was taken from.
        cell: Cell,
        /// Species harvested.
        species: SpeciesId,
        /// Reward credited to the player.
        rewards: Vec<RewardToken>,
    },
    /// Confirms that a tile became an irrigation channel.
    Irrigated {
        /// Tile that was irrigated.
        cell: Cell,
    },
    /// Confirms that a tile was cleared to bare soil.
    Tilled {
        /// Tile that was tilled.
        cell: Cell,
    },
    /// Confirms that water was removed from a tile.
    Dehydrated {
        /// Tile that lost water.
        cell: Cell,
        /// Water remaining on the tile.
        water: f64,
    },
    /// Confirms that the player moved.
    PlayerMoved {
        /// Tile occupied before moving.
        from: Cell,
        /// Tile occupied after moving.
        to: Cell,
    },
    /// Indicates that the sun advanced to a new column.
    SunMoved {
        /// Signed column the sun is centred on.
        position: i32,
    },
    /// Reports that a plant advanced a growth stage.
    PlantGrew {
        /// Tile holding the plant.
        cell: Cell,
        /// Species that grew.
        species: SpeciesId,
        /// Growth stage after advancing.
        growth: u32,
    },
    /// Indicates that a turn's environmental update completed.
    TurnSimulated {
        /// Turn that was simulated.
        turn: u32,
        /// Parameters in force for the turn.
        parameters: BoardParameters,
    },
    /// Reports that a tile or player command was rejected without mutation.
    Rejected {
        /// Command that was rejected.
        command: Command,
        /// Specific reason the command failed.
        reason: Rejection,
    },
}

/// Read-only view into a dense, row-major tile grid.
#[derive(Clone, Copy, Debug)]
pub struct TileView<'a> {
    tiles: &'a [Tile],
    columns: u32,
    rows: u32,
}

impl<'a> TileView<'a> {
    /// Captures a new tile view backed by the provided row-major slice.
    #[must_use]
    pub fn new(tiles: &'a [Tile], columns: u32, rows: u32) -> Self {
        Self {
            tiles,
            columns,
            rows,
        }
    }

    /// Returns the tile at the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn tile(&self, cell: Cell) -> Option<&'a Tile> {
        self.index(cell).and_then(|index| self.tiles.get(index))
    }

    /// Iterates the in-bounds Moore neighbours of a cell, excluding the cell itself.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = &'a Tile> + '_ {
        cell.neighbors().filter_map(move |neighbor| self.tile(neighbor))
    }

    /// Iterates every tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Tile> {
        self.tiles.iter()
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Resolves a cell into its row-major index, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        let row = u32::try_from(cell.row()).ok()?;
        let col = u32::try_from(cell.col()).ok()?;
        if row >= self.rows || col >= self.columns {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        Some(usize::try_from(row).ok()? * width + usize::try_from(col).ok()?)
    }
}

/// Player state captured alongside the board in every turn snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Horizontal position in host pixels.
    pub x: f64,
    /// Vertical position in host pixels.
    pub y: f64,
    /// Edge length of a tile in host pixels.
    pub tile_size: f64,
    /// Seeds and crops held by the player.
    pub inventory: Inventory,
}

/// Complete simulation state for a single turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Number of board columns.
    pub columns: u32,
    /// Number of board rows.
    pub rows: u32,
    /// Signed column the sun is centred on.
    pub sun_position: i32,
    /// Row-major tiles, `columns * rows` entries.
    pub tiles: Vec<Tile>,
    /// Player position and inventory.
    pub player: PlayerSnapshot,
}
