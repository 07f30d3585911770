//! Dense tile grid with per-tile mutations and the environmental update.

use rand::Rng;
use sunfield_core::{
    catalog, Cell, Event, RewardToken, SpeciesId, Tile, TileContent, TileView, MAX_HYDRATION,
};
use sunfield_system_growth::GrowthOutcome;

/// Scale applied to the random sunlight bonus near the sun's column.
const SUN_VARIANCE: f64 = 0.1;

/// Row-major grid of tiles plus the sun's signed column.
#[derive(Clone, Debug)]
pub struct Board {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    sun_position: i32,
}

impl Board {
    /// Creates a dry, empty board with the sun just past the right edge.
    #[must_use]
    pub fn new(columns: u32, rows: u32, sun_range: u32) -> Self {
        let tiles = (0..rows)
            .flat_map(|row| {
                (0..columns).map(move |col| Tile::empty(Cell::new(row as i32, col as i32)))
            })
            .collect();
        Self {
            columns,
            rows,
            tiles,
            sun_position: sun_reset_position(columns, sun_range),
        }
    }

    pub(crate) fn from_parts(columns: u32, rows: u32, sun_position: i32, tiles: Vec<Tile>) -> Self {
        Self {
            columns,
            rows,
            tiles,
            sun_position,
        }
    }

    /// Number of columns contained in the board.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the board.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Signed column the sun is currently centred on.
    #[must_use]
    pub const fn sun_position(&self) -> i32 {
        self.sun_position
    }

    /// Row-major slice of every tile.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Captures a read-only view of the grid for systems.
    #[must_use]
    pub fn view(&self) -> TileView<'_> {
        TileView::new(&self.tiles, self.columns, self.rows)
    }

    /// Returns the tile at `cell`, or `None` when the cell is outside the board.
    #[must_use]
    pub fn tile(&self, cell: Cell) -> Option<&Tile> {
        self.view().tile(cell)
    }

    fn tile_mut(&mut self, cell: Cell) -> Option<&mut Tile> {
        let index = self.view().index(cell)?;
        self.tiles.get_mut(index)
    }

    /// Converts the tile into an irrigation channel, clearing any plant.
    ///
    /// Fails when the tile is already water or the cell is outside the board.
    pub fn irrigate(&mut self, cell: Cell) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        if tile.content == TileContent::Water {
            return false;
        }
        tile.content = TileContent::Water;
        tile.plant = None;
        tile.growth = 0;
        true
    }

    /// Clears the tile back to bare soil, dropping any plant.
    ///
    /// Fails when the tile is already empty or the cell is outside the board.
    pub fn till(&mut self, cell: Cell) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        if tile.content == TileContent::Empty {
            return false;
        }
        clear(tile);
        true
    }

    /// Plants `species` on an empty tile at growth stage zero.
    pub fn sow(&mut self, cell: Cell, species: SpeciesId) -> bool {
        if !catalog::contains(species) {
            return false;
        }
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        if tile.content != TileContent::Empty {
            return false;
        }
        tile.content = TileContent::Planted;
        tile.plant = Some(species);
        tile.growth = 0;
        true
    }

    /// Removes up to `amount` water from the tile, never dropping below zero.
    ///
    /// Cells outside the board and negative or non-finite amounts are ignored.
    pub fn dehydrate(&mut self, cell: Cell, amount: f64) {
        if !amount.is_finite() || amount < 0.0 {
            return;
        }
        if let Some(tile) = self.tile_mut(cell) {
            tile.water = (tile.water - amount).clamp(0.0, MAX_HYDRATION);
        }
    }

    /// Harvests a plant that reached its growth cap, tilling the tile.
    ///
    /// Returns the species' reward tokens, or `None` without mutating anything
    /// when the tile holds no mature plant.
    pub fn reap(&mut self, cell: Cell) -> Option<&'static [RewardToken]> {
        let tile = self.tile_mut(cell)?;
        let species = tile.plant?;
        if tile.growth != catalog::growth_cap(species) {
            return None;
        }
        clear(tile);
        Some(catalog::reward(species))
    }

    /// In-bounds Moore neighbours of `cell`, excluding the cell itself.
    #[must_use]
    pub fn adjacent_tiles(&self, cell: Cell) -> Vec<&Tile> {
        self.view().neighbors(cell).collect()
    }

    /// Species planted around `cell`, or `None` when no neighbour holds a plant.
    #[must_use]
    pub fn adjacent_plants(&self, cell: Cell) -> Option<Vec<SpeciesId>> {
        let plants: Vec<SpeciesId> = self
            .view()
            .neighbors(cell)
            .filter_map(|tile| tile.plant)
            .collect();
        if plants.is_empty() {
            None
        } else {
            Some(plants)
        }
    }

    /// Steps the sun one column to the left, wrapping past the far edge.
    pub fn move_sun(&mut self, sun_range: u32) {
        let range = range_as_i32(sun_range);
        self.sun_position = self.sun_position.saturating_sub(1);
        if self.sun_position < -range {
            self.sun_position = sun_reset_position(self.columns, sun_range);
        }
    }

    /// Recomputes the sunlight of every tile from the sun's position.
    ///
    /// Columns within `sun_range` of the sun receive `1` plus a random bonus
    /// that shrinks with distance; every row of a column shares one value.
    pub fn update_sun_tiles<R>(&mut self, sun_range: u32, rng: &mut R)
    where
        R: Rng,
    {
        let range = i64::from(sun_range);
        let width = self.columns as usize;
        for col in 0..self.columns {
            let distance = (i64::from(col) - i64::from(self.sun_position)).abs();
            let sun = if distance < range {
                1.0 + rng.gen::<f64>() * SUN_VARIANCE * (range - distance).max(0) as f64
            } else {
                0.0
            };
            for tile in self.tiles.iter_mut().skip(col as usize).step_by(width.max(1)) {
                tile.sun = sun;
            }
        }
    }

    /// Pours water from every irrigation channel into its neighbours.
    ///
    /// Each neighbour receives `water_rate` plus a random amount in `[0, 1)`
    /// per adjacent channel, capped at [`MAX_HYDRATION`].
    pub fn hydrate<R>(&mut self, water_rate: f64, rng: &mut R)
    where
        R: Rng,
    {
        let sources: Vec<Cell> = self
            .tiles
            .iter()
            .filter(|tile| tile.content == TileContent::Water)
            .map(|tile| tile.cell)
            .collect();

        for source in sources {
            for neighbor in source.neighbors() {
                let Some(tile) = self.tile_mut(neighbor) else {
                    continue;
                };
                let poured = water_rate + rng.gen::<f64>();
                tile.water = (tile.water + poured).clamp(0.0, MAX_HYDRATION);
            }
        }
    }

    /// Applies the growth decisions taken against the pre-pass snapshot.
    pub(crate) fn apply_growth(&mut self, outcomes: &[GrowthOutcome], out_events: &mut Vec<Event>) {
        for outcome in outcomes {
            let Some(tile) = self.tile_mut(outcome.cell) else {
                continue;
            };
            if tile.plant != Some(outcome.species) {
                continue;
            }
            if outcome.grew {
                tile.growth = (tile.growth + 1).min(catalog::growth_cap(outcome.species));
                out_events.push(Event::PlantGrew {
                    cell: outcome.cell,
                    species: outcome.species,
                    growth: tile.growth,
                });
            }
            tile.water = (tile.water - outcome.water_cost).clamp(0.0, MAX_HYDRATION);
        }
    }
}

fn clear(tile: &mut Tile) {
    tile.content = TileContent::Empty;
    tile.plant = None;
    tile.growth = 0;
}

fn range_as_i32(sun_range: u32) -> i32 {
    i32::try_from(sun_range).unwrap_or(i32::MAX)
}

/// Column the sun wraps to once it leaves the board on the left.
pub(crate) fn sun_reset_position(columns: u32, sun_range: u32) -> i32 {
    let columns = i32::try_from(columns).unwrap_or(i32::MAX);
    columns
        .saturating_sub(1)
        .saturating_add(range_as_i32(sun_range))
}
