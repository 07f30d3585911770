//! Fixed-layout binary encoding of a single turn.
//!
//! A block is laid out as
//! `[tile_0 .. tile_{rows*cols-1}][cols][rows][sun_position][player]`, every
//! field a little-endian `f64`. Each tile record holds
//! `row, col, content, sun, water, plant_id, growth` so a tile lives at
//! `(row * cols + col) * TILE_RECORD_SIZE`. The player block holds `x, y,
//! tile_size` followed by one `(species, count)` slot per catalog species for
//! seeds and then for crops; unused slots carry [`NO_PLANT`] as their key.

use sunfield_core::{
    catalog, Cell, Inventory, PlayerSnapshot, SpeciesId, Tile, TileContent, WorldSnapshot,
    MAX_GRID_EXTENT, MAX_HYDRATION,
};

use crate::CodecError;

/// Sentinel stored in place of a species id for empty tiles and inventory slots.
pub const NO_PLANT: f64 = -1.0;

/// Width of every numeric field in bytes.
pub const FIELD_SIZE: usize = 8;

/// Numeric fields stored per tile.
pub const TILE_FIELDS: usize = 7;

/// Size of a tile record in bytes.
pub const TILE_RECORD_SIZE: usize = TILE_FIELDS * FIELD_SIZE;

/// Size of the `[cols][rows][sun_position]` trailer that follows the tiles.
pub const TRAILER_SIZE: usize = 3 * FIELD_SIZE;

const PLAYER_HEADER_FIELDS: usize = 3;

const ROW: usize = 0;
const COL: usize = 1;
const CONTENT: usize = 2;
const SUN: usize = 3;
const WATER: usize = 4;
const PLANT: usize = 5;
const GROWTH: usize = 6;

/// Byte layout of one turn block for a board of fixed dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    columns: u32,
    rows: u32,
    species_slots: u32,
}

impl BlockLayout {
    /// Creates the layout for a board, reserving one inventory slot per catalog species.
    pub fn new(columns: u32, rows: u32) -> Result<Self, CodecError> {
        Self::with_slots(columns, rows, catalog::species_count())
    }

    /// Creates a layout with an explicit inventory slot capacity.
    pub fn with_slots(columns: u32, rows: u32, species_slots: u32) -> Result<Self, CodecError> {
        let extent = 1..=MAX_GRID_EXTENT;
        if !extent.contains(&columns) || !extent.contains(&rows) {
            return Err(CodecError::Dimensions { columns, rows });
        }
        Ok(Self {
            columns,
            rows,
            species_slots,
        })
    }

    /// Number of board columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of board rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Inventory slots reserved for seeds, and again for crops.
    #[must_use]
    pub const fn species_slots(&self) -> u32 {
        self.species_slots
    }

    /// Number of tile records in the block.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Bytes occupied by the tiles and the trailer.
    #[must_use]
    pub const fn board_len(&self) -> usize {
        self.tile_count() * TILE_RECORD_SIZE + TRAILER_SIZE
    }

    /// Bytes occupied by the player block.
    #[must_use]
    pub const fn player_len(&self) -> usize {
        (PLAYER_HEADER_FIELDS + 4 * self.species_slots as usize) * FIELD_SIZE
    }

    /// Total bytes of one turn block.
    #[must_use]
    pub const fn block_len(&self) -> usize {
        self.board_len() + self.player_len()
    }

    /// Byte offset of the tile record for `cell`, or `None` outside the board.
    #[must_use]
    pub fn tile_offset(&self, cell: Cell) -> Option<usize> {
        let row = u32::try_from(cell.row()).ok()?;
        let col = u32::try_from(cell.col()).ok()?;
        if row >= self.rows || col >= self.columns {
            return None;
        }
        Some((row as usize * self.columns as usize + col as usize) * TILE_RECORD_SIZE)
    }

    /// Encodes a snapshot into a freshly allocated block.
    pub fn encode(&self, snapshot: &WorldSnapshot) -> Result<Vec<u8>, CodecError> {
        let mut block = vec![0; self.block_len()];
        self.write_snapshot(snapshot, &mut block)?;
        Ok(block)
    }

    /// Overwrites `block` with the encoding of `snapshot`.
    ///
    /// The block is left untouched when the snapshot does not fit the layout.
    pub fn write_snapshot(
        &self,
        snapshot: &WorldSnapshot,
        block: &mut [u8],
    ) -> Result<(), CodecError> {
        self.check_len(block)?;
        if snapshot.columns != self.columns || snapshot.rows != self.rows {
            return Err(CodecError::DimensionMismatch {
                columns: self.columns,
                rows: self.rows,
                found_columns: snapshot.columns,
                found_rows: snapshot.rows,
            });
        }
        if snapshot.tiles.len() != self.tile_count() {
            return Err(CodecError::TileCount {
                expected: self.tile_count(),
                found: snapshot.tiles.len(),
            });
        }
        let seeds: Vec<(SpeciesId, u32)> = snapshot.player.inventory.seeds().collect();
        let crops: Vec<(SpeciesId, u32)> = snapshot.player.inventory.crops().collect();
        let capacity = self.species_slots as usize;
        let entries = seeds.len().max(crops.len());
        if entries > capacity {
            return Err(CodecError::InventoryOverflow { capacity, entries });
        }

        for (index, tile) in snapshot.tiles.iter().enumerate() {
            write_record(block, index * TILE_RECORD_SIZE, tile);
        }

        let trailer = self.tile_count() * TILE_RECORD_SIZE;
        put(block, trailer, f64::from(self.columns));
        put(block, trailer + FIELD_SIZE, f64::from(self.rows));
        put(block, trailer + 2 * FIELD_SIZE, f64::from(snapshot.sun_position));

        let player = self.board_len();
        put(block, player, snapshot.player.x);
        put(block, player + FIELD_SIZE, snapshot.player.y);
        put(block, player + 2 * FIELD_SIZE, snapshot.player.tile_size);
        self.write_slots(block, self.seed_slots_offset(), &seeds);
        self.write_slots(block, self.crop_slots_offset(), &crops);
        Ok(())
    }

    /// Decodes and validates every field of a block.
    pub fn read_snapshot(&self, block: &[u8]) -> Result<WorldSnapshot, CodecError> {
        self.check_len(block)?;

        let trailer = self.tile_count() * TILE_RECORD_SIZE;
        let columns = integral("columns", get(block, trailer), 0.0, f64::from(u32::MAX))?;
        let rows = integral("rows", get(block, trailer + FIELD_SIZE), 0.0, f64::from(u32::MAX))?;
        if columns != i64::from(self.columns) || rows != i64::from(self.rows) {
            return Err(CodecError::DimensionMismatch {
                columns: self.columns,
                rows: self.rows,
                found_columns: u32::try_from(columns).unwrap_or(u32::MAX),
                found_rows: u32::try_from(rows).unwrap_or(u32::MAX),
            });
        }
        let sun_position = integral(
            "sun_position",
            get(block, trailer + 2 * FIELD_SIZE),
            f64::from(i32::MIN),
            f64::from(i32::MAX),
        )?;

        let tiles = (0..self.tile_count())
            .map(|index| self.read_record(block, index))
            .collect::<Result<Vec<_>, _>>()?;

        let player = self.board_len();
        let x = finite("player_x", get(block, player))?;
        let y = finite("player_y", get(block, player + FIELD_SIZE))?;
        let tile_size = finite("tile_size", get(block, player + 2 * FIELD_SIZE))?;
        if tile_size <= 0.0 {
            return Err(CodecError::InvalidField {
                field: "tile_size",
                value: tile_size,
            });
        }

        let mut inventory = Inventory::new();
        for (species, count) in self.read_slots(block, self.seed_slots_offset(), "seed_key")? {
            inventory.add_seeds(species, count);
        }
        for (species, count) in self.read_slots(block, self.crop_slots_offset(), "crop_key")? {
            inventory.add_crops(species, count);
        }

        Ok(WorldSnapshot {
            columns: self.columns,
            rows: self.rows,
            sun_position: sun_position as i32,
            tiles,
            player: PlayerSnapshot {
                x,
                y,
                tile_size,
                inventory,
            },
        })
    }

    /// Reads a single tile record in constant time.
    ///
    /// Returns `Ok(None)` when `cell` lies outside the board.
    pub fn read_tile(&self, block: &[u8], cell: Cell) -> Result<Option<Tile>, CodecError> {
        self.check_len(block)?;
        let Some(offset) = self.tile_offset(cell) else {
            return Ok(None);
        };
        self.read_record(block, offset / TILE_RECORD_SIZE).map(Some)
    }

    /// Overwrites a single tile record in constant time.
    ///
    /// Returns `Ok(false)` without writing when the tile's cell lies outside the board.
    pub fn write_tile(&self, block: &mut [u8], tile: &Tile) -> Result<bool, CodecError> {
        self.check_len(block)?;
        let Some(offset) = self.tile_offset(tile.cell) else {
            return Ok(false);
        };
        write_record(block, offset, tile);
        Ok(true)
    }

    fn check_len(&self, block: &[u8]) -> Result<(), CodecError> {
        if block.len() == self.block_len() {
            Ok(())
        } else {
            Err(CodecError::Length {
                expected: self.block_len(),
                found: block.len(),
            })
        }
    }

    fn seed_slots_offset(&self) -> usize {
        self.board_len() + PLAYER_HEADER_FIELDS * FIELD_SIZE
    }

    fn crop_slots_offset(&self) -> usize {
        self.seed_slots_offset() + 2 * self.species_slots as usize * FIELD_SIZE
    }

    fn write_slots(&self, block: &mut [u8], start: usize, entries: &[(SpeciesId, u32)]) {
        for slot in 0..self.species_slots as usize {
            let offset = start + slot * 2 * FIELD_SIZE;
            let (key, value) = entries
                .get(slot)
                .map_or((NO_PLANT, 0.0), |&(species, count)| {
                    (f64::from(species.get()), f64::from(count))
                });
            put(block, offset, key);
            put(block, offset + FIELD_SIZE, value);
        }
    }

    fn read_slots(
        &self,
        block: &[u8],
        start: usize,
        field: &'static str,
    ) -> Result<Vec<(SpeciesId, u32)>, CodecError> {
        let mut entries: Vec<(SpeciesId, u32)> = Vec::new();
        for slot in 0..self.species_slots as usize {
            let offset = start + slot * 2 * FIELD_SIZE;
            let key = get(block, offset);
            if key == NO_PLANT {
                continue;
            }
            let species = species_field(field, key)?;
            if entries.iter().any(|&(seen, _)| seen == species) {
                return Err(CodecError::InvalidField { field, value: key });
            }
            let count = integral(
                "inventory_count",
                get(block, offset + FIELD_SIZE),
                0.0,
                f64::from(u32::MAX),
            )?;
            entries.push((species, count as u32));
        }
        Ok(entries)
    }

    fn read_record(&self, block: &[u8], index: usize) -> Result<Tile, CodecError> {
        let offset = index * TILE_RECORD_SIZE;
        let field = |slot: usize| get(block, offset + slot * FIELD_SIZE);
        let columns = self.columns as usize;

        let row = integral("row", field(ROW), 0.0, f64::from(self.rows) - 1.0)?;
        let col = integral("col", field(COL), 0.0, f64::from(self.columns) - 1.0)?;
        if row as usize * columns + col as usize != index {
            return Err(CodecError::InconsistentTile {
                index,
                reason: "coordinates do not match record position",
            });
        }

        let code = integral("content", field(CONTENT), 0.0, f64::from(u8::MAX))?;
        let content =
            TileContent::from_code(code as u8).ok_or(CodecError::InvalidField {
                field: "content",
                value: field(CONTENT),
            })?;

        let sun = finite("sun", field(SUN))?;
        if sun < 0.0 {
            return Err(CodecError::InvalidField {
                field: "sun",
                value: sun,
            });
        }
        let water = finite("water", field(WATER))?;
        if !(0.0..=MAX_HYDRATION).contains(&water) {
            return Err(CodecError::InvalidField {
                field: "water",
                value: water,
            });
        }

        let plant = match field(PLANT) {
            key if key == NO_PLANT => None,
            key => Some(species_field("plant_id", key)?),
        };
        let growth = integral("growth", field(GROWTH), 0.0, f64::from(u32::MAX))? as u32;

        match (content, plant) {
            (TileContent::Planted, None) => {
                return Err(CodecError::InconsistentTile {
                    index,
                    reason: "planted tile without a species",
                });
            }
            (TileContent::Empty | TileContent::Water, Some(_)) => {
                return Err(CodecError::InconsistentTile {
                    index,
                    reason: "species recorded on an unplanted tile",
                });
            }
            (TileContent::Planted, Some(species)) if growth > catalog::growth_cap(species) => {
                return Err(CodecError::InconsistentTile {
                    index,
                    reason: "growth exceeds the species cap",
                });
            }
            _ => {}
        }

        Ok(Tile {
            cell: Cell::new(row as i32, col as i32),
            content,
            sun,
            water,
            plant,
            growth,
        })
    }
}

fn write_record(block: &mut [u8], offset: usize, tile: &Tile) {
    let plant = tile
        .plant
        .map_or(NO_PLANT, |species| f64::from(species.get()));
    let fields = [
        f64::from(tile.cell.row()),
        f64::from(tile.cell.col()),
        f64::from(tile.content.code()),
        tile.sun,
        tile.water,
        plant,
        f64::from(tile.growth),
    ];
    for (slot, value) in fields.into_iter().enumerate() {
        put(block, offset + slot * FIELD_SIZE, value);
    }
}

fn put(block: &mut [u8], offset: usize, value: f64) {
    block[offset..offset + FIELD_SIZE].copy_from_slice(&value.to_le_bytes());
}

fn get(block: &[u8], offset: usize) -> f64 {
    let mut bytes = [0; FIELD_SIZE];
    bytes.copy_from_slice(&block[offset..offset + FIELD_SIZE]);
    f64::from_le_bytes(bytes)
}

fn finite(field: &'static str, value: f64) -> Result<f64, CodecError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CodecError::InvalidField { field, value })
    }
}

fn integral(field: &'static str, value: f64, min: f64, max: f64) -> Result<i64, CodecError> {
    if value.is_finite() && value.fract() == 0.0 && value >= min && value <= max {
        Ok(value as i64)
    } else {
        Err(CodecError::InvalidField { field, value })
    }
}

fn species_field(field: &'static str, value: f64) -> Result<SpeciesId, CodecError> {
    let id = integral(field, value, 0.0, f64::from(u32::MAX))?;
    let species = SpeciesId::new(id as u32);
    if catalog::contains(species) {
        Ok(species)
    } else {
        Err(CodecError::InvalidField { field, value })
    }
}
