//! Player position and inventory.

use sunfield_core::{Cell, Inventory, PlayerSnapshot};

/// Farmer controlled by the host; positions are kept in host pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    x: f64,
    y: f64,
    tile_size: f64,
    inventory: Inventory,
}

impl Player {
    pub(crate) fn new(start: Cell, tile_size: f64, inventory: Inventory) -> Self {
        Self {
            x: f64::from(start.col()) * tile_size,
            y: f64::from(start.row()) * tile_size,
            tile_size,
            inventory,
        }
    }

    pub(crate) fn from_snapshot(snapshot: PlayerSnapshot) -> Self {
        Self {
            x: snapshot.x,
            y: snapshot.y,
            tile_size: snapshot.tile_size,
            inventory: snapshot.inventory,
        }
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            x: self.x,
            y: self.y,
            tile_size: self.tile_size,
            inventory: self.inventory.clone(),
        }
    }

    /// Horizontal position in host pixels.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical position in host pixels.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Edge length of a tile in host pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Tile the player is standing on.
    #[must_use]
    pub fn cell(&self) -> Cell {
        if self.tile_size <= 0.0 {
            return Cell::new(0, 0);
        }
        Cell::new(
            (self.y / self.tile_size).floor() as i32,
            (self.x / self.tile_size).floor() as i32,
        )
    }

    /// Seeds and crops carried by the player.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub(crate) fn move_to(&mut self, cell: Cell) {
        self.x = f64::from(cell.col()) * self.tile_size;
        self.y = f64::from(cell.row()) * self.tile_size;
    }
}
