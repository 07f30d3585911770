#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session tying the live world to its turn history and save slots.
//!
//! Every action runs against the live [`World`] and is then committed into
//! the current history block, so undo, redo and loads only ever need to
//! decode a block back into the world. A failed action or load leaves both
//! the world and the history as they were.

use sunfield_core::{Command, Event, SpeciesId, WorldSnapshot};
use sunfield_store::{
    BlockLayout, CodecError, KeyValueStore, SaveSlots, StoreError, TurnHistory,
};
use sunfield_world::{apply, query, restore, RestoreError, World};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A block could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The key-value store failed or held a malformed value.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A loaded history does not fit the live board.
    #[error(transparent)]
    Restore(#[from] RestoreError),
}

/// Single-player game session.
#[derive(Debug)]
pub struct Game<S> {
    world: World,
    history: TurnHistory,
    saves: SaveSlots<S>,
    events: Vec<Event>,
}

impl<S: KeyValueStore> Game<S> {
    /// Starts a session whose turn 0 is the provided world.
    pub fn new(world: World, store: S) -> Result<Self, SessionError> {
        let board = query::board(&world);
        let layout = BlockLayout::new(board.columns(), board.rows())?;
        let block = layout.encode(&query::snapshot(&world))?;
        Ok(Self {
            history: TurnHistory::new(layout, block)?,
            world,
            saves: SaveSlots::new(store),
            events: Vec::new(),
        })
    }

    /// Live world state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Stored turns and the undo/redo cursor.
    #[must_use]
    pub const fn history(&self) -> &TurnHistory {
        &self.history
    }

    /// Save slot manager and its backend.
    #[must_use]
    pub const fn saves(&self) -> &SaveSlots<S> {
        &self.saves
    }

    /// Index of the current turn.
    #[must_use]
    pub const fn turn(&self) -> usize {
        self.history.turn()
    }

    /// Events reported by the most recent action.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Reports whether the player holds enough seeds to win.
    #[must_use]
    pub fn has_won(&self) -> bool {
        query::has_won(&self.world)
    }

    /// Applies a player command, commits it to the current turn and autosaves.
    ///
    /// [`Command::Tick`] advances the turn instead, see [`Game::advance_turn`].
    pub fn act(&mut self, command: Command) -> Result<&[Event], SessionError> {
        if matches!(command, Command::Tick { .. }) {
            return self.advance_turn();
        }
        self.events.clear();
        apply(&mut self.world, command, &mut self.events);
        let block = self.encode_or_revert()?;
        self.history.current_mut().copy_from_slice(&block);
        self.autosave();
        Ok(&self.events)
    }

    /// Sows `species` on the tile the player stands on.
    pub fn sow_here(&mut self, species: SpeciesId) -> Result<&[Event], SessionError> {
        let cell = query::player(&self.world).cell();
        self.act(Command::Sow { cell, species })
    }

    /// Reaps the tile the player stands on.
    pub fn reap_here(&mut self) -> Result<&[Event], SessionError> {
        let cell = query::player(&self.world).cell();
        self.act(Command::Reap { cell })
    }

    /// Appends a new turn, simulates it and autosaves.
    pub fn advance_turn(&mut self) -> Result<&[Event], SessionError> {
        self.events.clear();
        let turn = u32::try_from(self.history.turn() + 1).unwrap_or(u32::MAX);
        apply(&mut self.world, Command::Tick { turn }, &mut self.events);
        let block = self.encode_or_revert()?;
        self.history.increment_turn();
        self.history.current_mut().copy_from_slice(&block);
        info!(turn, "advanced turn");
        self.autosave();
        Ok(&self.events)
    }

    /// Reports whether an earlier turn exists.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Reports whether a later turn exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Steps back one turn, returning whether the cursor moved.
    ///
    /// Nothing is autosaved when there is no earlier turn.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        if !self.history.undo() {
            return Ok(false);
        }
        if let Err(error) = self.sync_world() {
            let _ = self.history.redo();
            return Err(error);
        }
        debug!(turn = self.history.turn(), "undo");
        self.autosave();
        Ok(true)
    }

    /// Steps forward one turn, returning whether the cursor moved.
    pub fn redo(&mut self) -> Result<bool, SessionError> {
        if !self.history.redo() {
            return Ok(false);
        }
        if let Err(error) = self.sync_world() {
            let _ = self.history.undo();
            return Err(error);
        }
        debug!(turn = self.history.turn(), "redo");
        self.autosave();
        Ok(true)
    }

    /// Writes the whole history into the bound slot, allocating one if needed.
    pub fn save(&mut self) -> Result<u32, SessionError> {
        Ok(self.saves.save(&self.history)?)
    }

    /// Writes the whole history into the lowest unused slot.
    pub fn new_save(&mut self) -> Result<u32, SessionError> {
        Ok(self.saves.new_save(&self.history)?)
    }

    /// Replaces the session with the history stored in `slot`.
    ///
    /// Returns `Ok(false)` for an empty slot. On any failure the live world,
    /// history and slot binding are left as they were.
    pub fn load_from(&mut self, slot: u32) -> Result<bool, SessionError> {
        let bound = self.saves.current_slot();
        let Some(history) = self.saves.load_from(slot)? else {
            return Ok(false);
        };
        let loaded = self
            .vet(&history)
            .and_then(|snapshot| self.install(history, snapshot));
        if let Err(error) = loaded {
            self.saves.bind(bound);
            return Err(error);
        }
        Ok(true)
    }

    /// Replaces the session with the autosaved history, if one exists.
    ///
    /// The autosave is promoted into its tagged slot only once it is known to
    /// fit the live board, so a rejected autosave stays where it was.
    pub fn load_autosave(&mut self) -> Result<bool, SessionError> {
        let Some(autosave) = self.saves.read_autosave()? else {
            return Ok(false);
        };
        let snapshot = self.vet(&autosave.history)?;
        self.saves.promote_autosave(&autosave)?;
        self.install(autosave.history, snapshot)?;
        Ok(true)
    }

    /// Reports whether an autosave exists.
    pub fn has_autosave(&self) -> Result<bool, SessionError> {
        Ok(self.saves.has_autosave()?)
    }

    /// Decodes the current turn of a loaded history and checks it fits the live board.
    fn vet(&self, history: &TurnHistory) -> Result<WorldSnapshot, SessionError> {
        let checked = history
            .layout()
            .read_snapshot(history.current())
            .map_err(SessionError::from)
            .and_then(|snapshot| {
                let board = query::board(&self.world);
                if snapshot.columns != board.columns() || snapshot.rows != board.rows() {
                    return Err(RestoreError::DimensionMismatch {
                        columns: board.columns(),
                        rows: board.rows(),
                        found_columns: snapshot.columns,
                        found_rows: snapshot.rows,
                    }
                    .into());
                }
                Ok(snapshot)
            });
        if let Err(error) = &checked {
            warn!(%error, "rejected loaded history");
        }
        checked
    }

    fn install(
        &mut self,
        history: TurnHistory,
        snapshot: WorldSnapshot,
    ) -> Result<(), SessionError> {
        restore(&mut self.world, snapshot)?;
        self.history = history;
        self.events.clear();
        Ok(())
    }

    fn sync_world(&mut self) -> Result<(), SessionError> {
        let snapshot = self
            .history
            .layout()
            .read_snapshot(self.history.current())?;
        restore(&mut self.world, snapshot)?;
        self.events.clear();
        Ok(())
    }

    /// Encodes the live world into a fresh block.
    ///
    /// When the world no longer fits the history layout it is rolled back to
    /// the current block and the encoding error is returned.
    fn encode_or_revert(&mut self) -> Result<Vec<u8>, SessionError> {
        match self.history.layout().encode(&query::snapshot(&self.world)) {
            Ok(block) => Ok(block),
            Err(error) => {
                warn!(%error, "discarding change that cannot be stored");
                self.sync_world()?;
                Err(error.into())
            }
        }
    }

    fn autosave(&mut self) {
        if let Err(error) = self.saves.autosave(&self.history) {
            warn!(%error, "autosave failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunfield_core::{Cell, TileContent};
    use sunfield_store::MemoryStore;
    use sunfield_world::WorldConfig;

    fn game() -> Game<MemoryStore> {
        let world = World::new(WorldConfig {
            columns: 4,
            rows: 4,
            ..WorldConfig::default()
        });
        Game::new(world, MemoryStore::new()).expect("session")
    }

    #[test]
    fn actions_are_committed_to_current_block() {
        let mut game = game();
        let _ = game.sow_here(SpeciesId::new(0)).expect("sow");

        let stored = game
            .history()
            .layout()
            .read_snapshot(game.history().current())
            .expect("decode");
        assert_eq!(stored, query::snapshot(game.world()));
        assert_eq!(
            query::tile(game.world(), Cell::new(0, 0)).and_then(|tile| tile.plant),
            Some(SpeciesId::new(0))
        );
    }

    #[test]
    fn tick_command_advances_the_turn() {
        let mut game = game();
        let _ = game.act(Command::Tick { turn: 99 }).expect("tick");
        assert_eq!(game.turn(), 1);
        assert!(matches!(
            game.events().last(),
            Some(Event::TurnSimulated { turn: 1, .. })
        ));
    }

    #[test]
    fn action_that_cannot_be_stored_is_rolled_back() {
        let wheat = SpeciesId::new(0);
        let corn = SpeciesId::new(1);
        let cell = Cell::new(0, 0);
        let mut world = World::new(WorldConfig {
            columns: 4,
            rows: 4,
            starting_seeds: vec![(wheat, 1)],
            ..WorldConfig::default()
        });
        let mut ripe = query::snapshot(&world);
        ripe.tiles[0].content = TileContent::Planted;
        ripe.tiles[0].plant = Some(corn);
        ripe.tiles[0].growth = sunfield_core::catalog::growth_cap(corn);
        restore(&mut world, ripe.clone()).expect("restore");

        let mut game = Game::new(world, MemoryStore::new()).expect("session");
        let narrow = BlockLayout::with_slots(4, 4, 1).expect("layout");
        game.history = TurnHistory::new(narrow, narrow.encode(&ripe).expect("encode"))
            .expect("history");
        let stored = game.history().as_bytes().to_vec();

        let result = game.act(Command::Reap { cell });

        assert!(matches!(
            result,
            Err(SessionError::Codec(CodecError::InventoryOverflow { .. }))
        ));
        assert_eq!(query::snapshot(game.world()), ripe);
        assert_eq!(query::inventory(game.world()).seed_count(corn), 0);
        assert_eq!(game.history().as_bytes(), stored.as_slice());
        assert_eq!(game.turn(), 0);
    }

    #[test]
    fn undo_at_first_turn_skips_autosave() {
        let mut game = game();
        assert!(!game.undo().expect("undo"));
        assert!(!game.has_autosave().expect("has autosave"));
    }
}
