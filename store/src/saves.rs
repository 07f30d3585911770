//! Named save slots plus the reserved autosave entry.

use tracing::{info, warn};

use crate::{envelope, kv::KeyValueStore, text, StoreError, TurnHistory};

/// Key holding the most recent autosave.
pub const AUTOSAVE_KEY: &str = "game_autosave";

/// Key recording which slot the autosave belongs to.
pub const AUTOSAVE_SLOT_KEY: &str = "game_autosave_slot";

const SLOT_PREFIX: &str = "game_save_";

/// Key under which the given slot is stored.
#[must_use]
pub fn slot_key(slot: u32) -> String {
    format!("{SLOT_PREFIX}{slot}")
}

/// Autosaved history together with the slot it was tagged with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Autosave {
    /// Stored turns and cursor.
    pub history: TurnHistory,
    /// Slot the session was bound to when the autosave was written.
    pub slot: Option<u32>,
}

/// Manages manual save slots and the autosave on top of a key-value store.
///
/// The manager remembers the slot the session was last saved to or loaded
/// from; [`SaveSlots::save`] writes there and autosaves are tagged with it.
#[derive(Debug)]
pub struct SaveSlots<S> {
    store: S,
    current: Option<u32>,
}

impl<S: KeyValueStore> SaveSlots<S> {
    /// Wraps a backend with no slot selected.
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Slot the session is bound to, if any.
    #[must_use]
    pub const fn current_slot(&self) -> Option<u32> {
        self.current
    }

    /// Binds the manager to `slot`, or unbinds it.
    pub fn bind(&mut self, slot: Option<u32>) {
        self.current = slot;
    }

    /// Read access to the backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the backend.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Writes the history into the current slot, allocating one when unbound.
    pub fn save(&mut self, history: &TurnHistory) -> Result<u32, StoreError> {
        match self.current {
            Some(slot) => {
                self.write(&slot_key(slot), history)?;
                info!(slot, turn = history.turn(), "saved game");
                Ok(slot)
            }
            None => self.new_save(history),
        }
    }

    /// Writes the history into the lowest unused slot and binds to it.
    pub fn new_save(&mut self, history: &TurnHistory) -> Result<u32, StoreError> {
        let slot = self.first_free_slot()?;
        self.write(&slot_key(slot), history)?;
        self.current = Some(slot);
        info!(slot, turn = history.turn(), "created save slot");
        Ok(slot)
    }

    /// Reads the history stored in `slot` and binds to it.
    ///
    /// Returns `Ok(None)` when the slot is empty; a malformed slot is an
    /// error and leaves the binding unchanged.
    pub fn load_from(&mut self, slot: u32) -> Result<Option<TurnHistory>, StoreError> {
        let Some(history) = self.read(&slot_key(slot))? else {
            return Ok(None);
        };
        self.current = Some(slot);
        info!(slot, turn = history.turn(), "loaded save slot");
        Ok(Some(history))
    }

    /// Overwrites the autosave entry, tagging it with the current slot.
    pub fn autosave(&mut self, history: &TurnHistory) -> Result<(), StoreError> {
        self.write(AUTOSAVE_KEY, history)?;
        match self.current {
            Some(slot) => self.store.set(AUTOSAVE_SLOT_KEY, &slot.to_string())?,
            None => self.store.remove(AUTOSAVE_SLOT_KEY)?,
        }
        Ok(())
    }

    /// Reports whether an autosave entry exists.
    pub fn has_autosave(&self) -> Result<bool, StoreError> {
        self.store.contains(AUTOSAVE_KEY)
    }

    /// Reads the autosave and the slot it is tagged with, changing nothing.
    pub fn read_autosave(&self) -> Result<Option<Autosave>, StoreError> {
        let Some(history) = self.read(AUTOSAVE_KEY)? else {
            return Ok(None);
        };
        let slot = match self.store.get(AUTOSAVE_SLOT_KEY)? {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(slot) => Some(slot),
                Err(_) => {
                    warn!(value = %value, "ignoring malformed autosave slot tag");
                    None
                }
            },
            None => None,
        };
        Ok(Some(Autosave { history, slot }))
    }

    /// Settles an autosave that the caller accepted.
    ///
    /// A tagged autosave is written into its slot, the session binds to that
    /// slot and both autosave entries are cleared. An untagged one stays put.
    pub fn promote_autosave(&mut self, autosave: &Autosave) -> Result<(), StoreError> {
        let turn = autosave.history.turn();
        let Some(slot) = autosave.slot else {
            info!(turn, "loaded autosave");
            return Ok(());
        };
        self.write(&slot_key(slot), &autosave.history)?;
        self.store.remove(AUTOSAVE_KEY)?;
        self.store.remove(AUTOSAVE_SLOT_KEY)?;
        self.current = Some(slot);
        info!(slot, turn, "promoted autosave into slot");
        Ok(())
    }

    /// Reads the autosave and promotes it right away.
    ///
    /// Callers that still need to vet the history should pair
    /// [`SaveSlots::read_autosave`] with [`SaveSlots::promote_autosave`].
    pub fn load_autosave(&mut self) -> Result<Option<TurnHistory>, StoreError> {
        let Some(autosave) = self.read_autosave()? else {
            return Ok(None);
        };
        self.promote_autosave(&autosave)?;
        Ok(Some(autosave.history))
    }

    fn first_free_slot(&self) -> Result<u32, StoreError> {
        let mut slot = 0;
        while self.store.contains(&slot_key(slot))? {
            slot += 1;
        }
        Ok(slot)
    }

    fn write(&mut self, key: &str, history: &TurnHistory) -> Result<(), StoreError> {
        let bytes = envelope::wrap_history(history)?;
        self.store.set(key, &text::encode(&bytes))
    }

    fn read(&self, key: &str) -> Result<Option<TurnHistory>, StoreError> {
        let Some(value) = self.store.get(key)? else {
            return Ok(None);
        };
        let malformed = |source| StoreError::Malformed {
            key: key.to_owned(),
            source,
        };
        let bytes = text::decode(&value).map_err(malformed)?;
        let history = envelope::unwrap_history(&bytes).map_err(malformed)?;
        Ok(Some(history))
    }
}
