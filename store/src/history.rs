//! Linear turn history stored as consecutive fixed-size blocks.

use crate::{layout::BlockLayout, CodecError};

/// Contiguous buffer of turn blocks with an undo/redo cursor.
///
/// Block `n` occupies `n * block_len .. (n + 1) * block_len`. Undo and redo
/// only move the cursor; the stored blocks change only through
/// [`TurnHistory::current_mut`] and [`TurnHistory::increment_turn`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnHistory {
    layout: BlockLayout,
    buffer: Vec<u8>,
    turn: usize,
}

impl TurnHistory {
    /// Starts a history whose turn 0 is `initial`.
    pub fn new(layout: BlockLayout, initial: Vec<u8>) -> Result<Self, CodecError> {
        Self::from_parts(layout, initial, 0)
    }

    /// Rebuilds a history from a raw buffer and cursor.
    pub fn from_parts(
        layout: BlockLayout,
        buffer: Vec<u8>,
        turn: usize,
    ) -> Result<Self, CodecError> {
        let block_len = layout.block_len();
        if buffer.is_empty() || buffer.len() % block_len != 0 {
            let blocks = buffer.len() / block_len + 1;
            return Err(CodecError::Length {
                expected: blocks * block_len,
                found: buffer.len(),
            });
        }
        let blocks = buffer.len() / block_len;
        if turn >= blocks {
            return Err(CodecError::CursorOutOfRange {
                cursor: u32::try_from(turn).unwrap_or(u32::MAX),
                blocks: u32::try_from(blocks).unwrap_or(u32::MAX),
            });
        }
        Ok(Self {
            layout,
            buffer,
            turn,
        })
    }

    /// Layout shared by every block.
    #[must_use]
    pub const fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Index of the current turn.
    #[must_use]
    pub const fn turn(&self) -> usize {
        self.turn
    }

    /// Number of stored turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len() / self.layout.block_len()
    }

    /// Reports whether the history holds no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Raw bytes of every stored turn.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Block of the current turn.
    #[must_use]
    pub fn current(&self) -> &[u8] {
        let len = self.layout.block_len();
        &self.buffer[self.turn * len..(self.turn + 1) * len]
    }

    /// Mutable block of the current turn.
    pub fn current_mut(&mut self) -> &mut [u8] {
        let len = self.layout.block_len();
        &mut self.buffer[self.turn * len..(self.turn + 1) * len]
    }

    /// Appends a copy of the current block and moves the cursor onto it.
    ///
    /// Any turns after the cursor are discarded first, so there is nothing
    /// left to redo afterwards.
    pub fn increment_turn(&mut self) {
        let len = self.layout.block_len();
        let start = self.turn * len;
        self.buffer.truncate(start + len);
        self.buffer.extend_from_within(start..start + len);
        self.turn += 1;
    }

    /// Reports whether an earlier turn exists.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.turn > 0
    }

    /// Reports whether a later turn exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.turn + 1 < self.len()
    }

    /// Moves the cursor back one turn, returning whether it moved.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.turn -= 1;
        true
    }

    /// Moves the cursor forward one turn, returning whether it moved.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.turn += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BlockLayout {
        BlockLayout::with_slots(1, 1, 0).expect("valid layout")
    }

    fn history() -> TurnHistory {
        let layout = layout();
        TurnHistory::new(layout, vec![7; layout.block_len()]).expect("one block")
    }

    #[test]
    fn starts_at_turn_zero_without_undo_or_redo() {
        let history = history();
        assert_eq!(history.turn(), 0);
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn increment_duplicates_current_block() {
        let mut history = history();
        history.current_mut()[0] = 42;

        history.increment_turn();

        assert_eq!(history.turn(), 1);
        let (first, second) = history.as_bytes().split_at(history.layout().block_len());
        assert_eq!(first, second);
        assert_eq!(history.current()[0], 42);
    }

    #[test]
    fn undo_restores_pre_increment_block() {
        let mut history = history();
        let before = history.current().to_vec();
        history.increment_turn();
        history.current_mut()[3] = 9;

        assert!(history.undo());

        assert_eq!(history.current(), before.as_slice());
        assert!(history.can_redo());
    }

    #[test]
    fn increment_after_undo_discards_redo() {
        let mut history = history();
        history.increment_turn();
        history.current_mut()[0] = 1;
        history.increment_turn();
        assert!(history.undo());
        assert!(history.undo());

        history.increment_turn();

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current()[0], 7);
    }

    #[test]
    fn cursor_moves_are_bounded() {
        let mut history = history();
        assert!(!history.undo());
        assert!(!history.redo());
        history.increment_turn();
        assert!(!history.redo());
        assert!(history.undo());
        assert!(history.redo());
        assert_eq!(history.turn(), 1);
    }

    #[test]
    fn from_parts_validates_buffer_and_cursor() {
        let layout = layout();
        let len = layout.block_len();
        assert!(matches!(
            TurnHistory::from_parts(layout, vec![0; len + 1], 0),
            Err(CodecError::Length { .. })
        ));
        assert!(matches!(
            TurnHistory::from_parts(layout, Vec::new(), 0),
            Err(CodecError::Length { .. })
        ));
        assert_eq!(
            TurnHistory::from_parts(layout, vec![0; 2 * len], 2),
            Err(CodecError::CursorOutOfRange {
                cursor: 2,
                blocks: 2
            })
        );
    }
}
