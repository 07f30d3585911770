use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures raised while encoding or decoding turn blocks and history buffers.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The buffer does not match the size required by the block layout.
    #[error("expected {expected} bytes, found {found}")]
    Length {
        /// Bytes required by the layout.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },
    /// Board dimensions are zero or exceed the supported grid extent.
    #[error("unsupported board dimensions {columns}x{rows}")]
    Dimensions {
        /// Declared column count.
        columns: u32,
        /// Declared row count.
        rows: u32,
    },
    /// The snapshot or block describes a different board than the layout.
    #[error("block describes a {found_columns}x{found_rows} board, layout is {columns}x{rows}")]
    DimensionMismatch {
        /// Columns of the layout.
        columns: u32,
        /// Rows of the layout.
        rows: u32,
        /// Columns found in the data.
        found_columns: u32,
        /// Rows found in the data.
        found_rows: u32,
    },
    /// The snapshot does not hold exactly one tile per cell.
    #[error("expected {expected} tiles, found {found}")]
    TileCount {
        /// Tiles required by the layout.
        expected: usize,
        /// Tiles present in the snapshot.
        found: usize,
    },
    /// A numeric field holds a value outside its domain.
    #[error("field `{field}` holds invalid value {value}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Raw value that failed validation.
        value: f64,
    },
    /// A tile record violates the content/plant/growth invariants.
    #[error("tile at index {index} is inconsistent: {reason}")]
    InconsistentTile {
        /// Row-major index of the tile.
        index: usize,
        /// Description of the violated invariant.
        reason: &'static str,
    },
    /// The inventory holds more species than the fixed slot capacity.
    #[error("inventory holds {entries} species, capacity is {capacity}")]
    InventoryOverflow {
        /// Slots available in the player block.
        capacity: usize,
        /// Distinct species in the inventory.
        entries: usize,
    },
    /// The history was written for a catalog with a different species count.
    #[error("history reserves {found} species slots, catalog has {expected}")]
    SlotCount {
        /// Species in the catalog.
        expected: u32,
        /// Slots recorded in the header.
        found: u32,
    },
    /// The history header does not start with the expected magic bytes.
    #[error("missing history header magic")]
    BadMagic,
    /// The history header was written by a newer format version.
    #[error("unsupported history format version {0}")]
    UnsupportedVersion(u32),
    /// The history cursor points past the last stored block.
    #[error("cursor {cursor} is outside {blocks} stored blocks")]
    CursorOutOfRange {
        /// Stored cursor.
        cursor: u32,
        /// Stored block count.
        blocks: u32,
    },
    /// The payload checksum does not match the header.
    #[error("checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: u32,
        /// Checksum of the payload as read.
        computed: u32,
    },
    /// The text form could not be decoded back into bytes.
    #[error("invalid text encoding: {0}")]
    Text(#[from] base64::DecodeError),
}

/// Failures raised by key-value backends and save slot management.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key contains characters the backend cannot store.
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    /// Reading or writing a backing file failed.
    #[error("failed to access {path}")]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A stored value could not be decoded.
    #[error("stored value under `{key}` is malformed")]
    Malformed {
        /// Key holding the malformed value.
        key: String,
        /// Decoding failure.
        #[source]
        source: CodecError,
    },
    /// A history could not be encoded for storage.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
