//! Checksummed envelope around a persisted turn history.
//!
//! Header format (36 bytes, little-endian):
//! `[magic "SFLD"][version][columns][rows][species_slots][block_len][block_count][cursor][xxh32]`
//! followed by the raw history buffer. The checksum covers the buffer only.

use sunfield_core::catalog;
use xxhash_rust::xxh32::xxh32;

use crate::{layout::BlockLayout, CodecError, TurnHistory};

/// Magic bytes opening every persisted history.
pub const MAGIC: [u8; 4] = *b"SFLD";

/// Current envelope format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the envelope header in bytes.
pub const HEADER_SIZE: usize = 36;

const XXHASH_SEED: u32 = 0;

/// Wraps the history buffer with a header describing its layout and cursor.
pub fn wrap_history(history: &TurnHistory) -> Result<Vec<u8>, CodecError> {
    let layout = history.layout();
    let payload = history.as_bytes();
    let fields = [
        FORMAT_VERSION,
        layout.columns(),
        layout.rows(),
        layout.species_slots(),
        as_u32("block_len", layout.block_len())?,
        as_u32("block_count", history.len())?,
        as_u32("cursor", history.turn())?,
        xxh32(payload, XXHASH_SEED),
    ];

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    for field in fields {
        out.extend_from_slice(&field.to_le_bytes());
    }
    out.extend_from_slice(payload);
    Ok(out)
}

/// Validates the header and checksum, then rebuilds the history.
///
/// Every stored block is decoded once so a history that would fail to load
/// later is rejected here instead.
pub fn unwrap_history(bytes: &[u8]) -> Result<TurnHistory, CodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::Length {
            expected: HEADER_SIZE,
            found: bytes.len(),
        });
    }
    if bytes[..4] != MAGIC {
        return Err(CodecError::BadMagic);
    }

    let field = |index: usize| {
        let start = 4 + index * 4;
        u32::from_le_bytes([
            bytes[start],
            bytes[start + 1],
            bytes[start + 2],
            bytes[start + 3],
        ])
    };
    let version = field(0);
    if version > FORMAT_VERSION || version == 0 {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let species_slots = field(3);
    if species_slots != catalog::species_count() {
        return Err(CodecError::SlotCount {
            expected: catalog::species_count(),
            found: species_slots,
        });
    }
    let layout = BlockLayout::with_slots(field(1), field(2), species_slots)?;
    let block_len = field(4) as usize;
    if block_len != layout.block_len() {
        return Err(CodecError::Length {
            expected: layout.block_len(),
            found: block_len,
        });
    }
    let blocks = field(5);
    let cursor = field(6);
    let expected = field(7);

    let payload = &bytes[HEADER_SIZE..];
    let payload_len =
        (blocks as usize)
            .checked_mul(block_len)
            .ok_or(CodecError::InvalidField {
                field: "block_count",
                value: f64::from(blocks),
            })?;
    if payload.len() != payload_len {
        return Err(CodecError::Length {
            expected: HEADER_SIZE + payload_len,
            found: bytes.len(),
        });
    }
    if cursor >= blocks {
        return Err(CodecError::CursorOutOfRange { cursor, blocks });
    }
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != expected {
        return Err(CodecError::ChecksumMismatch { expected, computed });
    }

    for block in payload.chunks_exact(block_len) {
        let _ = layout.read_snapshot(block)?;
    }
    TurnHistory::from_parts(layout, payload.to_vec(), cursor as usize)
}

fn as_u32(field: &'static str, value: usize) -> Result<u32, CodecError> {
    u32::try_from(value).map_err(|_| CodecError::InvalidField {
        field,
        value: value as f64,
    })
}
