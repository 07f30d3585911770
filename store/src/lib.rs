#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn storage for Sunfield: the fixed-layout block codec, the undo/redo
//! history, the persisted envelope and the save slot manager.

pub mod envelope;
mod error;
pub mod history;
pub mod kv;
pub mod layout;
pub mod saves;
pub mod text;

pub use error::{CodecError, StoreError};
pub use history::TurnHistory;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use layout::BlockLayout;
pub use saves::{Autosave, SaveSlots};
