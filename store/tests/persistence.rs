use std::{fs, path::PathBuf};

use sunfield_core::{Cell, Inventory, PlayerSnapshot, SpeciesId, Tile, TileContent, WorldSnapshot};
use sunfield_store::{
    envelope, saves, text, BlockLayout, FileStore, KeyValueStore, SaveSlots, StoreError,
    TurnHistory,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sunfield_store_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn snapshot(water: f64) -> WorldSnapshot {
    let mut tiles: Vec<Tile> = (0..3)
        .flat_map(|row| (0..3).map(move |col| Tile::empty(Cell::new(row, col))))
        .collect();
    tiles[4].content = TileContent::Water;
    tiles[0] = Tile {
        cell: Cell::new(0, 0),
        content: TileContent::Planted,
        sun: 1.1,
        water,
        plant: Some(SpeciesId::new(1)),
        growth: 1,
    };
    let mut inventory = Inventory::new();
    inventory.add_seeds(SpeciesId::new(0), 2);
    WorldSnapshot {
        columns: 3,
        rows: 3,
        sun_position: 1,
        tiles,
        player: PlayerSnapshot {
            x: 32.0,
            y: 0.0,
            tile_size: 32.0,
            inventory,
        },
    }
}

fn three_turns() -> TurnHistory {
    let layout = BlockLayout::new(3, 3).expect("layout");
    let mut history = TurnHistory::new(layout, layout.encode(&snapshot(0.5)).expect("encode"))
        .expect("history");
    for water in [1.5, 2.5] {
        history.increment_turn();
        layout
            .write_snapshot(&snapshot(water), history.current_mut())
            .expect("write");
    }
    history
}

#[test]
fn undo_exposes_each_earlier_turn() {
    let mut history = three_turns();
    let layout = history.layout();
    let mut waters = Vec::new();
    loop {
        let state = layout.read_snapshot(history.current()).expect("decode");
        waters.push(state.tiles[0].water);
        if !history.undo() {
            break;
        }
    }
    assert_eq!(waters, vec![2.5, 1.5, 0.5]);
}

#[test]
fn text_envelope_round_trips_history() {
    let history = three_turns();
    let encoded = text::encode(&envelope::wrap_history(&history).expect("wrap"));
    let decoded = envelope::unwrap_history(&text::decode(&encoded).expect("text")).expect("unwrap");
    assert_eq!(decoded, history);
}

#[test]
fn file_backed_slots_survive_reopen() {
    let dir = scratch_dir("slots");
    let history = three_turns();

    let mut saves = SaveSlots::new(FileStore::open(&dir).expect("open"));
    let slot = saves.new_save(&history).expect("save");
    saves.autosave(&history).expect("autosave");

    let mut reopened = SaveSlots::new(FileStore::open(&dir).expect("reopen"));
    assert!(reopened.has_autosave().expect("has autosave"));
    assert_eq!(reopened.load_from(slot).expect("load"), Some(history));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_file_is_a_failed_load() {
    let dir = scratch_dir("corrupt");
    let mut store = FileStore::open(&dir).expect("open");
    let mut tampered = envelope::wrap_history(&three_turns()).expect("wrap");
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    store
        .set(&saves::slot_key(0), &text::encode(&tampered))
        .expect("seed");

    let mut saves = SaveSlots::new(store);
    assert!(matches!(
        saves.load_from(0),
        Err(StoreError::Malformed { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}
