use sunfield_core::{catalog, Cell, Command, Event, Rejection, SpeciesId};
use sunfield_session::{Game, SessionError};
use sunfield_store::{
    envelope, saves, text, BlockLayout, CodecError, KeyValueStore, MemoryStore, StoreError,
    TurnHistory,
};
use sunfield_world::{query, World, WorldConfig};

const WHEAT: SpeciesId = SpeciesId::new(0);
const CORN: SpeciesId = SpeciesId::new(1);

fn config(columns: u32, rows: u32) -> WorldConfig {
    WorldConfig {
        columns,
        rows,
        starting_seeds: vec![(WHEAT, 3), (CORN, 3)],
        rng_seed: 42,
        ..WorldConfig::default()
    }
}

fn game() -> Game<MemoryStore> {
    Game::new(World::new(config(5, 5)), MemoryStore::new()).expect("session")
}

fn play_script(game: &mut Game<MemoryStore>) {
    let _ = game
        .act(Command::Irrigate {
            cell: Cell::new(2, 2),
        })
        .expect("irrigate");
    let _ = game
        .act(Command::Sow {
            cell: Cell::new(1, 2),
            species: CORN,
        })
        .expect("sow corn");
    let _ = game
        .act(Command::Sow {
            cell: Cell::new(2, 1),
            species: WHEAT,
        })
        .expect("sow wheat");
    for _ in 0..10 {
        let _ = game.advance_turn().expect("advance");
    }
}

#[test]
fn undo_returns_to_pre_increment_state() {
    let mut game = game();
    let _ = game.sow_here(CORN).expect("sow");
    let before = query::snapshot(game.world());

    let _ = game.advance_turn().expect("advance");
    assert!(game.can_undo());
    assert!(!game.can_redo());

    assert!(game.undo().expect("undo"));
    assert_eq!(query::snapshot(game.world()), before);
    assert!(game.can_redo());

    assert!(game.redo().expect("redo"));
    assert_eq!(game.turn(), 1);
}

#[test]
fn fresh_turn_after_undo_drops_redo() {
    let mut game = game();
    let _ = game.advance_turn().expect("advance");
    let _ = game.advance_turn().expect("advance");
    assert!(game.undo().expect("undo"));

    let _ = game.advance_turn().expect("advance");

    assert!(!game.can_redo());
    assert_eq!(game.history().len(), 3);
    assert!(!game.redo().expect("redo"));
}

#[test]
fn actions_autosave() {
    let mut game = game();
    assert!(!game.has_autosave().expect("has autosave"));

    let _ = game.sow_here(WHEAT).expect("sow");

    assert!(game.has_autosave().expect("has autosave"));
}

#[test]
fn seeded_sessions_replay_identically() {
    let mut first = game();
    let mut second = game();

    play_script(&mut first);
    play_script(&mut second);

    assert_eq!(first.history().as_bytes(), second.history().as_bytes());
}

#[test]
fn loading_a_slot_restores_saved_turn() {
    let mut game = game();
    play_script(&mut game);
    let saved = query::snapshot(game.world());
    let saved_turn = game.turn();
    let slot = game.save().expect("save");

    let _ = game.advance_turn().expect("advance");
    let _ = game.advance_turn().expect("advance");
    assert!(game.load_from(slot).expect("load"));

    assert_eq!(game.turn(), saved_turn);
    assert_eq!(query::snapshot(game.world()), saved);
}

#[test]
fn empty_slot_loads_nothing() {
    let mut game = game();
    assert!(!game.load_from(3).expect("load"));
}

#[test]
fn malformed_slot_leaves_session_untouched() {
    let mut store = MemoryStore::new();
    store
        .set(&saves::slot_key(0), "AAAA")
        .expect("seed malformed slot");
    let mut game = Game::new(World::new(config(5, 5)), store).expect("session");
    let _ = game.advance_turn().expect("advance");
    let before = query::snapshot(game.world());

    let result = game.load_from(0);

    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::Malformed { .. }))
    ));
    assert_eq!(game.turn(), 1);
    assert_eq!(query::snapshot(game.world()), before);
}

#[test]
fn save_from_another_board_size_is_rejected() {
    let mut other = Game::new(World::new(config(3, 3)), MemoryStore::new()).expect("session");
    let slot = other.new_save().expect("save");
    let store = other.saves().store().clone();

    let mut game = Game::new(World::new(config(5, 5)), store).expect("session");
    let before = query::snapshot(game.world());

    assert!(matches!(
        game.load_from(slot),
        Err(SessionError::Restore(_))
    ));
    assert_eq!(game.saves().current_slot(), None);
    assert_eq!(query::snapshot(game.world()), before);
}

#[test]
fn autosave_promotes_into_bound_slot() {
    let mut game = game();
    let slot = game.new_save().expect("save");
    let _ = game.advance_turn().expect("advance");
    let _ = game.advance_turn().expect("advance");
    let store = game.saves().store().clone();

    let mut resumed = Game::new(World::new(config(5, 5)), store).expect("session");
    assert!(resumed.load_autosave().expect("load autosave"));

    assert_eq!(resumed.turn(), 2);
    assert_eq!(resumed.saves().current_slot(), Some(slot));
    assert!(!resumed.has_autosave().expect("has autosave"));
}

#[test]
fn reaping_mature_corn_through_the_player() {
    let mut game = Game::new(
        World::new(WorldConfig {
            columns: 3,
            rows: 3,
            starting_seeds: vec![(CORN, 1)],
            parameters: sunfield_core::BoardParameters {
                sun_range: 3,
                water_rate: 4.0,
            },
            rng_seed: 5,
            ..WorldConfig::default()
        }),
        MemoryStore::new(),
    )
    .expect("session");
    let _ = game
        .act(Command::MovePlayer { rows: 1, cols: 0 })
        .expect("move");
    let _ = game.act(Command::Irrigate { cell: Cell::new(0, 0) }).expect("irrigate");
    let _ = game.sow_here(CORN).expect("sow");

    let mut turns = 0;
    while query::tile(game.world(), Cell::new(1, 0)).map(|tile| tile.growth)
        != Some(catalog::growth_cap(CORN))
    {
        let _ = game.advance_turn().expect("advance");
        turns += 1;
        assert!(turns < 500, "corn never matured");
    }
    let _ = game.reap_here().expect("reap");

    let inventory = query::inventory(game.world());
    assert_eq!(inventory.seed_count(CORN), 1);
    assert_eq!(inventory.crop_count(CORN), 1);
}

#[test]
fn invalid_dehydrate_keeps_history_loadable() {
    let mut game = game();
    let cell = Cell::new(1, 1);
    let _ = game.act(Command::Irrigate { cell }).expect("irrigate");

    for amount in [f64::NAN, -2.0] {
        let events = game
            .act(Command::Dehydrate { cell, amount })
            .expect("dehydrate");
        assert!(matches!(
            events,
            [Event::Rejected {
                reason: Rejection::InvalidAmount,
                ..
            }]
        ));
    }

    let _ = game.advance_turn().expect("advance");
    let slot = game.save().expect("save");
    assert!(game.load_from(slot).expect("load"));
    assert!(game.undo().expect("undo"));
    let water = query::tile(game.world(), cell).map(|tile| tile.water);
    assert!(water.is_some_and(f64::is_finite));
}

#[test]
fn history_for_another_catalog_is_rejected() {
    let layout = BlockLayout::with_slots(5, 5, 0).expect("layout");
    let mut snapshot = query::snapshot(&World::new(config(5, 5)));
    snapshot.player.inventory = sunfield_core::Inventory::new();
    let history = TurnHistory::new(layout, layout.encode(&snapshot).expect("encode"))
        .expect("history");
    let mut store = MemoryStore::new();
    store
        .set(
            &saves::slot_key(0),
            &text::encode(&envelope::wrap_history(&history).expect("wrap")),
        )
        .expect("seed slot");
    let mut game = Game::new(World::new(config(5, 5)), store).expect("session");

    assert!(matches!(
        game.load_from(0),
        Err(SessionError::Store(StoreError::Malformed {
            source: CodecError::SlotCount { found: 0, .. },
            ..
        }))
    ));
    assert_eq!(game.saves().current_slot(), None);
}

#[test]
fn rejected_autosave_is_kept_in_place() {
    let mut other = Game::new(World::new(config(3, 3)), MemoryStore::new()).expect("session");
    let slot = other.new_save().expect("save");
    let _ = other.advance_turn().expect("advance");
    let store = other.saves().store().clone();

    let mut game = Game::new(World::new(config(5, 5)), store.clone()).expect("session");
    let before = query::snapshot(game.world());

    assert!(matches!(
        game.load_autosave(),
        Err(SessionError::Restore(_))
    ));
    assert!(game.has_autosave().expect("has autosave"));
    assert_eq!(game.saves().store(), &store);
    assert_eq!(
        game.saves().store().get(&saves::slot_key(slot)).expect("get"),
        store.get(&saves::slot_key(slot)).expect("get")
    );
    assert_eq!(game.saves().current_slot(), None);
    assert_eq!(query::snapshot(game.world()), before);
}
