#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure growth system that decides which plants advance a stage each turn.
//!
//! The system reads an immutable [`TileView`] captured before the growth pass
//! and reports one [`GrowthOutcome`] per planted tile. Because every decision
//! is taken against the same snapshot, neighbour reads never observe
//! partially-applied growth and the result does not depend on tile order.

use rand::Rng;
use sunfield_core::{
    catalog::{self, GrowthContext},
    Cell, SpeciesId, Tile, TileView, GLOBAL_FRIEND_RATE,
};

/// Water consumed when a plant advances a growth stage.
pub const GROWTH_WATER_COST: f64 = 1.0;

/// Water consumed by a growth attempt that does not advance the plant.
pub const ATTEMPT_WATER_COST: f64 = 0.5;

/// Decision taken for a single planted tile during a growth pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthOutcome {
    /// Tile holding the plant.
    pub cell: Cell,
    /// Species planted on the tile.
    pub species: SpeciesId,
    /// Indicates whether the plant advanced one growth stage.
    pub grew: bool,
    /// Water the attempt consumes from the tile.
    pub water_cost: f64,
}

/// Growth engine that evaluates every planted tile once per turn.
#[derive(Debug, Default)]
pub struct Growth {
    scratch_neighbors: Vec<&'static str>,
}

impl Growth {
    /// Creates a new growth system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates every planted tile in `view` and appends the outcomes to `out`.
    ///
    /// A random draw is consumed only for plants that are below their growth
    /// cap and whose growth predicate holds, so a seeded generator replays
    /// identically for identical boards.
    pub fn handle<R>(&mut self, view: TileView<'_>, rng: &mut R, out: &mut Vec<GrowthOutcome>)
    where
        R: Rng,
    {
        for tile in view.iter() {
            let Some(species) = tile.plant else {
                continue;
            };

            self.scratch_neighbors.clear();
            self.scratch_neighbors.extend(
                view.neighbors(tile.cell)
                    .filter_map(|neighbor| neighbor.plant)
                    .map(catalog::name),
            );

            let context = GrowthContext {
                soil_moisture: tile.water,
                temperature: tile.sun,
                neighbors: &self.scratch_neighbors,
            };
            let rate = growth_rate(tile, species, &self.scratch_neighbors);
            let grew = tile.growth < catalog::growth_cap(species)
                && catalog::grows_when(species, &context)
                && rng.gen::<f64>() < rate;

            out.push(GrowthOutcome {
                cell: tile.cell,
                species,
                grew,
                water_cost: if grew {
                    GROWTH_WATER_COST
                } else {
                    ATTEMPT_WATER_COST
                },
            });
        }
    }
}

/// Multiplier granted by neighbouring plants listed as adjacency friends.
#[must_use]
pub fn adjacency_bonus(species: SpeciesId, neighbors: &[&str]) -> f64 {
    let friends = catalog::adjacency_friends(species);
    let count = neighbors
        .iter()
        .filter(|name| friends.iter().any(|friend| friend == *name))
        .count();
    1.0 + GLOBAL_FRIEND_RATE * count as f64
}

/// Probability that the plant on `tile` advances a stage this turn.
#[must_use]
pub fn growth_rate(tile: &Tile, species: SpeciesId, neighbors: &[&str]) -> f64 {
    catalog::base_growth_rate(species) * tile.sun * tile.water * adjacency_bonus(species, neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use sunfield_core::TileContent;

    const WHEAT: SpeciesId = SpeciesId::new(0);
    const CORN: SpeciesId = SpeciesId::new(1);

    fn planted(cell: Cell, species: SpeciesId, growth: u32) -> Tile {
        Tile {
            cell,
            content: TileContent::Planted,
            sun: 1.2,
            water: 2.0,
            plant: Some(species),
            growth,
        }
    }

    fn grid(columns: i32, rows: i32) -> Vec<Tile> {
        (0..rows)
            .flat_map(|row| (0..columns).map(move |col| Tile::empty(Cell::new(row, col))))
            .collect()
    }

    #[test]
    fn adjacency_bonus_counts_only_friends() {
        assert_eq!(adjacency_bonus(CORN, &[]), 1.0);
        let bonus = adjacency_bonus(WHEAT, &["Corn", "Wheat", "Rice"]);
        assert!((bonus - (1.0 + 2.0 * GLOBAL_FRIEND_RATE)).abs() < 1e-12);
    }

    #[test]
    fn growth_rate_scales_with_sun_and_water() {
        let tile = planted(Cell::new(0, 0), CORN, 0);
        let expected = catalog::base_growth_rate(CORN) * 1.2 * 2.0;
        assert!((growth_rate(&tile, CORN, &[]) - expected).abs() < 1e-12);
    }

    #[test]
    fn favourable_draw_advances_plant() {
        let mut tiles = grid(3, 3);
        tiles[4] = planted(Cell::new(1, 1), CORN, 0);
        let mut growth = Growth::new();
        let mut outcomes = Vec::new();

        growth.handle(TileView::new(&tiles, 3, 3), &mut StepRng::new(0, 0), &mut outcomes);

        assert_eq!(
            outcomes,
            vec![GrowthOutcome {
                cell: Cell::new(1, 1),
                species: CORN,
                grew: true,
                water_cost: GROWTH_WATER_COST,
            }]
        );
    }

    #[test]
    fn mature_plant_still_pays_attempt_cost() {
        let mut tiles = grid(2, 2);
        tiles[0] = planted(Cell::new(0, 0), CORN, catalog::growth_cap(CORN));
        let mut outcomes = Vec::new();

        Growth::new().handle(TileView::new(&tiles, 2, 2), &mut StepRng::new(0, 0), &mut outcomes);

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].grew);
        assert_eq!(outcomes[0].water_cost, ATTEMPT_WATER_COST);
    }

    #[test]
    fn unfavourable_draw_keeps_stage() {
        let mut tiles = grid(2, 1);
        tiles[0] = planted(Cell::new(0, 0), CORN, 0);
        let mut outcomes = Vec::new();

        Growth::new().handle(
            TileView::new(&tiles, 2, 1),
            &mut StepRng::new(u64::MAX, 0),
            &mut outcomes,
        );

        assert!(!outcomes[0].grew);
    }

    #[test]
    fn failed_predicate_skips_random_draw() {
        let mut tiles = grid(2, 1);
        tiles[0] = planted(Cell::new(0, 0), WHEAT, 0);
        let mut rng = StepRng::new(0, 1);
        let mut outcomes = Vec::new();

        Growth::new().handle(TileView::new(&tiles, 2, 1), &mut rng, &mut outcomes);

        assert!(!outcomes[0].grew);
        assert_eq!(rng.gen::<u64>(), 0, "no draw should have been consumed");
    }

    #[test]
    fn empty_and_water_tiles_produce_no_outcome() {
        let mut tiles = grid(2, 1);
        tiles[1].content = TileContent::Water;
        let mut outcomes = Vec::new();

        Growth::new().handle(TileView::new(&tiles, 2, 1), &mut StepRng::new(0, 0), &mut outcomes);

        assert!(outcomes.is_empty());
    }
}
