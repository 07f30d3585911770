//! Immutable registry of plant species.
//!
//! Species are addressed by [`SpeciesId`], which is simply their position in
//! the catalog. All plant behaviour is a pure function of the identifier and
//! the supplied [`GrowthContext`]; nothing here holds mutable state.
//!
//! The fallible [`species`] lookup reports unknown identifiers. The remaining
//! accessors are meant for the simulation loop and fall back to neutral
//! values (`0`, empty lists) so a single bad identifier cannot stall a turn.

use std::fmt;

use thiserror::Error;

use crate::{RewardToken, SpeciesId};

/// Glyph shown for a plant that has not reached its growth cap.
const SEEDLING_SPRITE: &str = "🌱";
/// Glyph shown for an unknown species.
const BLANK_SPRITE: &str = " ";
/// Name reported for an unknown species.
const UNKNOWN_NAME: &str = "Unknown";

/// Errors raised while validating the catalog or resolving identifiers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The identifier does not refer to a catalog entry.
    #[error("unknown species id {0}")]
    UnknownSpecies(u32),
    /// Two catalog entries share the same name.
    #[error("species name `{0}` is defined more than once")]
    DuplicateName(&'static str),
    /// A species lists a friend that is not in the catalog.
    #[error("species `{species}` lists unknown adjacency friend `{friend}`")]
    UnknownFriend {
        /// Species declaring the friend.
        species: &'static str,
        /// Name that failed to resolve.
        friend: &'static str,
    },
    /// A species rewards a token for a species that is not in the catalog.
    #[error("species `{species}` rewards unknown token `{token}`")]
    InvalidReward {
        /// Species declaring the reward.
        species: &'static str,
        /// Token that failed to resolve.
        token: RewardToken,
    },
    /// A species has an unusable growth cap or rate.
    #[error("species `{0}` has an invalid growth cap or rate")]
    InvalidGrowth(&'static str),
    /// A reward token string did not match `<id>Seed` or `<id>Crop`.
    #[error("malformed reward token `{0}`")]
    MalformedToken(String),
}

/// Environmental inputs supplied to a species' growth predicate.
#[derive(Clone, Copy, Debug)]
pub struct GrowthContext<'a> {
    /// Water held by the plant's tile.
    pub soil_moisture: f64,
    /// Sunlight received by the plant's tile this turn.
    pub temperature: f64,
    /// Species names of every neighbouring plant.
    pub neighbors: &'a [&'static str],
}

/// Static definition of a plant species.
pub struct PlantSpecies {
    name: &'static str,
    sprite: &'static str,
    growth_rate: f64,
    growth_cap: u32,
    adjacency_friends: &'static [&'static str],
    reward: &'static [RewardToken],
    grows_when: fn(&GrowthContext<'_>) -> bool,
}

impl PlantSpecies {
    /// Display name, also used to match adjacency friends.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Glyph shown for a mature plant.
    #[must_use]
    pub const fn sprite(&self) -> &'static str {
        self.sprite
    }

    /// Base probability factor for advancing a growth stage.
    #[must_use]
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Growth stage at which the plant is mature and can be reaped.
    #[must_use]
    pub const fn growth_cap(&self) -> u32 {
        self.growth_cap
    }

    /// Species names whose presence nearby accelerates growth.
    #[must_use]
    pub const fn adjacency_friends(&self) -> &'static [&'static str] {
        self.adjacency_friends
    }

    /// Tokens granted when the plant is reaped at its growth cap.
    #[must_use]
    pub const fn reward(&self) -> &'static [RewardToken] {
        self.reward
    }

    /// Evaluates the species' growth predicate.
    #[must_use]
    pub fn grows_when(&self, context: &GrowthContext<'_>) -> bool {
        (self.grows_when)(context)
    }
}

impl fmt::Debug for PlantSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlantSpecies")
            .field("name", &self.name)
            .field("growth_rate", &self.growth_rate)
            .field("growth_cap", &self.growth_cap)
            .field("adjacency_friends", &self.adjacency_friends)
            .field("reward", &self.reward)
            .finish_non_exhaustive()
    }
}

const WHEAT: SpeciesId = SpeciesId::new(0);
const CORN: SpeciesId = SpeciesId::new(1);
const RICE: SpeciesId = SpeciesId::new(2);

static SPECIES: [PlantSpecies; 3] = [
    PlantSpecies {
        name: "Wheat",
        sprite: "🌾",
        growth_rate: 0.1,
        growth_cap: 4,
        adjacency_friends: &["Wheat", "Corn"],
        reward: &[
            RewardToken::Seed(WHEAT),
            RewardToken::Seed(WHEAT),
            RewardToken::Crop(WHEAT),
        ],
        grows_when: wheat_grows,
    },
    PlantSpecies {
        name: "Corn",
        sprite: "🌽",
        growth_rate: 0.075,
        growth_cap: 3,
        adjacency_friends: &["Wheat"],
        reward: &[RewardToken::Seed(CORN), RewardToken::Crop(CORN)],
        grows_when: corn_grows,
    },
    PlantSpecies {
        name: "Rice",
        sprite: "🍚",
        growth_rate: 0.15,
        growth_cap: 5,
        adjacency_friends: &["Rice"],
        reward: &[
            RewardToken::Seed(RICE),
            RewardToken::Seed(RICE),
            RewardToken::Crop(RICE),
        ],
        grows_when: rice_grows,
    },
];

fn wheat_grows(context: &GrowthContext<'_>) -> bool {
    context.soil_moisture >= 0.5 && context.neighbors.contains(&"Corn")
}

// Temperature is the tile's sun value, so a lit tile reads at least 1.0.
fn corn_grows(context: &GrowthContext<'_>) -> bool {
    context.temperature >= 1.0 && context.soil_moisture >= 0.3
}

fn rice_grows(context: &GrowthContext<'_>) -> bool {
    context.soil_moisture >= 0.8 && context.neighbors.iter().all(|name| *name == "Rice")
}

fn lookup(id: SpeciesId) -> Option<&'static PlantSpecies> {
    usize::try_from(id.get())
        .ok()
        .and_then(|index| SPECIES.get(index))
}

/// Number of species in the catalog.
#[must_use]
pub fn species_count() -> u32 {
    SPECIES.len() as u32
}

/// Iterates every catalog identifier in order.
pub fn ids() -> impl Iterator<Item = SpeciesId> {
    (0..species_count()).map(SpeciesId::new)
}

/// Resolves a species definition, failing on unknown identifiers.
pub fn species(id: SpeciesId) -> Result<&'static PlantSpecies, CatalogError> {
    lookup(id).ok_or(CatalogError::UnknownSpecies(id.get()))
}

/// Reports whether the identifier refers to a catalog entry.
#[must_use]
pub fn contains(id: SpeciesId) -> bool {
    lookup(id).is_some()
}

/// Resolves a species identifier from its display name.
#[must_use]
pub fn id_by_name(name: &str) -> Option<SpeciesId> {
    SPECIES
        .iter()
        .position(|species| species.name == name)
        .map(|index| SpeciesId::new(index as u32))
}

/// Display name of the species, or `"Unknown"`.
#[must_use]
pub fn name(id: SpeciesId) -> &'static str {
    lookup(id).map_or(UNKNOWN_NAME, PlantSpecies::name)
}

/// Base growth rate of the species, or `0`.
#[must_use]
pub fn base_growth_rate(id: SpeciesId) -> f64 {
    lookup(id).map_or(0.0, PlantSpecies::growth_rate)
}

/// Growth cap of the species, or `0`.
#[must_use]
pub fn growth_cap(id: SpeciesId) -> u32 {
    lookup(id).map_or(0, PlantSpecies::growth_cap)
}

/// Cosmetic glyph for a plant at the given growth stage.
#[must_use]
pub fn display_sprite(id: SpeciesId, growth: u32) -> &'static str {
    match lookup(id) {
        Some(species) if growth >= species.growth_cap => species.sprite,
        Some(_) => SEEDLING_SPRITE,
        None => BLANK_SPRITE,
    }
}

/// Evaluates the species' growth predicate; unknown species never grow.
#[must_use]
pub fn grows_when(id: SpeciesId, context: &GrowthContext<'_>) -> bool {
    lookup(id).is_some_and(|species| species.grows_when(context))
}

/// Adjacency friends of the species, or an empty list.
#[must_use]
pub fn adjacency_friends(id: SpeciesId) -> &'static [&'static str] {
    lookup(id)
        .map(PlantSpecies::adjacency_friends)
        .unwrap_or_default()
}

/// Reward tokens of the species, or an empty list.
#[must_use]
pub fn reward(id: SpeciesId) -> &'static [RewardToken] {
    lookup(id).map(PlantSpecies::reward).unwrap_or_default()
}

/// Checks that every catalog entry is internally consistent.
///
/// Hosts call this once at startup; a failure is a programming error in the
/// species table and must abort initialisation.
pub fn validate() -> Result<(), CatalogError> {
    for (index, species) in SPECIES.iter().enumerate() {
        if SPECIES[..index].iter().any(|other| other.name == species.name) {
            return Err(CatalogError::DuplicateName(species.name));
        }
        if species.growth_cap == 0 || !(species.growth_rate > 0.0 && species.growth_rate <= 1.0) {
            return Err(CatalogError::InvalidGrowth(species.name));
        }
        if let Some(friend) = species
            .adjacency_friends
            .iter()
            .find(|friend| id_by_name(friend).is_none())
        {
            return Err(CatalogError::UnknownFriend {
                species: species.name,
                friend: *friend,
            });
        }
        if let Some(token) = species
            .reward
            .iter()
            .find(|token| !contains(token.species()))
        {
            return Err(CatalogError::InvalidReward {
                species: species.name,
                token: *token,
            });
        }
    }
    Ok(())
}
