//! Line-oriented startup configuration.
//!
//! ```text
//! 25          # columns
//! 18          # rows
//! 3           # sun range
//! 0.5         # water rate
//! 20          # seeds to win
//! 0,3         # species id, starting seed count
//! 1,3
//! CONDITIONS
//! sun_range 1 from 10 to 14
//! water_rate 2.0 from 12 to 20
//! ```
//!
//! A condition line names the parameter, then the value, and ends with the
//! first and the end turn; words in between are ignored.

use sunfield_core::{
    catalog, BoardParameters, Condition, ConditionParameter, SpeciesId, MAX_GRID_EXTENT,
    MAX_HYDRATION,
};
use sunfield_world::DEFAULT_RNG_SEED;
use thiserror::Error;
use tracing::warn;

/// Largest accepted sun range.
pub const MAX_SUN_RANGE: u32 = 16;

/// Largest accepted seed goal.
pub const MAX_SEEDS_TO_WIN: u32 = 10_000;

const CONDITIONS_MARKER: &str = "CONDITIONS";

const HEADER_FIELDS: [&str; 5] = ["columns", "rows", "sun_range", "water_rate", "seeds_to_win"];

/// Fatal problems found while loading the startup configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The text ended before every header field was read.
    #[error("missing `{0}` line")]
    MissingField(&'static str),
    /// A header field is not a number.
    #[error("line {line}: `{value}` is not a valid {field}")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// Header field being read.
        field: &'static str,
        /// Offending text.
        value: String,
    },
    /// A numeric setting lies outside its accepted range.
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        /// Setting that failed validation.
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// A starting seed line is not `species,count`.
    #[error("line {line}: expected `species,count`, found `{text}`")]
    MalformedSeedLine {
        /// One-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },
    /// A starting seed line names a species missing from the catalog.
    #[error("line {line}: unknown species {species}")]
    UnknownSpecies {
        /// One-based line number.
        line: usize,
        /// Species id as written.
        species: u32,
    },
    /// A species appears on more than one starting seed line.
    #[error("line {line}: species {species} already has starting seeds")]
    DuplicateSpecies {
        /// One-based line number.
        line: usize,
        /// Repeated species id.
        species: u32,
    },
    /// A condition line lacks a value or its turn window.
    #[error("line {line}: expected `<parameter> <value> .. <start> <end>`, found `{text}`")]
    MalformedCondition {
        /// One-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },
    /// A condition names a parameter that cannot be overridden.
    #[error("line {line}: unknown condition parameter `{name}`")]
    UnknownParameter {
        /// One-based line number.
        line: usize,
        /// Parameter as written.
        name: String,
    },
    /// A condition ends on or before the turn it starts.
    #[error("line {line}: condition window {start}..{end} is empty")]
    EmptyConditionWindow {
        /// One-based line number.
        line: usize,
        /// First turn of the window.
        start: u32,
        /// End turn of the window.
        end: u32,
    },
    /// The built-in plant catalog is inconsistent.
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),
}

/// Validated startup settings.
#[derive(Clone, Debug, PartialEq)]
pub struct StartupConfig {
    /// Number of board columns.
    pub columns: u32,
    /// Number of board rows.
    pub rows: u32,
    /// Baseline sun range.
    pub sun_range: u32,
    /// Baseline water rate.
    pub water_rate: f64,
    /// Total seeds needed to win.
    pub seeds_to_win: u32,
    /// Seeds granted at the start, in file order.
    pub starting_seeds: Vec<(SpeciesId, u32)>,
    /// Timed parameter overrides, in file order.
    pub conditions: Vec<Condition>,
    /// Seed for the simulation's random draws.
    pub rng_seed: u64,
}

impl StartupConfig {
    /// Parses and validates configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        catalog::validate()?;

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, raw)| (index + 1, strip_comment(raw)))
            .filter(|(_, line)| !line.is_empty());

        let mut header = [0.0_f64; HEADER_FIELDS.len()];
        for (slot, field) in header.iter_mut().zip(HEADER_FIELDS) {
            let (line, value) = lines.next().ok_or(ConfigError::MissingField(field))?;
            *slot = parse_number(line, field, value)?;
        }
        let [columns, rows, sun_range, water_rate, seeds_to_win] = header;

        let mut config = Self {
            columns: whole("columns", columns, 1, MAX_GRID_EXTENT)?,
            rows: whole("rows", rows, 1, MAX_GRID_EXTENT)?,
            sun_range: whole("sun_range", sun_range, 1, MAX_SUN_RANGE)?,
            water_rate: water(water_rate)?,
            seeds_to_win: whole("seeds_to_win", seeds_to_win, 1, MAX_SEEDS_TO_WIN)?,
            starting_seeds: Vec::new(),
            conditions: Vec::new(),
            rng_seed: DEFAULT_RNG_SEED,
        };

        let mut in_conditions = false;
        for (line, text) in lines {
            if !in_conditions && text == CONDITIONS_MARKER {
                in_conditions = true;
            } else if in_conditions {
                config.conditions.push(parse_condition(line, text)?);
            } else if let Some(entry) = config.parse_seed_line(line, text)? {
                config.starting_seeds.push(entry);
            }
        }
        Ok(config)
    }

    /// Replaces the seed used for random draws.
    #[must_use]
    pub fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    /// Baseline board parameters.
    #[must_use]
    pub const fn parameters(&self) -> BoardParameters {
        BoardParameters {
            sun_range: self.sun_range,
            water_rate: self.water_rate,
        }
    }

    fn parse_seed_line(
        &self,
        line: usize,
        text: &str,
    ) -> Result<Option<(SpeciesId, u32)>, ConfigError> {
        let malformed = || ConfigError::MalformedSeedLine {
            line,
            text: text.to_owned(),
        };
        let (species, count) = text.split_once(',').ok_or_else(malformed)?;
        let species: u32 = species.trim().parse().map_err(|_| malformed())?;
        let count: u32 = count.trim().parse().map_err(|_| malformed())?;

        let id = SpeciesId::new(species);
        if !catalog::contains(id) {
            return Err(ConfigError::UnknownSpecies { line, species });
        }
        if self.starting_seeds.iter().any(|&(seen, _)| seen == id) {
            return Err(ConfigError::DuplicateSpecies { line, species });
        }
        if count == 0 {
            warn!(line, species, "ignoring starting seed line with zero seeds");
            return Ok(None);
        }
        Ok(Some((id, count)))
    }
}

fn strip_comment(raw: &str) -> &str {
    raw.split_once('#').map_or(raw, |(before, _)| before).trim()
}

fn parse_number(line: usize, field: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            line,
            field,
            value: value.to_owned(),
        })
}

fn whole(field: &'static str, value: f64, min: u32, max: u32) -> Result<u32, ConfigError> {
    if value.fract() == 0.0 && value >= f64::from(min) && value <= f64::from(max) {
        Ok(value as u32)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: f64::from(min),
            max: f64::from(max),
        })
    }
}

fn water(value: f64) -> Result<f64, ConfigError> {
    if (0.0..=MAX_HYDRATION).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field: "water_rate",
            value,
            min: 0.0,
            max: MAX_HYDRATION,
        })
    }
}

fn parse_condition(line: usize, text: &str) -> Result<Condition, ConfigError> {
    let malformed = || ConfigError::MalformedCondition {
        line,
        text: text.to_owned(),
    };
    let words: Vec<&str> = text.split_whitespace().collect();
    let [name, value, .., start, end] = words.as_slice() else {
        return Err(malformed());
    };

    let parameter = match *name {
        "sun_range" => ConditionParameter::SunRange,
        "water_rate" => ConditionParameter::WaterRate,
        other => {
            return Err(ConfigError::UnknownParameter {
                line,
                name: other.to_owned(),
            })
        }
    };
    let value = parse_number(line, "condition value", value)?;
    let value = match parameter {
        ConditionParameter::SunRange => f64::from(whole("sun_range", value, 1, MAX_SUN_RANGE)?),
        ConditionParameter::WaterRate => water(value)?,
    };
    let turn_start: u32 = start.parse().map_err(|_| malformed())?;
    let turn_end: u32 = end.parse().map_err(|_| malformed())?;
    if turn_start >= turn_end {
        return Err(ConfigError::EmptyConditionWindow {
            line,
            start: turn_start,
            end: turn_end,
        });
    }

    Ok(Condition {
        parameter,
        value,
        turn_start,
        turn_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "5\n4\n2\n0.5\n10\n";

    #[test]
    fn parses_header_seeds_and_conditions() {
        let text = "\
# farm
8
6
3
1.5
12

0,3
2, 1   # rice
CONDITIONS
sun_range 1 from 4 to 9
water_rate 0.25 between 6 and 7
";
        let config = StartupConfig::parse(text).expect("valid config");

        assert_eq!((config.columns, config.rows), (8, 6));
        assert_eq!(config.sun_range, 3);
        assert_eq!(config.water_rate, 1.5);
        assert_eq!(config.seeds_to_win, 12);
        assert_eq!(
            config.starting_seeds,
            vec![(SpeciesId::new(0), 3), (SpeciesId::new(2), 1)]
        );
        assert_eq!(
            config.conditions,
            vec![
                Condition {
                    parameter: ConditionParameter::SunRange,
                    value: 1.0,
                    turn_start: 4,
                    turn_end: 9,
                },
                Condition {
                    parameter: ConditionParameter::WaterRate,
                    value: 0.25,
                    turn_start: 6,
                    turn_end: 7,
                },
            ]
        );
        assert_eq!(config.rng_seed, DEFAULT_RNG_SEED);
    }

    #[test]
    fn header_only_config_is_valid() {
        let config = StartupConfig::parse(MINIMAL).expect("valid config");
        assert!(config.starting_seeds.is_empty());
        assert!(config.conditions.is_empty());
        assert_eq!(config.parameters().sun_range, 2);
    }

    #[test]
    fn missing_header_line_is_fatal() {
        assert_eq!(
            StartupConfig::parse("5\n4\n2\n"),
            Err(ConfigError::MissingField("water_rate"))
        );
    }

    #[test]
    fn oversized_board_is_fatal() {
        let err = StartupConfig::parse("65\n4\n2\n0.5\n10\n").expect_err("too wide");
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "columns",
                ..
            }
        ));
    }

    #[test]
    fn fractional_rows_are_fatal() {
        assert!(matches!(
            StartupConfig::parse("5\n4.5\n2\n0.5\n10\n"),
            Err(ConfigError::OutOfRange { field: "rows", .. })
        ));
    }

    #[test]
    fn water_rate_above_hydration_cap_is_fatal() {
        assert!(matches!(
            StartupConfig::parse("5\n4\n2\n4.5\n10\n"),
            Err(ConfigError::OutOfRange {
                field: "water_rate",
                ..
            })
        ));
    }

    #[test]
    fn zero_seed_goal_is_fatal() {
        assert!(matches!(
            StartupConfig::parse("5\n4\n2\n0.5\n0\n"),
            Err(ConfigError::OutOfRange {
                field: "seeds_to_win",
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_header_is_fatal() {
        assert_eq!(
            StartupConfig::parse("five\n"),
            Err(ConfigError::InvalidNumber {
                line: 1,
                field: "columns",
                value: "five".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_species_is_fatal() {
        assert_eq!(
            StartupConfig::parse(&format!("{MINIMAL}7,2\n")),
            Err(ConfigError::UnknownSpecies {
                line: 6,
                species: 7
            })
        );
    }

    #[test]
    fn repeated_species_is_fatal() {
        assert!(matches!(
            StartupConfig::parse(&format!("{MINIMAL}1,2\n1,3\n")),
            Err(ConfigError::DuplicateSpecies { species: 1, .. })
        ));
    }

    #[test]
    fn zero_count_seed_line_is_skipped() {
        let config = StartupConfig::parse(&format!("{MINIMAL}1,0\n")).expect("valid config");
        assert!(config.starting_seeds.is_empty());
    }

    #[test]
    fn unknown_condition_parameter_is_fatal() {
        assert_eq!(
            StartupConfig::parse(&format!("{MINIMAL}CONDITIONS\nwind 3 1 2\n")),
            Err(ConfigError::UnknownParameter {
                line: 7,
                name: "wind".to_owned(),
            })
        );
    }

    #[test]
    fn condition_window_must_not_be_empty() {
        assert!(matches!(
            StartupConfig::parse(&format!("{MINIMAL}CONDITIONS\nsun_range 2 5 5\n")),
            Err(ConfigError::EmptyConditionWindow {
                start: 5,
                end: 5,
                ..
            })
        ));
    }

    #[test]
    fn condition_values_share_baseline_bounds() {
        assert!(matches!(
            StartupConfig::parse(&format!("{MINIMAL}CONDITIONS\nsun_range 40 1 3\n")),
            Err(ConfigError::OutOfRange {
                field: "sun_range",
                ..
            })
        ));
    }

    #[test]
    fn short_condition_line_is_malformed() {
        assert!(matches!(
            StartupConfig::parse(&format!("{MINIMAL}CONDITIONS\nwater_rate 1\n")),
            Err(ConfigError::MalformedCondition { line: 7, .. })
        ));
    }

    #[test]
    fn host_can_override_rng_seed() {
        let config = StartupConfig::parse(MINIMAL)
            .expect("valid config")
            .with_rng_seed(99);
        assert_eq!(config.rng_seed, 99);
    }
}
