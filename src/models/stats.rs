// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stat field registry and stat values.
//!
//! Every counter an Update may carry is declared once in [`STAT_FIELDS`].
//! Leaderboard validation, Update validation, and target validation all
//! consult this table instead of inspecting model fields at runtime.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Storage kind of a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum StatKind {
    /// Non-negative whole number.
    Integer,
    /// Non-negative number with at most two decimal places.
    Decimal,
}

/// Metadata for a single stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatField {
    pub name: &'static str,
    pub kind: StatKind,
    /// Value may legitimately decrease between updates.
    pub reversable: bool,
    /// Value may be used to order a leaderboard.
    pub sortable: bool,
    /// Inclusive upper bound, if the game caps this stat.
    pub max: Option<u64>,
}

const fn medal(name: &'static str) -> StatField {
    StatField {
        name,
        kind: StatKind::Integer,
        reversable: false,
        sortable: true,
        max: None,
    }
}

const fn capped(name: &'static str, max: u64) -> StatField {
    StatField {
        name,
        kind: StatKind::Integer,
        reversable: false,
        sortable: true,
        max: Some(max),
    }
}

const fn profile(name: &'static str, reversable: bool) -> StatField {
    StatField {
        name,
        kind: StatKind::Integer,
        reversable,
        sortable: false,
        max: None,
    }
}

/// Firestore stores integers as i64.
pub const MAX_STORED_INTEGER: u64 = i64::MAX as u64;

/// Default leaderboard stat.
pub const DEFAULT_STAT: &str = "total_xp";

/// All stats an Update may carry.
pub static STAT_FIELDS: &[StatField] = &[
    medal("total_xp"),
    profile("pokedex_total_caught", false),
    profile("pokedex_total_seen", false),
    capped("pokedex_gen1", 151),
    capped("pokedex_gen2", 100),
    capped("pokedex_gen3", 134),
    capped("pokedex_gen4", 107),
    capped("pokedex_gen5", 156),
    capped("pokedex_gen6", 72),
    capped("pokedex_gen7", 88),
    capped("pokedex_gen8", 87),
    StatField {
        name: "travel_km",
        kind: StatKind::Decimal,
        reversable: false,
        sortable: true,
        max: None,
    },
    medal("capture_total"),
    medal("evolved_total"),
    medal("hatched_total"),
    medal("pokestops_visited"),
    medal("big_magikarp"),
    medal("battle_attack_won"),
    medal("battle_training_won"),
    medal("small_rattata"),
    medal("pikachu"),
    capped("unown", 28),
    medal("raid_battle_won"),
    medal("legendary_battle_won"),
    medal("berries_fed"),
    medal("hours_defended"),
    medal("challenge_quests"),
    medal("max_level_friends"),
    medal("trading"),
    medal("trading_distance"),
    medal("great_league"),
    medal("ultra_league"),
    medal("master_league"),
    medal("photobomb"),
    medal("pokemon_purified"),
    medal("rocket_grunts_defeated"),
    medal("rocket_giovanni_defeated"),
    medal("buddy_best"),
    medal("wayfarer"),
    medal("total_mega_evos"),
    medal("unique_mega_evos"),
    medal("type_normal"),
    medal("type_fighting"),
    medal("type_flying"),
    medal("type_poison"),
    medal("type_ground"),
    medal("type_rock"),
    medal("type_bug"),
    medal("type_ghost"),
    medal("type_steel"),
    medal("type_fire"),
    medal("type_water"),
    medal("type_grass"),
    medal("type_electric"),
    medal("type_psychic"),
    medal("type_ice"),
    medal("type_dragon"),
    medal("type_dark"),
    medal("type_fairy"),
    profile("gymbadges_total", true),
    profile("gymbadges_gold", true),
    profile("stardust", true),
];

/// Look up a stat by name.
pub fn stat_field(name: &str) -> Option<&'static StatField> {
    STAT_FIELDS.iter().find(|f| f.name == name)
}

/// Look up a stat that can order a leaderboard.
pub fn sortable_field(name: &str) -> Option<&'static StatField> {
    stat_field(name).filter(|f| f.sortable)
}

/// Stats whose values may decrease over time.
pub fn reversable_fields() -> impl Iterator<Item = &'static StatField> {
    STAT_FIELDS.iter().filter(|f| f.reversable)
}

/// A stat value as submitted by a trainer.
///
/// Values of one stat always share a kind once normalized, but comparisons
/// are defined across kinds so ranking never has to care.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum StatValue {
    Integer(#[cfg_attr(feature = "binding-generation", ts(type = "number"))] u64),
    Decimal(f64),
}

impl StatValue {
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Integer(v) => v as f64,
            StatValue::Decimal(v) => v,
        }
    }
}

impl PartialEq for StatValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StatValue {}

impl PartialOrd for StatValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StatValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (StatValue::Integer(a), StatValue::Integer(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Integer(v) => write!(f, "{}", v),
            StatValue::Decimal(v) => write!(f, "{:.2}", v),
        }
    }
}

/// Reason a value does not fit a stat's declared shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatValueError {
    #[error("Value must not be negative")]
    Negative,

    #[error("Value must be a whole number")]
    NotWhole,

    #[error("Value must have at most two decimal places")]
    TooPrecise,

    #[error("Value must be at most {0}")]
    AboveMax(u64),
}

impl StatValueError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            StatValueError::Negative => "min_value",
            StatValueError::NotWhole => "invalid",
            StatValueError::TooPrecise => "max_decimal_places",
            StatValueError::AboveMax(_) => "max_value",
        }
    }
}

impl StatField {
    /// Coerce a submitted value into this stat's kind and check its bounds.
    pub fn normalize(&self, value: StatValue) -> Result<StatValue, StatValueError> {
        let raw = value.as_f64();
        if raw < 0.0 {
            return Err(StatValueError::Negative);
        }

        let normalized = match (self.kind, value) {
            (StatKind::Integer, StatValue::Integer(v)) => {
                if v > MAX_STORED_INTEGER {
                    return Err(StatValueError::AboveMax(MAX_STORED_INTEGER));
                }
                StatValue::Integer(v)
            }
            (StatKind::Integer, StatValue::Decimal(v)) => {
                if v.fract() != 0.0 {
                    return Err(StatValueError::NotWhole);
                }
                // i64::MAX rounds up to 2^63 as f64
                if v >= MAX_STORED_INTEGER as f64 {
                    return Err(StatValueError::AboveMax(MAX_STORED_INTEGER));
                }
                StatValue::Integer(v as u64)
            }
            (StatKind::Decimal, _) => {
                let hundredths = raw * 100.0;
                if (hundredths - hundredths.round()).abs() > 1e-6 {
                    return Err(StatValueError::TooPrecise);
                }
                StatValue::Decimal(hundredths.round() / 100.0)
            }
        };

        if let Some(max) = self.max {
            if normalized.as_f64() > max as f64 {
                return Err(StatValueError::AboveMax(max));
            }
        }

        Ok(normalized)
    }
}
