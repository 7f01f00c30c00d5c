// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Earliest possible game start date (global launch).
pub const EARLIEST_START_DATE: (i32, u32, u32) = (2016, 7, 5);

/// In-game team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Faction {
    #[default]
    Teamless,
    Mystic,
    Valor,
    Instinct,
}

impl Faction {
    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Teamless => "teamless",
            Faction::Mystic => "mystic",
            Faction::Valor => "valor",
            Faction::Instinct => "instinct",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Faction {
    type Err = String;

    /// Accepts the team name or its numeric id (0-3).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "teamless" | "0" => Ok(Faction::Teamless),
            "mystic" | "1" => Ok(Faction::Mystic),
            "valor" | "2" => Ok(Faction::Valor),
            "instinct" | "3" => Ok(Faction::Instinct),
            other => Err(format!("Unknown faction: {}", other)),
        }
    }
}

/// One entry in a trainer's nickname history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Nickname {
    pub nickname: String,
    pub active: bool,
}

/// Trainer profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
    /// Trainer ID (also used as document ID)
    pub id: u64,
    /// Active nickname, as displayed
    pub username: String,
    pub faction: Faction,
    /// ISO 3166-1 alpha-2 country code
    #[serde(default)]
    pub country: Option<String>,
    /// When the game profile was created
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// All nicknames this trainer has used; exactly one is active.
    #[serde(default)]
    pub nicknames: Vec<Nickname>,
}

fn default_true() -> bool {
    true
}

/// Breakdown of the leaderboard eligibility predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EligibilityDetail {
    pub is_verified: bool,
    pub is_active: bool,
    pub is_not_banned: bool,
}

impl EligibilityDetail {
    pub fn is_eligible(&self) -> bool {
        self.is_verified && self.is_active && self.is_not_banned
    }
}

impl Trainer {
    /// Create a new, unverified trainer with a single active nickname.
    pub fn new(id: u64, username: &str, faction: Faction, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.to_string(),
            faction,
            country: None,
            start_date: None,
            is_verified: false,
            is_banned: false,
            is_active: true,
            created_at,
            nicknames: vec![Nickname {
                nickname: username.to_string(),
                active: true,
            }],
        }
    }

    pub fn eligibility_detail(&self) -> EligibilityDetail {
        EligibilityDetail {
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_not_banned: !self.is_banned,
        }
    }

    /// The default-exclusion predicate shared by every read path.
    ///
    /// Banned, unverified, and deactivated trainers never appear in listings
    /// or leaderboards.
    pub fn is_leaderboard_eligible(&self) -> bool {
        self.eligibility_detail().is_eligible()
    }

    /// Make `nickname` the active one, recording it in the history.
    ///
    /// Reuses an existing history entry when the same nickname (any casing)
    /// was used before.
    pub fn set_nickname(&mut self, nickname: &str) {
        for entry in &mut self.nicknames {
            entry.active = false;
        }

        match self
            .nicknames
            .iter_mut()
            .find(|n| n.nickname.eq_ignore_ascii_case(nickname))
        {
            Some(entry) => {
                entry.nickname = nickname.to_string();
                entry.active = true;
            }
            None => self.nicknames.push(Nickname {
                nickname: nickname.to_string(),
                active: true,
            }),
        }

        self.username = nickname.to_string();
    }

    /// Game start date, falling back to the global launch date.
    pub fn effective_start_date(&self) -> NaiveDate {
        let (y, m, d) = EARLIEST_START_DATE;
        let launch = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        self.start_date.map_or(launch, |date| date.max(launch))
    }
}

/// Check that a nickname matches the in-game rules: 3-15 letters and digits.
pub fn is_valid_nickname(nickname: &str) -> bool {
    (3..=15).contains(&nickname.len()) && nickname.chars().all(|c| c.is_ascii_alphanumeric())
}
