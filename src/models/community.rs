// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community model: a named group of trainers with its own leaderboard.

use serde::{Deserialize, Serialize};

/// Community stored in Firestore, keyed by handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// URL slug, immutable once created
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Publicly viewable
    #[serde(default)]
    pub can_see: bool,
    /// Publicly joinable
    #[serde(default)]
    pub can_join: bool,
    #[serde(default)]
    pub members: Vec<u64>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}
