// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod leaderboard;
pub mod update_checks;

pub use leaderboard::{
    LeaderboardError, LeaderboardOutcome, LeaderboardPage, LeaderboardParams, LeaderboardService,
    LeaderboardStore, Mode, Population,
};
pub use update_checks::{rate_warnings, validate_update};
