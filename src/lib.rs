// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer Tracker: stat tracking and leaderboards for Pokémon Go trainers.
//!
//! This crate provides the backend API: trainer profiles, self-reported
//! stat Updates, Targets, communities, and ranked leaderboards.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::LeaderboardService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let leaderboard = LeaderboardService::new(db.clone(), &config);
        Self {
            config,
            db,
            leaderboard,
        }
    }
}
