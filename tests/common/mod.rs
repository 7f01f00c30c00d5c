// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use trainer_tracker::config::Config;
use trainer_tracker::db::FirestoreDb;
use trainer_tracker::models::{Faction, StatValue, Trainer, Update};
use trainer_tracker::routes::create_router;
use trainer_tracker::AppState;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), test_db_offline()));
    (create_router(state.clone()), state)
}

/// Midnight UTC on the given day.
#[allow(dead_code)]
pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A verified, active, unbanned trainer.
#[allow(dead_code)]
pub fn eligible_trainer(id: u64, username: &str, faction: Faction) -> Trainer {
    let mut trainer = Trainer::new(id, username, faction, day(2020, 1, 1));
    trainer.is_verified = true;
    trainer
}

/// An Update reporting the given integer stats.
#[allow(dead_code)]
pub fn update_at(trainer_id: u64, time: DateTime<Utc>, stats: &[(&str, u64)]) -> Update {
    Update {
        uuid: Uuid::new_v4(),
        trainer_id,
        update_time: time,
        submission_date: time,
        comment: None,
        source: None,
        stats: stats
            .iter()
            .map(|(name, v)| (name.to_string(), StatValue::Integer(*v)))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
