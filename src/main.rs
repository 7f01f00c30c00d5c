// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer Tracker API Server
//!
//! Serves trainer profiles, stat Updates, and leaderboards.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trainer_tracker::{config::Config, db::FirestoreDb, models::STAT_FIELDS, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Trainer Tracker API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    tracing::info!(
        stats = STAT_FIELDS.len(),
        sortable = STAT_FIELDS.iter().filter(|f| f.sortable).count(),
        page_size = config.leaderboard_page_size,
        max_page_size = config.leaderboard_max_page_size,
        "Leaderboard engine ready"
    );

    let state = Arc::new(AppState::new(config.clone(), db));
    let app = trainer_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainer_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
