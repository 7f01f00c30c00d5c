// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public trainer routes: profiles, update history, and targets.

use crate::error::{AppError, Result};
use crate::models::{Faction, Nickname, Target, Trainer, Update};
use crate::services::leaderboard::Population;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v2/trainers", get(list_trainers))
        .route("/api/v2/trainers/{id}", get(get_trainer))
        .route("/api/v2/trainers/{id}/updates", get(list_updates))
        .route("/api/v2/trainers/{id}/updates/latest", get(latest_update))
        .route("/api/v2/trainers/{id}/targets", get(list_targets))
}

/// Public trainer profile.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrainerResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    pub faction: Faction,
    pub country: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub nicknames: Vec<Nickname>,
}

impl From<Trainer> for TrainerResponse {
    fn from(t: Trainer) -> Self {
        Self {
            id: t.id,
            username: t.username,
            faction: t.faction,
            country: t.country,
            start_date: t.start_date,
            created_at: t.created_at,
            nicknames: t.nicknames,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrainersQuery {
    faction: Option<String>,
    country: Option<String>,
    /// Case-insensitive match on any nickname the trainer has used
    codename: Option<String>,
}

/// List eligible trainers with optional filters.
async fn list_trainers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrainersQuery>,
) -> Result<Json<Vec<TrainerResponse>>> {
    let faction = query
        .faction
        .as_deref()
        .map(|f| f.parse::<Faction>().map_err(AppError::InvalidParameter))
        .transpose()?;
    let population = Population {
        faction,
        country: query.country.map(|c| c.to_ascii_uppercase()),
        members: None,
    };

    let mut trainers = state.db.get_eligible_trainers(&population).await?;
    if let Some(codename) = query.codename.as_deref() {
        trainers.retain(|t| {
            t.nicknames
                .iter()
                .any(|n| n.nickname.eq_ignore_ascii_case(codename))
        });
    }
    trainers.sort_by_key(|t| t.id);

    Ok(Json(trainers.into_iter().map(Into::into).collect()))
}

/// An eligible trainer, or 404. Ineligible trainers are indistinguishable
/// from missing ones on public routes.
async fn eligible_trainer(state: &AppState, trainer_id: u64) -> Result<Trainer> {
    state
        .db
        .get_eligible_trainer(trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainer {}", trainer_id)))
}

async fn get_trainer(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<u64>,
) -> Result<Json<TrainerResponse>> {
    Ok(Json(eligible_trainer(&state, trainer_id).await?.into()))
}

/// All updates, newest first.
async fn list_updates(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<u64>,
) -> Result<Json<Vec<Update>>> {
    eligible_trainer(&state, trainer_id).await?;
    Ok(Json(state.db.get_updates_for_trainer(trainer_id).await?))
}

async fn latest_update(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<u64>,
) -> Result<Json<Update>> {
    eligible_trainer(&state, trainer_id).await?;
    state
        .db
        .get_latest_update(trainer_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Trainer {} has no updates", trainer_id)))
}

async fn list_targets(
    State(state): State<Arc<AppState>>,
    Path(trainer_id): Path<u64>,
) -> Result<Json<Vec<Target>>> {
    eligible_trainer(&state, trainer_id).await?;
    let mut targets = state.db.get_targets_for_trainer(trainer_id).await?;
    targets.sort_by(|a, b| a.stat.cmp(&b.stat).then(a.target.cmp(&b.target)));
    Ok(Json(targets))
}
