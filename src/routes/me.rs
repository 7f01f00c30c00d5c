// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the authenticated trainer.

use crate::error::{AppError, FieldIssue, FieldIssues, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stats::{stat_field, StatValue};
use crate::models::trainer::is_valid_nickname;
use crate::models::{EligibilityDetail, Target, Trainer, Update};
use crate::routes::trainers::TrainerResponse;
use crate::services::{rate_warnings, validate_update};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Allowed clock skew for a trainer-supplied `update_time`.
const MAX_FUTURE_SKEW_MINUTES: i64 = 60;

/// Authenticated routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v2/me", get(get_me))
        .route("/api/v2/me/nickname", put(change_nickname))
        .route("/api/v2/me/updates", post(submit_update))
        .route("/api/v2/me/targets", post(create_target))
}

async fn own_trainer(state: &AppState, user: &AuthUser) -> Result<Trainer> {
    state
        .db
        .get_trainer(user.trainer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainer {}", user.trainer_id)))
}

fn field_error(field: &str, issue: FieldIssue) -> AppError {
    AppError::Validation(FieldIssues::from([(field.to_string(), vec![issue])]))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    #[serde(flatten)]
    pub trainer: TrainerResponse,
    pub eligibility: EligibilityDetail,
    /// Whether the trainer appears on leaderboards
    pub is_eligible: bool,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let trainer = own_trainer(&state, &user).await?;
    let eligibility = trainer.eligibility_detail();

    Ok(Json(MeResponse {
        trainer: trainer.into(),
        is_eligible: eligibility.is_eligible(),
        eligibility,
    }))
}

// ─── Nickname ────────────────────────────────────────────────

fn validate_nickname(nickname: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_nickname(nickname) {
        Ok(())
    } else {
        Err(ValidationError::new("nickname")
            .with_message("Must be 3-15 letters or digits".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NicknameRequest {
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

async fn change_nickname(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NicknameRequest>,
) -> Result<Json<TrainerResponse>> {
    body.validate()?;
    let trainer = state.db.set_nickname(user.trainer_id, &body.nickname).await?;
    Ok(Json(trainer.into()))
}

// ─── Updates ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitUpdateRequest {
    /// When the stats were true; defaults to now
    pub update_time: Option<DateTime<Utc>>,
    #[validate(length(max = 240))]
    pub comment: Option<String>,
    #[validate(length(max = 64))]
    pub source: Option<String>,
    /// Stat name -> value; `null` is the same as leaving a stat out
    #[serde(default)]
    pub stats: BTreeMap<String, Option<StatValue>>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubmitUpdateResponse {
    pub update: Update,
    /// Plausibility warnings; the update was still stored
    #[cfg_attr(
        feature = "binding-generation",
        ts(type = "Record<string, Array<{ code: string, message: string }>>")
    )]
    pub warnings: FieldIssues,
    /// Targets newly reached (or un-reached) by this update
    pub targets_changed: Vec<Target>,
}

/// Submit a stat snapshot.
async fn submit_update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SubmitUpdateRequest>,
) -> Result<(StatusCode, Json<SubmitUpdateResponse>)> {
    body.validate()?;
    let trainer = own_trainer(&state, &user).await?;

    let now = Utc::now();
    let update_time = body.update_time.unwrap_or(now);
    if update_time > now + chrono::Duration::minutes(MAX_FUTURE_SKEW_MINUTES) {
        return Err(field_error(
            "update_time",
            FieldIssue::new("future", "Must not be in the future"),
        ));
    }

    let mut update = Update {
        uuid: Uuid::new_v4(),
        trainer_id: trainer.id,
        update_time,
        submission_date: now,
        comment: body.comment,
        source: body.source,
        stats: body
            .stats
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect(),
    };

    let mut history = state.db.get_updates_for_trainer(trainer.id).await?;
    validate_update(&mut update, &history)?;
    let warnings = rate_warnings(&trainer, &update, &history);

    state.db.create_update(&update).await?;

    history.push(update.clone());
    let targets_changed: Vec<Target> = state
        .db
        .get_targets_for_trainer(trainer.id)
        .await?
        .into_iter()
        .filter_map(|mut t| t.check_reached(&history).then_some(t))
        .collect();
    if !targets_changed.is_empty() {
        state.db.set_targets(&targets_changed).await?;
    }

    tracing::info!(
        trainer_id = trainer.id,
        update = %update.uuid,
        stats = update.reported_stats().count(),
        warnings = warnings.len(),
        targets_changed = targets_changed.len(),
        "Update submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitUpdateResponse {
            update,
            warnings,
            targets_changed,
        }),
    ))
}

// ─── Targets ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTargetRequest {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    pub stat: String,
    pub target: StatValue,
}

async fn create_target(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTargetRequest>,
) -> Result<(StatusCode, Json<Target>)> {
    body.validate()?;

    let field = match stat_field(&body.stat) {
        None => {
            return Err(field_error(
                "stat",
                FieldIssue::new("unknown", format!("'{}' is not a known stat", body.stat)),
            ))
        }
        Some(f) if f.reversable => {
            return Err(field_error(
                "stat",
                FieldIssue::new(
                    "reversable",
                    "Targets can only be set on stats that never decrease",
                ),
            ))
        }
        Some(f) => f,
    };
    let value = field
        .normalize(body.target)
        .map_err(|e| field_error("target", FieldIssue::new(e.code(), e.to_string())))?;

    let trainer = own_trainer(&state, &user).await?;
    let mut target = Target {
        trainer_id: trainer.id,
        name: body.name,
        stat: body.stat,
        target: value,
        has_reached: false,
        date_reached: None,
    };

    let updates = state.db.get_updates_for_trainer(trainer.id).await?;
    target.check_reached(&updates);
    state.db.create_target(&target).await?;

    tracing::info!(
        trainer_id = trainer.id,
        stat = %target.stat,
        target = %target.target,
        reached = target.has_reached,
        "Target created"
    );

    Ok((StatusCode::CREATED, Json(target)))
}
