// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public leaderboard, stat metadata, and community routes.

use crate::error::{AppError, Result};
use crate::models::stats::{StatField, DEFAULT_STAT, STAT_FIELDS};
use crate::models::{Community, Faction};
use crate::services::leaderboard::{LeaderboardOutcome, LeaderboardParams, Mode, Population};
use crate::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Query parameters owned by the pager; rewritten on a focus redirect.
const PAGER_PARAMS: [&str; 3] = ["focus", "limit", "offset"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v2/stats", get(list_stats))
        .route("/api/v2/leaderboard", get(global_leaderboard))
        .route("/api/v2/communities/{handle}", get(get_community))
        .route(
            "/api/v2/communities/{handle}/leaderboard",
            get(community_leaderboard),
        )
}

// ─── Stat Metadata ───────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub default: &'static str,
    pub stats: &'static [StatField],
}

async fn list_stats() -> Json<StatsResponse> {
    Json(StatsResponse {
        default: DEFAULT_STAT,
        stats: STAT_FIELDS,
    })
}

// ─── Leaderboards ────────────────────────────────────────────

/// Raw leaderboard query. Parsed by hand so malformed values produce
/// `invalid_parameter` rather than a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub stat: Option<String>,
    pub mode: Option<String>,
    pub faction: Option<String>,
    pub country: Option<String>,
    pub focus: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|v| {
        v.parse().map_err(|_| {
            AppError::InvalidParameter(format!("'{}' must be a non-negative integer", name))
        })
    })
    .transpose()
}

impl LeaderboardQuery {
    /// Build engine parameters for a given population.
    pub fn into_params(self, population: Population) -> Result<LeaderboardParams> {
        let mode = match self.mode.as_deref() {
            None | Some("") => Mode::default(),
            Some(raw) => raw.parse::<Mode>()?,
        };

        Ok(LeaderboardParams {
            stat: self
                .stat
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STAT.to_string()),
            mode,
            population,
            focus: parse_number("focus", self.focus.as_deref())?,
            limit: parse_number("limit", self.limit.as_deref())?,
            offset: parse_number("offset", self.offset.as_deref())?.unwrap_or(0),
        })
    }

    /// Faction/country population from the query.
    pub fn population(&self) -> Result<Population> {
        let faction = self
            .faction
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<Faction>().map_err(AppError::InvalidParameter))
            .transpose()?;

        Ok(Population {
            faction,
            country: self
                .country
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(str::to_ascii_uppercase),
            members: None,
        })
    }
}

/// Same path and filters, `focus` dropped, pager set to the given window.
pub fn refocus_location(path: &str, raw_query: Option<&str>, limit: u32, offset: u32) -> String {
    let mut pairs: Vec<String> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            let key = urlencoding::decode(key).unwrap_or_default();
            !PAGER_PARAMS.iter().any(|p| *p == key)
        })
        .map(str::to_string)
        .collect();

    pairs.push(format!("limit={}", limit));
    pairs.push(format!("offset={}", offset));

    format!("{}?{}", path, pairs.join("&"))
}

async fn run_leaderboard(
    state: &AppState,
    uri: &axum::http::Uri,
    params: LeaderboardParams,
) -> Result<Response> {
    match state.leaderboard.leaderboard(&params).await? {
        LeaderboardOutcome::Page(page) => Ok(Json(page).into_response()),
        LeaderboardOutcome::Refocus { limit, offset } => {
            let location = refocus_location(uri.path(), uri.query(), limit, offset);
            tracing::debug!(focus = ?params.focus, %location, "Redirecting to focused page");
            Ok(Redirect::temporary(&location).into_response())
        }
    }
}

async fn global_leaderboard(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response> {
    let population = query.population()?;
    let params = query.into_params(population)?;
    run_leaderboard(&state, &uri, params).await
}

async fn community_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response> {
    // Reject bad parameters before the community lookup touches the store
    let params = query.into_params(Population::default())?;
    params.stat_field()?;
    state.leaderboard.resolve_limit(params.limit)?;

    let community = visible_community(&state, &handle).await?;
    let params = LeaderboardParams {
        population: Population::community(&community),
        ..params
    };
    run_leaderboard(&state, &uri, params).await
}

// ─── Communities ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommunityResponse {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub country: Option<String>,
    pub language: String,
    pub timezone: String,
    pub can_join: bool,
    pub member_count: u32,
}

impl From<Community> for CommunityResponse {
    fn from(c: Community) -> Self {
        Self {
            member_count: c.members.len() as u32,
            handle: c.handle,
            name: c.name,
            description: c.description,
            country: c.country,
            language: c.language,
            timezone: c.timezone,
            can_join: c.can_join,
        }
    }
}

/// A community, or 404 if it does not exist or is private.
async fn visible_community(state: &AppState, handle: &str) -> Result<Community> {
    state
        .db
        .get_community(handle)
        .await?
        .filter(|c| c.can_see)
        .ok_or_else(|| AppError::NotFound(format!("Community {}", handle)))
}

async fn get_community(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<CommunityResponse>> {
    Ok(Json(visible_community(&state, &handle).await?.into()))
}
