// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking engine.
//!
//! Aggregates each eligible trainer's Updates down to a single value for the
//! requested stat, then orders and dense-ranks the result:
//!
//! - `current` mode takes the value from the trainer's most recent Update
//!   that reports the stat.
//! - `legacy` mode takes the best value ever reported, plus the best-ever
//!   value of every reversable stat as auxiliary columns.
//!
//! A request may ask to be centred on one trainer (`focus`). The engine does
//! not answer such a request directly; it tells the caller which window to
//! ask for instead.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::stats::{reversable_fields, sortable_field, StatField, StatValue};
use crate::models::{Community, Faction, Trainer, Update};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How per-trainer values are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Mode {
    /// Most recent reported value
    #[default]
    Current,
    /// Best value ever reported
    Legacy,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Current => "current",
            Mode::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Mode::Current),
            "legacy" => Ok(Mode::Legacy),
            other => Err(LeaderboardError::InvalidParameter(format!(
                "Unknown mode '{}', expected 'current' or 'legacy'",
                other
            ))),
        }
    }
}

/// Which trainers a leaderboard covers. The default is everyone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    pub faction: Option<Faction>,
    /// ISO 3166-1 alpha-2 country code
    pub country: Option<String>,
    /// Restrict to these trainer ids (community membership)
    pub members: Option<HashSet<u64>>,
}

impl Population {
    /// Everyone in a community.
    pub fn community(community: &Community) -> Self {
        Self {
            members: Some(community.members.iter().copied().collect()),
            ..Self::default()
        }
    }

    /// Whether a trainer falls inside this population.
    ///
    /// Eligibility is checked separately by the store.
    pub fn contains(&self, trainer: &Trainer) -> bool {
        self.faction.is_none_or(|f| trainer.faction == f)
            && self
                .country
                .as_deref()
                .is_none_or(|c| trainer.country.as_deref() == Some(c))
            && self
                .members
                .as_ref()
                .is_none_or(|m| m.contains(&trainer.id))
    }
}

/// A single leaderboard request.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardParams {
    pub stat: String,
    pub mode: Mode,
    pub population: Population,
    /// Trainer to centre the page on
    pub focus: Option<u64>,
    /// Page size; `None` uses the configured default
    pub limit: Option<u32>,
    pub offset: u32,
}

impl LeaderboardParams {
    /// The requested stat, if it can order a leaderboard.
    pub fn stat_field(&self) -> Result<&'static StatField, LeaderboardError> {
        sortable_field(&self.stat).ok_or_else(|| {
            LeaderboardError::InvalidParameter(format!("'{}' is not a sortable stat", self.stat))
        })
    }
}

impl Default for LeaderboardParams {
    fn default() -> Self {
        Self {
            stat: crate::models::stats::DEFAULT_STAT.to_string(),
            mode: Mode::Current,
            population: Population::default(),
            focus: None,
            limit: None,
            offset: 0,
        }
    }
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trainer_id: u64,
    pub username: String,
    pub faction: Faction,
    pub value: StatValue,
    /// When the value was reported
    pub datetime: DateTime<Utc>,
    /// Best-ever reversable stats (legacy mode only)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aux: BTreeMap<String, StatValue>,
}

/// One page of a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardPage {
    pub stat: String,
    pub mode: Mode,
    /// Number of ranked trainers across all pages
    pub total: u32,
    pub limit: u32,
    pub offset: u32,
    pub entries: Vec<LeaderboardEntry>,
}

/// Result of a leaderboard request.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardOutcome {
    Page(LeaderboardPage),
    /// The focused trainer is on the page at this window; ask again for it.
    Refocus { limit: u32, offset: u32 },
}

/// Leaderboard failures, distinguishable by callers.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("{0}")]
    InvalidParameter(String),

    #[error("Trainer {0} not found")]
    NotFound(u64),

    #[error("Trainer {trainer_id} is not in this leaderboard")]
    NotInLeaderboard { trainer_id: u64, profile: String },

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<LeaderboardError> for AppError {
    fn from(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::InvalidParameter(msg) => AppError::InvalidParameter(msg),
            LeaderboardError::NotFound(id) => AppError::NotFound(format!("Trainer {}", id)),
            LeaderboardError::NotInLeaderboard {
                trainer_id,
                profile,
            } => AppError::NotInLeaderboard {
                trainer_id,
                profile,
            },
            LeaderboardError::Store(e) => e,
        }
    }
}

/// Data the engine reads. Implemented by [`FirestoreDb`].
pub trait LeaderboardStore: Send + Sync {
    /// Any trainer by id, eligible or not.
    fn find_trainer(
        &self,
        trainer_id: u64,
    ) -> impl Future<Output = Result<Option<Trainer>, AppError>> + Send;

    /// Eligible trainers inside a population.
    fn eligible_trainers(
        &self,
        population: &Population,
    ) -> impl Future<Output = Result<Vec<Trainer>, AppError>> + Send;

    /// All Updates owned by the given trainers, in any order.
    fn updates_for_trainers(
        &self,
        trainer_ids: &[u64],
    ) -> impl Future<Output = Result<Vec<Update>, AppError>> + Send;
}

impl LeaderboardStore for FirestoreDb {
    async fn find_trainer(&self, trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        self.get_trainer(trainer_id).await
    }

    async fn eligible_trainers(&self, population: &Population) -> Result<Vec<Trainer>, AppError> {
        self.get_eligible_trainers(population).await
    }

    async fn updates_for_trainers(&self, trainer_ids: &[u64]) -> Result<Vec<Update>, AppError> {
        self.get_updates_for_trainers(trainer_ids).await
    }
}

/// Ranks trainers against a store.
#[derive(Clone)]
pub struct LeaderboardService<S = FirestoreDb> {
    store: S,
    config: Config,
}

impl<S: LeaderboardStore> LeaderboardService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            config: config.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a requested page size against the configured bounds.
    pub fn resolve_limit(&self, limit: Option<u32>) -> Result<u32, LeaderboardError> {
        match limit {
            None => Ok(self.config.leaderboard_page_size),
            Some(0) => Err(LeaderboardError::InvalidParameter(
                "limit must be at least 1".to_string(),
            )),
            Some(n) => Ok(n.min(self.config.leaderboard_max_page_size)),
        }
    }

    /// Build a leaderboard page, or the window to redirect to for `focus`.
    pub async fn leaderboard(
        &self,
        params: &LeaderboardParams,
    ) -> Result<LeaderboardOutcome, LeaderboardError> {
        let field = params.stat_field()?;
        let limit = self.resolve_limit(params.limit)?;

        if let Some(focus) = params.focus {
            if self.store.find_trainer(focus).await?.is_none() {
                return Err(LeaderboardError::NotFound(focus));
            }
        }

        let trainers = self.store.eligible_trainers(&params.population).await?;
        let ids: Vec<u64> = trainers.iter().map(|t| t.id).collect();
        let updates = if ids.is_empty() {
            Vec::new()
        } else {
            self.store.updates_for_trainers(&ids).await?
        };

        let entries = rank_entries(field, params.mode, &trainers, &updates);

        tracing::debug!(
            stat = field.name,
            mode = %params.mode,
            trainers = trainers.len(),
            updates = updates.len(),
            ranked = entries.len(),
            "Leaderboard computed"
        );

        if let Some(focus) = params.focus {
            return match entries.iter().position(|e| e.trainer_id == focus) {
                Some(index) => Ok(LeaderboardOutcome::Refocus {
                    limit,
                    offset: focus_offset(index, limit),
                }),
                None => Err(LeaderboardError::NotInLeaderboard {
                    trainer_id: focus,
                    profile: self.config.profile_url(focus),
                }),
            };
        }

        let total = entries.len() as u32;
        let entries = entries
            .into_iter()
            .skip(params.offset as usize)
            .take(limit as usize)
            .collect();

        Ok(LeaderboardOutcome::Page(LeaderboardPage {
            stat: field.name.to_string(),
            mode: params.mode,
            total,
            limit,
            offset: params.offset,
            entries,
        }))
    }
}

/// Offset of the window of size `limit` that shows 0-based `index`
/// in its middle.
pub fn focus_offset(index: usize, limit: u32) -> u32 {
    let half = limit.div_ceil(2) as usize;
    (index + 1).saturating_sub(half) as u32
}

/// Aggregate, order, and dense-rank eligible trainers by `field`.
///
/// Updates belonging to trainers not in `trainers` (or not eligible) are
/// ignored. The output does not depend on input order.
pub fn rank_entries(
    field: &StatField,
    mode: Mode,
    trainers: &[Trainer],
    updates: &[Update],
) -> Vec<LeaderboardEntry> {
    let eligible: HashMap<u64, &Trainer> = trainers
        .iter()
        .filter(|t| t.is_leaderboard_eligible())
        .map(|t| (t.id, t))
        .collect();

    let mut by_trainer: HashMap<u64, Vec<&Update>> = HashMap::new();
    for update in updates {
        if eligible.contains_key(&update.trainer_id) {
            by_trainer.entry(update.trainer_id).or_default().push(update);
        }
    }

    let mut entries: Vec<LeaderboardEntry> = by_trainer
        .into_iter()
        .filter_map(|(trainer_id, updates)| {
            let (value, datetime) = match mode {
                Mode::Current => latest_value(field.name, &updates)?,
                Mode::Legacy => best_value(field.name, &updates)?,
            };
            let aux = match mode {
                Mode::Current => BTreeMap::new(),
                Mode::Legacy => best_reversables(&updates),
            };
            let trainer = eligible.get(&trainer_id)?;
            Some(LeaderboardEntry {
                rank: 0,
                trainer_id,
                username: trainer.username.clone(),
                faction: trainer.faction,
                value,
                datetime,
                aux,
            })
        })
        .collect();

    entries.sort_by(display_order);
    assign_dense_ranks(&mut entries);
    entries
}

/// Value descending, then earliest achiever, then trainer id.
fn display_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.value
        .cmp(&a.value)
        .then(a.datetime.cmp(&b.datetime))
        .then(a.trainer_id.cmp(&b.trainer_id))
}

/// Entries must already be sorted by value descending.
fn assign_dense_ranks(entries: &mut [LeaderboardEntry]) {
    let mut rank = 0;
    let mut previous: Option<StatValue> = None;
    for entry in entries {
        if previous != Some(entry.value) {
            rank += 1;
            previous = Some(entry.value);
        }
        entry.rank = rank;
    }
}

/// Value of the most recent Update reporting `stat`.
fn latest_value(stat: &str, updates: &[&Update]) -> Option<(StatValue, DateTime<Utc>)> {
    updates
        .iter()
        .filter_map(|u| u.stat(stat).map(|v| (v, *u)))
        .max_by(|(_, a), (_, b)| {
            a.update_time
                .cmp(&b.update_time)
                .then(a.submission_date.cmp(&b.submission_date))
                .then(a.uuid.cmp(&b.uuid))
        })
        .map(|(v, u)| (v, u.update_time))
}

/// Best value ever reported for `stat`, with the latest time it was held.
fn best_value(stat: &str, updates: &[&Update]) -> Option<(StatValue, DateTime<Utc>)> {
    updates
        .iter()
        .filter_map(|u| u.stat(stat).map(|v| (v, u.update_time)))
        .max_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
}

fn best_reversables(updates: &[&Update]) -> BTreeMap<String, StatValue> {
    reversable_fields()
        .filter_map(|field| {
            updates
                .iter()
                .filter_map(|u| u.stat(field.name))
                .max()
                .map(|v| (field.name.to_string(), v))
        })
        .collect()
}
