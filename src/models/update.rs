// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Update model: a trainer's self-reported stats at a point in time.

use crate::models::stats::StatValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Stored update record in Firestore. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Update {
    /// Update ID (also used as document ID)
    pub uuid: Uuid,
    /// Owning trainer
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trainer_id: u64,
    /// When the stats were true (trainer-supplied)
    pub update_time: DateTime<Utc>,
    /// When the update was received (server-assigned)
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Where the numbers came from (e.g. "manual", "ocr")
    #[serde(default)]
    pub source: Option<String>,
    /// Stat name -> value; absent stats were not reported.
    #[serde(default)]
    pub stats: BTreeMap<String, StatValue>,
}

impl Update {
    /// Value reported for a stat, if any.
    pub fn stat(&self, name: &str) -> Option<StatValue> {
        self.stats.get(name).copied()
    }

    /// Names of stats reported in this update.
    pub fn reported_stats(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }
}
