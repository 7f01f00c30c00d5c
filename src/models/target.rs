// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-trainer goals on a monotonic stat.

use crate::models::stats::StatValue;
use crate::models::Update;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A trainer's target, stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Target {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trainer_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub stat: String,
    pub target: StatValue,
    #[serde(default)]
    pub has_reached: bool,
    #[serde(default)]
    pub date_reached: Option<DateTime<Utc>>,
}

impl Target {
    /// Document ID, unique per (trainer, stat, target value).
    pub fn doc_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.trainer_id,
            self.stat,
            urlencoding::encode(&self.target.to_string())
        )
    }

    /// Recompute reached state from a trainer's updates.
    ///
    /// The target counts as reached at the update carrying the smallest value
    /// that meets it. Returns `true` if the state changed.
    pub fn check_reached(&mut self, updates: &[Update]) -> bool {
        let reached_at = updates
            .iter()
            .filter(|u| u.trainer_id == self.trainer_id)
            .filter_map(|u| u.stat(&self.stat).map(|v| (v, u.update_time)))
            .filter(|(v, _)| *v >= self.target)
            .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, time)| time);

        let changed =
            self.has_reached != reached_at.is_some() || self.date_reached != reached_at;

        self.has_reached = reached_at.is_some();
        self.date_reached = reached_at;

        changed
    }
}
