// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Write-time checks for submitted Updates.
//!
//! Two layers:
//! - [`validate_update`] enforces hard rules; any failure rejects the write.
//! - [`rate_warnings`] flags implausibly fast progress but never blocks.

use crate::error::{AppError, FieldIssue, FieldIssues};
use crate::models::stats::{stat_field, StatValue};
use crate::models::{Trainer, Update};
use chrono::{DateTime, NaiveDate, Utc};

/// Above this many gym badges the game stops showing the total, so gold
/// may legitimately exceed the reported total.
const MAX_GYMBADGES_VISIBLE: u64 = 1000;

/// Plausible daily progress for a stat.
struct DailyLimit {
    stat: &'static str,
    per_day: f64,
    /// Date the stat was introduced to the game
    introduced: Option<(i32, u32, u32)>,
}

const fn limit(stat: &'static str, per_day: f64) -> DailyLimit {
    DailyLimit {
        stat,
        per_day,
        introduced: None,
    }
}

const fn limit_since(stat: &'static str, per_day: f64, introduced: (i32, u32, u32)) -> DailyLimit {
    DailyLimit {
        stat,
        per_day,
        introduced: Some(introduced),
    }
}

static DAILY_LIMITS: &[DailyLimit] = &[
    limit("total_xp", 10_000_000.0),
    limit("travel_km", 60.0),
    limit("capture_total", 800.0),
    limit("evolved_total", 250.0),
    limit("hatched_total", 60.0),
    limit("pokestops_visited", 500.0),
    limit("big_magikarp", 25.0),
    limit("battle_attack_won", 500.0),
    limit_since("battle_training_won", 100.0, (2018, 12, 13)),
    limit("small_rattata", 25.0),
    limit_since("berries_fed", 100.0, (2017, 6, 22)),
    limit_since("hours_defended", 480.0, (2017, 6, 22)),
    limit_since("raid_battle_won", 100.0, (2017, 6, 26)),
    limit_since("legendary_battle_won", 100.0, (2017, 7, 22)),
    limit_since("challenge_quests", 500.0, (2018, 3, 30)),
    limit_since("trading", 100.0, (2018, 6, 21)),
    // Half the earth's circumference per trade
    limit_since("trading_distance", 1_001_800.0, (2018, 6, 21)),
];

fn push(issues: &mut FieldIssues, field: &str, issue: FieldIssue) {
    issues.entry(field.to_string()).or_default().push(issue);
}

/// Check a new Update against the stat registry and the trainer's history.
///
/// Normalizes each stat in place (e.g. `12` for a decimal stat becomes
/// `12.0`). `history` is every other Update by the same trainer.
pub fn validate_update(update: &mut Update, history: &[Update]) -> Result<(), AppError> {
    let mut issues = FieldIssues::new();

    if update.stats.is_empty() {
        push(
            &mut issues,
            "stats",
            FieldIssue::new("nodata", "At least one stat must be filled in"),
        );
        return Err(AppError::Validation(issues));
    }

    for (name, value) in update.stats.iter_mut() {
        let Some(field) = stat_field(name) else {
            push(
                &mut issues,
                name,
                FieldIssue::new("unknown", format!("'{}' is not a known stat", name)),
            );
            continue;
        };
        match field.normalize(*value) {
            Ok(normalized) => *value = normalized,
            Err(e) => push(&mut issues, name, FieldIssue::new(e.code(), e.to_string())),
        }
    }

    if !issues.is_empty() {
        return Err(AppError::Validation(issues));
    }

    for (name, value) in &update.stats {
        let Some(field) = stat_field(name) else {
            continue;
        };
        if field.reversable {
            continue;
        }

        let others = others_with(name, update, history);
        let earlier_max = others
            .clone()
            .filter(|(_, time)| *time <= update.update_time)
            .map(|(v, _)| v)
            .max();
        let later_min = others
            .filter(|(_, time)| *time > update.update_time)
            .map(|(v, _)| v)
            .min();

        if let Some(earlier) = earlier_max.filter(|e| value < e) {
            push(
                &mut issues,
                name,
                FieldIssue::new(
                    "insufficient",
                    format!(
                        "This value has previously been entered at a higher value ({})",
                        earlier
                    ),
                ),
            );
        }
        if let Some(later) = later_min.filter(|l| value > l) {
            push(
                &mut issues,
                name,
                FieldIssue::new(
                    "exceeds_later",
                    format!("A later update has a lower value ({})", later),
                ),
            );
        }
    }

    if let Some(gold) = update.stat("gymbadges_gold") {
        match update.stat("gymbadges_total") {
            None => push(
                &mut issues,
                "gymbadges_total",
                FieldIssue::new("required", "Required when gymbadges_gold is given"),
            ),
            Some(total) if total < StatValue::Integer(MAX_GYMBADGES_VISIBLE) && gold > total => {
                push(
                    &mut issues,
                    "gymbadges_gold",
                    FieldIssue::new("excessive", "Must not exceed gymbadges_total"),
                )
            }
            Some(_) => {}
        }
    }

    if update.stat("trading_distance").is_some() && update.stat("trading").is_none() {
        push(
            &mut issues,
            "trading",
            FieldIssue::new("required", "Required when trading_distance is given"),
        );
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(issues))
    }
}

/// Values of `stat` in other Updates, with their times.
fn others_with<'a>(
    stat: &'a str,
    update: &'a Update,
    history: &'a [Update],
) -> impl Iterator<Item = (StatValue, DateTime<Utc>)> + Clone + 'a {
    history
        .iter()
        .filter(move |u| u.uuid != update.uuid)
        .filter_map(move |u| u.stat(stat).map(|v| (v, u.update_time)))
}

/// Flag stats whose implied daily average is above a plausible limit.
///
/// The average is measured from the trainer's start (or the date the stat
/// was introduced, whichever is later) and from the most recent earlier
/// Update reporting the stat.
pub fn rate_warnings(trainer: &Trainer, update: &Update, history: &[Update]) -> FieldIssues {
    let mut warnings = FieldIssues::new();
    let start = trainer.effective_start_date();

    for limit in DAILY_LIMITS {
        let Some(value) = update.stat(limit.stat) else {
            continue;
        };

        let introduced = limit
            .introduced
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .map_or(start, |date| date.max(start));
        let mut baselines = vec![(0.0, introduced.and_time(chrono::NaiveTime::MIN).and_utc())];

        if let Some((previous, time)) = others_with(limit.stat, update, history)
            .filter(|(_, time)| *time < update.update_time)
            .max_by_key(|(_, time)| *time)
        {
            baselines.push((previous.as_f64(), time));
        }

        for (base, since) in baselines {
            let days = (update.update_time - since).num_seconds() as f64 / 86_400.0;
            if days <= 0.0 {
                continue;
            }
            let average = (value.as_f64() - base) / days;
            if average >= limit.per_day {
                push(
                    &mut warnings,
                    limit.stat,
                    FieldIssue::new(
                        "high_rate",
                        format!(
                            "Daily average of {:.2} since {} is above the threshold of {}",
                            average,
                            since.date_naive(),
                            limit.per_day
                        ),
                    ),
                );
            }
        }
    }

    if !warnings.is_empty() {
        tracing::info!(
            trainer_id = trainer.id,
            update = %update.uuid,
            stats = ?warnings.keys().collect::<Vec<_>>(),
            "Update has implausible progress rates"
        );
    }

    warnings
}
