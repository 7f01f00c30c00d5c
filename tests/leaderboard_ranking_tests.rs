// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking engine tests.
//!
//! Runs the engine against an in-memory store so every property can be
//! checked without Firestore, including how many store reads happen.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use trainer_tracker::config::Config;
use trainer_tracker::error::AppError;
use trainer_tracker::models::{Faction, StatValue, Trainer, Update};
use trainer_tracker::services::leaderboard::{
    LeaderboardError, LeaderboardOutcome, LeaderboardPage, LeaderboardParams, LeaderboardService,
    LeaderboardStore, Mode, Population,
};

mod common;
use common::{day, eligible_trainer, update_at};

#[derive(Default)]
struct MemoryStore {
    trainers: Vec<Trainer>,
    updates: Vec<Update>,
    reads: AtomicUsize,
}

impl MemoryStore {
    fn new(trainers: Vec<Trainer>, updates: Vec<Update>) -> Self {
        Self {
            trainers,
            updates,
            reads: AtomicUsize::new(0),
        }
    }
}

impl LeaderboardStore for MemoryStore {
    async fn find_trainer(&self, trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.trainers.iter().find(|t| t.id == trainer_id).cloned())
    }

    async fn eligible_trainers(&self, population: &Population) -> Result<Vec<Trainer>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .trainers
            .iter()
            .filter(|t| t.is_leaderboard_eligible() && population.contains(t))
            .cloned()
            .collect())
    }

    async fn updates_for_trainers(&self, trainer_ids: &[u64]) -> Result<Vec<Update>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        // Reverse so the engine never sees updates in insertion order
        Ok(self
            .updates
            .iter()
            .rev()
            .filter(|u| trainer_ids.contains(&u.trainer_id))
            .cloned()
            .collect())
    }
}

/// Store whose every read fails.
struct BrokenStore;

impl LeaderboardStore for BrokenStore {
    async fn find_trainer(&self, _trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        Err(AppError::Database("unavailable".to_string()))
    }

    async fn eligible_trainers(&self, _population: &Population) -> Result<Vec<Trainer>, AppError> {
        Err(AppError::Database("unavailable".to_string()))
    }

    async fn updates_for_trainers(&self, _trainer_ids: &[u64]) -> Result<Vec<Update>, AppError> {
        Err(AppError::Database("unavailable".to_string()))
    }
}

fn service<S: LeaderboardStore>(store: S) -> LeaderboardService<S> {
    LeaderboardService::new(store, &Config::test_default())
}

fn params(stat: &str, mode: Mode) -> LeaderboardParams {
    LeaderboardParams {
        stat: stat.to_string(),
        mode,
        ..Default::default()
    }
}

fn page(outcome: Result<LeaderboardOutcome, LeaderboardError>) -> LeaderboardPage {
    match outcome {
        Ok(LeaderboardOutcome::Page(page)) => page,
        other => panic!("expected a page, got {:?}", other),
    }
}

fn ids(page: &LeaderboardPage) -> Vec<u64> {
    page.entries.iter().map(|e| e.trainer_id).collect()
}

/// Three trainers A=100, B=90, C=80 on total_xp.
fn abc_store() -> MemoryStore {
    MemoryStore::new(
        vec![
            eligible_trainer(1, "Alpha", Faction::Mystic),
            eligible_trainer(2, "Bravo", Faction::Valor),
            eligible_trainer(3, "Charlie", Faction::Instinct),
        ],
        vec![
            update_at(1, day(2024, 1, 1), &[("total_xp", 100)]),
            update_at(2, day(2024, 1, 1), &[("total_xp", 90)]),
            update_at(3, day(2024, 1, 1), &[("total_xp", 80)]),
        ],
    )
}

#[tokio::test]
async fn test_ineligible_trainers_never_ranked() {
    let mut banned = eligible_trainer(10, "Banned", Faction::Valor);
    banned.is_banned = true;
    let unverified = Trainer::new(11, "Unverified", Faction::Valor, day(2020, 1, 1));
    let mut inactive = eligible_trainer(12, "Inactive", Faction::Valor);
    inactive.is_active = false;

    let mut trainers = abc_store().trainers;
    trainers.extend([banned, unverified, inactive]);
    let mut updates = abc_store().updates;
    for id in 10..=12 {
        updates.push(update_at(id, day(2024, 2, 1), &[("total_xp", 1_000_000)]));
    }
    let svc = service(MemoryStore::new(trainers, updates));

    for mode in [Mode::Current, Mode::Legacy] {
        let page = page(svc.leaderboard(&params("total_xp", mode)).await);
        assert_eq!(ids(&page), vec![1, 2, 3], "mode {}", mode);
        assert_eq!(page.total, 3);
    }
}

#[tokio::test]
async fn test_unsortable_stat_rejected() {
    let svc = service(abc_store());

    for stat in ["stardust", "pokedex_total_seen", "not_a_stat", ""] {
        let result = svc.leaderboard(&params(stat, Mode::Current)).await;
        assert!(
            matches!(result, Err(LeaderboardError::InvalidParameter(_))),
            "stat {:?}",
            stat
        );
    }
}

#[tokio::test]
async fn test_invalid_stat_does_not_read_store() {
    let svc = service(abc_store());

    let result = svc.leaderboard(&params("gymbadges_gold", Mode::Legacy)).await;
    assert!(matches!(result, Err(LeaderboardError::InvalidParameter(_))));

    let focused = LeaderboardParams {
        focus: Some(1),
        ..params("stardust", Mode::Current)
    };
    assert!(svc.leaderboard(&focused).await.is_err());

    assert_eq!(svc.store().reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_current_mode_uses_latest_non_null_value() {
    let store = MemoryStore::new(
        vec![eligible_trainer(1, "Alpha", Faction::Mystic)],
        vec![
            update_at(1, day(2024, 1, 1), &[("capture_total", 500)]),
            update_at(1, day(2024, 2, 1), &[("capture_total", 700)]),
            // Later, but silent on capture_total
            update_at(1, day(2024, 3, 1), &[("total_xp", 1)]),
        ],
    );
    let svc = service(store);

    let page = page(svc.leaderboard(&params("capture_total", Mode::Current)).await);

    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].value, StatValue::Integer(700));
    assert_eq!(page.entries[0].datetime, day(2024, 2, 1));
    assert!(page.entries[0].aux.is_empty());
}

#[tokio::test]
async fn test_current_mode_same_time_prefers_later_submission() {
    let mut first = update_at(1, day(2024, 1, 1), &[("total_xp", 100)]);
    first.submission_date = day(2024, 1, 2);
    let mut corrected = update_at(1, day(2024, 1, 1), &[("total_xp", 120)]);
    corrected.submission_date = day(2024, 1, 3);

    let svc = service(MemoryStore::new(
        vec![eligible_trainer(1, "Alpha", Faction::Mystic)],
        vec![corrected, first],
    ));

    let page = page(svc.leaderboard(&params("total_xp", Mode::Current)).await);
    assert_eq!(page.entries[0].value, StatValue::Integer(120));
}

#[tokio::test]
async fn test_legacy_mode_uses_best_value() {
    let store = MemoryStore::new(
        vec![eligible_trainer(1, "Alpha", Faction::Mystic)],
        vec![
            update_at(1, day(2024, 1, 1), &[("total_xp", 10), ("stardust", 900)]),
            update_at(1, day(2024, 2, 1), &[("total_xp", 7), ("stardust", 50)]),
            update_at(1, day(2024, 3, 1), &[("gymbadges_total", 12)]),
        ],
    );
    let svc = service(store);

    let legacy = page(svc.leaderboard(&params("total_xp", Mode::Legacy)).await);
    assert_eq!(legacy.entries[0].value, StatValue::Integer(10));
    assert_eq!(legacy.entries[0].datetime, day(2024, 1, 1));
    assert_eq!(
        legacy.entries[0].aux.get("stardust"),
        Some(&StatValue::Integer(900))
    );
    assert_eq!(
        legacy.entries[0].aux.get("gymbadges_total"),
        Some(&StatValue::Integer(12))
    );
    assert!(!legacy.entries[0].aux.contains_key("gymbadges_gold"));

    let current = page(svc.leaderboard(&params("total_xp", Mode::Current)).await);
    assert_eq!(current.entries[0].value, StatValue::Integer(7));
}

#[tokio::test]
async fn test_legacy_mode_time_is_latest_holding_best() {
    let store = MemoryStore::new(
        vec![eligible_trainer(1, "Alpha", Faction::Mystic)],
        vec![
            update_at(1, day(2024, 1, 1), &[("total_xp", 10)]),
            update_at(1, day(2024, 3, 1), &[("total_xp", 10)]),
            update_at(1, day(2024, 2, 1), &[("total_xp", 7)]),
        ],
    );
    let svc = service(store);

    let legacy = page(svc.leaderboard(&params("total_xp", Mode::Legacy)).await);
    assert_eq!(legacy.entries[0].value, StatValue::Integer(10));
    assert_eq!(legacy.entries[0].datetime, day(2024, 3, 1));
}

#[tokio::test]
async fn test_dense_rank_has_no_gaps() {
    let store = MemoryStore::new(
        (1..=4)
            .map(|id| eligible_trainer(id, &format!("Trainer{}", id), Faction::Valor))
            .collect(),
        vec![
            update_at(1, day(2024, 1, 1), &[("total_xp", 100)]),
            update_at(2, day(2024, 1, 1), &[("total_xp", 100)]),
            update_at(3, day(2024, 1, 1), &[("total_xp", 90)]),
            update_at(4, day(2024, 1, 1), &[("total_xp", 80)]),
        ],
    );
    let svc = service(store);

    let page = page(svc.leaderboard(&params("total_xp", Mode::Current)).await);
    let ranks: Vec<u32> = page.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 1, 2, 3]);
}

#[tokio::test]
async fn test_ties_ordered_by_earliest_then_trainer_id() {
    let store = MemoryStore::new(
        (1..=3)
            .map(|id| eligible_trainer(id, &format!("Trainer{}", id), Faction::Valor))
            .collect(),
        vec![
            update_at(3, day(2024, 1, 1), &[("total_xp", 100)]),
            update_at(1, day(2024, 1, 5), &[("total_xp", 100)]),
            update_at(2, day(2024, 1, 1), &[("total_xp", 100)]),
        ],
    );
    let svc = service(store);

    let page = page(svc.leaderboard(&params("total_xp", Mode::Current)).await);
    assert_eq!(ids(&page), vec![2, 3, 1]);
    assert!(page.entries.iter().all(|e| e.rank == 1));
}

#[tokio::test]
async fn test_ranking_is_idempotent() {
    let svc = service(abc_store());

    for mode in [Mode::Current, Mode::Legacy] {
        let first = page(svc.leaderboard(&params("total_xp", mode)).await);
        let second = page(svc.leaderboard(&params("total_xp", mode)).await);
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn test_focus_redirects_to_centred_window() {
    let svc = service(abc_store());

    let request = LeaderboardParams {
        focus: Some(3),
        limit: Some(2),
        ..params("total_xp", Mode::Current)
    };

    assert_eq!(
        svc.leaderboard(&request).await.unwrap(),
        LeaderboardOutcome::Refocus {
            limit: 2,
            offset: 2
        }
    );

    // The follow-up request shows the focused trainer
    let follow_up = LeaderboardParams {
        focus: None,
        offset: 2,
        ..request
    };
    let page = page(svc.leaderboard(&follow_up).await);
    assert_eq!(ids(&page), vec![3]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_focus_on_missing_trainer_is_not_found() {
    let svc = service(abc_store());

    let request = LeaderboardParams {
        focus: Some(999),
        ..Default::default()
    };

    assert!(matches!(
        svc.leaderboard(&request).await,
        Err(LeaderboardError::NotFound(999))
    ));
}

#[tokio::test]
async fn test_focus_on_banned_trainer_is_not_in_leaderboard() {
    let mut store = abc_store();
    let mut banned = eligible_trainer(4, "Delta", Faction::Valor);
    banned.is_banned = true;
    store.trainers.push(banned);
    store
        .updates
        .push(update_at(4, day(2024, 1, 1), &[("total_xp", 5000)]));
    let svc = service(store);

    let request = LeaderboardParams {
        focus: Some(4),
        ..Default::default()
    };

    match svc.leaderboard(&request).await {
        Err(LeaderboardError::NotInLeaderboard {
            trainer_id,
            profile,
        }) => {
            assert_eq!(trainer_id, 4);
            assert_eq!(profile, "http://localhost:5173/trainers/4");
        }
        other => panic!("expected NotInLeaderboard, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_in_leaderboard_profile_follows_config() {
    let mut config = Config::test_default();
    config.frontend_url = "https://tracker.example/".to_string();
    let svc = LeaderboardService::new(abc_store(), &config);

    let request = LeaderboardParams {
        focus: Some(2),
        ..params("capture_total", Mode::Current)
    };

    match svc.leaderboard(&request).await {
        Err(LeaderboardError::NotInLeaderboard { profile, .. }) => {
            assert_eq!(profile, config.profile_url(2));
            assert_eq!(profile, "https://tracker.example/trainers/2");
        }
        other => panic!("expected NotInLeaderboard, got {:?}", other),
    }
}

#[tokio::test]
async fn test_focus_on_trainer_without_stat_is_not_in_leaderboard() {
    let svc = service(abc_store());

    let request = LeaderboardParams {
        focus: Some(1),
        ..params("capture_total", Mode::Current)
    };

    assert!(matches!(
        svc.leaderboard(&request).await,
        Err(LeaderboardError::NotInLeaderboard { trainer_id: 1, .. })
    ));
}

#[tokio::test]
async fn test_empty_population_is_empty_page() {
    let svc = service(MemoryStore::default());

    let page = page(svc.leaderboard(&params("total_xp", Mode::Legacy)).await);
    assert!(page.entries.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_population_filters() {
    let svc = service(abc_store());

    let by_faction = LeaderboardParams {
        population: Population {
            faction: Some(Faction::Valor),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(ids(&page(svc.leaderboard(&by_faction).await)), vec![2]);

    let by_members = LeaderboardParams {
        population: Population {
            members: Some(HashSet::from([1, 3])),
            ..Default::default()
        },
        ..Default::default()
    };
    let members_page = page(svc.leaderboard(&by_members).await);
    assert_eq!(ids(&members_page), vec![1, 3]);
    // Ranks are within the population
    assert_eq!(members_page.entries[1].rank, 2);
}

#[tokio::test]
async fn test_limit_and_offset() {
    let svc = service(abc_store());

    let zero = LeaderboardParams {
        limit: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        svc.leaderboard(&zero).await,
        Err(LeaderboardError::InvalidParameter(_))
    ));

    let huge = LeaderboardParams {
        limit: Some(1_000_000),
        ..Default::default()
    };
    assert_eq!(page(svc.leaderboard(&huge).await).limit, 1000);

    let default = page(svc.leaderboard(&LeaderboardParams::default()).await);
    assert_eq!(default.limit, 100);

    let second = LeaderboardParams {
        limit: Some(1),
        offset: 1,
        ..Default::default()
    };
    let second = page(svc.leaderboard(&second).await);
    assert_eq!(ids(&second), vec![2]);
    assert_eq!(second.entries[0].rank, 2);
    assert_eq!(second.total, 3);
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let svc = service(BrokenStore);

    let result = svc.leaderboard(&LeaderboardParams::default()).await;
    assert!(matches!(
        result,
        Err(LeaderboardError::Store(AppError::Database(_)))
    ));
}
