// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Trainers (profiles) and nickname reservations
//! - Updates (stat snapshots, never modified after creation)
//! - Targets (per-trainer goals)
//! - Communities

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Community, Target, Trainer, Update};
use crate::services::leaderboard::Population;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore `in` filters accept at most 30 values.
const IN_FILTER_LIMIT: usize = 30;
const NICKNAME_COMMIT_ATTEMPTS: usize = 3;

/// Reservation document for a lower-cased nickname.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct NicknameReservation {
    trainer_id: u64,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Emulator connection with a dummy token; the emulator ignores auth.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Trainer Operations ──────────────────────────────────────

    /// Get any trainer by ID, including ineligible ones.
    pub async fn get_trainer(&self, trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRAINERS)
            .obj()
            .one(&trainer_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a trainer only if it passes the eligibility filter.
    pub async fn get_eligible_trainer(&self, trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        Ok(self
            .get_trainer(trainer_id)
            .await?
            .filter(Trainer::is_leaderboard_eligible))
    }

    /// Eligible trainers inside a population.
    ///
    /// Every listing of trainers goes through here, so banned, unverified,
    /// and deactivated trainers are never returned.
    pub async fn get_eligible_trainers(
        &self,
        population: &Population,
    ) -> Result<Vec<Trainer>, AppError> {
        let faction = population.faction;
        let country = population.country.clone();

        let trainers: Vec<Trainer> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRAINERS)
            .filter(move |q| {
                q.for_all([
                    q.field("is_verified").eq(true),
                    q.field("is_banned").eq(false),
                    q.field("is_active").eq(true),
                    faction.and_then(|f| q.field("faction").eq(f.as_str())),
                    country.as_ref().and_then(|c| q.field("country").eq(c.clone())),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(trainers
            .into_iter()
            .filter(|t| t.is_leaderboard_eligible() && population.contains(t))
            .collect())
    }

    /// Create a trainer, reserving its nickname.
    pub async fn create_trainer(&self, trainer: &Trainer) -> Result<(), AppError> {
        if self.get_trainer(trainer.id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Trainer {} already exists",
                trainer.id
            )));
        }
        self.save_trainer_with_nickname(trainer).await
    }

    /// Create or update a trainer's profile fields.
    ///
    /// Does not touch nickname reservations; use [`Self::set_nickname`] to
    /// rename.
    pub async fn upsert_trainer(&self, trainer: &Trainer) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TRAINERS)
            .document_id(trainer.id.to_string())
            .object(trainer)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Change a trainer's active nickname.
    ///
    /// Fails with `Conflict` if another trainer has ever used the nickname
    /// in any casing.
    pub async fn set_nickname(&self, trainer_id: u64, nickname: &str) -> Result<Trainer, AppError> {
        let mut trainer = self
            .get_trainer(trainer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trainer {}", trainer_id)))?;

        trainer.set_nickname(nickname);
        self.save_trainer_with_nickname(&trainer).await?;

        tracing::info!(trainer_id, nickname, "Nickname changed");
        Ok(trainer)
    }

    /// Write a trainer together with the reservation of its active nickname.
    ///
    /// The reservation is read inside the transaction, so two trainers
    /// claiming the same nickname cannot both commit. An aborted commit is
    /// retried; the retry then sees the winner's reservation.
    async fn save_trainer_with_nickname(&self, trainer: &Trainer) -> Result<(), AppError> {
        let mut attempt = 1;
        loop {
            match self.try_save_trainer_with_nickname(trainer).await? {
                Ok(()) => return Ok(()),
                Err(e) if attempt < NICKNAME_COMMIT_ATTEMPTS => {
                    tracing::warn!(
                        trainer_id = trainer.id,
                        attempt,
                        error = %e,
                        "Nickname transaction aborted, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }
    }

    /// One attempt at [`Self::save_trainer_with_nickname`]. The inner result
    /// is the outcome of the commit.
    async fn try_save_trainer_with_nickname(
        &self,
        trainer: &Trainer,
    ) -> Result<Result<(), firestore::errors::FirestoreError>, AppError> {
        let client = self.get_client()?;
        let key = trainer.username.to_lowercase();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads through this client are tracked by the transaction
        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let existing: Option<NicknameReservation> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::NICKNAMES)
            .obj()
            .one(&key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(reservation) = existing {
            if reservation.trainer_id != trainer.id {
                let _ = transaction.rollback().await;
                return Err(AppError::Conflict(format!(
                    "Nickname '{}' is already taken",
                    trainer.username
                )));
            }
        }

        client
            .fluent()
            .update()
            .in_col(collections::NICKNAMES)
            .document_id(&key)
            .object(&NicknameReservation {
                trainer_id: trainer.id,
            })
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add nickname to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::TRAINERS)
            .document_id(trainer.id.to_string())
            .object(trainer)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add trainer to transaction: {}", e))
            })?;

        Ok(transaction.commit().await.map(|_| ()))
    }

    // ─── Update Operations ───────────────────────────────────────

    /// Store a new Update.
    pub async fn create_update(&self, update: &Update) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::UPDATES)
            .document_id(update.uuid.to_string())
            .object(update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All Updates for a trainer, newest `update_time` first.
    pub async fn get_updates_for_trainer(&self, trainer_id: u64) -> Result<Vec<Update>, AppError> {
        let mut updates: Vec<Update> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::UPDATES)
            .filter(|q| q.for_all([q.field("trainer_id").eq(trainer_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        updates.sort_by(|a, b| {
            b.update_time
                .cmp(&a.update_time)
                .then(b.submission_date.cmp(&a.submission_date))
        });
        Ok(updates)
    }

    /// Most recent Update for a trainer.
    pub async fn get_latest_update(&self, trainer_id: u64) -> Result<Option<Update>, AppError> {
        Ok(self
            .get_updates_for_trainer(trainer_id)
            .await?
            .into_iter()
            .next())
    }

    /// All Updates owned by any of the given trainers.
    ///
    /// Chunked to fit Firestore's `in` filter limit; chunks are fetched
    /// concurrently.
    pub async fn get_updates_for_trainers(
        &self,
        trainer_ids: &[u64],
    ) -> Result<Vec<Update>, AppError> {
        let client = self.get_client()?;

        let futures: Vec<_> = trainer_ids
            .chunks(IN_FILTER_LIMIT)
            .map(|chunk| async move {
                let ids = chunk.to_vec();
                client
                    .fluent()
                    .select()
                    .from(collections::UPDATES)
                    .filter(move |q| q.for_all([q.field("trainer_id").is_in(ids.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .collect();

        let chunks: Vec<Vec<Update>> = stream::iter(futures)
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Vec<Update>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<_, AppError>>()?;

        Ok(chunks.into_iter().flatten().collect())
    }

    // ─── Target Operations ───────────────────────────────────────

    pub async fn get_targets_for_trainer(&self, trainer_id: u64) -> Result<Vec<Target>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TARGETS)
            .filter(|q| q.for_all([q.field("trainer_id").eq(trainer_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a new Target; a (trainer, stat, value) triple may exist once.
    pub async fn create_target(&self, target: &Target) -> Result<(), AppError> {
        let doc_id = target.doc_id();
        let existing: Option<Target> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TARGETS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Target {} {} already exists",
                target.stat, target.target
            )));
        }

        self.set_targets(std::slice::from_ref(target)).await
    }

    /// Write multiple Targets.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn set_targets(&self, targets: &[Target]) -> Result<(), AppError> {
        let client = self.get_client()?;

        let futures: Vec<_> = targets
            .iter()
            .map(|target| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::TARGETS)
                    .document_id(target.doc_id())
                    .object(target)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .collect();

        stream::iter(futures)
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Community Operations ────────────────────────────────────

    pub async fn get_community(&self, handle: &str) -> Result<Option<Community>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMMUNITIES)
            .obj()
            .one(handle)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_community(&self, community: &Community) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COMMUNITIES)
            .document_id(&community.handle)
            .object(community)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
