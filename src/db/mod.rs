// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const TRAINERS: &str = "trainers";
    /// Lower-cased nickname -> owning trainer (uniqueness reservation)
    pub const NICKNAMES: &str = "nicknames";
    pub const UPDATES: &str = "updates";
    pub const TARGETS: &str = "targets";
    /// Communities (keyed by handle)
    pub const COMMUNITIES: &str = "communities";
}
