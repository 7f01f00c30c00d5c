// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod community;
pub mod stats;
pub mod target;
pub mod trainer;
pub mod update;

pub use community::Community;
pub use stats::{StatField, StatKind, StatValue, STAT_FIELDS};
pub use target::Target;
pub use trainer::{EligibilityDetail, Faction, Nickname, Trainer};
pub use update::Update;
