// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (CORS origin, trainer profile links)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Leaderboard page size when the request gives no `limit`
    pub leaderboard_page_size: u32,
    /// Requests asking for more than this are clamped
    pub leaderboard_max_page_size: u32,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let leaderboard_max_page_size = parse_var("LEADERBOARD_MAX_PAGE_SIZE", 1000)?;
        let leaderboard_page_size = parse_var("LEADERBOARD_PAGE_SIZE", 100)?;
        if leaderboard_page_size == 0 || leaderboard_page_size > leaderboard_max_page_size {
            return Err(ConfigError::Invalid("LEADERBOARD_PAGE_SIZE"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8080)?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
            leaderboard_page_size,
            leaderboard_max_page_size,
        })
    }

    /// Config for tests; no environment access.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            leaderboard_page_size: 100,
            leaderboard_max_page_size: 1000,
        }
    }

    /// Public profile link for a trainer.
    pub fn profile_url(&self, trainer_id: u64) -> String {
        format!(
            "{}/trainers/{}",
            self.frontend_url.trim_end_matches('/'),
            trainer_id
        )
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
