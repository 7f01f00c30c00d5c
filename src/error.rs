// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single problem with one submitted field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    /// Stable machine-readable code, e.g. `insufficient`
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Field name -> problems with that field.
pub type FieldIssues = BTreeMap<String, Vec<FieldIssue>>;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Trainer {trainer_id} is not in this leaderboard")]
    NotInLeaderboard { trainer_id: u64, profile: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(FieldIssues),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldIssues>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match &self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::InvalidParameter(msg)
            | AppError::Conflict(msg) => Some(msg.clone()),
            AppError::NotInLeaderboard { .. } => Some(self.to_string()),
            _ => None,
        };

        let (status, error, profile, fields) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None, None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None, None),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None, None),
            AppError::InvalidParameter(_) => {
                (StatusCode::BAD_REQUEST, "invalid_parameter", None, None)
            }
            AppError::NotInLeaderboard { profile, .. } => (
                StatusCode::BAD_REQUEST,
                "not_in_leaderboard",
                Some(profile),
                None,
            ),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict", None, None),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                None,
                Some(fields),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    None,
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            profile,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let issues = errs
                    .iter()
                    .map(|e| {
                        let message = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value for {}", field));
                        FieldIssue::new("invalid", message)
                    })
                    .collect();
                (field.to_string(), issues)
            })
            .collect();
        AppError::Validation(fields)
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
