// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the takedown service.
//!
//! Response bodies carry only generic messages; the error's `Display` output
//! is for logs.

use crate::models::{LinkId, RequestStatus};
use crate::validator::FieldErrors;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Persistence failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("Takedown request not found: {0}")]
    RequestNotFound(Uuid),
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Rate limit exceeded, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Removal transaction failed: {0}")]
    Transaction(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Transaction(_)
            | Self::Store(_)
            | Self::InvalidTransition { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Validation(details) => (
                status,
                Json(json!({
                    "error": "Validation failed",
                    "details": details,
                })),
            )
                .into_response(),
            Self::RateLimited { retry_after } => {
                // Round up so clients never retry a moment too early
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let mut response = (
                    status,
                    Json(json!({
                        "error": "Too many requests",
                        "message": format!(
                            "Too many takedown requests. Please try again in {secs} seconds."
                        ),
                        "retry_after_secs": secs,
                    })),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            Self::Transaction(_)
            | Self::Store(_)
            | Self::InvalidTransition { .. }
            | Self::Internal(_) => (
                status,
                Json(json!({
                    "error": "Internal server error",
                    "message": "Failed to process takedown request",
                })),
            )
                .into_response(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
