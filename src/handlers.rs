// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the takedown service.

use crate::error::AppError;
use crate::models::PublicView;
use crate::service::TakedownService;
use crate::validator::{FieldErrors, TakedownSubmission};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub service: TakedownService,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Body of a successful submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub request_id: Uuid,
    pub link_removed: bool,
}

/// Query string for a status lookup.
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful status lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub request: PublicView,
}

/// Routes served by the takedown service.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(
            "/takedown-requests",
            get(takedown_status).post(submit_takedown),
        )
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "takedown-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /takedown-requests`
pub async fn submit_takedown(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<TakedownSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let actor_ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    debug!(actor_ip = %actor_ip, "Processing takedown submission");

    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            // Malformed bodies still count against the actor
            state.service.admit(&actor_ip).await?;
            let mut errors = FieldErrors::default();
            errors.add("body", rejection.body_text());
            return Err(AppError::Validation(errors));
        }
    };

    let outcome = state.service.submit(&actor_ip, &submission).await?;
    let message = if outcome.link_removed {
        "Takedown request received. The content has been removed pending review."
    } else {
        "Takedown request received and will be reviewed."
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: message.to_string(),
            request_id: outcome.request.id,
            link_removed: outcome.link_removed,
        }),
    ))
}

/// `GET /takedown-requests?id=<uuid>&email=<contact>`
pub async fn takedown_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> Response {
    let (Some(id), Some(email)) = (
        params.id.filter(|s| !s.is_empty()),
        params.email.filter(|s| !s.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Both id and email query parameters are required" })),
        )
            .into_response();
    };

    match state.service.lookup(&id, &email).await {
        Ok(Some(request)) => (StatusCode::OK, Json(StatusResponse { request })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Takedown request not found" })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Caller address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
