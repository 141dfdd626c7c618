// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Takedown Service
//!
//! Serves `POST /takedown-requests` for claim intake and
//! `GET /takedown-requests?id=..&email=..` for status lookups.
//!
//! ## Configuration
//!
//! Read from the environment (a `.env` file is honoured):
//!
//! - `TAKEDOWN_BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `TAKEDOWN_RATE_LIMIT__MAX_REQUESTS`: Submissions per window per actor (default: 5)
//! - `TAKEDOWN_RATE_LIMIT__WINDOW_SECS`: Window length (default: 3600)
//! - `TAKEDOWN_RATE_LIMIT__SWEEP_INTERVAL_SECS`: Expired window sweep (default: 300)
//!
//! The rate limiter keeps its counters in process memory; run a single
//! instance or the per-actor limit is multiplied by the instance count.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use takedown_service::{
    handlers::{router, AppState},
    Config, Database, TakedownService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Starting takedown service"
    );

    let db = Database::new();
    let state = Arc::new(AppState {
        service: TakedownService::from_config(db, &config),
    });

    // Sweep expired rate limit windows
    let sweep_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweep_state.service.limiter().cleanup().await;
        }
    });

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
