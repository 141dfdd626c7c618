// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for takedown submissions.
//!
//! Each actor key (normally the submitter's network address) gets a counter
//! and a window start. The check and the increment happen under one lock, so
//! concurrent submissions from the same actor cannot both see "under limit".
//!
//! State is process-local. Running more than one instance multiplies the
//! effective limit; a multi-instance deployment needs a shared external
//! counter behind the same `admit` contract.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission admitted
    Allowed {
        /// Admissions left in the current window
        remaining: u32,
        /// Time until the window resets
        reset_in: Duration,
    },
    /// Submission denied until the window resets
    Limited { retry_after: Duration },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Per-actor fixed-window limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a rate limiter that reads time from `clock`.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny one submission for `key`.
    pub async fn admit(&self, key: &str) -> bool {
        self.check(key).await.is_allowed()
    }

    /// Admit or deny one submission for `key`, with timing hints.
    pub async fn check(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now();
        let window_len = self.config.window_duration();
        let max = self.config.max_requests;

        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if max == 0 {
            return RateLimitResult::Limited {
                retry_after: window_len,
            };
        }

        if window.count == 0 || elapsed >= window_len {
            window.count = 1;
            window.started = now;
            return RateLimitResult::Allowed {
                remaining: max.saturating_sub(1),
                reset_in: window_len,
            };
        }

        let reset_in = window_len - elapsed;
        if window.count < max {
            window.count += 1;
            debug!(key, count = window.count, "Submission admitted");
            RateLimitResult::Allowed {
                remaining: max - window.count,
                reset_in,
            }
        } else {
            warn!(key, count = window.count, retry_after_secs = reset_in.as_secs(), "Submission rate limit exceeded");
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        }
    }

    /// Drop windows that have already elapsed.
    pub async fn cleanup(&self) {
        let now = self.clock.now();
        let window_len = self.config.window_duration();

        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| now.saturating_duration_since(window.started) < window_len);
        debug!(removed = before - windows.len(), remaining = windows.len(), "Rate limiter sweep");
    }

    /// Number of actors currently tracked.
    pub async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }
}
