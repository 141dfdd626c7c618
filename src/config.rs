// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the takedown service.
//!
//! Values come from `TAKEDOWN_*` environment variables (optionally via a
//! `.env` file); nested sections use a double underscore, e.g.
//! `TAKEDOWN_RATE_LIMIT__MAX_REQUESTS=10`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the takedown service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Submission rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Submission field bounds
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Fixed-window limit on takedown submissions per actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often the binary sweeps expired windows, in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Length bounds applied to free-text submission fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_work_title_max")]
    pub work_title_max: usize,

    #[serde(default = "default_claim_details_min")]
    pub claim_details_min: usize,

    #[serde(default = "default_claim_details_max")]
    pub claim_details_max: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_work_title_max() -> usize {
    500
}

fn default_claim_details_min() -> usize {
    20
}

fn default_claim_details_max() -> usize {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            work_title_max: default_work_title_max(),
            claim_details_min: default_claim_details_min(),
            claim_details_max: default_claim_details_max(),
        }
    }
}

impl RateLimitConfig {
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Config {
    /// Load from the process environment, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix("TAKEDOWN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
