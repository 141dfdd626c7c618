// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Takedown Service
//!
//! Accepts copyright takedown claims against catalog links and performs
//! immediate safe-harbor removal when the claimed link is found:
//!
//! - Per-actor fixed-window submission limiting
//! - Field-level validation of claims and sworn statements
//! - Target resolution by link id or normalized URL
//! - Atomic soft delete of the link plus a `dmca_remove` audit entry
//! - Claim lifecycle (`pending` -> `processing` -> `resolved` | `rejected`)
//! - Status lookup restricted to the claim's original contact

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod models;
pub mod normalize;
pub mod removal;
pub mod resolver;
pub mod service;
pub mod status;
pub mod store;
pub mod validator;

pub use config::Config;
pub use error::{AppError, StoreError};
pub use limiter::{RateLimitResult, RateLimiter};
pub use service::{SubmissionOutcome, TakedownService};
pub use store::Database;
pub use validator::{SubmissionValidator, ValidationResult};
