// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Takedown request pipeline.
//!
//! A submission runs: rate limit, validation, target resolution, claim
//! creation (`pending`), and, when a target was found, the removal
//! transaction followed by advancing the claim to `processing`.
//!
//! If the removal commits but the status advance fails, the link stays
//! removed and the claim stays `pending`. The submission still reports
//! `link_removed: true`; the mismatch is logged and the claim shows up in
//! `Database::pending_requests_with_removed_targets` for reconciliation.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::models::{NewTakedownRequest, PublicView, RequestStatus, StatusUpdate, TakedownRequest};
use crate::removal::{RemovalContext, RemovalOutcome, RemovalTransaction};
use crate::resolver::LinkResolver;
use crate::status::StatusQuery;
use crate::store::Database;
use crate::validator::{SubmissionValidator, TakedownSubmission, ValidationResult};
use tracing::{error, info, warn};

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub request: TakedownRequest,
    pub link_removed: bool,
}

/// Owns the limiter, validator and database handle used by the pipeline.
pub struct TakedownService {
    db: Database,
    limiter: RateLimiter,
    validator: SubmissionValidator,
}

impl TakedownService {
    pub fn new(db: Database, limiter: RateLimiter, validator: SubmissionValidator) -> Self {
        Self {
            db,
            limiter,
            validator,
        }
    }

    pub fn from_config(db: Database, config: &Config) -> Self {
        Self::new(
            db,
            RateLimiter::new(config.rate_limit.clone()),
            SubmissionValidator::new(config.validation.clone()),
        )
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Charge one submission to `actor_ip`.
    pub async fn admit(&self, actor_ip: &str) -> Result<()> {
        match self.limiter.check(actor_ip).await {
            RateLimitResult::Allowed { .. } => Ok(()),
            RateLimitResult::Limited { retry_after } => Err(AppError::RateLimited { retry_after }),
        }
    }

    /// Process one takedown submission end to end.
    pub async fn submit(
        &self,
        actor_ip: &str,
        submission: &TakedownSubmission,
    ) -> Result<SubmissionOutcome> {
        self.admit(actor_ip).await?;

        let valid = match self.validator.validate(submission) {
            ValidationResult::Valid(valid) => valid,
            ValidationResult::Invalid(errors) => {
                info!(actor_ip, fields = ?errors.fields().collect::<Vec<_>>(), "Takedown submission rejected");
                return Err(AppError::Validation(errors));
            }
        };

        let target = LinkResolver::new(&self.db)
            .resolve(&valid.target)
            .await
            .map_err(|e| {
                error!(actor_ip, stage = "resolve", error = %e, "Target resolution failed");
                AppError::from(e)
            })?;

        let request = self
            .db
            .create_request(NewTakedownRequest {
                requester_contact: valid.requester_contact.clone(),
                requester_name: valid.requester_name.clone(),
                requester_company: valid.requester_company.clone(),
                target_url: valid.target_url.clone(),
                target_link_id: target.map(|link| link.id).or(valid.target_link_id()),
                target_series_id: target.map(|link| link.series_id),
                work_title: valid.work_title.clone(),
                claim_details: valid.claim_details.clone(),
            })
            .await
            .map_err(|e| {
                error!(actor_ip, stage = "persist", error = %e, "Failed to store takedown request");
                AppError::from(e)
            })?;

        info!(
            request_id = %request.id,
            actor_ip,
            link_id = ?target.map(|link| link.id),
            "Takedown request created"
        );

        let Some(target) = target else {
            return Ok(SubmissionOutcome {
                request,
                link_removed: false,
            });
        };

        let ctx = RemovalContext {
            request_id: request.id,
            requester_contact: &request.requester_contact,
            work_title: &request.work_title,
            actor_ip,
        };
        let outcome = RemovalTransaction::new(&self.db)
            .execute(target.id, &ctx)
            .await
            .map_err(|e| {
                error!(
                    request_id = %request.id,
                    actor_ip,
                    link_id = target.id,
                    stage = "remove",
                    error = %e,
                    "Removal transaction failed, claim left pending"
                );
                e
            })?;

        match outcome {
            RemovalOutcome::Removed { .. } => {}
            RemovalOutcome::AlreadyRemoved => {
                info!(request_id = %request.id, link_id = target.id, "Target already removed, claim left pending");
                return Ok(SubmissionOutcome {
                    request,
                    link_removed: false,
                });
            }
            RemovalOutcome::NotActive { status } => {
                info!(request_id = %request.id, link_id = target.id, link_status = ?status, "Target not active, claim left pending");
                return Ok(SubmissionOutcome {
                    request,
                    link_removed: false,
                });
            }
        }

        match self
            .db
            .advance_status(request.id, RequestStatus::Processing, StatusUpdate::default())
            .await
        {
            Ok(request) => Ok(SubmissionOutcome {
                request,
                link_removed: true,
            }),
            Err(e) => {
                warn!(
                    request_id = %request.id,
                    actor_ip,
                    link_id = target.id,
                    stage = "advance",
                    error = %e,
                    "Link removed but claim status not advanced; needs reconciliation"
                );
                Ok(SubmissionOutcome {
                    request,
                    link_removed: true,
                })
            }
        }
    }

    /// Status lookup for the original submitter.
    pub async fn lookup(&self, claim_id: &str, contact: &str) -> Result<Option<PublicView>> {
        StatusQuery::new(&self.db)
            .lookup_str(claim_id, contact)
            .await
            .map_err(|e| {
                error!(request_id = %claim_id, stage = "lookup", error = %e, "Status lookup failed");
                AppError::from(e)
            })
    }
}
