// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Safe-harbor removal of a catalog link.
//!
//! The soft delete of the link and its `dmca_remove` audit entry are written
//! in one `Transaction`: both land or neither does. Only an `active` link is
//! removed. A link that is already removed gets no second audit entry, and a
//! link in any other catalog state is left untouched.

use crate::error::{AppError, Result};
use crate::models::{AuditEntry, Link, LinkId, LinkStatus, RemovalPayload, DMCA_REMOVE_ACTION};
use crate::store::Database;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

/// Reason recorded in the audit payload.
pub const REMOVAL_REASON: &str = "DMCA takedown request";

/// Who asked for the removal and why.
#[derive(Debug, Clone)]
pub struct RemovalContext<'a> {
    pub request_id: Uuid,
    pub requester_contact: &'a str,
    pub work_title: &'a str,
    pub actor_ip: &'a str,
}

/// Outcome of a removal attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The link was removed and audited by this call
    Removed { link: Link, audit: AuditEntry },
    /// The link was already removed; nothing was written
    AlreadyRemoved,
    /// The link is neither active nor removed; nothing was written
    NotActive { status: LinkStatus },
}

impl RemovalOutcome {
    pub fn removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}

/// Removes a link and appends its audit entry as one unit.
pub struct RemovalTransaction<'a> {
    db: &'a Database,
}

impl<'a> RemovalTransaction<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn execute(&self, link_id: LinkId, ctx: &RemovalContext<'_>) -> Result<RemovalOutcome> {
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let link = tx
            .get_link(link_id)
            .ok_or_else(|| AppError::Transaction(format!("link {link_id} vanished before removal")))?;
        if link.is_removed() {
            debug!(link_id, request_id = %ctx.request_id, "Link already removed, skipping");
            tx.rollback();
            return Ok(RemovalOutcome::AlreadyRemoved);
        }
        if link.status != LinkStatus::Active {
            debug!(link_id, request_id = %ctx.request_id, status = ?link.status, "Link not active, skipping");
            tx.rollback();
            return Ok(RemovalOutcome::NotActive {
                status: link.status,
            });
        }

        let payload = serde_json::to_value(RemovalPayload {
            request_id: ctx.request_id,
            requester_contact: ctx.requester_contact.to_string(),
            work_title: ctx.work_title.to_string(),
            reason: REMOVAL_REASON.to_string(),
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;

        // An early return drops `tx`, discarding whatever was staged
        let link = tx
            .update_link_status(link_id, LinkStatus::Removed, Some(Utc::now()))
            .map_err(|e| AppError::Transaction(e.to_string()))?;
        let audit = tx
            .append_audit(link_id, DMCA_REMOVE_ACTION, ctx.actor_ip, payload)
            .map_err(|e| AppError::Transaction(e.to_string()))?;
        tx.commit()
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(
            link_id,
            request_id = %ctx.request_id,
            actor_ip = %ctx.actor_ip,
            audit_id = %audit.id,
            "Link removed under takedown request"
        );
        Ok(RemovalOutcome::Removed { link, audit })
    }
}
