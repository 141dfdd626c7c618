// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Data models for takedown claims, catalog links and the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog link identifier.
pub type LinkId = i64;

/// Audit action recorded for a safe-harbor removal.
pub const DMCA_REMOVE_ACTION: &str = "dmca_remove";

/// Lifecycle state of a takedown claim.
///
/// Ordering follows the lifecycle: a claim only ever moves to a later state.
/// `Resolved` and `Rejected` are both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Processing,
    Resolved,
    Rejected,
}

impl RequestStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Resolved | Self::Rejected => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward step (or a repeat).
    pub fn can_advance_to(self, next: RequestStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted takedown claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakedownRequest {
    pub id: Uuid,
    pub requester_contact: String,
    pub requester_name: Option<String>,
    pub requester_company: Option<String>,
    pub target_url: Option<String>,
    pub target_link_id: Option<LinkId>,
    /// Series of the resolved link, if one was found at submission time
    pub target_series_id: Option<i64>,
    pub work_title: String,
    pub claim_details: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

/// Fields supplied when creating a claim. Id, status and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewTakedownRequest {
    pub requester_contact: String,
    pub requester_name: Option<String>,
    pub requester_company: Option<String>,
    pub target_url: Option<String>,
    pub target_link_id: Option<LinkId>,
    pub target_series_id: Option<i64>,
    pub work_title: String,
    pub claim_details: String,
}

/// Extra fields written alongside a status change.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub resolution_note: Option<String>,
}

/// Publicly visible projection of a claim, returned to its submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicView {
    pub id: Uuid,
    pub status: RequestStatus,
    pub work_title: String,
    pub target_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

impl From<&TakedownRequest> for PublicView {
    fn from(request: &TakedownRequest) -> Self {
        Self {
            id: request.id,
            status: request.status,
            work_title: request.work_title.clone(),
            target_url: request.target_url.clone(),
            created_at: request.created_at,
            resolved_at: request.resolved_at,
            resolution_note: request.resolution_note.clone(),
        }
    }
}

/// Status of a catalog link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Active,
    Removed,
    Hidden,
    Broken,
}

/// A link in the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub series_id: i64,
    pub url: String,
    pub url_normalized: String,
    pub status: LinkStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<String>,
}

impl Link {
    /// Create an active link, computing its normalized URL.
    pub fn new(id: LinkId, series_id: i64, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id,
            series_id,
            url_normalized: crate::normalize::normalize_url(&url),
            url,
            status: LinkStatus::Active,
            deleted_at: None,
            submitted_by: None,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.status == LinkStatus::Removed
    }
}

/// Payload stored with a `dmca_remove` audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalPayload {
    pub request_id: Uuid,
    pub requester_contact: String,
    pub work_title: String,
    pub reason: String,
}

/// Append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub link_id: LinkId,
    pub action: String,
    pub actor_ip: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
