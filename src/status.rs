// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim status lookup for the original submitter.
//!
//! A lookup succeeds only when both the claim id and the stored contact
//! match exactly. An unknown id, a malformed id and a wrong contact all
//! produce the same `None`, so the endpoint cannot be used to probe which
//! claim ids exist.
//!
//! Contact comparison is case-sensitive with no normalization: a claim filed
//! as `A@x.com` is not found with `a@x.com`.

use crate::error::StoreError;
use crate::models::PublicView;
use crate::store::Database;
use uuid::Uuid;

/// Looks up a claim on behalf of its submitter.
pub struct StatusQuery<'a> {
    db: &'a Database,
}

impl<'a> StatusQuery<'a> {
    /// Create a status query over `db`.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Public view of the claim, if `contact` matches the one it was filed with.
    pub async fn lookup(&self, claim_id: Uuid, contact: &str) -> Result<Option<PublicView>, StoreError> {
        let request = self.db.find_request_by_id_and_contact(claim_id, contact).await?;
        Ok(request.as_ref().map(PublicView::from))
    }

    /// Lookup from an untrusted id string.
    pub async fn lookup_str(&self, claim_id: &str, contact: &str) -> Result<Option<PublicView>, StoreError> {
        match Uuid::parse_str(claim_id.trim()) {
            Ok(id) => self.lookup(id, contact).await,
            Err(_) => Ok(None),
        }
    }
}
