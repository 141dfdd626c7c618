// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory persistence for the link catalog, the audit log and takedown
//! requests.
//!
//! All three tables sit behind one lock, which is the transactional boundary
//! the removal path relies on. `Database::begin` takes the write side and
//! returns a `Transaction` that stages link updates and audit appends; only
//! `Transaction::commit` makes them visible. Dropping a transaction without
//! committing discards everything it staged.

use crate::error::{AppError, Result, StoreError};
use crate::models::{
    AuditEntry, Link, LinkId, LinkStatus, NewTakedownRequest, RemovalPayload, RequestStatus,
    StatusUpdate, TakedownRequest, DMCA_REMOVE_ACTION,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::Mutex;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

/// Store operations that can be made to fail in tests.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Begin,
    UpdateLinkStatus,
    AppendAudit,
    Commit,
    CreateRequest,
    AdvanceStatus,
    ReadLink,
}

/// Fail the enclosing call if a fault was injected for `$op`. Compiles to
/// nothing without test helpers.
macro_rules! fail_point {
    ($db:expr, $op:ident) => {
        #[cfg(any(test, feature = "test-helpers"))]
        $db.check_fault(Fault::$op)?;
    };
}

#[derive(Debug, Default)]
struct Tables {
    links: BTreeMap<LinkId, Link>,
    audit_log: Vec<AuditEntry>,
    requests: HashMap<Uuid, TakedownRequest>,
}

/// Database handle. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
    #[cfg(any(test, feature = "test-helpers"))]
    faults: Arc<Mutex<HashSet<Fault>>>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `StoreError::Unavailable`.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn inject_fault(&self, op: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(op);
    }

    #[cfg(any(test, feature = "test-helpers"))]
    fn check_fault(&self, op: Fault) -> std::result::Result<(), StoreError> {
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if faults.remove(&op) {
            return Err(StoreError::Unavailable(format!("{op:?} failed")));
        }
        Ok(())
    }

    /// Start a transaction over the catalog and audit log.
    pub async fn begin(&self) -> std::result::Result<Transaction<'_>, StoreError> {
        fail_point!(self, Begin);
        let guard = self.tables.write().await;
        Ok(Transaction {
            #[cfg(any(test, feature = "test-helpers"))]
            db: self,
            guard,
            staged_links: BTreeMap::new(),
            staged_audit: Vec::new(),
        })
    }

    // Link catalog

    /// Store a link as given, replacing any link with the same id.
    ///
    /// `url_normalized` is taken from the caller; `Link::new` computes it.
    pub async fn insert_link(&self, link: Link) -> std::result::Result<Link, StoreError> {
        let mut tables = self.tables.write().await;
        tables.links.insert(link.id, link.clone());
        Ok(link)
    }

    /// Find a link by id, whatever its status.
    pub async fn get_link(&self, id: LinkId) -> std::result::Result<Option<Link>, StoreError> {
        fail_point!(self, ReadLink);
        let tables = self.tables.read().await;
        Ok(tables.links.get(&id).cloned())
    }

    /// Non-deleted links whose normalized URL equals `normalized`, ordered by
    /// ascending id.
    pub async fn find_links_by_normalized_url(
        &self,
        normalized: &str,
    ) -> std::result::Result<Vec<Link>, StoreError> {
        fail_point!(self, ReadLink);
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .values()
            .filter(|link| link.deleted_at.is_none() && link.url_normalized == normalized)
            .cloned()
            .collect())
    }

    // Audit log

    /// Audit entries recorded against one link, oldest first.
    pub async fn audit_entries_for_link(
        &self,
        link_id: LinkId,
    ) -> std::result::Result<Vec<AuditEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_log
            .iter()
            .filter(|entry| entry.link_id == link_id)
            .cloned()
            .collect())
    }

    /// The whole audit log, oldest first.
    pub async fn audit_entries(&self) -> std::result::Result<Vec<AuditEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.audit_log.clone())
    }

    // Takedown requests

    /// Persist a new claim in `pending` state.
    pub async fn create_request(
        &self,
        fields: NewTakedownRequest,
    ) -> std::result::Result<TakedownRequest, StoreError> {
        fail_point!(self, CreateRequest);

        let request = TakedownRequest {
            id: Uuid::new_v4(),
            requester_contact: fields.requester_contact,
            requester_name: fields.requester_name,
            requester_company: fields.requester_company,
            target_url: fields.target_url,
            target_link_id: fields.target_link_id,
            target_series_id: fields.target_series_id,
            work_title: fields.work_title,
            claim_details: fields.claim_details,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolution_note: None,
        };

        let mut tables = self.tables.write().await;
        tables.requests.insert(request.id, request.clone());
        debug!(request_id = %request.id, "Takedown request stored");
        Ok(request)
    }

    /// Find a claim by id.
    pub async fn get_request(
        &self,
        id: Uuid,
    ) -> std::result::Result<Option<TakedownRequest>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.requests.get(&id).cloned())
    }

    /// Move a claim forward in its lifecycle.
    ///
    /// Writing the status a claim already has is a no-op that returns the
    /// stored record unchanged. Terminal states stamp `resolved_at`.
    pub async fn advance_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        update: StatusUpdate,
    ) -> Result<TakedownRequest> {
        fail_point!(self, AdvanceStatus);

        let mut tables = self.tables.write().await;
        let request = tables
            .requests
            .get_mut(&id)
            .ok_or(StoreError::RequestNotFound(id))?;

        if request.status == status {
            return Ok(request.clone());
        }
        if !request.status.can_advance_to(status) {
            return Err(AppError::InvalidTransition {
                from: request.status,
                to: status,
            });
        }

        request.status = status;
        if status.is_terminal() {
            request.resolved_at = Some(Utc::now());
        }
        if update.resolution_note.is_some() {
            request.resolution_note = update.resolution_note;
        }
        debug!(request_id = %id, status = %status, "Takedown request advanced");
        Ok(request.clone())
    }

    /// Claims currently in `status`, oldest first.
    pub async fn requests_with_status(
        &self,
        status: RequestStatus,
    ) -> std::result::Result<Vec<TakedownRequest>, StoreError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<TakedownRequest> = tables
            .requests
            .values()
            .filter(|request| request.status == status)
            .cloned()
            .collect();
        requests.sort_by_key(|request| request.created_at);
        Ok(requests)
    }

    /// Exact, case-sensitive match on both id and stored contact.
    pub async fn find_request_by_id_and_contact(
        &self,
        id: Uuid,
        contact: &str,
    ) -> std::result::Result<Option<TakedownRequest>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .get(&id)
            .filter(|request| request.requester_contact == contact)
            .cloned())
    }

    /// Claims still `pending` although a `dmca_remove` entry for them has
    /// committed. These need reconciliation outside the request path.
    pub async fn pending_requests_with_removed_targets(
        &self,
    ) -> std::result::Result<Vec<TakedownRequest>, StoreError> {
        let tables = self.tables.read().await;
        let removed_for: HashSet<Uuid> = tables
            .audit_log
            .iter()
            .filter(|entry| entry.action == DMCA_REMOVE_ACTION)
            .filter_map(|entry| {
                serde_json::from_value::<RemovalPayload>(entry.payload.clone())
                    .ok()
                    .map(|payload| payload.request_id)
            })
            .collect();

        let mut stranded: Vec<TakedownRequest> = tables
            .requests
            .values()
            .filter(|request| {
                request.status == RequestStatus::Pending && removed_for.contains(&request.id)
            })
            .cloned()
            .collect();
        stranded.sort_by_key(|request| request.created_at);
        Ok(stranded)
    }
}

/// Staged writes against the catalog and audit log.
pub struct Transaction<'a> {
    #[cfg(any(test, feature = "test-helpers"))]
    db: &'a Database,
    guard: RwLockWriteGuard<'a, Tables>,
    staged_links: BTreeMap<LinkId, Link>,
    staged_audit: Vec<AuditEntry>,
}

impl Transaction<'_> {
    /// Read a link, seeing this transaction's own staged writes.
    pub fn get_link(&self, id: LinkId) -> Option<Link> {
        self.staged_links
            .get(&id)
            .or_else(|| self.guard.links.get(&id))
            .cloned()
    }

    /// Stage a status change for a link.
    pub fn update_link_status(
        &mut self,
        id: LinkId,
        status: LinkStatus,
        deleted_at: Option<DateTime<Utc>>,
    ) -> std::result::Result<Link, StoreError> {
        fail_point!(self.db, UpdateLinkStatus);

        let mut link = self.get_link(id).ok_or(StoreError::LinkNotFound(id))?;
        link.status = status;
        link.deleted_at = deleted_at;
        self.staged_links.insert(id, link.clone());
        Ok(link)
    }

    /// Stage an audit log entry.
    pub fn append_audit(
        &mut self,
        link_id: LinkId,
        action: &str,
        actor_ip: &str,
        payload: serde_json::Value,
    ) -> std::result::Result<AuditEntry, StoreError> {
        fail_point!(self.db, AppendAudit);

        let entry = AuditEntry {
            id: Uuid::new_v4(),
            link_id,
            action: action.to_string(),
            actor_ip: actor_ip.to_string(),
            payload,
            created_at: Utc::now(),
        };
        self.staged_audit.push(entry.clone());
        Ok(entry)
    }

    /// Apply all staged writes at once.
    pub fn commit(mut self) -> std::result::Result<(), StoreError> {
        fail_point!(self.db, Commit);

        let links = std::mem::take(&mut self.staged_links);
        let audit = std::mem::take(&mut self.staged_audit);
        self.guard.links.extend(links);
        self.guard.audit_log.extend(audit);
        Ok(())
    }

    /// Discard all staged writes.
    pub fn rollback(self) {
        debug!(
            links = self.staged_links.len(),
            audit_entries = self.staged_audit.len(),
            "Transaction rolled back"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_request(contact: &str) -> NewTakedownRequest {
        NewTakedownRequest {
            requester_contact: contact.to_string(),
            target_url: Some("https://example.com/ch/1".to_string()),
            work_title: "Book".to_string(),
            claim_details: "This chapter is copied from my book.".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_request_starts_pending() {
        let db = Database::new();
        let request = db.create_request(new_request("a@x.com")).await.unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.resolved_at.is_none());
        assert_eq!(db.get_request(request.id).await.unwrap(), Some(request));
    }

    #[tokio::test]
    async fn test_advance_status_is_idempotent() {
        let db = Database::new();
        let request = db.create_request(new_request("a@x.com")).await.unwrap();

        let first = db
            .advance_status(request.id, RequestStatus::Processing, StatusUpdate::default())
            .await
            .unwrap();
        let second = db
            .advance_status(request.id, RequestStatus::Processing, StatusUpdate::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.status, RequestStatus::Processing);
    }

    #[tokio::test]
    async fn test_advance_status_rejects_backwards_move() {
        let db = Database::new();
        let request = db.create_request(new_request("a@x.com")).await.unwrap();
        db.advance_status(request.id, RequestStatus::Processing, StatusUpdate::default())
            .await
            .unwrap();

        let err = db
            .advance_status(request.id, RequestStatus::Pending, StatusUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_terminal_status_stamps_resolution() {
        let db = Database::new();
        let request = db.create_request(new_request("a@x.com")).await.unwrap();

        let resolved = db
            .advance_status(
                request.id,
                RequestStatus::Resolved,
                StatusUpdate {
                    resolution_note: Some("Content removed permanently".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(resolved.resolved_at.is_some());
        assert_eq!(
            resolved.resolution_note.as_deref(),
            Some("Content removed permanently")
        );
    }

    #[tokio::test]
    async fn test_advance_unknown_request() {
        let db = Database::new();
        let err = db
            .advance_status(Uuid::new_v4(), RequestStatus::Processing, StatusUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::RequestNotFound(_))));
    }

    #[tokio::test]
    async fn test_contact_match_is_case_sensitive() {
        let db = Database::new();
        let request = db.create_request(new_request("a@x.com")).await.unwrap();

        assert!(db
            .find_request_by_id_and_contact(request.id, "a@x.com")
            .await
            .unwrap()
            .is_some());
        assert!(db
            .find_request_by_id_and_contact(request.id, "A@X.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_normalized_url_skips_deleted_and_orders_by_id() {
        let db = Database::new();
        db.insert_link(Link::new(9, 1, "https://example.com/ch/1")).await.unwrap();
        db.insert_link(Link::new(3, 1, "http://EXAMPLE.com/ch/1/")).await.unwrap();
        let mut deleted = Link::new(1, 1, "example.com/ch/1");
        deleted.status = LinkStatus::Removed;
        deleted.deleted_at = Some(Utc::now());
        db.insert_link(deleted).await.unwrap();

        let found = db.find_links_by_normalized_url("example.com/ch/1").await.unwrap();
        let ids: Vec<LinkId> = found.iter().map(|link| link.id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_leaves_no_trace() {
        let db = Database::new();
        db.insert_link(Link::new(1, 1, "example.com/a")).await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            tx.update_link_status(1, LinkStatus::Removed, Some(Utc::now()))
                .unwrap();
            tx.append_audit(1, DMCA_REMOVE_ACTION, "10.0.0.1", json!({}))
                .unwrap();
            assert!(tx.get_link(1).unwrap().is_removed());
        }

        let link = db.get_link(1).await.unwrap().unwrap();
        assert_eq!(link.status, LinkStatus::Active);
        assert!(db.audit_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_applies_both_writes() {
        let db = Database::new();
        db.insert_link(Link::new(1, 1, "example.com/a")).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        tx.update_link_status(1, LinkStatus::Removed, Some(Utc::now()))
            .unwrap();
        tx.append_audit(1, DMCA_REMOVE_ACTION, "10.0.0.1", json!({}))
            .unwrap();
        tx.commit().unwrap();

        assert!(db.get_link(1).await.unwrap().unwrap().is_removed());
        assert_eq!(db.audit_entries_for_link(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let db = Database::new();
        db.insert_link(Link::new(1, 1, "example.com/a")).await.unwrap();
        db.inject_fault(Fault::Commit);

        let mut tx = db.begin().await.unwrap();
        tx.update_link_status(1, LinkStatus::Removed, Some(Utc::now()))
            .unwrap();
        tx.append_audit(1, DMCA_REMOVE_ACTION, "10.0.0.1", json!({}))
            .unwrap();
        assert!(tx.commit().is_err());

        assert_eq!(
            db.get_link(1).await.unwrap().unwrap().status,
            LinkStatus::Active
        );
        assert!(db.audit_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requests_with_status_filters() {
        let db = Database::new();
        let first = db.create_request(new_request("a@x.com")).await.unwrap();
        let second = db.create_request(new_request("b@x.com")).await.unwrap();
        db.advance_status(second.id, RequestStatus::Processing, StatusUpdate::default())
            .await
            .unwrap();

        let pending = db.requests_with_status(RequestStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);
        assert!(db
            .requests_with_status(RequestStatus::Resolved)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_insert_link_keeps_given_normalized_url() {
        let db = Database::new();
        let mut link = Link::new(1, 1, "https://example.com/ch/1");
        link.url_normalized = "catalog/ch/1".to_string();
        db.insert_link(link).await.unwrap();

        assert_eq!(
            db.get_link(1).await.unwrap().unwrap().url_normalized,
            "catalog/ch/1"
        );
        assert_eq!(db.find_links_by_normalized_url("catalog/ch/1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let db = Database::new();
        db.inject_fault(Fault::CreateRequest);

        assert!(db.create_request(new_request("a@x.com")).await.is_err());
        assert!(db.create_request(new_request("a@x.com")).await.is_ok());
    }
}
