// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Integration tests for the takedown pipeline.

use serde_json::json;
use takedown_service::{
    config::{RateLimitConfig, ValidationConfig},
    models::{Link, LinkStatus, RemovalPayload, RequestStatus, DMCA_REMOVE_ACTION},
    removal::{RemovalContext, RemovalOutcome, RemovalTransaction},
    validator::TakedownSubmission,
    AppError, Database, RateLimiter, SubmissionValidator, TakedownService,
};
use tokio_test::assert_ok;

const ACTOR: &str = "203.0.113.9";

fn service(db: Database, max_requests: u32) -> TakedownService {
    TakedownService::new(
        db,
        RateLimiter::new(RateLimitConfig {
            max_requests,
            ..Default::default()
        }),
        SubmissionValidator::new(ValidationConfig::default()),
    )
}

fn submission() -> TakedownSubmission {
    TakedownSubmission {
        requester_contact: Some("a@x.com".to_string()),
        target_url: Some("https://Example.com/ch/1/".to_string()),
        work_title: Some("Book".to_string()),
        claim_details: Some("Chapter one is a verbatim copy of my novel.".to_string()),
        good_faith_statement: Some(json!(true)),
        accuracy_statement: Some(json!(true)),
        ..Default::default()
    }
}

async fn catalog_with(url_normalized: &str) -> Database {
    let db = Database::new();
    let mut link = Link::new(1, 42, "https://example.com/ch/1");
    link.url_normalized = url_normalized.to_string();
    db.insert_link(link).await.unwrap();
    db
}

#[tokio::test]
async fn test_resolved_target_is_removed_and_audited() {
    let db = catalog_with("example.com/ch/1").await;
    let service = service(db.clone(), 10);

    let outcome = assert_ok!(service.submit(ACTOR, &submission()).await);
    assert!(outcome.link_removed);
    assert_eq!(outcome.request.status, RequestStatus::Processing);

    let link = db.get_link(1).await.unwrap().unwrap();
    assert_eq!(link.status, LinkStatus::Removed);
    assert!(link.deleted_at.is_some());

    let entries = db.audit_entries_for_link(1).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, DMCA_REMOVE_ACTION);
    assert_eq!(entries[0].actor_ip, ACTOR);
    let payload: RemovalPayload = serde_json::from_value(entries[0].payload.clone()).unwrap();
    assert_eq!(payload.request_id, outcome.request.id);

    let stored = db.get_request(outcome.request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Processing);
}

#[tokio::test]
async fn test_unresolved_target_leaves_catalog_untouched() {
    let db = catalog_with("example.com/ch/1").await;
    let service = service(db.clone(), 10);

    let mut unmatched = submission();
    unmatched.target_url = Some("https://example.com/ch/2".to_string());

    let outcome = service.submit(ACTOR, &unmatched).await.unwrap();
    assert!(!outcome.link_removed);
    assert_eq!(outcome.request.status, RequestStatus::Pending);
    assert_eq!(outcome.request.target_link_id, None);

    let link = db.get_link(1).await.unwrap().unwrap();
    assert_eq!(link.status, LinkStatus::Active);
    assert!(link.deleted_at.is_none());
    assert!(db.audit_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeat_claim_against_removed_link_adds_no_audit() {
    let db = catalog_with("example.com/ch/1").await;
    let service = service(db.clone(), 10);

    service.submit(ACTOR, &submission()).await.unwrap();

    // By id, the removed link still resolves but is not removed again
    let mut by_id = submission();
    by_id.target_link_id = Some(1);
    let second = service.submit(ACTOR, &by_id).await.unwrap();
    assert!(!second.link_removed);
    assert_eq!(second.request.status, RequestStatus::Pending);

    assert_eq!(db.audit_entries_for_link(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_removal_transaction_twice_is_noop() {
    let db = catalog_with("example.com/ch/1").await;
    let removal = RemovalTransaction::new(&db);
    let ctx = RemovalContext {
        request_id: uuid::Uuid::new_v4(),
        requester_contact: "a@x.com",
        work_title: "Book",
        actor_ip: ACTOR,
    };

    assert!(removal.execute(1, &ctx).await.unwrap().removed());
    assert_eq!(
        removal.execute(1, &ctx).await.unwrap(),
        RemovalOutcome::AlreadyRemoved
    );
    assert_eq!(db.audit_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_applies_before_validation() {
    let service = service(Database::new(), 2);

    let invalid = TakedownSubmission::default();
    for _ in 0..2 {
        let err = service.submit(ACTOR, &invalid).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let err = service.submit(ACTOR, &submission()).await.unwrap_err();
    assert!(matches!(err, AppError::RateLimited { .. }));

    // Another actor is unaffected
    assert_ok!(service.submit("198.51.100.1", &submission()).await);
}

#[tokio::test]
async fn test_status_lookup_after_submission() {
    let db = catalog_with("example.com/ch/1").await;
    let service = service(db, 10);
    let outcome = service.submit(ACTOR, &submission()).await.unwrap();
    let id = outcome.request.id.to_string();

    let view = service.lookup(&id, "a@x.com").await.unwrap().unwrap();
    assert_eq!(view.status, RequestStatus::Processing);
    assert_eq!(view.target_url.as_deref(), Some("https://Example.com/ch/1/"));

    assert!(service.lookup(&id, "someone@else.com").await.unwrap().is_none());
    assert!(service
        .lookup(&uuid::Uuid::new_v4().to_string(), "a@x.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_manual_resolution_after_processing() {
    let db = catalog_with("example.com/ch/1").await;
    let service = service(db.clone(), 10);
    let outcome = service.submit(ACTOR, &submission()).await.unwrap();

    let resolved = db
        .advance_status(
            outcome.request.id,
            RequestStatus::Resolved,
            takedown_service::models::StatusUpdate {
                resolution_note: Some("Upheld".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(resolved.resolved_at.is_some());

    let view = service
        .lookup(&outcome.request.id.to_string(), "a@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, RequestStatus::Resolved);
    assert_eq!(view.resolution_note.as_deref(), Some("Upheld"));
}
