//! Integration tests for dead-letter queue lifecycle transitions.
//!
//! Requirements: Docker (for Postgres via testcontainers)
//!
//! Run with: cargo test -p pipeline-db --features test-utils --test dlq_test

#![cfg(feature = "test-utils")]

use pipeline_common::domain::DlqStage;
use pipeline_common::DeadLetterStore;
use pipeline_db::testutil;
use serde_json::json;

#[tokio::test]
async fn reset_to_pending_clears_resolution_state() {
    let (_container, store) = testutil::postgres_container().await;
    let source_id = store.upsert_source("Test Venue", "https://example.com", true).await.unwrap();

    let id = store
        .add(
            uuid::Uuid::new_v4(),
            source_id,
            DlqStage::Parse,
            "ParseError",
            "could not find title selector",
            json!({}),
        )
        .await
        .unwrap();

    store.mark_discarded(id, "selector permanently broken").await.unwrap();

    store.reset_to_pending(id).await.unwrap();

    let ready = store.items_ready_for_retry(10).await.unwrap();
    let item = ready.iter().find(|i| i.id == id).expect("reset item should be ready for retry");
    assert_eq!(item.status, pipeline_common::domain::DlqStatus::Pending);
    assert!(item.resolved_at.is_none(), "reset_to_pending must clear resolved_at");
    assert!(item.resolution_notes.is_none(), "reset_to_pending must clear resolution_notes");
}

#[tokio::test]
async fn reset_to_pending_clears_after_resolved_not_just_discarded() {
    let (_container, store) = testutil::postgres_container().await;
    let source_id = store.upsert_source("Test Venue", "https://example.com", true).await.unwrap();

    let id = store
        .add(
            uuid::Uuid::new_v4(),
            source_id,
            DlqStage::Insert,
            "ConstraintViolation",
            "unique violation on content_hash",
            json!({}),
        )
        .await
        .unwrap();

    store.mark_resolved(id).await.unwrap();
    store.reset_to_pending(id).await.unwrap();

    let ready = store.items_ready_for_retry(10).await.unwrap();
    let item = ready.iter().find(|i| i.id == id).expect("reset item should be ready for retry");
    assert!(item.resolved_at.is_none());
    assert!(item.resolution_notes.is_none());
}
