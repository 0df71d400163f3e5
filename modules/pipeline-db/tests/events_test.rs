//! Integration tests for event insertion and the semantic-dedup ANN query.
//!
//! Requirements: Docker (for Postgres via testcontainers)
//!
//! Run with: cargo test -p pipeline-db --features test-utils --test events_test

#![cfg(feature = "test-utils")]

use chrono::Utc;
use pipeline_common::domain::{Category, Event, EventKind, EventStatus, GeoPoint};
use pipeline_db::{testutil, InsertOutcome};
use uuid::Uuid;

const EMBED_DIM: usize = 768;

fn fixture_event(source_id: Uuid, content_hash: &str, fingerprint: &str) -> Event {
    Event {
        id: Uuid::nil(),
        title: "Trivia Night".to_string(),
        description: "Weekly trivia".to_string(),
        category: Category::Social,
        event_type: EventKind::Anchor,
        venue_name: "The Local".to_string(),
        location: GeoPoint::new(44.9778, -93.2650),
        event_date: Utc::now(),
        event_time: "19:00".to_string(),
        image_url: None,
        source_id,
        event_fingerprint: fingerprint.to_string(),
        content_hash: content_hash.to_string(),
        embedding: None,
        embedding_model: None,
        status: EventStatus::Active,
    }
}

fn vector_near(seed: f32) -> Vec<f32> {
    (0..EMBED_DIM).map(|i| seed + (i as f32) * 1e-6).collect()
}

#[tokio::test]
async fn insert_event_rejects_duplicate_content_hash() {
    let (_container, store) = testutil::postgres_container().await;
    let source_id = store.upsert_source("Test Venue", "https://example.com", true).await.unwrap();

    let first = fixture_event(source_id, "hash-a", "fp-a");
    let outcome = store.insert_event(&first, None).await.unwrap();
    assert!(matches!(outcome, InsertOutcome::Inserted(_)));

    let second = fixture_event(source_id, "hash-a", "fp-b");
    let outcome = store.insert_event(&second, None).await.unwrap();
    assert!(matches!(outcome, InsertOutcome::DuplicateContentHash));
}

#[tokio::test]
async fn insert_event_rejects_duplicate_fingerprint_within_source() {
    let (_container, store) = testutil::postgres_container().await;
    let source_id = store.upsert_source("Test Venue", "https://example.com", true).await.unwrap();

    let first = fixture_event(source_id, "hash-a", "fp-shared");
    store.insert_event(&first, None).await.unwrap();

    let second = fixture_event(source_id, "hash-b", "fp-shared");
    let outcome = store.insert_event(&second, None).await.unwrap();
    assert!(matches!(outcome, InsertOutcome::DuplicateFingerprint));
}

#[tokio::test]
async fn match_events_treats_threshold_as_similarity_not_distance() {
    let (_container, store) = testutil::postgres_container().await;
    let source_id = store.upsert_source("Test Venue", "https://example.com", true).await.unwrap();

    let near = vector_near(0.1);
    let far = vector_near(10.0);

    let mut anchor = fixture_event(source_id, "hash-anchor", "fp-anchor");
    anchor.embedding_model = Some("test-model".to_string());
    let InsertOutcome::Inserted(anchor_id) = store.insert_event(&anchor, Some(&near)).await.unwrap() else {
        panic!("expected fresh insert");
    };

    let mut unrelated = fixture_event(source_id, "hash-unrelated", "fp-unrelated");
    unrelated.embedding_model = Some("test-model".to_string());
    store.insert_event(&unrelated, Some(&far)).await.unwrap();

    // 0.95 similarity == 0.05 distance cutoff: the near-identical vector
    // matches, the far vector (cosine distance close to its full range)
    // does not.
    let matches = store.match_events(&near, 0.95, 5).await.unwrap();
    let ids: Vec<Uuid> = matches.iter().map(|(event, _)| event.id).collect();
    assert!(ids.contains(&anchor_id), "near-identical embedding should match at 0.95 similarity");
    assert_eq!(matches.len(), 1, "the far embedding must not pass a 0.05 distance cutoff");
}
