use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DeadLetterItem, DlqStage};
use crate::error::Result;

/// DLQ stats (§4.9). Alerts when `pending + retrying > 50`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlqStats {
    pub pending: i64,
    pub retrying: i64,
    pub resolved: i64,
    pub discarded: i64,
}

impl DlqStats {
    pub fn alert_threshold_exceeded(&self) -> bool {
        self.pending + self.retrying > 50
    }
}

/// Storage contract for the dead-letter queue (§4.9), matching the
/// operation list 1:1. Implemented by `pipeline-db`'s Postgres adapter and,
/// in tests, by an in-memory fake — same pure/impure split the teacher's
/// `NotifyBackend` trait uses for Slack.
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    async fn add(
        &self,
        original_job_id: Uuid,
        source_id: Uuid,
        stage: DlqStage,
        error_type: &str,
        error_message: &str,
        payload: serde_json::Value,
    ) -> Result<Uuid>;

    async fn items_ready_for_retry(&self, limit: i64) -> Result<Vec<DeadLetterItem>>;
    async fn mark_retrying(&self, id: Uuid) -> Result<()>;
    async fn mark_resolved(&self, id: Uuid) -> Result<()>;
    async fn mark_discarded(&self, id: Uuid, reason: &str) -> Result<()>;
    async fn reset_to_pending(&self, id: Uuid) -> Result<()>;
    async fn stats(&self) -> Result<DlqStats>;
    async fn cleanup_old_items(&self, days_old: i64) -> Result<u64>;
}

/// `next_retry_at = now + 1h * 2^retry_count` — pure, unit-tested independent
/// of any store, per the teacher's preference for pulling schedule math out
/// of the I/O layer (`SourceScheduler`, `dedup_verdict`).
pub fn next_retry_at(now: DateTime<Utc>, retry_count: i32) -> DateTime<Utc> {
    let hours = 2i64.saturating_pow(retry_count.max(0) as u32);
    now + chrono::Duration::hours(hours)
}

/// `retry_count >= max_retries` → discard.
pub fn should_discard(retry_count: i32, max_retries: i32) -> bool {
    retry_count >= max_retries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_retry_doubles_each_attempt() {
        let now = Utc::now();
        assert_eq!(next_retry_at(now, 0), now + chrono::Duration::hours(1));
        assert_eq!(next_retry_at(now, 1), now + chrono::Duration::hours(2));
        assert_eq!(next_retry_at(now, 2), now + chrono::Duration::hours(4));
        assert_eq!(next_retry_at(now, 3), now + chrono::Duration::hours(8));
    }

    #[test]
    fn should_discard_boundary() {
        assert!(!should_discard(2, 3));
        assert!(should_discard(3, 3));
        assert!(should_discard(4, 3));
    }

    #[test]
    fn alert_threshold() {
        let mut s = DlqStats { pending: 30, retrying: 15, ..Default::default() };
        assert!(!s.alert_threshold_exceeded());
        s.retrying = 21;
        assert!(s.alert_threshold_exceeded());
    }
}
