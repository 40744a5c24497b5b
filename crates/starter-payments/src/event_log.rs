//! Webhook Event Log
//!
//! Stripe delivers events at least once. The log is keyed by event ID and
//! consulted before a handler runs so that a redelivered event is
//! acknowledged without running its handler again.
//!
//! A `Processing` claim is a lease: if the delivery that took it never
//! reports back (the request was dropped mid-handler), a redelivery may take
//! the event over once the lease expires.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;

/// How long a `Processing` claim blocks redeliveries
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

/// How long records are kept; Stripe stops retrying an event after 3 days
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Processing state of a logged event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Processing,
    Succeeded,
    /// Unhandled event type
    Ignored,
    Failed,
}

/// A logged webhook event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: String,
    pub status: EventStatus,
    pub attempts: u32,
    /// Set on every claim and completion
    pub updated_at: DateTime<Utc>,
    pub error: Option<String>,
}

/// Event log storage trait
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Atomically claim an event for processing.
    ///
    /// Returns `false` if the event is already being processed or has
    /// completed. An event whose last attempt failed, or whose processing
    /// claim has gone stale, can be claimed again.
    async fn claim(&self, event_id: &str, event_type: &str) -> Result<bool>;

    /// Record the outcome of a claimed event
    async fn complete(&self, event_id: &str, status: EventStatus, error: Option<String>) -> Result<()>;

    /// Get an event record by ID
    async fn get(&self, event_id: &str) -> Result<Option<EventRecord>>;
}

/// In-memory event log (for development)
pub struct MemoryEventLog {
    records: Mutex<HashMap<String, EventRecord>>,
    lease: TimeDelta,
    retention: TimeDelta,
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self {
            records: Mutex::default(),
            lease: span(DEFAULT_LEASE),
            retention: span(DEFAULT_RETENTION),
        }
    }
}

fn span(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = span(lease);
        self
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = span(retention);
        self
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn prune(&self, records: &mut HashMap<String, EventRecord>, now: DateTime<Utc>) {
        let before = records.len();
        records.retain(|_, record| now - record.updated_at < self.retention);

        let evicted = before - records.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Pruned expired webhook events");
        }
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn claim(&self, event_id: &str, event_type: &str) -> Result<bool> {
        let now = Utc::now();
        let mut records = self.records.lock().await;
        self.prune(&mut records, now);

        if let Some(record) = records.get_mut(event_id) {
            let reclaimable = match record.status {
                EventStatus::Failed => true,
                EventStatus::Processing => now - record.updated_at >= self.lease,
                EventStatus::Succeeded | EventStatus::Ignored => false,
            };
            if !reclaimable {
                return Ok(false);
            }
            if record.status == EventStatus::Processing {
                tracing::warn!(event_id, attempts = record.attempts, "Taking over stale webhook claim");
            }
            record.status = EventStatus::Processing;
            record.attempts += 1;
            record.updated_at = now;
            record.error = None;
            return Ok(true);
        }

        records.insert(
            event_id.to_string(),
            EventRecord {
                event_id: event_id.to_string(),
                event_type: event_type.to_string(),
                status: EventStatus::Processing,
                attempts: 1,
                updated_at: now,
                error: None,
            },
        );
        Ok(true)
    }

    async fn complete(&self, event_id: &str, status: EventStatus, error: Option<String>) -> Result<()> {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(event_id) {
            record.status = status;
            record.error = error;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get(&self, event_id: &str) -> Result<Option<EventRecord>> {
        Ok(self.records.lock().await.get(event_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_once() {
        let log = MemoryEventLog::new();
        assert!(log.claim("evt_1", "invoice.payment_failed").await.unwrap());
        assert!(!log.claim("evt_1", "invoice.payment_failed").await.unwrap());

        log.complete("evt_1", EventStatus::Succeeded, None).await.unwrap();
        assert!(!log.claim("evt_1", "invoice.payment_failed").await.unwrap());
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_event_can_be_reclaimed() {
        let log = MemoryEventLog::new();
        log.claim("evt_2", "customer.subscription.updated").await.unwrap();
        log.complete("evt_2", EventStatus::Failed, Some("boom".into())).await.unwrap();

        assert!(log.claim("evt_2", "customer.subscription.updated").await.unwrap());
        let record = log.get("evt_2").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Processing);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn test_stale_claim_can_be_taken_over() {
        let log = MemoryEventLog::new().with_lease(Duration::ZERO);
        assert!(log.claim("evt_3", "invoice.payment_succeeded").await.unwrap());

        // The first delivery never completed.
        assert!(log.claim("evt_3", "invoice.payment_succeeded").await.unwrap());
        let record = log.get("evt_3").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Processing);
        assert_eq!(record.attempts, 2);

        log.complete("evt_3", EventStatus::Succeeded, None).await.unwrap();
        assert!(!log.claim("evt_3", "invoice.payment_succeeded").await.unwrap());
    }

    #[tokio::test]
    async fn test_live_claim_blocks_redelivery() {
        let log = MemoryEventLog::new();
        assert!(log.claim("evt_4", "customer.subscription.created").await.unwrap());
        assert!(!log.claim("evt_4", "customer.subscription.created").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_records_are_evicted() {
        let log = MemoryEventLog::new().with_retention(Duration::ZERO);
        log.claim("evt_old", "invoice.payment_succeeded").await.unwrap();
        log.complete("evt_old", EventStatus::Succeeded, None).await.unwrap();

        log.claim("evt_new", "invoice.payment_succeeded").await.unwrap();
        assert_eq!(log.len().await, 1);
        assert!(log.get("evt_old").await.unwrap().is_none());
        assert!(log.get("evt_new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recent_records_are_kept() {
        let log = MemoryEventLog::new();
        log.claim("evt_a", "invoice.payment_succeeded").await.unwrap();
        log.complete("evt_a", EventStatus::Succeeded, None).await.unwrap();
        log.claim("evt_b", "invoice.payment_succeeded").await.unwrap();

        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_event() {
        let log = MemoryEventLog::new();
        assert!(log.get("evt_missing").await.unwrap().is_none());
        assert!(log.is_empty().await);
    }
}
