//! Event log store contract.
//!
//! The tracker and the summary provider only ever append events and read
//! a time window of them back, so the seam is two operations. The sqlite
//! [`Database`] is the persistent adapter; [`MemoryEventStore`] backs
//! tests and embedders that do not want a file on disk.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::db::{ActivityEvent, Database};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event; rows are immutable once written.
    async fn insert_event(&self, event: &ActivityEvent) -> Result<()>;

    /// One user's events with `created_at >= since`, newest first.
    async fn events_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>>;
}

#[async_trait]
impl EventStore for Database {
    async fn insert_event(&self, event: &ActivityEvent) -> Result<()> {
        Database::insert_event(self, event).await
    }

    async fn events_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>> {
        Database::events_since(self, user_id, since).await
    }
}

#[derive(Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event in insertion order, regardless of user or age.
    pub async fn all(&self) -> Vec<ActivityEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_event(&self, event: &ActivityEvent) -> Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    async fn events_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>> {
        let mut events: Vec<ActivityEvent> = self
            .events
            .lock()
            .await
            .iter()
            .filter(|event| event.user_id == user_id && event.created_at >= since)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }
}
