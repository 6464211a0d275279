//! On-demand summary computation with a stale-read fallback.

use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use log::error;
use tokio::sync::Mutex;

use crate::aggregate::{summarize, ActivitySummary};
use crate::store::EventStore;

/// Recomputes [`ActivitySummary`] from the store and keeps the last good
/// result. A failed read leaves the previous summary in place; recovery is
/// the caller invoking [`refresh`](Self::refresh) again — there is no
/// automatic retry.
pub struct SummaryProvider {
    store: Arc<dyn EventStore>,
    user_id: String,
    last: Mutex<Option<ActivitySummary>>,
}

impl SummaryProvider {
    pub fn new(user_id: impl Into<String>, store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            last: Mutex::new(None),
        }
    }

    /// Re-fold the current calendar year of events. On a read failure the
    /// previous summary (if any) is returned unchanged.
    pub async fn refresh(&self) -> Option<ActivitySummary> {
        let now = Utc::now();

        match self.store.events_since(&self.user_id, start_of_year(now)).await {
            Ok(events) => {
                let summary = summarize(&events, now);
                *self.last.lock().await = Some(summary.clone());
                Some(summary)
            }
            Err(err) => {
                error!(
                    "failed to load activity events for {}: {err:#}",
                    self.user_id
                );
                self.last.lock().await.clone()
            }
        }
    }

    /// The most recent successfully computed summary, without refreshing.
    pub async fn current(&self) -> Option<ActivitySummary> {
        self.last.lock().await.clone()
    }
}

fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
