//! Activity event data model.
//!
//! Events are append-only observations of time spent on a logical page.
//! Once persisted they are never updated; every aggregate is a read-only
//! fold over a queried window of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    PageView,
    Heartbeat,
    SessionEnd,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::PageView => "page_view",
            ActivityType::Heartbeat => "heartbeat",
            ActivityType::SessionEnd => "session_end",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    pub user_id: String,
    pub page: String,
    /// Whole seconds attributed to `page`; never negative.
    pub duration_secs: i64,
    /// Informational tag; the aggregation fold ignores it.
    pub activity_type: ActivityType,
    pub category: Category,
    /// Source of truth for all windowing.
    pub created_at: DateTime<Utc>,
}
