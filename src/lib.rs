//! Client-side activity and session-time aggregation.
//!
//! The embedding application feeds navigation and visibility signals into
//! an [`ActivityTracker`]; the tracker turns them into non-overlapping
//! duration events, flushes long sessions with periodic heartbeats, and
//! appends everything to an [`EventStore`]. [`SummaryProvider`] folds the
//! current year of stored events into an [`ActivitySummary`] on demand.
//!
//! Logging goes through the `log` facade; initialize `env_logger` (or any
//! other backend) in the embedding application.

pub mod aggregate;
pub mod category;
pub mod db;
pub mod reporting;
pub mod settings;
pub mod store;
pub mod tracker;

pub use aggregate::{summarize, ActivitySummary, DailyActivity, WeekdayMinutes};
pub use category::{categorize, Category};
pub use db::{ActivityEvent, ActivityType, Database};
pub use reporting::SummaryProvider;
pub use settings::{SettingsStore, TrackerSettings};
pub use store::{EventStore, MemoryEventStore};
pub use tracker::{ActivityTracker, ClosedSpan, ErrorSink, SessionState};
