//! Derived usage summary models.
//!
//! A summary is recomputed fresh from the stored event window on every
//! fetch and never persisted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Totals for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub total_minutes: u32,
    pub session_count: u32,
    /// Minutes per page category for this date; only categories that
    /// actually occurred are present.
    pub categories: BTreeMap<Category, u32>,
}

/// One Sunday-first weekday bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayMinutes {
    /// Three-letter weekday label ("Sun" .. "Sat").
    pub day: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub today_minutes: u32,
    pub week_minutes: u32,
    pub month_minutes: u32,
    pub year_minutes: u32,
    /// Year minutes divided by the number of distinct active days.
    pub average_daily_minutes: u32,
    /// Count of events in the query window.
    pub total_sessions: u32,
    /// First arg-max of the hourly histogram, ascending hour order.
    pub most_active_hour: u8,
    /// Label of the first arg-max weekday bucket, Sunday-first order.
    pub most_active_day: String,
    /// The 30 most recent distinct active days, newest first.
    pub daily_data: Vec<DailyActivity>,
    /// Minutes per hour of day.
    pub hourly_distribution: [u32; 24],
    /// Seven Sunday-first weekday buckets.
    pub weekly_pattern: Vec<WeekdayMinutes>,
}
