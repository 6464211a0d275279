use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::category::Category;
use crate::db::models::ActivityType;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_activity_type(value: &str) -> Result<ActivityType> {
    match value {
        "page_view" => Ok(ActivityType::PageView),
        "heartbeat" => Ok(ActivityType::Heartbeat),
        "session_end" => Ok(ActivityType::SessionEnd),
        other => Err(anyhow!("unknown activity type {other}")),
    }
}

pub fn parse_category(value: &str) -> Result<Category> {
    match value {
        "feed" => Ok(Category::Feed),
        "messaging" => Ok(Category::Messaging),
        "videos" => Ok(Category::Videos),
        "discovery" => Ok(Category::Discovery),
        "profile" => Ok(Category::Profile),
        "shopping" => Ok(Category::Shopping),
        "maps" => Ok(Category::Maps),
        "settings" => Ok(Category::Settings),
        "ai" => Ok(Category::Ai),
        "creation" => Ok(Category::Creation),
        "other" => Ok(Category::Other),
        unknown => Err(anyhow!("unknown category {unknown}")),
    }
}
