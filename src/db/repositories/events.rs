use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_activity_type, parse_category, parse_datetime},
    models::ActivityEvent,
};
use crate::settings::TrackerSettings;

fn row_to_event(row: &Row) -> Result<ActivityEvent> {
    let activity_type: String = row.get("activity_type")?;
    let category: String = row.get("category")?;
    let created_at: String = row.get("created_at")?;

    Ok(ActivityEvent {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        page: row.get("page")?,
        duration_secs: row.get("duration_secs")?,
        activity_type: parse_activity_type(&activity_type)?,
        category: parse_category(&category)?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Append one event. Rows are never updated afterwards.
    pub async fn insert_event(&self, event: &ActivityEvent) -> Result<()> {
        let record = event.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO activity_events (id, user_id, page, duration_secs, activity_type, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.user_id,
                    record.page,
                    record.duration_secs,
                    record.activity_type.as_str(),
                    record.category.as_str(),
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All of one user's events with `created_at >= since`, newest first.
    pub async fn events_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>> {
        let user_id = user_id.to_string();
        let since = since.to_rfc3339();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, page, duration_secs, activity_type, category, created_at
                 FROM activity_events
                 WHERE user_id = ?1 AND created_at >= ?2
                 ORDER BY created_at DESC",
            )?;

            let mut rows = stmt.query(params![user_id, since])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_event(row)?);
            }

            Ok(events)
        })
        .await
    }

    /// Drop every event older than the configured retention window.
    pub async fn apply_retention(&self, settings: &TrackerSettings) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(settings.retention_days));
        self.delete_events_before(cutoff).await
    }

    /// Retention purge: drop every event older than `cutoff` across all
    /// users. Returns the number of rows removed.
    pub async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = cutoff.to_rfc3339();
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM activity_events WHERE created_at < ?1",
                params![cutoff],
            )?;
            Ok(removed)
        })
        .await
    }
}
