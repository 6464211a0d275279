use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc};

use crate::category::Category;
use crate::db::ActivityEvent;

use super::summary::{ActivitySummary, DailyActivity, WeekdayMinutes};

/// How many distinct days `daily_data` covers.
const DAILY_WINDOW_DAYS: usize = 30;

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Default)]
struct DayBucket {
    seconds: f64,
    sessions: u32,
    categories: BTreeMap<Category, f64>,
}

/// Fold a window of events into an [`ActivitySummary`].
///
/// Single pass, order independent: shuffling the input produces an
/// identical summary for the same `now`. All calendar gates (day, week,
/// month, year, hour and weekday buckets) are evaluated in UTC against
/// `now`. Accumulation stays in unrounded f64 minutes; rounding happens
/// once, when the output is built, so bucket totals never compound
/// per-event rounding error.
pub fn summarize(events: &[ActivityEvent], now: DateTime<Utc>) -> ActivitySummary {
    let today = now.date_naive();
    let week_start = start_of_week(today);

    let mut today_secs = 0.0_f64;
    let mut week_secs = 0.0_f64;
    let mut month_secs = 0.0_f64;
    let mut year_secs = 0.0_f64;
    let mut hourly_secs = [0.0_f64; 24];
    let mut weekday_secs = [0.0_f64; 7];
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for event in events {
        let secs = event.duration_secs.max(0) as f64;
        let date = event.created_at.date_naive();

        if date == today {
            today_secs += secs;
        }
        if date >= week_start {
            week_secs += secs;
        }
        if date.year() == today.year() && date.month() == today.month() {
            month_secs += secs;
        }
        if date.year() == today.year() {
            year_secs += secs;
        }

        hourly_secs[event.created_at.hour() as usize] += secs;
        weekday_secs[event.created_at.weekday().num_days_from_sunday() as usize] += secs;

        let bucket = days.entry(date).or_default();
        bucket.seconds += secs;
        bucket.sessions += 1;
        *bucket.categories.entry(event.category).or_insert(0.0) += secs;
    }

    let average_daily_minutes = if days.is_empty() {
        0
    } else {
        to_minutes(year_secs / days.len() as f64)
    };

    let mut hourly_distribution = [0u32; 24];
    for (hour, secs) in hourly_secs.iter().enumerate() {
        hourly_distribution[hour] = to_minutes(*secs);
    }

    let weekly_pattern: Vec<WeekdayMinutes> = WEEKDAY_LABELS
        .iter()
        .zip(weekday_secs.iter())
        .map(|(day, secs)| WeekdayMinutes {
            day: (*day).to_string(),
            minutes: to_minutes(*secs),
        })
        .collect();

    let most_active_day = WEEKDAY_LABELS[first_arg_max(&weekday_secs)].to_string();

    let daily_data: Vec<DailyActivity> = days
        .iter()
        .rev()
        .take(DAILY_WINDOW_DAYS)
        .map(|(date, bucket)| DailyActivity {
            date: *date,
            total_minutes: to_minutes(bucket.seconds),
            session_count: bucket.sessions,
            categories: bucket
                .categories
                .iter()
                .map(|(category, secs)| (*category, to_minutes(*secs)))
                .collect(),
        })
        .collect();

    ActivitySummary {
        today_minutes: to_minutes(today_secs),
        week_minutes: to_minutes(week_secs),
        month_minutes: to_minutes(month_secs),
        year_minutes: to_minutes(year_secs),
        average_daily_minutes,
        total_sessions: events.len() as u32,
        most_active_hour: first_arg_max(&hourly_secs) as u8,
        most_active_day,
        daily_data,
        hourly_distribution,
        weekly_pattern,
    }
}

fn to_minutes(secs: f64) -> u32 {
    (secs / 60.0).round() as u32
}

/// Index of the largest value; ties resolve to the earliest index.
fn first_arg_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Most recent Sunday on or before `date`.
fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::category::categorize;
    use crate::db::ActivityType;

    fn event(page: &str, duration_secs: i64, created_at: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent {
            id: Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            page: page.to_string(),
            duration_secs,
            activity_type: ActivityType::PageView,
            category: categorize(page),
            created_at,
        }
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn worked_example() -> (Vec<ActivityEvent>, DateTime<Utc>) {
        let events = vec![
            event("/home", 120, ts(2024, 1, 5, 10, 0)),
            event("/messages", 60, ts(2024, 1, 5, 10, 5)),
            event("/home", 180, ts(2024, 1, 6, 9, 0)),
        ];
        (events, ts(2024, 1, 6, 12, 0))
    }

    #[test]
    fn worked_example_totals_and_histograms() {
        let (events, now) = worked_example();
        let summary = summarize(&events, now);

        assert_eq!(summary.today_minutes, 3);
        assert_eq!(summary.year_minutes, 6);
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.hourly_distribution[9], 3);
        assert_eq!(summary.hourly_distribution[10], 3);
        // Hours 9 and 10 tie; the earlier hour wins.
        assert_eq!(summary.most_active_hour, 9);
        // 2024-01-05 is a Friday, 2024-01-06 a Saturday; they tie at three
        // minutes each and Friday comes first in Sunday-first order.
        assert_eq!(summary.most_active_day, "Fri");
        // 360 seconds over two active days.
        assert_eq!(summary.average_daily_minutes, 3);

        assert_eq!(summary.daily_data.len(), 2);
        let jan5 = &summary.daily_data[1];
        assert_eq!(jan5.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(jan5.session_count, 2);
        assert_eq!(jan5.categories.get(&Category::Feed), Some(&2));
        assert_eq!(jan5.categories.get(&Category::Messaging), Some(&1));
    }

    #[test]
    fn fold_is_permutation_invariant() {
        let (mut events, now) = worked_example();
        let baseline = summarize(&events, now);

        events.reverse();
        assert_eq!(summarize(&events, now), baseline);

        events.rotate_left(1);
        assert_eq!(summarize(&events, now), baseline);
    }

    #[test]
    fn daily_totals_round_trip_the_raw_seconds() {
        let (events, now) = worked_example();
        let summary = summarize(&events, now);

        for day in &summary.daily_data {
            let raw_secs: i64 = events
                .iter()
                .filter(|e| e.created_at.date_naive() == day.date)
                .map(|e| e.duration_secs)
                .sum();
            assert_eq!(day.total_minutes, to_minutes(raw_secs as f64));
        }
    }

    #[test]
    fn rounding_happens_at_output_not_per_event() {
        // 89s + 89s = 178s -> 3 minutes. Rounding each event first would
        // give 1 + 1 = 2.
        let now = ts(2024, 1, 6, 12, 0);
        let events = vec![
            event("/home", 89, ts(2024, 1, 6, 8, 0)),
            event("/home", 89, ts(2024, 1, 6, 8, 30)),
        ];

        let summary = summarize(&events, now);
        assert_eq!(summary.today_minutes, 3);
        assert_eq!(summary.daily_data[0].total_minutes, 3);
    }

    #[test]
    fn week_window_starts_on_sunday() {
        // 2024-03-06 is a Wednesday; its week began Sunday 2024-03-03.
        let now = ts(2024, 3, 6, 12, 0);
        let events = vec![
            event("/home", 600, ts(2024, 3, 3, 10, 0)),  // Sunday: in week
            event("/home", 600, ts(2024, 3, 2, 10, 0)),  // Saturday: out
            event("/home", 600, ts(2024, 3, 5, 10, 0)),  // Tuesday: in week
        ];

        let summary = summarize(&events, now);
        assert_eq!(summary.week_minutes, 20);
        assert_eq!(summary.month_minutes, 30);
    }

    #[test]
    fn daily_data_is_truncated_to_the_most_recent_days() {
        let now = ts(2024, 12, 1, 12, 0);
        let events: Vec<ActivityEvent> = (0..40)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 12, 1)
                    .unwrap()
                    .checked_sub_days(Days::new(i))
                    .unwrap();
                event(
                    "/home",
                    300,
                    Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
                )
            })
            .collect();

        let summary = summarize(&events, now);
        assert_eq!(summary.daily_data.len(), DAILY_WINDOW_DAYS);
        assert_eq!(
            summary.daily_data[0].date,
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
        // Newest first, strictly descending.
        for pair in summary.daily_data.windows(2) {
            assert!(pair[0].date > pair[1].date);
        }
    }

    #[test]
    fn empty_window_produces_a_zero_summary() {
        let summary = summarize(&[], ts(2024, 1, 6, 12, 0));
        assert_eq!(summary.today_minutes, 0);
        assert_eq!(summary.average_daily_minutes, 0);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.most_active_hour, 0);
        assert_eq!(summary.most_active_day, "Sun");
        assert!(summary.daily_data.is_empty());
        assert_eq!(summary.weekly_pattern.len(), 7);
    }
}
