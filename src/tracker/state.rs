use chrono::{DateTime, Utc};

use crate::db::ActivityType;

/// One closed span of attributed page time, ready to be persisted.
///
/// `closed_at - duration_secs` is the start of the span; consecutive spans
/// from one state machine never overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSpan {
    pub page: String,
    pub duration_secs: i64,
    pub activity_type: ActivityType,
    pub closed_at: DateTime<Utc>,
}

/// In-memory session window over one logical page.
///
/// At most one session is open at any instant. Every transition that
/// closes a window attributes the elapsed time to the page that was open,
/// never to the page being navigated to. All methods take `now` explicitly
/// so the machine is a pure function of its call sequence.
#[derive(Debug, Default)]
pub struct SessionState {
    window_start: Option<DateTime<Utc>>,
    current_page: Option<String>,
    last_page: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.window_start.is_some()
    }

    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    /// Page of the most recent session, retained after the session ends so
    /// a visibility resume can re-open it.
    pub fn last_page(&self) -> Option<&str> {
        self.last_page.as_deref()
    }

    /// Open a session for `page` at `now`, first closing any session that
    /// is still open. The returned span (if any) belongs to the previous
    /// page.
    pub fn begin(&mut self, page: &str, now: DateTime<Utc>) -> Option<ClosedSpan> {
        let closed = self.close_window(ActivityType::PageView, now);
        self.window_start = Some(now);
        self.current_page = Some(page.to_string());
        self.last_page = Some(page.to_string());
        closed
    }

    /// Navigation transition. Duplicate signals for the page already being
    /// tracked are ignored; a real change closes the current window and
    /// opens one for `page`.
    pub fn change_page(&mut self, page: &str, now: DateTime<Utc>) -> Option<ClosedSpan> {
        if self.is_open() && self.current_page.as_deref() == Some(page) {
            return None;
        }
        self.begin(page, now)
    }

    /// Close the open session (if any) with a `session_end` span.
    pub fn end(&mut self, now: DateTime<Utc>) -> Option<ClosedSpan> {
        let closed = self.close_window(ActivityType::SessionEnd, now);
        self.current_page = None;
        closed
    }

    /// Periodic partial flush. When the open window has accumulated at
    /// least `interval_secs`, emit a heartbeat span for the elapsed time
    /// and restart the window at `now`; the session stays open.
    pub fn heartbeat(&mut self, now: DateTime<Utc>, interval_secs: i64) -> Option<ClosedSpan> {
        let start = self.window_start?;
        let page = self.current_page.clone()?;

        let elapsed = (now - start).num_seconds();
        if elapsed < interval_secs {
            return None;
        }

        self.window_start = Some(now);
        Some(ClosedSpan {
            page,
            duration_secs: elapsed,
            activity_type: ActivityType::Heartbeat,
            closed_at: now,
        })
    }

    fn close_window(&mut self, activity_type: ActivityType, now: DateTime<Utc>) -> Option<ClosedSpan> {
        let start = self.window_start.take()?;
        let page = self.current_page.clone()?;

        Some(ClosedSpan {
            page,
            duration_secs: (now - start).num_seconds().max(0),
            activity_type,
            closed_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn assert_non_overlapping(spans: &[ClosedSpan]) {
        let mut intervals: Vec<(i64, i64)> = spans
            .iter()
            .map(|s| {
                let end = s.closed_at.timestamp();
                (end - s.duration_secs, end)
            })
            .collect();
        intervals.sort();
        for pair in intervals.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "spans overlap: {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn page_change_attributes_time_to_previous_page() {
        let mut state = SessionState::new();
        assert!(state.begin("/home", at(0)).is_none());

        let closed = state.change_page("/messages", at(120)).expect("span");
        assert_eq!(closed.page, "/home");
        assert_eq!(closed.duration_secs, 120);
        assert_eq!(closed.activity_type, ActivityType::PageView);
        assert_eq!(state.current_page(), Some("/messages"));
    }

    #[test]
    fn duplicate_page_change_is_a_no_op() {
        let mut state = SessionState::new();
        state.begin("/home", at(0));

        assert!(state.change_page("/home", at(60)).is_none());
        assert!(state.change_page("/home", at(90)).is_none());

        // The original window is still intact.
        let closed = state.end(at(100)).expect("span");
        assert_eq!(closed.duration_secs, 100);
    }

    #[test]
    fn end_emits_session_end_and_remembers_last_page() {
        let mut state = SessionState::new();
        state.begin("/videos", at(0));

        let closed = state.end(at(45)).expect("span");
        assert_eq!(closed.activity_type, ActivityType::SessionEnd);
        assert_eq!(closed.page, "/videos");
        assert!(!state.is_open());
        assert_eq!(state.current_page(), None);
        assert_eq!(state.last_page(), Some("/videos"));

        // A second end with nothing open emits nothing.
        assert!(state.end(at(50)).is_none());
    }

    #[test]
    fn close_events_match_session_boundaries_and_never_overlap() {
        let mut state = SessionState::new();
        let mut spans = Vec::new();

        let mut push = |span: Option<ClosedSpan>| {
            if let Some(span) = span {
                spans.push(span);
            }
        };

        push(state.begin("/home", at(0)));
        push(state.change_page("/messages", at(30)));
        push(state.change_page("/messages", at(40))); // duplicate
        push(state.change_page("/discover", at(75)));
        push(state.end(at(100)));

        // Three boundaries were crossed: home->messages, messages->discover,
        // discover->end.
        assert_eq!(spans.len(), 3);
        assert_eq!(
            spans.iter().map(|s| s.duration_secs).sum::<i64>(),
            100,
            "attributed time must cover the whole run"
        );
        assert_non_overlapping(&spans);
    }

    #[test]
    fn heartbeat_flushes_partial_time_without_closing() {
        let mut state = SessionState::new();
        state.begin("/home", at(0));

        assert!(state.heartbeat(at(10), 30).is_none(), "below interval");

        let hb = state.heartbeat(at(30), 30).expect("heartbeat");
        assert_eq!(hb.duration_secs, 30);
        assert_eq!(hb.activity_type, ActivityType::Heartbeat);
        assert!(state.is_open());

        // The window restarted, so the close only covers the remainder.
        let closed = state.end(at(42)).expect("span");
        assert_eq!(closed.duration_secs, 12);
    }

    #[test]
    fn crash_after_heartbeats_loses_at_most_one_interval() {
        let mut state = SessionState::new();
        let mut logged = 0i64;
        state.begin("/home", at(0));

        // 95 second session with a 30s heartbeat; the process dies at 95s
        // without a clean close.
        for tick in [30, 60, 90] {
            let hb = state.heartbeat(at(tick), 30).expect("heartbeat");
            assert_eq!(hb.duration_secs, 30);
            logged += hb.duration_secs;
        }

        assert_eq!(logged, 90);
        assert!(95 - logged < 30, "loss is bounded by one interval");

        // Had the close happened, it would have covered the remainder.
        let closed = state.end(at(95)).expect("span");
        assert_eq!(closed.duration_secs, 5);
        assert_non_overlapping(&[closed]);
    }

    #[test]
    fn begin_over_an_open_session_closes_the_previous_page() {
        let mut state = SessionState::new();
        state.begin("/home", at(0));

        let closed = state.begin("/profile", at(20)).expect("span");
        assert_eq!(closed.page, "/home");
        assert_eq!(closed.duration_secs, 20);
        assert_eq!(state.current_page(), Some("/profile"));
    }
}
