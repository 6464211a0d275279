use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{debug, error, info};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    category::categorize,
    db::models::ActivityEvent,
    settings::TrackerSettings,
    store::EventStore,
};

use super::state::{ClosedSpan, SessionState};

/// Invoked with every failed event write, after the failure has been
/// logged. The default sink does nothing; tests inject their own to
/// observe fire-and-forget failures.
pub type ErrorSink = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

fn noop_sink() -> ErrorSink {
    Arc::new(|_err| {})
}

/// Converts page-occupancy signals into persisted activity events.
///
/// The embedding environment reports visibility and navigation transitions
/// through the methods below; the tracker owns the session state, the
/// heartbeat ticker, and the store dispatch. Writes are fire-and-forget:
/// they never block a transition, are never retried, and a failure only
/// reaches the log and the error sink.
#[derive(Clone)]
pub struct ActivityTracker {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn EventStore>,
    user_id: Arc<str>,
    settings: TrackerSettings,
    ticker: Arc<Mutex<Option<(CancellationToken, JoinHandle<()>)>>>,
    error_sink: ErrorSink,
}

impl ActivityTracker {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn EventStore>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            store,
            user_id: user_id.into().into(),
            settings,
            ticker: Arc::new(Mutex::new(None)),
            error_sink: noop_sink(),
        }
    }

    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = sink;
        self
    }

    /// Spawn the heartbeat ticker. Must be called once before signals are
    /// fed in; a second call without an intervening shutdown is an error.
    pub async fn start(&self) -> Result<()> {
        let mut guard = self.ticker.lock().await;
        if guard.is_some() {
            bail!("activity tracker already started");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let tracker = self.clone();
        let period = Duration::from_secs(self.settings.heartbeat_interval_secs.max(1));

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracker.flush_heartbeat().await;
                    }
                    _ = token_clone.cancelled() => {
                        info!("heartbeat ticker shutting down");
                        break;
                    }
                }
            }
        });

        *guard = Some((cancel_token, handle));
        Ok(())
    }

    /// End any open session and tear the ticker down. The unload path.
    pub async fn shutdown(&self) -> Result<()> {
        self.end_session().await;

        if let Some((token, handle)) = self.ticker.lock().await.take() {
            token.cancel();
            handle
                .await
                .context("heartbeat ticker task failed to join")?;
        }
        Ok(())
    }

    /// Open a session for `page`, closing a still-open one first.
    pub async fn start_session(&self, page: &str) {
        let span = self.state.lock().await.begin(page, Utc::now());
        self.dispatch(span);
    }

    /// Navigation signal. Idempotent against duplicate reports of the page
    /// already being tracked.
    pub async fn track_page_change(&self, page: &str) {
        let span = self.state.lock().await.change_page(page, Utc::now());
        self.dispatch(span);
    }

    /// Close the open session, if any.
    pub async fn end_session(&self) {
        let span = self.state.lock().await.end(Utc::now());
        self.dispatch(span);
    }

    /// The document went hidden; suspend attribution.
    pub async fn on_hidden(&self) {
        self.end_session().await;
    }

    /// The document became visible again; resume on the last known page.
    pub async fn on_visible(&self) {
        let page = {
            let state = self.state.lock().await;
            state.last_page().map(str::to_string)
        };

        if let Some(page) = page {
            self.start_session(&page).await;
        }
    }

    pub async fn is_session_open(&self) -> bool {
        self.state.lock().await.is_open()
    }

    async fn flush_heartbeat(&self) {
        let interval = self.settings.heartbeat_interval_secs.max(1) as i64;
        let span = self.state.lock().await.heartbeat(Utc::now(), interval);
        self.dispatch(span);
    }

    /// Hand a closed span to the store without awaiting the write. Spans
    /// below the configured minimum never reach the store.
    fn dispatch(&self, span: Option<ClosedSpan>) {
        let Some(span) = span else {
            return;
        };

        if span.duration_secs < self.settings.min_event_duration_secs as i64 {
            debug!(
                "dropping {} span for {} ({}s below minimum)",
                span.activity_type.as_str(),
                span.page,
                span.duration_secs
            );
            return;
        }

        let event = ActivityEvent {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.to_string(),
            category: categorize(&span.page),
            page: span.page,
            duration_secs: span.duration_secs,
            activity_type: span.activity_type,
            created_at: span.closed_at,
        };

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.error_sink);
        tokio::spawn(async move {
            if let Err(err) = store.insert_event(&event).await {
                error!(
                    "failed to persist {} event for {}: {err:#}",
                    event.activity_type.as_str(),
                    event.page
                );
                sink(&err);
            }
        });
    }
}
