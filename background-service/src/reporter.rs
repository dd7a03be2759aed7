//! Timer-driven loop that logs a snapshot of the aggregate statistics.
//!
//! The reporter owns a fixed request window: every tick spends one unit of
//! budget, and once `max_requests` units are spent inside one window the
//! loop sleeps until the window has elapsed. Both the tick sleep and the
//! throttle sleep stop as soon as the cancellation token fires.

use crate::engine::FetchEngine;
use stats_core::ReporterConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Running,
    Throttled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterStatus {
    pub state: ReporterState,
    pub ticks: u64,
    pub request_count: u32,
}

/// Local request budget: `max_requests` per `window_length`.
#[derive(Debug, Clone)]
pub struct RateWindow {
    request_count: u32,
    window_start: Instant,
    max_requests: u32,
    window_length: Duration,
}

impl RateWindow {
    pub fn new(max_requests: u32, window_length: Duration, now: Instant) -> Self {
        Self {
            request_count: 0,
            window_start: now,
            max_requests,
            window_length,
        }
    }

    /// Start a new window if the current one is older than `window_length`.
    /// Returns whether a reset happened.
    pub fn roll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) > self.window_length {
            self.restart(now);
            true
        } else {
            false
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.request_count = 0;
        self.window_start = now;
    }

    pub fn is_exhausted(&self) -> bool {
        self.request_count >= self.max_requests
    }

    /// Time left until the current window elapses.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.window_length
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }

    pub fn record(&mut self) {
        self.request_count = self.request_count.saturating_add(1);
    }

    pub fn request_count(&self) -> u32 {
        self.request_count
    }
}

pub struct PeriodicReporter {
    engine: Arc<FetchEngine>,
    config: ReporterConfig,
    status_tx: watch::Sender<ReporterStatus>,
}

impl PeriodicReporter {
    pub fn new(engine: Arc<FetchEngine>, config: ReporterConfig) -> Self {
        let (status_tx, _) = watch::channel(ReporterStatus {
            state: ReporterState::Running,
            ticks: 0,
            request_count: 0,
        });

        Self {
            engine,
            config,
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReporterStatus> {
        self.status_tx.subscribe()
    }

    /// Run until `cancel` fires. A panic inside a tick ends the task; the
    /// reporter does not restart itself.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval = ?self.config.tick_interval,
            max_requests = self.config.max_requests,
            window = ?self.config.window_length,
            "Periodic reporter started"
        );

        let mut window = RateWindow::new(
            self.config.max_requests,
            self.config.window_length,
            Instant::now(),
        );
        let mut ticks: u64 = 0;

        while !cancel.is_cancelled() {
            let now = Instant::now();
            if window.roll(now) {
                debug!("Request window elapsed, budget reset");
            }

            if window.is_exhausted() {
                let wait = window.remaining(now);
                warn!(
                    requests = window.request_count(),
                    wait = ?wait,
                    "Request budget exhausted, throttling"
                );
                self.publish(ReporterState::Throttled, ticks, &window);
                if !sleep_or_cancel(&cancel, wait).await {
                    break;
                }
                window.restart(Instant::now());
                info!("Throttle window elapsed, resuming");
            }

            ticks += 1;
            self.report_snapshot(ticks);
            window.record();
            self.publish(ReporterState::Running, ticks, &window);

            if !sleep_or_cancel(&cancel, self.config.tick_interval).await {
                break;
            }
        }

        info!(ticks, "Periodic reporter stopped");
    }

    fn report_snapshot(&self, tick: u64) {
        match self.engine.top_post() {
            Some(post) => info!(
                tick,
                title = %post.title,
                author = %post.author,
                upvotes = post.upvotes,
                "Top post"
            ),
            None => info!(tick, "Top post: none fetched yet"),
        }
        match self.engine.top_author() {
            Some(author) => info!(
                tick,
                author = %author.name,
                posts = author.post_count,
                "Top author"
            ),
            None => info!(tick, "Top author: none fetched yet"),
        }
    }

    fn publish(&self, state: ReporterState, ticks: u64, window: &RateWindow) {
        self.status_tx.send_replace(ReporterStatus {
            state,
            ticks,
            request_count: window.request_count(),
        });
    }
}

/// Sleep for `duration`; returns `false` if cancelled first.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
