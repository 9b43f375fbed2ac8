//! Periodic driver for [`ReminderChecker`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use utoipa::ToSchema;

use crate::services::reminder_checker::{CheckSummary, CheckerError, ReminderChecker};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub interval_seconds: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_summary: Option<CheckSummary>,
}

#[derive(Default)]
struct LastRun {
    at: Option<DateTime<Utc>>,
    summary: Option<CheckSummary>,
}

struct Inner {
    checker: Arc<ReminderChecker>,
    interval: Duration,
    initial_delay: Duration,
    /// Held for the whole of a pass
    pass_lock: Mutex<()>,
    last_run: Mutex<LastRun>,
    task: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

/// Owns the background reminder task. Clones share the same task.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

impl ReminderScheduler {
    pub fn new(checker: Arc<ReminderChecker>, interval: Duration, initial_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                checker,
                interval,
                initial_delay,
                pass_lock: Mutex::new(()),
                last_run: Mutex::new(LastRun::default()),
                task: Mutex::new(None),
            }),
        }
    }

    /// Spawns the periodic task. The first pass runs after the initial delay.
    pub async fn start(&self) {
        let mut task = self.inner.task.lock().await;
        if task.is_some() {
            tracing::warn!("Reminder scheduler already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let inner = self.inner.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + inner.initial_delay, inner.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        inner.scheduled_pass().await;
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }

            tracing::info!("Reminder scheduler stopped");
        });

        *task = Some((shutdown_tx, handle));
        tracing::info!(
            "Reminder scheduler started, checking every {}s",
            self.inner.interval.as_secs()
        );
    }

    /// Signals the task and waits for it to exit. A pass in flight completes first.
    pub async fn stop(&self) {
        let Some((shutdown_tx, handle)) = self.inner.task.lock().await.take() else {
            return;
        };

        let _ = shutdown_tx.send(true);
        if let Err(err) = handle.await {
            tracing::error!("Reminder scheduler task ended abnormally: {}", err);
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let is_running = self.inner.task.lock().await.is_some();
        let last_run = self.inner.last_run.lock().await;

        SchedulerStatus {
            is_running,
            interval_seconds: self.inner.interval.as_secs(),
            last_run_at: last_run.at,
            last_summary: last_run.summary,
        }
    }

    /// Runs a pass now, waiting for any pass already in flight
    pub async fn trigger_now(&self) -> Result<CheckSummary, CheckerError> {
        let _guard = self.inner.pass_lock.lock().await;
        tracing::info!("Manual reminder check requested");
        self.inner.run_pass().await
    }
}

impl Inner {
    /// Returns false when skipped because another pass holds the lock
    async fn scheduled_pass(&self) -> bool {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            tracing::debug!("Reminder pass already in progress, skipping tick");
            return false;
        };

        if let Err(err) = self.run_pass().await {
            tracing::error!("Scheduled reminder check failed: {}", err);
        }
        true
    }

    async fn run_pass(&self) -> Result<CheckSummary, CheckerError> {
        let now = Utc::now();
        let result = self.checker.run_pass(now).await;

        let mut last_run = self.last_run.lock().await;
        last_run.at = Some(now);
        if let Ok(summary) = &result {
            last_run.summary = Some(*summary);
        }
        result
    }
}
