//! Cron-driven ingestion scheduling.
//!
//! The scheduler is a two-state machine: `Idle` and `Running`. A timer
//! fire or a manual trigger while `Idle` executes one refresh cycle; a
//! fire while `Running` is refused outright, never queued, so two cycles
//! can never overlap. The cycle in progress is never interrupted.
//!
//! `ScheduleState` is mutated only inside [`IngestionScheduler::try_refresh`];
//! the timer loop and the operator trigger both go through it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use listafeed_core::config::parse_refresh_cron;
use listafeed_core::ConfigError;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::ingest::Ingestor;

/// What became of one trigger, timer-driven or manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RefreshOutcome {
    /// Cycle ran to completion and replaced the cached collection.
    Completed { count: usize },
    /// Cycle aborted; previously cached data is untouched.
    Failed { reason: String },
    /// A cycle was already running; this trigger did nothing.
    Skipped,
}

/// Snapshot of the scheduler's observable state.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleState {
    /// True for the entire duration of a refresh cycle.
    pub running: bool,
    /// When the most recent cycle settled.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Outcome of the most recent completed or failed cycle.
    pub last_outcome: Option<RefreshOutcome>,
    /// The active cron expression.
    pub cron: String,
}

struct StateInner {
    last_run_at: Option<DateTime<Utc>>,
    last_outcome: Option<RefreshOutcome>,
    cron: String,
    schedule: Schedule,
}

/// Fires the refresh cycle on a cron schedule and guards against overlap.
pub struct IngestionScheduler {
    ingestor: Arc<Ingestor>,
    running: AtomicBool,
    state: Mutex<StateInner>,
}

impl IngestionScheduler {
    /// # Errors
    ///
    /// Rejects an invalid five-field cron expression.
    pub fn new(ingestor: Arc<Ingestor>, cron_expr: &str) -> Result<Self, ConfigError> {
        let schedule = parse_refresh_cron(cron_expr)?;
        Ok(Self {
            ingestor,
            running: AtomicBool::new(false),
            state: Mutex::new(StateInner {
                last_run_at: None,
                last_outcome: None,
                cron: cron_expr.trim().to_owned(),
                schedule,
            }),
        })
    }

    /// Execute one refresh cycle unless one is already running.
    ///
    /// Both the timer and the operator-facing manual trigger come through
    /// here, so they share the overlap guard.
    pub async fn try_refresh(&self) -> RefreshOutcome {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("refresh already running, skipping trigger");
            return RefreshOutcome::Skipped;
        }

        let outcome = match self.ingestor.refresh().await {
            Ok(properties) => RefreshOutcome::Completed { count: properties.len() },
            Err(err) => {
                tracing::error!(%err, "refresh cycle failed");
                RefreshOutcome::Failed { reason: err.to_string() }
            }
        };

        {
            let mut state = self.state.lock().expect("scheduler state mutex poisoned");
            state.last_run_at = Some(Utc::now());
            state.last_outcome = Some(outcome.clone());
        }
        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    /// Observable state snapshot.
    pub fn state(&self) -> ScheduleState {
        let state = self.state.lock().expect("scheduler state mutex poisoned");
        ScheduleState {
            running: self.running.load(Ordering::SeqCst),
            last_run_at: state.last_run_at,
            last_outcome: state.last_outcome.clone(),
            cron: state.cron.clone(),
        }
    }

    /// Replace the cron expression.
    ///
    /// # Errors
    ///
    /// An invalid expression is rejected and the active schedule keeps
    /// running unchanged.
    pub fn set_schedule(&self, cron_expr: &str) -> Result<(), ConfigError> {
        let schedule = parse_refresh_cron(cron_expr)?;
        let mut state = self.state.lock().expect("scheduler state mutex poisoned");
        state.cron = cron_expr.trim().to_owned();
        state.schedule = schedule;
        tracing::info!(cron = %state.cron, "schedule updated");
        Ok(())
    }

    fn next_fire(&self) -> Option<DateTime<Utc>> {
        let state = self.state.lock().expect("scheduler state mutex poisoned");
        state.schedule.upcoming(Utc).next()
    }

    /// Timer loop. Sleeps until the next cron occurrence, fires, repeats;
    /// exits when the shutdown channel signals.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(cron = %self.state().cron, "scheduler started");
        loop {
            let Some(next) = self.next_fire() else {
                tracing::warn!("schedule has no future occurrence, scheduler stopping");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.try_refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("scheduler stopped");
                    return;
                }
            }
        }
    }
}
