// crates/server/src/controller.rs
//! Single-slot scrape job controller.
//!
//! At most one scrape job runs per process. The slot is a `std::sync::Mutex`
//! (never held across `.await`) so status reads stay cheap; start and stop
//! transitions are additionally serialized through an async transition lock.
//! A start that finds the transition lock busy is rejected outright, the same
//! single-flight `try_lock` rule the git sync endpoint used.
//!
//! Every run gets a `run_id`. The worker's cleanup guard and a stop that gave
//! up waiting only clear the slot if it still belongs to their run, so a late
//! worker can never clobber a newer job.

use chrono::{DateTime, Utc};
use forum_harvest_core::{ForumId, JobRegistry, RecordStore, ScrapeJob, StoreError};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::metrics;

/// How long a stop request waits for the worker before giving up.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Invalid forum: {0}")]
    InvalidForum(String),

    #[error("Scraping is already in progress")]
    AlreadyRunning,

    #[error("No scraping in progress")]
    NotRunning,

    #[error("No scrape job registered for {0}")]
    NoJob(ForumId),

    #[error("Failed to reset records: {0}")]
    Store(#[from] StoreError),
}

/// Snapshot of the job slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub active: bool,
    pub forum: Option<ForumId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    fn idle() -> Self {
        Self {
            active: false,
            forum: None,
            run_id: None,
            started_at: None,
        }
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    /// Forum that was running when the stop was accepted.
    pub forum: ForumId,
    pub run_id: u64,
    /// The worker was still running when the stop timeout expired.
    pub timed_out: bool,
    pub waited: Duration,
}

struct ActiveJob {
    run_id: u64,
    forum: ForumId,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    started_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<ActiveJob>>>;

fn lock_slot(slot: &Mutex<Option<ActiveJob>>) -> MutexGuard<'_, Option<ActiveJob>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clear the slot if it still belongs to `run_id`. Returns whether it did.
fn release_slot(slot: &Mutex<Option<ActiveJob>>, run_id: u64) -> bool {
    let mut guard = lock_slot(slot);
    if guard.as_ref().is_some_and(|a| a.run_id == run_id) {
        *guard = None;
        metrics::set_job_active(false);
        true
    } else {
        false
    }
}

/// Releases the slot when the worker task ends, however it ends.
struct SlotRelease {
    slot: Slot,
    run_id: u64,
    forum: ForumId,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        if release_slot(&self.slot, self.run_id) {
            debug!(forum = %self.forum, run_id = self.run_id, "Worker released job slot");
        }
    }
}

pub struct JobController {
    slot: Slot,
    transition: tokio::sync::Mutex<()>,
    next_run_id: AtomicU64,
    jobs: JobRegistry,
    store: Arc<dyn RecordStore>,
    stop_timeout: Duration,
}

impl JobController {
    pub fn new(jobs: JobRegistry, store: Arc<dyn RecordStore>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            transition: tokio::sync::Mutex::new(()),
            next_run_id: AtomicU64::new(1),
            jobs,
            store,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// Store the controller clears on every start.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Start a scrape of `forum` in the background.
    ///
    /// Clears the forum's records, then spawns the worker and returns
    /// without waiting for it.
    pub async fn start_job(&self, forum: &str) -> Result<ForumId, ControllerError> {
        let forum: ForumId = forum
            .parse()
            .map_err(|e: forum_harvest_core::UnknownForum| ControllerError::InvalidForum(e.0))?;
        let job = self.jobs.get(forum).ok_or(ControllerError::NoJob(forum))?;

        let _transition = self
            .transition
            .try_lock()
            .map_err(|_| ControllerError::AlreadyRunning)?;
        let busy = lock_slot(&self.slot).is_some();
        if busy {
            return Err(ControllerError::AlreadyRunning);
        }

        let removed = self.store.clear(forum).await?;

        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        {
            let mut slot = lock_slot(&self.slot);
            let handle = tokio::spawn(run_worker(
                Arc::clone(&self.slot),
                run_id,
                forum,
                job,
                cancel.clone(),
            ));
            *slot = Some(ActiveJob {
                run_id,
                forum,
                cancel,
                handle: Some(handle),
                started_at: Utc::now(),
            });
        }

        metrics::record_job_started(forum);
        info!(forum = %forum, run_id, cleared = removed, "Scrape job started");
        Ok(forum)
    }

    /// Signal the running job to stop and wait (bounded) for it.
    ///
    /// The forum is captured under the same lock as the active check. If the
    /// worker outlives the stop timeout the slot is cleared anyway and the
    /// worker is left to finish on its own.
    pub async fn stop_job(&self) -> Result<StopOutcome, ControllerError> {
        let _transition = self.transition.lock().await;

        let (run_id, forum, cancel, handle) = {
            let mut slot = lock_slot(&self.slot);
            match slot.as_mut() {
                Some(active) => (
                    active.run_id,
                    active.forum,
                    active.cancel.clone(),
                    active.handle.take(),
                ),
                None => return Err(ControllerError::NotRunning),
            }
        };

        info!(forum = %forum, run_id, "Stopping scrape job");
        cancel.cancel();

        let started = Instant::now();
        let timed_out = match handle {
            Some(handle) => match tokio::time::timeout(self.stop_timeout, handle).await {
                Ok(Ok(())) => false,
                Ok(Err(e)) => {
                    warn!(forum = %forum, run_id, error = %e, "Scrape worker ended abnormally");
                    false
                }
                Err(_) => {
                    warn!(
                        forum = %forum,
                        run_id,
                        timeout_secs = self.stop_timeout.as_secs_f64(),
                        "Scrape job did not stop within timeout; continuing without it"
                    );
                    metrics::record_stop_timeout(forum);
                    true
                }
            },
            None => false,
        };
        let waited = started.elapsed();

        release_slot(&self.slot, run_id);

        Ok(StopOutcome {
            forum,
            run_id,
            timed_out,
            waited,
        })
    }

    /// Current slot state. Never waits on a running job.
    pub fn status(&self) -> JobStatus {
        match lock_slot(&self.slot).as_ref() {
            Some(active) => JobStatus {
                active: true,
                forum: Some(active.forum),
                run_id: Some(active.run_id),
                started_at: Some(active.started_at),
            },
            None => JobStatus::idle(),
        }
    }

    /// Stop whatever is running, for process shutdown.
    pub async fn shutdown(&self) {
        match self.stop_job().await {
            Ok(outcome) => info!(
                forum = %outcome.forum,
                timed_out = outcome.timed_out,
                "Stopped scrape job for shutdown"
            ),
            Err(ControllerError::NotRunning) => {}
            Err(e) => warn!(error = %e, "Failed to stop scrape job for shutdown"),
        }
    }
}

async fn run_worker(
    slot: Slot,
    run_id: u64,
    forum: ForumId,
    job: Arc<dyn ScrapeJob>,
    cancel: CancellationToken,
) {
    let _release = SlotRelease {
        slot,
        run_id,
        forum,
    };
    let started = Instant::now();

    let outcome = AssertUnwindSafe(job.run(cancel)).catch_unwind().await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(report)) => {
            let label = if report.cancelled { "cancelled" } else { "completed" };
            info!(
                forum = %forum,
                run_id,
                pages = report.pages_fetched,
                records = report.records_written,
                duration_secs = elapsed.as_secs_f64(),
                "Scrape job {label}"
            );
            metrics::record_job_finished(forum, label, elapsed);
        }
        Ok(Err(e)) => {
            error!(forum = %forum, run_id, error = %e, "Scrape job failed");
            metrics::record_job_finished(forum, "failed", elapsed);
        }
        Err(payload) => {
            error!(
                forum = %forum,
                run_id,
                panic = %panic_message(payload.as_ref()),
                "Scrape job panicked"
            );
            metrics::record_job_finished(forum, "panicked", elapsed);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
