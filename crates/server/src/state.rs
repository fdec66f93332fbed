// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use forum_harvest_core::{JobRegistry, RecordStore};

use crate::controller::JobController;
use crate::export::ExportService;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Owner of the single scrape job slot.
    pub controller: Arc<JobController>,
    pub exporter: ExportService,
}

impl AppState {
    pub fn new(controller: Arc<JobController>, exporter: ExportService) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            controller,
            exporter,
        })
    }

    /// Controller and exporter sharing one store, default stop timeout.
    pub fn from_parts(jobs: JobRegistry, store: Arc<dyn RecordStore>) -> Arc<Self> {
        let controller = Arc::new(JobController::new(jobs, store.clone()));
        Self::new(controller, ExportService::new(store))
    }

    /// Get server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
