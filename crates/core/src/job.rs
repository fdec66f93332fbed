// crates/core/src/job.rs
//! Scrape job contract and the per-forum job registry.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::ScrapeError;
use crate::forum::ForumId;

/// What a finished (or cancelled) run accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub pages_fetched: u32,
    pub records_written: u64,
    /// True when the run ended because the token was set.
    pub cancelled: bool,
}

/// A long-running scrape of one forum.
///
/// Cancellation is cooperative: implementations poll `cancel` at safe
/// points and return once it is set. Nothing forcibly stops them.
#[async_trait]
pub trait ScrapeJob: Send + Sync {
    /// The forum this job scrapes (and whose store partition it writes).
    fn forum(&self) -> ForumId;

    async fn run(&self, cancel: CancellationToken) -> Result<JobReport, ScrapeError>;
}

/// One scrape job per forum.
#[derive(Default, Clone)]
pub struct JobRegistry {
    jobs: HashMap<ForumId, Arc<dyn ScrapeJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` under its own forum, replacing any previous job.
    pub fn register(&mut self, job: Arc<dyn ScrapeJob>) -> &mut Self {
        self.jobs.insert(job.forum(), job);
        self
    }

    pub fn with(mut self, job: Arc<dyn ScrapeJob>) -> Self {
        self.register(job);
        self
    }

    pub fn get(&self, forum: ForumId) -> Option<Arc<dyn ScrapeJob>> {
        self.jobs.get(&forum).cloned()
    }

    pub fn forums(&self) -> Vec<ForumId> {
        ForumId::ALL
            .into_iter()
            .filter(|f| self.jobs.contains_key(f))
            .collect()
    }
}
