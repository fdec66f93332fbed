//! Prometheus metrics for scrape jobs.
//!
//! The recorder is installed once at startup by [`init_metrics`]. Until then
//! the `record_*` helpers are no-ops and `/metrics` answers 503.

use forum_harvest_core::ForumId;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!("scrape_jobs_started_total", "Scrape jobs started, by forum");
    describe_counter!(
        "scrape_jobs_finished_total",
        "Scrape jobs finished, by forum and outcome"
    );
    describe_histogram!(
        "scrape_job_duration_seconds",
        "Wall-clock duration of scrape jobs in seconds"
    );
    describe_gauge!("scrape_job_active", "1 while a scrape job occupies the slot");
    describe_counter!(
        "scrape_stop_timeouts_total",
        "Stop requests that gave up waiting for the worker"
    );
    describe_counter!(
        "scrape_records_exported_total",
        "Records written to CSV exports"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_job_started(forum: ForumId) {
    counter!("scrape_jobs_started_total", "forum" => forum.as_str()).increment(1);
    set_job_active(true);
}

/// `outcome` is one of `completed`, `cancelled`, `failed`, `panicked`.
pub fn record_job_finished(forum: ForumId, outcome: &'static str, duration: Duration) {
    counter!("scrape_jobs_finished_total", "forum" => forum.as_str(), "outcome" => outcome)
        .increment(1);
    histogram!("scrape_job_duration_seconds", "forum" => forum.as_str())
        .record(duration.as_secs_f64());
}

pub fn set_job_active(active: bool) {
    gauge!("scrape_job_active").set(if active { 1.0 } else { 0.0 });
}

pub fn record_stop_timeout(forum: ForumId) {
    counter!("scrape_stop_timeouts_total", "forum" => forum.as_str()).increment(1);
}

pub fn record_export(forum: ForumId, rows: usize) {
    counter!("scrape_records_exported_total", "forum" => forum.as_str()).increment(rows as u64);
}
