//! HTTP route handlers for the forum-harvest server.

pub mod health;
pub mod metrics;
pub mod scraping;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - POST /start_scraping - Start a scrape job for `{"forum": "..."}`
/// - GET  /stop_scraping - Stop the running job and download its CSV
/// - GET  /scraping_status - Whether a job is running, and for which forum
/// - GET  /export/{forum} - Download a forum's current records as CSV
/// - GET  /health - Health check
/// - GET  /metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(scraping::router())
        .merge(health::router())
        .merge(metrics::router())
        .with_state(state)
}
