//! Prometheus metrics endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::error::StatusResponse;
use crate::metrics;
use crate::state::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics - Prometheus text format, 503 until the recorder is installed.
///
/// `scrape_job_active` is re-read from the slot on every scrape so it is
/// exported before the first job has run.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    metrics::set_job_active(state.controller.status().active);
    match metrics::render_metrics() {
        Some(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse::error("Metrics not initialized")),
        )
            .into_response(),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
