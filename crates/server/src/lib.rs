// crates/server/src/lib.rs
//! forum-harvest server library.
//!
//! Axum HTTP server that runs at most one forum scrape job at a time and
//! exports its records as CSV when the job is stopped.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::Config;
pub use controller::{ControllerError, JobController, JobStatus, StopOutcome};
pub use error::*;
pub use export::{ExportError, ExportFile, ExportService};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([routes::scraping::STOP_TIMED_OUT_HEADER]);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
