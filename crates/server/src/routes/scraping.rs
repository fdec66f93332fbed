// crates/server/src/routes/scraping.rs
//! Scrape job control: start, stop (with CSV download), status, export.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use forum_harvest_core::ForumId;
use serde::Deserialize;

use crate::controller::JobStatus;
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::export::ExportFile;
use crate::state::AppState;

/// Set on stop responses: whether the job outlived the stop timeout.
pub const STOP_TIMED_OUT_HEADER: HeaderName = HeaderName::from_static("x-stop-timed-out");

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub forum: Option<String>,
}

/// POST /start_scraping - start a background scrape of `forum`.
///
/// A missing, blank or unparseable body is reported as an invalid forum.
pub async fn start_scraping(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let forum = match body {
        Ok(Json(req)) => req.forum.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unreadable start request body");
            String::new()
        }
    };

    let forum = state.controller.start_job(&forum).await?;
    Ok(Json(StatusResponse::success(format!("Scraping {forum} started"))))
}

/// GET /stop_scraping - stop the running job and return its records as CSV.
pub async fn stop_scraping(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let outcome = state.controller.stop_job().await?;
    let file = state.exporter.export(outcome.forum).await?;

    let mut response = csv_attachment(file);
    response.headers_mut().insert(
        STOP_TIMED_OUT_HEADER,
        HeaderValue::from_static(if outcome.timed_out { "true" } else { "false" }),
    );
    Ok(response)
}

/// GET /scraping_status
pub async fn scraping_status(State(state): State<Arc<AppState>>) -> Json<JobStatus> {
    Json(state.controller.status())
}

/// GET /export/{forum} - current records of `forum`, without touching the job.
pub async fn export_forum(
    State(state): State<Arc<AppState>>,
    Path(forum): Path<String>,
) -> ApiResult<Response> {
    let forum: ForumId = forum
        .parse()
        .map_err(|e: forum_harvest_core::UnknownForum| ApiError::InvalidForum(e.0))?;
    let file = state.exporter.export(forum).await?;
    Ok(csv_attachment(file))
}

fn csv_attachment(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start_scraping", post(start_scraping))
        .route("/stop_scraping", get(stop_scraping))
        .route("/scraping_status", get(scraping_status))
        .route("/export/{forum}", get(export_forum))
}
