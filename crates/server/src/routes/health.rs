//! Health check endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::controller::JobStatus;
use crate::state::AppState;

/// Longest a health check waits on the record store.
const STORE_PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the record store does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub store_reachable: bool,
    pub job: JobStatus,
}

/// GET /health - job slot and record store state. 503 while the store is
/// unreachable.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_reachable =
        match tokio::time::timeout(STORE_PING_TIMEOUT, state.controller.store().ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Record store failed health ping");
                false
            }
            Err(_) => {
                tracing::warn!("Record store health ping timed out");
                false
            }
        };

    let (code, status) = if store_reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.uptime_secs(),
            store_reachable,
            job: state.controller.status(),
        }),
    )
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use forum_harvest_core::{
        ForumId, JobRegistry, JobReport, MemoryStore, Record, RecordStore, ScrapeError,
        ScrapeJob, StoreError,
    };
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct UnreachableStore;

    fn unreachable() -> StoreError {
        StoreError::backend(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "database is locked",
        ))
    }

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn clear(&self, _forum: ForumId) -> Result<u64, StoreError> {
            Err(unreachable())
        }
        async fn insert_many(&self, _: ForumId, _: &[Record]) -> Result<u64, StoreError> {
            Err(unreachable())
        }
        async fn read_all(&self, _forum: ForumId) -> Result<Vec<Record>, StoreError> {
            Err(unreachable())
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(unreachable())
        }
    }

    /// Waits for cancellation.
    struct IdleJob;

    #[async_trait]
    impl ScrapeJob for IdleJob {
        fn forum(&self) -> ForumId {
            ForumId::CryptBb
        }

        async fn run(&self, cancel: CancellationToken) -> Result<JobReport, ScrapeError> {
            cancel.cancelled().await;
            Ok(JobReport {
                cancelled: true,
                ..JobReport::default()
            })
        }
    }

    async fn health(state: Arc<AppState>) -> (StatusCode, Value) {
        let response = crate::create_app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_idle_slot() {
        let state = AppState::from_parts(JobRegistry::new(), Arc::new(MemoryStore::new()));
        let (status, body) = health(state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store_reachable"], true);
        assert_eq!(body["job"]["active"], false);
        assert_eq!(body["job"]["forum"], Value::Null);
    }

    #[tokio::test]
    async fn test_health_reports_running_job() {
        let jobs = JobRegistry::new().with(Arc::new(IdleJob));
        let state = AppState::from_parts(jobs, Arc::new(MemoryStore::new()));
        state.controller.start_job("cryptbb").await.unwrap();

        let (status, body) = health(state.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["active"], true);
        assert_eq!(body["job"]["forum"], "cryptbb");

        state.controller.stop_job().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_store_is_degraded() {
        let state = AppState::from_parts(JobRegistry::new(), Arc::new(UnreachableStore));
        let (status, body) = health(state).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["store_reachable"], false);
        assert_eq!(body["job"]["active"], false);
    }
}
