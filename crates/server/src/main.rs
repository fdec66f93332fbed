// crates/server/src/main.rs
//! forum-harvest server binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use forum_harvest_core::forums::default_registry;
use forum_harvest_core::RecordStore;
use forum_harvest_db::Database;
use forum_harvest_server::{create_app, metrics, AppState, Config, ExportService, JobController};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "warn,forum_harvest_server=info,forum_harvest_core=info,forum_harvest_db=info";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);
    metrics::init_metrics();

    let db = match &config.db_path {
        Some(path) => Database::new(path).await,
        None => Database::open_default().await,
    }
    .context("failed to open record database")?;
    let store: Arc<dyn RecordStore> = Arc::new(db);

    let jobs = default_registry(&config.forum_sites(), store.clone());
    let controller = Arc::new(
        JobController::new(jobs, store.clone()).with_stop_timeout(config.stop_timeout()),
    );
    let mut exporter = ExportService::new(store);
    if let Some(dir) = &config.export_dir {
        exporter = exporter.with_export_dir(dir);
    }

    let app = create_app(AppState::new(controller.clone(), exporter));

    let addr = config.bind_addr().context("invalid --host/--port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "forum-harvest listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    controller.shutdown().await;
    Ok(())
}
