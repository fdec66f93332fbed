// crates/server/src/export.rs
//! CSV export of a forum's scraped records.

use forum_harvest_core::{ForumId, Record, RecordStore, StoreError, STORE_ID_FIELD};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::metrics;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read records: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to write export to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A rendered export, ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn RecordStore>,
    export_dir: Option<PathBuf>,
}

impl ExportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            export_dir: None,
        }
    }

    /// Also persist every export under `dir`.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    pub async fn export(&self, forum: ForumId) -> Result<ExportFile, ExportError> {
        let records = self.store.read_all(forum).await?;
        let csv = build_csv(&records);
        let filename = forum.export_filename();

        if let Some(dir) = &self.export_dir {
            let path = dir.join(&filename);
            write_export(&path, csv.as_bytes()).await?;
            debug!(path = %path.display(), "Wrote export to disk");
        }

        metrics::record_export(forum, records.len());
        info!(forum = %forum, rows = records.len(), "Exported records");
        Ok(ExportFile {
            filename,
            bytes: csv.into_bytes(),
            rows: records.len(),
        })
    }
}

async fn write_export(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let wrap = |source| ExportError::Write {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    tokio::fs::write(path, bytes).await.map_err(wrap)
}

/// Column order: every key in first-seen order, minus the store id.
fn columns(records: &[Record]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if key != STORE_ID_FIELD && !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns
}

/// Build RFC 4180 CSV from records. No records means an empty body.
pub fn build_csv(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let columns = columns(records);
    let mut csv = String::new();

    let header: Vec<String> = columns.iter().map(|c| escape_csv_field(c)).collect();
    csv.push_str(&header.join(","));
    csv.push('\n');

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| escape_csv_field(&cell_text(record.get(*c))))
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Escape a CSV field per RFC 4180.
///
/// Fields containing a comma, double quote, CR or LF are wrapped in double
/// quotes with internal quotes doubled.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
