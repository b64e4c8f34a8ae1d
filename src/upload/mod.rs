//! Tab-delimited file preview.
//!
//! Shown next to the dashboard as a plain table. Nothing here feeds the
//! price pipeline.

use crate::error::DashboardError;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse tab-separated text with a header row. Rows must all have the
/// header's width.
pub fn preview_tsv(bytes: &[u8]) -> Result<PreviewTable, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::MalformedUpload(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DashboardError::MalformedUpload("missing header row".into()));
    }

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            debug!("Upload row {} rejected: {}", i + 1, e);
            DashboardError::MalformedUpload(format!("row {}: {}", i + 1, e))
        })?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    info!("Upload preview: {} columns, {} rows", headers.len(), rows.len());
    Ok(PreviewTable { headers, rows })
}

pub fn preview_file(path: &Path) -> Result<PreviewTable, DashboardError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DashboardError::MalformedUpload(format!("{}: {}", path.display(), e)))?;
    preview_tsv(&bytes)
}
