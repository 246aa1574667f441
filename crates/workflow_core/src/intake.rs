//! Turns a selected file into an [`UploadSlot`].
//!
//! Intake never parses spreadsheets. The record estimate is a display hint:
//! line count for CSV, a size heuristic for binary workbooks.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

use crate::state::UploadSlot;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// Rough bytes per row in a compressed workbook.
const WORKBOOK_BYTES_PER_ROW: u64 = 96;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("'{name}' is not a supported file (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat { name: String },
    #[error("'{name}' is empty")]
    EmptyFile { name: String },
    #[error("could not read '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file as selected by the user, before intake.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub payload: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub async fn read(path: &Path) -> Result<Self, IntakeError> {
        let payload = tokio::fs::read(path)
            .await
            .map_err(|source| IntakeError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, payload })
    }
}

impl std::fmt::Debug for RawFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("len", &self.payload.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Csv,
    Workbook,
}

fn source_format(name: &str) -> Option<SourceFormat> {
    let (_, extension) = name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    if extension == "csv" {
        Some(SourceFormat::Csv)
    } else {
        Some(SourceFormat::Workbook)
    }
}

pub fn derive_slot(raw: RawFile) -> Result<UploadSlot, IntakeError> {
    let Some(format) = source_format(&raw.name) else {
        return Err(IntakeError::UnsupportedFormat { name: raw.name });
    };
    if raw.payload.is_empty() {
        return Err(IntakeError::EmptyFile { name: raw.name });
    }

    let size_bytes = raw.payload.len() as u64;
    let estimated_records = match format {
        SourceFormat::Csv => estimate_csv_rows(&raw.payload),
        SourceFormat::Workbook => (size_bytes / WORKBOOK_BYTES_PER_ROW).max(1) as usize,
    };

    Ok(UploadSlot {
        name: raw.name,
        size_bytes,
        size_label: format_size(size_bytes),
        estimated_records,
        ready: true,
        payload: Arc::from(raw.payload),
    })
}

pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Non-blank lines after the header.
fn estimate_csv_rows(payload: &[u8]) -> usize {
    String::from_utf8_lossy(payload)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        .saturating_sub(1)
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;
