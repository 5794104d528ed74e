//! Table writer trait and export types
//!
//! This module defines the trait interface for export writers, the column
//! table they serialize, and the errors raised by export and download.

use crate::state::ProductRecord;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while exporting records
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{writer} writer failed for {}: {message}", .path.display())]
    Write {
        writer: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Every export writer failed; last error: {0}")]
    AllWritersFailed(Box<ExportError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when serving the exported file
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Export file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Export file is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Records laid out as a header plus rows
///
/// The header is the sorted union of every record's keys, so a record that
/// lacks a column gets an empty cell rather than shifting the row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_records(records: &[ProductRecord]) -> Self {
        let maps: Vec<_> = records.iter().map(ProductRecord::to_row).collect();
        let columns: Vec<String> = maps
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = maps
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A way of writing a table to a file
///
/// Writers must leave the data on durable storage before returning `Ok`.
pub trait TableWriter {
    /// Short writer name for logs and errors
    fn name(&self) -> &'static str;

    /// Writes `table` to `path`, replacing any existing file
    fn write(&self, table: &Table, path: &Path) -> ExportResult<()>;
}
