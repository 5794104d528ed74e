//! Incremental Exporter
//!
//! Every checkpoint rewrites the whole export from the accumulated records.
//! The writer chain is: CSV at the destination, CSV in the fallback
//! directory, then the plain writer at each of those two paths. A backup copy
//! is written next to whichever file succeeded.

use crate::config::OutputConfig;
use crate::output::csv_output::{CsvWriter, PlainWriter};
use crate::output::traits::{ExportError, ExportResult, Table, TableWriter};
use crate::state::ProductRecord;
use std::path::{Path, PathBuf};

/// Writes accumulated records to a durable CSV file
#[derive(Debug, Clone)]
pub struct Exporter {
    destination: PathBuf,
    fallback_dir: PathBuf,
    backup: bool,
}

/// Derived name of the backup file: `products.csv` becomes `products.backup.csv`
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}.backup.{}", stem, ext.to_string_lossy()),
        None => format!("{}.backup", stem),
    };
    path.with_file_name(name)
}

impl Exporter {
    /// Creates an exporter whose fallback directory is the working directory
    pub fn new(destination: impl Into<PathBuf>, backup: bool) -> Self {
        Self {
            destination: destination.into(),
            fallback_dir: PathBuf::from("."),
            backup,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.csv_path, config.backup)
    }

    /// Directory retried when the destination cannot be written
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Writer and path pairs, in the order they are tried
    fn attempts(&self) -> Vec<(&'static dyn TableWriter, PathBuf)> {
        let file_name = self
            .destination
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("export.csv"));
        let retry = self.fallback_dir.join(file_name);

        let mut paths = vec![self.destination.clone()];
        if retry != self.destination {
            paths.push(retry);
        }

        let writers: [&'static dyn TableWriter; 2] = [&CsvWriter, &PlainWriter];
        writers
            .into_iter()
            .flat_map(|writer| paths.iter().map(move |path| (writer, path.clone())))
            .collect()
    }

    /// Exports `records`, returning the path actually written
    ///
    /// # Errors
    ///
    /// `ExportError::AllWritersFailed` only after every writer and path in
    /// the chain has failed.
    pub fn export(&self, records: &[ProductRecord]) -> ExportResult<PathBuf> {
        let table = Table::from_records(records);
        let mut last_error = None;

        for (writer, path) in self.attempts() {
            match writer.write(&table, &path) {
                Ok(()) => {
                    if path != self.destination || writer.name() != "csv" {
                        tracing::warn!(
                            "Export fell back to the {} writer at {}",
                            writer.name(),
                            path.display()
                        );
                    }
                    self.write_backup(writer, &table, &path);
                    return Ok(path);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(ExportError::AllWritersFailed(Box::new(last_error.unwrap_or_else(
            || ExportError::Write {
                writer: "none",
                path: self.destination.clone(),
                message: "no writer was attempted".to_string(),
            },
        ))))
    }

    /// Best-effort backup copy; failures are logged only
    fn write_backup(&self, writer: &dyn TableWriter, table: &Table, path: &Path) {
        if !self.backup {
            return;
        }
        let backup = backup_path(path);
        if let Err(e) = writer.write(table, &backup) {
            tracing::warn!("Backup not written: {}", e);
        }
    }
}
