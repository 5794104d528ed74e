//! Reading back the exported file
//!
//! Persisted records are served in fixed-size windows, and the raw file is
//! handed out for download.

use crate::output::traits::DownloadError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One window of persisted records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPage {
    /// 1-based page actually served, after clamping
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Reads page `page` of the exported records, `per_page` rows at a time
///
/// Out-of-range pages are clamped to the first or last page. A file that does
/// not exist yet reads as an empty first page.
pub fn read_records(path: &Path, page: usize, per_page: usize) -> Result<RecordPage, DownloadError> {
    let per_page = per_page.max(1);

    if !path.exists() {
        tracing::debug!("No export at {} yet", path.display());
        return Ok(RecordPage {
            page: 1,
            total_pages: 1,
            total_records: 0,
            columns: Vec::new(),
            rows: Vec::new(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;

    let total_records = records.len();
    let total_pages = total_records.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;

    let rows = records
        .iter()
        .skip(start)
        .take(per_page)
        .map(|record| {
            columns
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect()
        })
        .collect();

    Ok(RecordPage {
        page,
        total_pages,
        total_records,
        columns,
        rows,
    })
}

/// An export file opened for download
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    /// Suggested attachment file name
    pub file_name: String,
    pub len: u64,
    pub file: File,
}

/// Opens the export file for streaming as an attachment
///
/// # Errors
///
/// * `DownloadError::NotFound` - no export exists at `path`
/// * `DownloadError::Empty` - the file exists but has zero bytes
pub fn open_download(path: &Path) -> Result<Download, DownloadError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DownloadError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(DownloadError::NotFound(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(DownloadError::Empty(path.to_path_buf()));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.csv".to_string());

    Ok(Download {
        path: path.to_path_buf(),
        file_name,
        len: metadata.len(),
        file: File::open(path)?,
    })
}
