//! Output module for persisting and reporting crawl results
//!
//! This module provides:
//! - The incremental CSV exporter with its writer fallback chain
//! - Paged reads of the exported records and the download handle
//! - The run report, printed to stdout or rendered as markdown

mod csv_output;
mod export;
mod markdown;
mod records;
mod stats;
mod traits;

pub use csv_output::{CsvWriter, PlainWriter};
pub use export::{backup_path, Exporter};
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use records::{open_download, read_records, Download, RecordPage};
pub use stats::{print_report, CrawlReport, FieldMisses};
pub use traits::{DownloadError, ExportError, ExportResult, Table, TableWriter};
