//! Run report for a single crawl
//!
//! The coordinator fills a `CrawlReport` as the run progresses; it is
//! printed to stdout and optionally rendered as markdown at the end.

use crate::state::ProductRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Count of records where a field came back empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldMisses {
    pub name: u64,
    pub brand: u64,
    pub identifier: u64,
    pub price: u64,
}

/// Outcome of a crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// SHA-256 of the configuration file, when it was loaded from disk
    pub config_hash: Option<String>,

    pub category_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages the resolver settled on
    pub pages_planned: u32,
    pub pages_visited: u32,
    /// Pages no navigation strategy could reach
    pub pages_skipped: u32,

    pub products_extracted: u64,
    pub products_failed: u64,
    pub misses: FieldMisses,

    /// Successful intermediate exports
    pub checkpoints: u32,
    pub export_path: Option<PathBuf>,

    /// Fault that ended the run early
    pub error: Option<String>,
}

impl CrawlReport {
    pub fn new(category_url: &str) -> Self {
        Self {
            config_hash: None,
            category_url: category_url.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            pages_planned: 0,
            pages_visited: 0,
            pages_skipped: 0,
            products_extracted: 0,
            products_failed: 0,
            misses: FieldMisses::default(),
            checkpoints: 0,
            export_path: None,
            error: None,
        }
    }

    /// Counts an accepted record and any fields it is missing
    pub fn note_record(&mut self, record: &ProductRecord) {
        self.products_extracted += 1;
        if record.name.is_empty() {
            self.misses.name += 1;
        }
        if record.brand.is_empty() {
            self.misses.brand += 1;
        }
        if record.identifier.is_empty() {
            self.misses.identifier += 1;
        }
        if !record.has_price() {
            self.misses.price += 1;
        }
    }

    pub fn finish(&mut self, error: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.error = error;
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Share of extracted records that carry a value for a field
    fn coverage(&self, misses: u64) -> f64 {
        if self.products_extracted == 0 {
            return 0.0;
        }
        let present = self.products_extracted.saturating_sub(misses);
        (present as f64 / self.products_extracted as f64) * 100.0
    }
}

/// Prints the report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Category: {}", report.category_url);
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(duration) = report.duration_seconds() {
        println!("  Duration: {} seconds", duration);
    }
    if let Some(hash) = &report.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    println!("Pages:");
    println!("  Planned: {}", report.pages_planned);
    println!("  Visited: {}", report.pages_visited);
    println!("  Skipped: {}", report.pages_skipped);
    println!();

    println!("Products:");
    println!("  Extracted: {}", report.products_extracted);
    println!("  Failed: {}", report.products_failed);
    println!();

    if report.products_extracted > 0 {
        println!("Field Coverage:");
        for (field, misses) in [
            ("name", report.misses.name),
            ("brand", report.misses.brand),
            ("identifier", report.misses.identifier),
            ("price", report.misses.price),
        ] {
            println!("  {}: {:.1}% ({} missing)", field, report.coverage(misses), misses);
        }
        println!();
    }

    match &report.export_path {
        Some(path) => println!("Export: {} ({} checkpoints)", path.display(), report.checkpoints),
        None => println!("Export: none"),
    }

    match &report.error {
        Some(error) => println!("Status: aborted ({})", error),
        None => println!("Status: completed"),
    }
}
