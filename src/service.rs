//! Crawl service facade
//!
//! The operations a front-end needs: start a crawl in the background, poll
//! its progress, page through the persisted records and fetch the raw export.

use crate::config::Config;
use crate::crawler::{Coordinator, CrawlRequest};
use crate::output::{open_download, read_records, CrawlReport, Download, DownloadError, RecordPage};
use crate::state::{CrawlStatus, Eta, StatusHandle};
use crate::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

/// Owns the configuration and the status shared with the running crawl
#[derive(Debug, Clone)]
pub struct CrawlService {
    config: Arc<Config>,
    config_hash: Option<String>,
    status: StatusHandle,
    /// Where the last run actually wrote its export
    last_export: Arc<RwLock<Option<PathBuf>>>,
}

impl CrawlService {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            config_hash: None,
            status: StatusHandle::new(),
            last_export: Arc::new(RwLock::new(None)),
        }
    }

    /// Hash of the configuration file, carried into every run report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Starts a crawl on a background task
    ///
    /// The status is marked running before this returns, so a poll right
    /// after `start` already sees `in_progress`.
    ///
    /// # Errors
    ///
    /// `HarvestError::AlreadyRunning` if a crawl is in progress.
    pub fn start(&self, request: CrawlRequest) -> Result<JoinHandle<CrawlReport>> {
        self.status.begin()?;
        tracing::info!("Starting crawl of {}", request.category_url);

        let mut coordinator = Coordinator::new(Arc::clone(&self.config), self.status.clone());
        if let Some(hash) = &self.config_hash {
            coordinator = coordinator.with_config_hash(hash.clone());
        }
        let last_export = Arc::clone(&self.last_export);

        Ok(tokio::spawn(async move {
            let report = coordinator.run(&request).await;
            if let Some(path) = &report.export_path {
                let mut slot = last_export.write().unwrap_or_else(|e| e.into_inner());
                *slot = Some(path.clone());
            }
            report
        }))
    }

    /// Current progress and the estimated time remaining
    pub fn status(&self) -> (CrawlStatus, Eta) {
        let snapshot = self.status.snapshot();
        let eta = snapshot.eta();
        (snapshot, eta)
    }

    /// Path of the persisted export
    ///
    /// The file the last run wrote, which may be a fallback location, or the
    /// configured destination before any run has exported.
    pub fn export_path(&self) -> PathBuf {
        let last = self.last_export.read().unwrap_or_else(|e| e.into_inner());
        last.clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.output.csv_path))
    }

    /// One page of persisted records, `records-per-page` rows at a time
    pub fn records(&self, page: usize) -> std::result::Result<RecordPage, DownloadError> {
        read_records(&self.export_path(), page, self.config.output.records_per_page)
    }

    /// The raw export, opened for download
    pub fn download(&self) -> std::result::Result<Download, DownloadError> {
        open_download(&self.export_path())
    }
}
