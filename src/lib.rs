//! Catalog-Harvest: a resilient product catalog crawler
//!
//! This crate walks a paginated e-commerce category listing, visits every
//! linked product page, extracts structured fields through ordered fallback
//! chains, and checkpoints the accumulated records to CSV as it goes.

pub mod browser;
pub mod chain;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod service;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Navigation timeout for {url}")]
    NavigationTimeout { url: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("Download error: {0}")]
    Download(#[from] output::DownloadError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("A crawl is already in progress")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if the error means the browser session itself is unusable
    ///
    /// Session faults abort the whole run. Everything else is scoped to a
    /// single page or product and only causes that item to be skipped.
    pub fn is_session_fault(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use service::CrawlService;
pub use state::{CrawlPhase, CrawlStatus, ProductRecord, StatusHandle};
