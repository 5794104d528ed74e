//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Checkpoint every {} products", config.crawl.checkpoint_every);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserBackend, BrowserConfig, Config, CrawlConfig, LoggingConfig, OutputConfig, RetryConfig,
    SelectorConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
