//! Crawler module for category and product crawling
//!
//! This module contains the core crawling logic, including:
//! - Page count resolution and listing page navigation
//! - Overall crawl coordination and checkpointing
//! - Batch scraping of explicit product lists with retries

mod batch;
mod coordinator;
mod pagination;

pub use batch::{backoff_delay, scrape_products};
pub use coordinator::{run_crawl, Coordinator, CrawlRequest};
pub use pagination::{page_count_chain, PageCountContext, PaginationResolver};
