//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ProductRecord`: one scraped product, immutable once built
//! - `CrawlPhase`: the orchestrator's state machine
//! - `CrawlStatus` / `StatusHandle`: progress shared between the crawl task and pollers

mod phase;
mod record;
mod status;

pub use phase::CrawlPhase;
pub use record::{ProductRecord, DATE_FORMAT, PRICE_UNAVAILABLE};
pub use status::{CrawlStatus, Eta, StatusHandle};
