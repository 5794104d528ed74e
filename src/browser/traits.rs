//! Browser session capability trait
//!
//! The crawler never talks to a concrete browser. It drives a
//! `BrowserSession`, which lets the orchestrator and extractors run against a
//! static HTTP backend, headless Chrome, or an in-memory fixture alike.

use crate::browser::page::Snapshot;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Capabilities the crawler needs from a browser
///
/// A session is owned by exactly one crawl run and is used sequentially.
#[async_trait]
pub trait BrowserSession: Send {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Loads `url` and makes it the current page
    ///
    /// # Errors
    ///
    /// * `NavigationTimeout` / `Navigation` - the page could not be loaded;
    ///   callers skip the page or product
    /// * `Session` - the browser itself is gone; callers abort the run
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Waits until an element matching `selector` is present
    ///
    /// Returns `Ok(false)` when the ceiling elapses without a match.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Clicks the first element matching `selector` whose text equals `label`
    ///
    /// With `label = None` the first matching element is clicked. Returns
    /// `Ok(false)` when no such element appears within `timeout`.
    async fn click(&mut self, selector: &str, label: Option<&str>, timeout: Duration)
        -> Result<bool>;

    /// Markup of the current page
    async fn page_source(&mut self) -> Result<String>;

    /// Address of the current page, if any page is loaded
    async fn current_url(&mut self) -> Result<Option<String>>;

    /// Releases the browser. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;

    /// Captures the current page as a `Send`-able snapshot
    async fn snapshot(&mut self) -> Result<Snapshot> {
        let html = self.page_source().await?;
        let url = self
            .current_url()
            .await?
            .ok_or_else(|| HarvestError::Session("no page is loaded".to_string()))?;
        Ok(Snapshot::new(url, html))
    }
}
