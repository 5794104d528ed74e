//! Browser session management
//!
//! This module owns the browser lifecycle for a crawl run:
//! - The `BrowserSession` capability trait the crawler drives
//! - DOM snapshots (`Snapshot`, `Page`) for synchronous selector queries
//! - A static HTTP backend and an optional headless Chrome backend
//! - `open_session`, which picks and starts the configured backend

#[cfg(feature = "chrome")]
mod chrome;
#[cfg(test)]
pub(crate) mod fixture;
mod http;
mod page;
mod traits;

#[cfg(feature = "chrome")]
pub use chrome::ChromeSession;
pub use http::{build_http_client, HttpSession};
pub use page::{element_text, normalize_whitespace, Page, Snapshot};
pub use traits::BrowserSession;

use crate::config::{BrowserBackend, BrowserConfig};
use crate::Result;

/// Acquires a browser session for one crawl run
///
/// Any failure here is a session fault: the run cannot start.
///
/// # Arguments
///
/// * `config` - The browser configuration
///
/// # Returns
///
/// * `Ok(Box<dyn BrowserSession>)` - A ready session
/// * `Err(HarvestError::Session)` - The backend could not be started
pub async fn open_session(config: &BrowserConfig) -> Result<Box<dyn BrowserSession>> {
    tracing::info!("Opening {:?} browser session", config.backend);
    match config.backend {
        BrowserBackend::Http => Ok(Box::new(HttpSession::new(config)?)),
        #[cfg(feature = "chrome")]
        BrowserBackend::Chrome => Ok(Box::new(ChromeSession::launch(config).await?)),
        #[cfg(not(feature = "chrome"))]
        BrowserBackend::Chrome => Err(crate::HarvestError::Session(
            "the chrome backend requires building with the `chrome` feature".to_string(),
        )),
    }
}
