//! Static HTML session over reqwest
//!
//! This backend fetches pages without executing JavaScript. It presents a
//! desktop browser user agent and browser-like `Accept` headers, and keeps a
//! cookie jar so consent cookies survive between requests.

use crate::browser::page::Snapshot;
use crate::browser::traits::BrowserSession;
use crate::config::BrowserConfig;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Browser session backed by plain HTTP requests
pub struct HttpSession {
    client: Client,
    current: Option<Snapshot>,
}

/// Builds an HTTP client that looks like a desktop browser
///
/// # Arguments
///
/// * `config` - The browser configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &BrowserConfig) -> std::result::Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

impl HttpSession {
    /// Creates a session with a freshly built client
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let client = build_http_client(config)
            .map_err(|e| HarvestError::Session(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Creates a session around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    fn current_page(&self) -> Result<&Snapshot> {
        self.current
            .as_ref()
            .ok_or_else(|| HarvestError::Session("no page is loaded".to_string()))
    }
}

/// Maps a transport error to the navigation error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::NavigationTimeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.current = None;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        tracing::trace!("Loaded {} ({} bytes)", final_url, body.len());
        self.current = Some(Snapshot::new(final_url, body));
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
        // Static markup never changes after load, so one check is final.
        Ok(self
            .current
            .as_ref()
            .is_some_and(|snapshot| snapshot.page().exists(selector)))
    }

    async fn click(
        &mut self,
        selector: &str,
        label: Option<&str>,
        _timeout: Duration,
    ) -> Result<bool> {
        let target = match &self.current {
            Some(snapshot) => {
                let page = snapshot.page();
                page.find(selector)
                    .into_iter()
                    .filter(|el| {
                        label.map_or(true, |label| crate::browser::element_text(*el) == label)
                    })
                    .find_map(|el| el.value().attr("href").and_then(|href| page.resolve(href)))
            }
            None => None,
        };

        match target {
            Some(href) => {
                tracing::debug!("Following control '{}' to {}", selector, href);
                self.navigate(&href).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.current_page()?.html.clone())
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(self.current.as_ref().map(|snapshot| snapshot.url.clone()))
    }

    async fn close(&mut self) -> Result<()> {
        self.current = None;
        tracing::debug!("HTTP session closed");
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<Snapshot> {
        Ok(self.current_page()?.clone())
    }
}
