//! Headless Chrome session over the DevTools protocol
//!
//! Used for listings that only render product cards through JavaScript.
//! The browser is launched with automation hints disabled, a desktop user
//! agent, and a script that hides `navigator.webdriver` on every document.

use crate::browser::traits::BrowserSession;
use crate::config::BrowserConfig;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page as Tab;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Browser session driving a local headless Chrome
pub struct ChromeSession {
    browser: Browser,
    tab: Tab,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    closed: bool,
}

fn session_error(context: &str, error: impl std::fmt::Display) -> HarvestError {
    HarvestError::Session(format!("{}: {}", context, error))
}

impl ChromeSession {
    /// Launches Chrome and opens the single tab used for the whole run
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = LaunchConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", config.user_agent))
            .request_timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        let launch = builder
            .build()
            .map_err(|e| session_error("invalid Chrome configuration", e))?;

        let (browser, mut handler) = Browser::launch(launch)
            .await
            .map_err(|e| session_error("failed to launch Chrome", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("Chrome handler event error: {}", e);
                }
            }
        });

        let tab = browser
            .new_page("about:blank")
            .await
            .map_err(|e| session_error("failed to open tab", e))?;

        tab.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| session_error("failed to install stealth script", e))?;

        tracing::info!("Headless Chrome session started");

        Ok(Self {
            browser,
            tab,
            handler_task,
            navigation_timeout: Duration::from_secs(config.request_timeout_secs),
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed || self.handler_task.is_finished() {
            return Err(HarvestError::Session("Chrome is no longer running".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn backend_name(&self) -> &'static str {
        "chrome"
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        match tokio::time::timeout(self.navigation_timeout, self.tab.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(HarvestError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        self.ensure_open()?;
        let started = Instant::now();
        loop {
            if self.tab.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(
        &mut self,
        selector: &str,
        label: Option<&str>,
        timeout: Duration,
    ) -> Result<bool> {
        if !self.wait_for(selector, timeout).await? {
            return Ok(false);
        }

        let elements = match self.tab.find_elements(selector).await {
            Ok(elements) => elements,
            Err(_) => return Ok(false),
        };

        for element in elements {
            if let Some(label) = label {
                let text = element.inner_text().await.ok().flatten().unwrap_or_default();
                if text.trim() != label {
                    continue;
                }
            }
            if element.click().await.is_ok() {
                // Let the click settle before the caller inspects the page
                let _ = self.tab.wait_for_navigation().await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn page_source(&mut self) -> Result<String> {
        self.ensure_open()?;
        self.tab
            .content()
            .await
            .map_err(|e| session_error("failed to read page content", e))
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        self.ensure_open()?;
        self.tab
            .url()
            .await
            .map_err(|e| session_error("failed to read page address", e))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Chrome did not close cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        tracing::info!("Headless Chrome session closed");
        Ok(())
    }
}
