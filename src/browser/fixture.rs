//! In-memory session for unit tests

use crate::browser::page::Snapshot;
use crate::browser::traits::BrowserSession;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Serves canned markup keyed by exact URL
#[derive(Default)]
pub struct FixtureSession {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    current: Option<Snapshot>,
    pub visits: Vec<String>,
    pub closed: bool,
    pub fail_session_on: Option<String>,
}

impl FixtureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Makes navigation to `url` time out
    pub fn with_timeout(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

#[async_trait]
impl BrowserSession for FixtureSession {
    fn backend_name(&self) -> &'static str {
        "fixture"
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.visits.push(url.to_string());
        self.current = None;

        if self.fail_session_on.as_deref() == Some(url) {
            return Err(HarvestError::Session("browser crashed".to_string()));
        }
        if self.failing.contains(url) {
            return Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
            });
        }
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(Snapshot::new(url, html.clone()));
                Ok(())
            }
            None => Err(HarvestError::Navigation {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
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
                self.navigate(&href).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        self.current
            .as_ref()
            .map(|snapshot| snapshot.html.clone())
            .ok_or_else(|| HarvestError::Session("no page is loaded".to_string()))
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(self.current.as_ref().map(|snapshot| snapshot.url.clone()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
