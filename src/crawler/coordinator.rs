//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one run end to end:
//! - Accepting the cookie overlay and resolving the page count
//! - Walking every listing page and extracting each linked product
//! - Checkpointing the accumulated records as they grow
//! - Finalizing: last export, session release, status reset

use crate::browser::{open_session, BrowserSession};
use crate::config::Config;
use crate::crawler::pagination::PaginationResolver;
use crate::extract::{collect_product_links, ProductExtractor};
use crate::output::{CrawlReport, Exporter};
use crate::state::{CrawlPhase, ProductRecord, StatusHandle};
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;

/// What to crawl in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Root address of the category listing
    pub category_url: String,
    /// Optional cap on the number of listing pages
    pub max_pages: Option<u32>,
}

impl CrawlRequest {
    /// The category and page cap from the configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            category_url: config.crawl.category_url.clone(),
            max_pages: config.crawl.max_pages,
        }
    }
}

/// Main crawler coordinator structure
///
/// A coordinator runs exactly one crawl. It holds no state across runs other
/// than the files it exported.
pub struct Coordinator {
    config: Arc<Config>,
    status: StatusHandle,
    resolver: PaginationResolver,
    extractor: ProductExtractor,
    exporter: Exporter,
    records: Vec<ProductRecord>,
    since_checkpoint: usize,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `status` - Progress handle shared with pollers; the caller has
    ///   already called `StatusHandle::begin` on it
    pub fn new(config: Arc<Config>, status: StatusHandle) -> Self {
        Self {
            resolver: PaginationResolver::from_config(&config),
            extractor: ProductExtractor::from_config(&config),
            exporter: Exporter::from_config(&config.output),
            report: CrawlReport::new(&config.crawl.category_url),
            records: Vec::new(),
            since_checkpoint: 0,
            status,
            config,
        }
    }

    /// Overrides where exports go
    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Records the hash of the configuration file in the run report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.report.config_hash = Some(hash.into());
        self
    }

    /// Records accumulated so far
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Runs the crawl with a freshly opened browser session
    ///
    /// A session that cannot be opened is fatal: the run goes straight to
    /// finalizing with nothing accumulated.
    pub async fn run(&mut self, request: &CrawlRequest) -> CrawlReport {
        match open_session(&self.config.browser).await {
            Ok(mut session) => self.run_with_session(session.as_mut(), request).await,
            Err(e) => {
                tracing::error!("Could not start a browser session: {}", e);
                self.finalize(None, Some(e)).await
            }
        }
    }

    /// Runs the crawl on an existing session, then releases it
    pub async fn run_with_session(
        &mut self,
        session: &mut dyn BrowserSession,
        request: &CrawlRequest,
    ) -> CrawlReport {
        tracing::info!(
            "Starting crawl of {} with the {} backend",
            request.category_url,
            session.backend_name()
        );

        let error = self.crawl(session, request).await.err();
        if let Some(e) = &error {
            tracing::error!("Crawl stopped early: {}", e);
        }
        self.finalize(Some(session), error).await
    }

    /// Initializing and the page loop
    async fn crawl(&mut self, session: &mut dyn BrowserSession, request: &CrawlRequest) -> Result<()> {
        let base = request.category_url.as_str();
        let wait = Duration::from_secs(self.config.browser.wait_timeout_secs);

        self.accept_consent(session, base).await?;

        session.navigate(base).await?;
        if !self.resolver.products_rendered(session, wait).await? {
            tracing::warn!("No product cards rendered on {}", base);
        }

        let snapshot = session.snapshot().await?;
        let (total_pages, mut first_links) = {
            let page = snapshot.page();
            (
                self.resolver.resolve_total_pages(&page, request.max_pages),
                collect_product_links(
                    &page,
                    &self.config.selectors,
                    &self.config.crawl.product_path_marker,
                ),
            )
        };

        self.report.pages_planned = total_pages;
        let estimate = first_links.len() as u64 * u64::from(total_pages);
        self.status.set_estimate(estimate);
        tracing::info!(
            "{} pages to crawl, about {} products",
            total_pages,
            estimate
        );

        for page_number in 1..=total_pages {
            self.status.transition(CrawlPhase::Navigating { page: page_number })?;
            tracing::info!("Crawling page {}/{}", page_number, total_pages);

            let links = if page_number == 1 {
                std::mem::take(&mut first_links)
            } else {
                if !self
                    .resolver
                    .navigate_to_page(session, base, page_number)
                    .await?
                {
                    tracing::error!("Skipping page {}: it could not be reached", page_number);
                    self.report.pages_skipped += 1;
                    continue;
                }
                let snapshot = session.snapshot().await?;
                let page = snapshot.page();
                collect_product_links(
                    &page,
                    &self.config.selectors,
                    &self.config.crawl.product_path_marker,
                )
            };

            self.report.pages_visited += 1;
            self.status.transition(CrawlPhase::Extracting { page: page_number })?;

            for link in &links {
                match self.extractor.extract_product(session, link).await? {
                    Some(record) => self.accept(record),
                    None => self.report.products_failed += 1,
                }
            }

            self.checkpoint();

            if page_number < total_pages {
                self.pause().await;
            }
        }

        Ok(())
    }

    /// Dismisses the cookie overlay; absence or a timeout is not an error
    async fn accept_consent(&mut self, session: &mut dyn BrowserSession, base: &str) -> Result<()> {
        let timeout = Duration::from_secs(self.config.browser.consent_timeout_secs);
        let selector = self.config.browser.consent_selector.clone();

        let outcome = match session.navigate(base).await {
            Ok(()) => session.click(&selector, None, timeout).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(true) => tracing::info!("Cookie consent accepted"),
            Ok(false) => tracing::info!("No cookie consent overlay"),
            Err(e) if e.is_session_fault() => return Err(e),
            Err(e) => tracing::info!("Cookie consent skipped: {}", e),
        }
        Ok(())
    }

    fn accept(&mut self, record: ProductRecord) {
        tracing::info!("Scraped product: {}", record.name);
        self.status.record_product(&record.name);
        self.report.note_record(&record);
        self.records.push(record);

        self.since_checkpoint += 1;
        if self.since_checkpoint >= self.config.crawl.checkpoint_every {
            self.checkpoint();
        }
    }

    /// Exports everything accumulated so far
    ///
    /// A failed checkpoint is logged and the run continues; the next
    /// checkpoint rewrites the whole file anyway.
    fn checkpoint(&mut self) {
        if self.records.is_empty() || self.since_checkpoint == 0 {
            return;
        }
        match self.exporter.export(&self.records) {
            Ok(path) => {
                tracing::debug!("Checkpoint: {} records in {}", self.records.len(), path.display());
                self.report.checkpoints += 1;
                self.report.export_path = Some(path);
                self.since_checkpoint = 0;
            }
            Err(e) => tracing::error!("Checkpoint failed: {}", e),
        }
    }

    /// Randomized pause between listing pages
    async fn pause(&self) {
        let (min, max) = (self.config.crawl.pause_min_ms, self.config.crawl.pause_max_ms);
        let millis = if max > min { fastrand::u64(min..=max) } else { min };
        if millis > 0 {
            tracing::debug!("Pausing {} ms", millis);
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Final export, session release and status reset
    async fn finalize(
        &mut self,
        session: Option<&mut dyn BrowserSession>,
        error: Option<HarvestError>,
    ) -> CrawlReport {
        if let Err(e) = self.status.transition(CrawlPhase::Finalizing) {
            tracing::debug!("{}", e);
        }

        let mut error = error.map(|e| e.to_string());

        if self.records.is_empty() {
            tracing::warn!("No records to export");
        } else {
            match self.exporter.export(&self.records) {
                Ok(path) => {
                    tracing::info!("Exported {} records to {}", self.records.len(), path.display());
                    self.report.export_path = Some(path);
                }
                Err(e) => {
                    tracing::error!("Final export failed: {}", e);
                    error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(session) = session {
            if let Err(e) = session.close().await {
                tracing::warn!("Browser session did not close cleanly: {}", e);
            }
        }

        self.status.finish();
        self.report.finish(error);
        tracing::info!(
            "Crawl finished: {} products from {} pages",
            self.report.products_extracted,
            self.report.pages_visited
        );
        self.report.clone()
    }
}

/// Runs a complete crawl
///
/// This is the blocking entry point: it marks the run as started, opens a
/// browser session, crawls, and returns the run report once finalized.
///
/// # Errors
///
/// Only `HarvestError::AlreadyRunning`, when `status` belongs to a run that
/// is still in progress. Faults during the run end up in the report.
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::load_config;
/// use catalog_harvest::crawler::{run_crawl, CrawlRequest};
/// use catalog_harvest::StatusHandle;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let request = CrawlRequest::from_config(&config);
/// let report = run_crawl(Arc::new(config), request, StatusHandle::new()).await?;
/// println!("{} products", report.products_extracted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Arc<Config>,
    request: CrawlRequest,
    status: StatusHandle,
) -> Result<CrawlReport> {
    status.begin()?;
    let mut coordinator = Coordinator::new(config, status);
    Ok(coordinator.run(&request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::FixtureSession;
    use tempfile::TempDir;

    const BASE: &str = "https://shop.example/cat/soins";

    fn config(csv: &std::path::Path) -> Arc<Config> {
        let toml = format!(
            r#"
            [crawl]
            category-url = "{}"
            category-label = "Soins Visage"
            checkpoint-every = 2
            pause-min-ms = 0
            pause-max-ms = 0

            [browser]
            wait-timeout-secs = 1
            consent-timeout-secs = 1

            [output]
            csv-path = "{}"
            backup = false
            "#,
            BASE,
            csv.display()
        );
        Arc::new(crate::config::parse_config(&toml).unwrap())
    }

    fn listing(products: &[&str], pages: u32) -> String {
        let cards: String = products
            .iter()
            .map(|slug| format!(r#"<a class="product-card-link" href="/fp/{}">{}</a>"#, slug, slug))
            .collect();
        let nav: String = (1..=pages)
            .map(|n| format!(r#"<a href="/cat/soins?page={}">{}</a>"#, n, n))
            .collect();
        format!(r#"<html><body>{}<nav class="pagination">{}</nav></body></html>"#, cards, nav)
    }

    fn product(name: &str) -> String {
        format!(
            r#"<html><body><h1 class="product-block-title">{}</h1><div class="price">9,90 €</div></body></html>"#,
            name
        )
    }

    fn coordinator(dir: &TempDir) -> (Coordinator, StatusHandle) {
        let csv = dir.path().join("products.csv");
        let status = StatusHandle::new();
        status.begin().unwrap();
        let exporter = Exporter::new(&csv, false).with_fallback_dir(dir.path());
        let coordinator = Coordinator::new(config(&csv), status.clone()).with_exporter(exporter);
        (coordinator, status)
    }

    fn request() -> CrawlRequest {
        CrawlRequest {
            category_url: BASE.to_string(),
            max_pages: None,
        }
    }

    #[tokio::test]
    async fn test_two_page_crawl() {
        let dir = TempDir::new().unwrap();
        let (mut coordinator, status) = coordinator(&dir);
        let mut session = FixtureSession::new()
            .with_page(BASE, &listing(&["creme-1", "gel-2"], 2))
            .with_page(&format!("{}?page=2", BASE), &listing(&["serum-3"], 2))
            .with_page("https://shop.example/fp/creme-1", &product("Avène Crème"))
            .with_page("https://shop.example/fp/gel-2", &product("Nuxe Gel"))
            .with_page("https://shop.example/fp/serum-3", &product("Vichy Sérum"));

        let report = coordinator.run_with_session(&mut session, &request()).await;

        assert_eq!(report.pages_planned, 2);
        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.products_extracted, 3);
        assert!(report.error.is_none());
        assert!(session.closed);

        let names: Vec<_> = coordinator.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Avène Crème", "Nuxe Gel", "Vichy Sérum"]);

        let snap = status.snapshot();
        assert!(!snap.in_progress);
        assert_eq!(snap.processed_count, 3);
        assert_eq!(snap.total_products_estimate, 4);
        assert_eq!(snap.last_product_name, "Vichy Sérum");
        assert!(dir.path().join("products.csv").exists());
    }

    #[tokio::test]
    async fn test_product_timeout_is_skipped() {
        let dir = TempDir::new().unwrap();
        let (mut coordinator, _) = coordinator(&dir);
        let mut session = FixtureSession::new()
            .with_page(BASE, &listing(&["creme-1", "gel-2"], 1))
            .with_timeout("https://shop.example/fp/creme-1")
            .with_page("https://shop.example/fp/gel-2", &product("Nuxe Gel"));

        let report = coordinator.run_with_session(&mut session, &request()).await;
        assert_eq!(report.products_extracted, 1);
        assert_eq!(report.products_failed, 1);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_page_is_skipped() {
        let dir = TempDir::new().unwrap();
        let (mut coordinator, _) = coordinator(&dir);
        let mut session = FixtureSession::new()
            .with_page(BASE, &listing(&["creme-1"], 3))
            .with_page(&format!("{}?page=3", BASE), &listing(&["gel-2"], 3))
            .with_page("https://shop.example/fp/creme-1", &product("Avène Crème"))
            .with_page("https://shop.example/fp/gel-2", &product("Nuxe Gel"));

        let report = coordinator.run_with_session(&mut session, &request()).await;
        assert_eq!(report.pages_planned, 3);
        assert_eq!(report.pages_skipped, 1);
        assert_eq!(report.products_extracted, 2);
    }

    #[tokio::test]
    async fn test_session_fault_keeps_partial_results() {
        let dir = TempDir::new().unwrap();
        let (mut coordinator, status) = coordinator(&dir);
        let mut session = FixtureSession::new()
            .with_page(BASE, &listing(&["creme-1", "gel-2"], 1))
            .with_page("https://shop.example/fp/creme-1", &product("Avène Crème"));
        session.fail_session_on = Some("https://shop.example/fp/gel-2".to_string());

        let report = coordinator.run_with_session(&mut session, &request()).await;
        assert_eq!(report.products_extracted, 1);
        assert!(report.error.is_some());
        assert!(session.closed);
        assert!(!status.snapshot().in_progress);

        let exported = std::fs::read_to_string(dir.path().join("products.csv")).unwrap();
        assert!(exported.contains("Avène Crème"));
    }

    #[tokio::test]
    async fn test_max_pages_limits_crawl() {
        let dir = TempDir::new().unwrap();
        let (mut coordinator, _) = coordinator(&dir);
        let mut session = FixtureSession::new()
            .with_page(BASE, &listing(&["creme-1"], 5))
            .with_page("https://shop.example/fp/creme-1", &product("Avène Crème"));

        let request = CrawlRequest {
            max_pages: Some(1),
            ..request()
        };
        let report = coordinator.run_with_session(&mut session, &request).await;
        assert_eq!(report.pages_planned, 1);
        assert_eq!(report.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_run_crawl_rejects_concurrent_run() {
        let dir = TempDir::new().unwrap();
        let status = StatusHandle::new();
        status.begin().unwrap();
        let result = run_crawl(config(&dir.path().join("x.csv")), request(), status).await;
        assert!(matches!(result, Err(HarvestError::AlreadyRunning)));
    }
}
