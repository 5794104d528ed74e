//! Field Extractor
//!
//! Turns a loaded product page into a `ProductRecord`. Each field runs its
//! own fallback chain; a field that no strategy can fill is left empty (or
//! set to the price sentinel) and the record is kept.

use super::fields::{
    brand_chain, extract_price, identifier_chain, name_chain, BrandContext, FieldContext,
};
use crate::browser::{BrowserSession, Page};
use crate::config::{Config, SelectorConfig};
use crate::state::ProductRecord;
use crate::Result;
use chrono::{Local, NaiveDate};
use std::time::Duration;

/// Upper bound on waiting for a product page to render its heading
const PRODUCT_SETTLE_CAP: Duration = Duration::from_secs(10);

/// Extracts product records with one fixed selector set and category label
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    selectors: SelectorConfig,
    category: String,
    settle_timeout: Duration,
}

impl ProductExtractor {
    pub fn new(selectors: SelectorConfig, category: impl Into<String>, settle_timeout: Duration) -> Self {
        Self {
            selectors,
            category: category.into(),
            settle_timeout: settle_timeout.min(PRODUCT_SETTLE_CAP),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.selectors.clone(),
            config.crawl.category_label.clone(),
            Duration::from_secs(config.browser.wait_timeout_secs),
        )
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Builds a record from an already parsed product page
    pub fn extract_from_page(&self, page: &Page, url: &str, capture_date: NaiveDate) -> ProductRecord {
        let ctx = FieldContext {
            page,
            url,
            selectors: &self.selectors,
        };

        let name = name_chain().resolve(&ctx).unwrap_or_default();
        if name.is_empty() {
            tracing::warn!("No product name found on {}", url);
        }

        let identifier = identifier_chain().resolve(&ctx).unwrap_or_default();
        if identifier.is_empty() {
            tracing::debug!("No 13-digit identifier found on {}", url);
        }

        let price = extract_price(&ctx);

        let brand = {
            let brand_ctx = BrandContext {
                fields: &ctx,
                name: &name,
            };
            brand_chain(self.selectors.brand_from_name)
                .resolve(&brand_ctx)
                .unwrap_or_default()
        };

        ProductRecord {
            url: url.to_string(),
            capture_date,
            name,
            brand,
            category: self.category.clone(),
            identifier,
            price,
            extras: Default::default(),
        }
    }

    /// Loads a product page and extracts its record
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The page loaded; missing fields are empty
    /// * `Ok(None)` - The page could not be loaded (timeout, HTTP error)
    /// * `Err(_)` - The browser session itself failed
    pub async fn extract_product(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<Option<ProductRecord>> {
        match self.load_product(session, url).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_session_fault() => Err(e),
            Err(e) => {
                tracing::warn!("Skipping product {}: {}", url, e);
                Ok(None)
            }
        }
    }

    /// Like `extract_product`, but a page that fails to load is an error
    /// carrying the cause (timeout, HTTP status)
    pub async fn load_product(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<ProductRecord> {
        session.navigate(url).await?;

        if !session
            .wait_for(&self.selectors.heading, self.settle_timeout)
            .await?
        {
            tracing::debug!("No heading rendered on {}, extracting anyway", url);
        }

        let snapshot = session.snapshot().await?;
        let record = self.extract_from_page(&snapshot.page(), url, Local::now().date_naive());
        tracing::debug!("Extracted '{}' ({}) from {}", record.name, record.price, url);
        Ok(record)
    }
}
