//! Pagination Resolver
//!
//! Works out how many listing pages a category has and moves the session to
//! an arbitrary page. Both are fallback chains: page markup drifts, and no
//! single numbering signal survives every redesign.

use crate::browser::{BrowserSession, Page};
use crate::chain::FallbackChain;
use crate::config::{Config, SelectorConfig};
use crate::extract::{link_selectors, product_link_probe};
use crate::url::{page_formats, page_url, PageUrlFormat};
use crate::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static PAGE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&;]page=(\d+)").expect("valid page query pattern"));

static RESULT_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:sur|of)\s+(\d+)").expect("valid result count pattern"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("valid number pattern"));

/// Inline elements whose text may be a bare page number
const INLINE_NUMBER_SELECTOR: &str = "a, span, li, button";

/// Longest text still treated as a page number label
const MAX_LABEL_DIGITS: usize = 3;

/// Exclusive bounds for page numbers guessed from free body text
const BODY_NUMBER_RANGE: (u32, u32) = (1, 100);

/// What a page-count strategy can look at
pub struct PageCountContext<'a> {
    pub page: &'a Page,
    pub selectors: &'a SelectorConfig,
    pub page_size: u32,
}

/// The page-count chain, in the order strategies are tried
pub fn page_count_chain<'a>() -> FallbackChain<PageCountContext<'a>, u32> {
    FallbackChain::new("total-pages")
        .then("inline-numbers", count_from_inline_numbers)
        .then("pagination-region", count_from_pagination_region)
        .then("page-query", count_from_page_query)
        .then("result-count", count_from_result_count)
        .then("body-numbers", count_from_body_numbers)
}

/// Accepts a candidate only when it actually implies more than one page
fn plausible(count: Option<u32>) -> Option<u32> {
    count.filter(|n| *n > 1)
}

fn parse_label(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || text.len() > MAX_LABEL_DIGITS || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn count_from_inline_numbers(ctx: &PageCountContext<'_>) -> Option<u32> {
    plausible(
        ctx.page
            .texts(INLINE_NUMBER_SELECTOR)
            .iter()
            .filter_map(|text| parse_label(text))
            .max(),
    )
}

fn count_from_pagination_region(ctx: &PageCountContext<'_>) -> Option<u32> {
    // Numbers are read from the whole label so "1 / 12" counts as 12
    plausible(
        ctx.selectors
            .pagination
            .iter()
            .flat_map(|css| ctx.page.texts(css))
            .flat_map(|text| {
                NUMBER
                    .find_iter(&text)
                    .filter_map(|m| m.as_str().parse::<u32>().ok())
                    .collect::<Vec<_>>()
            })
            .max(),
    )
}

fn count_from_page_query(ctx: &PageCountContext<'_>) -> Option<u32> {
    plausible(
        PAGE_QUERY
            .captures_iter(ctx.page.markup())
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .max(),
    )
}

/// "1-24 sur 123 produits" gives ceil(123 / page_size)
fn count_from_result_count(ctx: &PageCountContext<'_>) -> Option<u32> {
    let page_size = ctx.page_size.max(1);
    ctx.selectors
        .result_count
        .iter()
        .flat_map(|css| ctx.page.texts(css))
        .find_map(|text| {
            let total: u32 = RESULT_COUNT.captures(&text)?.get(1)?.as_str().parse().ok()?;
            (total > 0).then(|| total.div_ceil(page_size))
        })
}

fn count_from_body_numbers(ctx: &PageCountContext<'_>) -> Option<u32> {
    let (low, high) = BODY_NUMBER_RANGE;
    NUMBER
        .find_iter(&ctx.page.body_text())
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > low && *n < high)
        .max()
}

/// Page count resolution and page navigation for one category
#[derive(Debug, Clone)]
pub struct PaginationResolver {
    selectors: SelectorConfig,
    page_size: u32,
    fallback_total_pages: u32,
    formats: Vec<PageUrlFormat>,
    probe: String,
    card_selectors: Vec<String>,
    wait_timeout: Duration,
}

impl PaginationResolver {
    pub fn from_config(config: &Config) -> Self {
        Self {
            selectors: config.selectors.clone(),
            page_size: config.crawl.page_size,
            fallback_total_pages: config.crawl.fallback_total_pages,
            formats: page_formats(&config.crawl.page_params),
            probe: product_link_probe(&config.selectors, &config.crawl.product_path_marker),
            card_selectors: link_selectors(&config.selectors, &config.crawl.product_path_marker),
            wait_timeout: Duration::from_secs(config.browser.wait_timeout_secs),
        }
    }

    /// Waits until the current page shows at least one product card
    ///
    /// The joined selector list covers every card pattern in a single wait.
    /// One malformed selector invalidates that whole list, so each selector
    /// is then checked on its own against the loaded page.
    pub async fn products_rendered(
        &self,
        session: &mut dyn BrowserSession,
        timeout: Duration,
    ) -> Result<bool> {
        if session.wait_for(&self.probe, timeout).await? {
            return Ok(true);
        }
        for css in &self.card_selectors {
            if session.wait_for(css, Duration::ZERO).await? {
                tracing::debug!("Product cards found with '{}' alone", css);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Determines how many listing pages the category has
    ///
    /// Falls back to the configured page count when no strategy finds a
    /// plausible value, then clamps to `max_pages` when given.
    pub fn resolve_total_pages(&self, page: &Page, max_pages: Option<u32>) -> u32 {
        let ctx = PageCountContext {
            page,
            selectors: &self.selectors,
            page_size: self.page_size,
        };

        let total = match page_count_chain().resolve_named(&ctx) {
            Some((strategy, total)) => {
                tracing::info!("Resolved {} listing pages via {}", total, strategy);
                total
            }
            None => {
                tracing::warn!(
                    "No pagination signal found, assuming {} pages",
                    self.fallback_total_pages
                );
                self.fallback_total_pages
            }
        };

        match max_pages {
            Some(max) if max < total => {
                tracing::info!("Limiting crawl to {} of {} pages", max, total);
                max
            }
            _ => total,
        }
    }

    /// Moves the session to listing page `page_number`
    ///
    /// Every address format is tried in turn and confirmed by the presence of
    /// product cards. If none works, the root listing is reloaded and a
    /// pagination control labelled with the page number is clicked.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The page is loaded and shows products
    /// * `Ok(false)` - Every strategy failed; the caller skips the page
    /// * `Err(_)` - The session itself failed
    pub async fn navigate_to_page(
        &self,
        session: &mut dyn BrowserSession,
        base_url: &str,
        page_number: u32,
    ) -> Result<bool> {
        for format in &self.formats {
            let url = page_url(base_url, format, page_number)?;
            match session.navigate(&url).await {
                Ok(()) => {}
                Err(e) if e.is_session_fault() => return Err(e),
                Err(e) => {
                    tracing::debug!("Page {} not reachable at {}: {}", page_number, url, e);
                    continue;
                }
            }

            if self.products_rendered(session, self.wait_timeout).await? {
                tracing::debug!("Reached page {} at {}", page_number, url);
                return Ok(true);
            }
            tracing::debug!("No products at {}", url);
        }

        self.click_to_page(session, base_url, page_number).await
    }

    async fn click_to_page(
        &self,
        session: &mut dyn BrowserSession,
        base_url: &str,
        page_number: u32,
    ) -> Result<bool> {
        match session.navigate(base_url).await {
            Ok(()) => {}
            Err(e) if e.is_session_fault() => return Err(e),
            Err(e) => {
                tracing::warn!("Could not reload {} to click page {}: {}", base_url, page_number, e);
                return Ok(false);
            }
        }

        let label = page_number.to_string();
        for css in &self.selectors.page_controls {
            let clicked = match session.click(css, Some(&label), self.wait_timeout).await {
                Ok(clicked) => clicked,
                Err(e) if e.is_session_fault() => return Err(e),
                Err(e) => {
                    tracing::debug!("Control '{}' for page {} failed: {}", css, page_number, e);
                    false
                }
            };
            if clicked && self.products_rendered(session, self.wait_timeout).await? {
                tracing::debug!("Reached page {} by clicking '{}'", page_number, css);
                return Ok(true);
            }
        }

        tracing::warn!("Every strategy failed to reach page {}", page_number);
        Ok(false)
    }
}
