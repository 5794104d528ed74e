//! Link Collector
//!
//! Collects the product addresses on a listing page. Every selector pattern is
//! applied (the matches are pooled, not short-circuited) and the result is
//! deduplicated in first-seen order. When nothing matches at all, every anchor
//! on the page is scanned for the product-path marker.

use crate::browser::Page;
use crate::config::SelectorConfig;
use crate::url::is_product_link;
use std::collections::HashSet;

/// All anchor selectors for product cards, including the marker-based one
pub fn link_selectors(selectors: &SelectorConfig, marker: &str) -> Vec<String> {
    let mut all = selectors.product_links.clone();
    all.push(format!("a[href*='{}']", marker));
    all
}

/// A single selector list matching any product card anchor
///
/// Used to confirm that a listing page actually rendered its products.
pub fn product_link_probe(selectors: &SelectorConfig, marker: &str) -> String {
    link_selectors(selectors, marker).join(", ")
}

/// Collects the deduplicated product links of a listing page
///
/// # Arguments
///
/// * `page` - The parsed listing page
/// * `selectors` - Selector configuration
/// * `marker` - Substring every product address contains
///
/// # Returns
///
/// Absolute product URLs, each appearing once, in document order of the
/// selector that first matched them
pub fn collect_product_links(page: &Page, selectors: &SelectorConfig, marker: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for css in link_selectors(selectors, marker) {
        let before = links.len();
        push_unique(page, &page.attrs(&css, "href"), marker, &mut seen, &mut links);
        tracing::trace!("Selector '{}' added {} links", css, links.len() - before);
    }

    if links.is_empty() {
        tracing::debug!(
            "No product card matched on {}, scanning every anchor for '{}'",
            page.url(),
            marker
        );
        push_unique(page, &page.attrs("a[href]", "href"), marker, &mut seen, &mut links);
    }

    tracing::info!("Collected {} product links on {}", links.len(), page.url());
    links
}

fn push_unique(
    page: &Page,
    hrefs: &[String],
    marker: &str,
    seen: &mut HashSet<String>,
    links: &mut Vec<String>,
) {
    for href in hrefs {
        let Some(url) = page.resolve(href) else {
            continue;
        };
        if is_product_link(&url, marker) && seen.insert(url.clone()) {
            links.push(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.example/cat/soins-visage";

    fn collect(html: &str) -> Vec<String> {
        let page = Page::parse(BASE, html);
        collect_product_links(&page, &SelectorConfig::default(), "/fp/")
    }

    #[test]
    fn test_duplicates_across_selectors_appear_once() {
        let html = r#"
            <a class="product-card-link" href="/fp/creme-1">Crème</a>
            <app-product-card-result-list>
                <a class="product-visual" href="/fp/creme-1#top">img</a>
                <a class="product-visual" href="/fp/gel-2">img</a>
            </app-product-card-result-list>
            <a href="/fp/gel-2?utm_source=x">Gel</a>
        "#;
        assert_eq!(
            collect(html),
            vec![
                "https://shop.example/fp/creme-1".to_string(),
                "https://shop.example/fp/gel-2".to_string(),
            ]
        );
    }

    #[test]
    fn test_links_without_marker_are_rejected() {
        let html = r#"
            <a class="product-card-link" href="/promo/summer">Promo</a>
            <a class="product-card-link" href="/fp/serum-3">Sérum</a>
        "#;
        assert_eq!(collect(html), vec!["https://shop.example/fp/serum-3".to_string()]);
    }

    #[test]
    fn test_fallback_scans_all_anchors() {
        // Relative hrefs only carry the marker once resolved against the page
        let page = Page::parse(
            "https://shop.example/x/",
            r#"<a href="lotion-9">Lotion</a><a href="/">Home</a>"#,
        );
        let mut selectors = SelectorConfig::default();
        selectors.product_links.clear();
        let links = collect_product_links(&page, &selectors, "/x/");
        assert_eq!(links, vec!["https://shop.example/x/lotion-9".to_string()]);
    }

    #[test]
    fn test_empty_listing() {
        assert!(collect("<p>Aucun produit</p>").is_empty());
    }

    #[test]
    fn test_probe_joins_selectors() {
        let probe = product_link_probe(&SelectorConfig::default(), "/fp/");
        assert!(probe.starts_with("a.product-card-link, "));
        assert!(probe.ends_with("a[href*='/fp/']"));
    }
}
