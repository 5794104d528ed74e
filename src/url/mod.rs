//! URL handling module for Catalog Harvest
//!
//! This module provides link resolution and normalization, product-path
//! classification, and the listing page address formats used by pagination.

mod normalize;
mod paging;

pub use normalize::resolve_link;
pub use paging::{page_formats, page_url, PageUrlFormat};

use url::Url;

/// Returns true if the address points at a product page
///
/// A link is a product link if and only if it contains the product-path
/// marker substring.
pub fn is_product_link(url: &str, marker: &str) -> bool {
    !marker.is_empty() && url.contains(marker)
}

/// The last non-empty path segment of an address
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Every token of the address path, split on `/`, `-` and `_`
pub fn path_tokens(url: &str) -> Vec<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    path.split(['/', '-', '_', '.'])
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_product_link() {
        assert!(is_product_link("https://shop.example/fp/creme-1", "/fp/"));
        assert!(!is_product_link("https://shop.example/cat/soins", "/fp/"));
        assert!(!is_product_link("https://shop.example/fp/creme-1", ""));
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("https://shop.example/fp/creme-hydratante-3282770204681/"),
            Some("creme-hydratante-3282770204681".to_string())
        );
        assert_eq!(last_path_segment("https://shop.example/"), None);
        assert_eq!(last_path_segment("not a url"), None);
    }

    #[test]
    fn test_path_tokens() {
        let tokens = path_tokens("https://shop.example/fp/gel-doux-3282770204681?x=1");
        assert_eq!(tokens, vec!["fp", "gel", "doux", "3282770204681"]);
    }
}
