use url::Url;

/// Query parameters that only track where a click came from
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(normalize_product_url(absolute_url))
    } else {
        None
    }
}

/// Normalizes a product address so the same product is only visited once
///
/// # Normalization Steps
///
/// 1. Lowercase the host
/// 2. Remove the fragment
/// 3. Remove tracking query parameters, keeping the others in order
/// 4. Remove an empty query string
fn normalize_product_url(mut url: Url) -> String {
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            // set_host only fails for hosts that could not have parsed in the first place
            let _ = url.set_host(Some(&lowered));
        }
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://www.shop.example/cat/soins-visage?page=2").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("/fp/creme-3282770204681", &base_url()),
            Some("https://www.shop.example/fp/creme-3282770204681".to_string())
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        assert_eq!(
            resolve_link("https://other.example/fp/x", &base_url()),
            Some("https://other.example/fp/x".to_string())
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        assert_eq!(resolve_link("javascript:void(0)", &base_url()), None);
        assert_eq!(resolve_link("mailto:a@b.example", &base_url()), None);
        assert_eq!(resolve_link("tel:+33100000000", &base_url()), None);
        assert_eq!(resolve_link("data:text/html,x", &base_url()), None);
        assert_eq!(resolve_link("#reviews", &base_url()), None);
        assert_eq!(resolve_link("   ", &base_url()), None);
    }

    #[test]
    fn test_strip_fragment_and_tracking() {
        assert_eq!(
            resolve_link("/fp/creme-1?utm_source=mail&size=50#avis", &base_url()),
            Some("https://www.shop.example/fp/creme-1?size=50".to_string())
        );
        assert_eq!(
            resolve_link("/fp/creme-1?utm_campaign=x", &base_url()),
            Some("https://www.shop.example/fp/creme-1".to_string())
        );
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(
            resolve_link("https://WWW.SHOP.EXAMPLE/fp/a", &base_url()),
            Some("https://www.shop.example/fp/a".to_string())
        );
    }
}
