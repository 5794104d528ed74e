//! DOM snapshots
//!
//! A `Snapshot` is the raw markup of the page a session currently shows. It is
//! `Send` and cheap to move between tasks. Parsing it yields a `Page`, which
//! answers selector queries synchronously; `Page` wraps `scraper::Html` and
//! must not be held across an `.await`.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Markup of a loaded page plus the address it was served from
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub url: String,
    pub html: String,
}

impl Snapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Parses the markup into a queryable page
    pub fn page(&self) -> Page {
        Page::parse(&self.url, &self.html)
    }
}

/// A parsed page that answers selector queries
pub struct Page {
    url: String,
    markup: String,
    document: Html,
}

/// Tags whose text is never visible to a shopper
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

impl Page {
    /// Parses an HTML document served from `url`
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            markup: html.to_string(),
            document: Html::parse_document(html),
        }
    }

    /// The address the page was served from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw page markup
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// All elements matching a CSS selector
    ///
    /// An invalid selector is treated as a miss, not an error.
    pub fn find(&self, css: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(css) {
            Some(selector) => self.document.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    /// Returns true if at least one element matches the selector
    pub fn exists(&self, css: &str) -> bool {
        match parse_selector(css) {
            Some(selector) => self.document.select(&selector).next().is_some(),
            None => false,
        }
    }

    /// Whitespace-normalized text of every element matching the selector
    pub fn texts(&self, css: &str) -> Vec<String> {
        self.find(css).into_iter().map(element_text).collect()
    }

    /// Text of the first element matching the selector, if non-empty
    pub fn first_text(&self, css: &str) -> Option<String> {
        self.find(css)
            .into_iter()
            .map(element_text)
            .find(|text| !text.is_empty())
    }

    /// Tries each selector in order and returns the first non-empty text
    pub fn first_text_of(&self, selectors: &[String]) -> Option<String> {
        selectors.iter().find_map(|css| self.first_text(css))
    }

    /// Values of `attr` on every element matching the selector
    pub fn attrs(&self, css: &str, attr: &str) -> Vec<String> {
        self.find(css)
            .into_iter()
            .filter_map(|el| el.value().attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// Visible text of the document body
    ///
    /// Text nodes are joined with single spaces; script and style content is
    /// skipped.
    pub fn body_text(&self) -> String {
        let root = self
            .find("body")
            .into_iter()
            .next()
            .unwrap_or_else(|| self.document.root_element());

        let mut parts = Vec::new();
        for node in root.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_TAGS.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let text = normalize_whitespace(text);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    /// Resolves a link found on this page to an absolute address
    pub fn resolve(&self, href: &str) -> Option<String> {
        crate::url::resolve_link(href, &Url::parse(&self.url).ok()?)
    }
}

/// Whitespace-normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector '{}': {:?}", css, e);
            None
        }
    }
}
