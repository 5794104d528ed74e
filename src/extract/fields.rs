//! Per-field fallback strategies
//!
//! Each field of a product page has its own chain. A strategy only inspects
//! the parsed page and returns `None` when its signal is missing; the chain
//! moves on to the next one. No strategy can fail the whole record.

use crate::browser::{element_text, normalize_whitespace, Page};
use crate::chain::FallbackChain;
use crate::config::SelectorConfig;
use crate::state::PRICE_UNAVAILABLE;
use crate::url::{last_path_segment, path_tokens};
use regex::Regex;
use std::sync::LazyLock;

static EAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{13}\b").expect("valid EAN pattern"));

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[,.]\d{2}\s*€").expect("valid price pattern"));

/// Minimum length of a heading accepted as a product name
const MIN_HEADING_CHARS: usize = 5;

/// Minimum length of a name's first word accepted as a brand
const MIN_BRAND_CHARS: usize = 2;

/// What a field strategy can look at
pub struct FieldContext<'a> {
    pub page: &'a Page,
    pub url: &'a str,
    pub selectors: &'a SelectorConfig,
}

/// Brand strategies also see the name extracted just before
pub struct BrandContext<'a> {
    pub fields: &'a FieldContext<'a>,
    pub name: &'a str,
}

// ---------------------------------------------------------------------------
// Name
// ---------------------------------------------------------------------------

pub fn name_chain<'a>() -> FallbackChain<FieldContext<'a>, String> {
    FallbackChain::new("name")
        .then("title-selectors", name_from_title_selectors)
        .then("heading-scan", name_from_headings)
        .then("url-slug", name_from_url)
}

fn name_from_title_selectors(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.page.first_text_of(&ctx.selectors.title)
}

fn name_from_headings(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.page
        .texts(&ctx.selectors.heading)
        .into_iter()
        .find(|text| text.chars().count() > MIN_HEADING_CHARS)
}

/// `creme-hydratante-3282770204681` becomes `creme hydratante`
fn name_from_url(ctx: &FieldContext<'_>) -> Option<String> {
    let segment = last_path_segment(ctx.url)?;
    let parts: Vec<&str> = segment.split('-').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }
    Some(parts[..parts.len() - 1].join(" "))
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

pub fn identifier_chain<'a>() -> FallbackChain<FieldContext<'a>, String> {
    FallbackChain::new("identifier")
        .then("url-token", identifier_from_url)
        .then("table-cells", identifier_from_cells)
        .then("body-text", identifier_from_body)
}

/// Digits of `text` if they form exactly one 13-digit code
fn thirteen_digits(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == 13).then_some(digits)
}

fn identifier_from_url(ctx: &FieldContext<'_>) -> Option<String> {
    path_tokens(ctx.url)
        .iter()
        .find_map(|token| thirteen_digits(token))
}

fn identifier_from_cells(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.selectors.identifier_cells.iter().find_map(|css| {
        ctx.page.texts(css).iter().find_map(|text| {
            EAN_PATTERN
                .find(text)
                .map(|m| m.as_str().to_string())
                .or_else(|| thirteen_digits(text))
        })
    })
}

fn identifier_from_body(ctx: &FieldContext<'_>) -> Option<String> {
    EAN_PATTERN
        .find(&ctx.page.body_text())
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

pub fn price_chain<'a>() -> FallbackChain<FieldContext<'a>, String> {
    FallbackChain::new("price")
        .then("euros-cents", price_from_parts)
        .then("combined-element", price_from_combined)
        .then("body-pattern", price_from_body)
}

/// Runs the price chain, falling back to the unavailable sentinel
pub fn extract_price(ctx: &FieldContext<'_>) -> String {
    price_chain()
        .resolve(ctx)
        .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string())
}

fn price_from_parts(ctx: &FieldContext<'_>) -> Option<String> {
    let euros = ctx.page.first_text_of(&ctx.selectors.euros)?;
    let cents = ctx.page.first_text_of(&ctx.selectors.cents)?;

    let euros: String = euros.chars().filter(char::is_ascii_digit).collect();
    let cents: String = cents.chars().filter(char::is_ascii_digit).collect();
    if euros.is_empty() || cents.is_empty() {
        return None;
    }
    Some(format!("{},{} €", euros, cents))
}

fn price_from_combined(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.selectors.combined_price.iter().find_map(|css| {
        ctx.page
            .find(css)
            .into_iter()
            .map(element_text)
            .find(|text| text.contains('€') || text.contains("EUR"))
    })
}

fn price_from_body(ctx: &FieldContext<'_>) -> Option<String> {
    PRICE_PATTERN
        .find(&ctx.page.body_text())
        .map(|m| normalize_whitespace(m.as_str()))
}

// ---------------------------------------------------------------------------
// Brand
// ---------------------------------------------------------------------------

/// Brand chain; the name heuristic is appended only when enabled
pub fn brand_chain<'a>(from_name: bool) -> FallbackChain<BrandContext<'a>, String> {
    let chain = FallbackChain::new("brand").then("brand-selectors", brand_from_selectors);
    if from_name {
        chain.then("first-word-of-name", brand_from_name)
    } else {
        chain
    }
}

fn brand_from_selectors(ctx: &BrandContext<'_>) -> Option<String> {
    ctx.fields.page.first_text_of(&ctx.fields.selectors.brand)
}

/// First word of the name, unless it looks like an article ("Le", "La")
fn brand_from_name(ctx: &BrandContext<'_>) -> Option<String> {
    let first = ctx.name.split(' ').next()?;
    (first.chars().count() > MIN_BRAND_CHARS).then(|| first.to_string())
}
