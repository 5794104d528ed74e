//! Product records
//!
//! A record is built once by the field extractor and never mutated; the
//! exporter reads it as a flat key/value row.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Price value written when no price signal was found on the page
pub const PRICE_UNAVAILABLE: &str = "Non disponible";

/// Format of the `capture_date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One scraped product
///
/// `url` is always populated. Every other field may be an empty string when
/// extraction failed; the record is kept regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub url: String,
    pub capture_date: NaiveDate,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub identifier: String,
    pub price: String,

    /// Additional columns, such as `error` on placeholder records
    #[serde(skip)]
    pub extras: BTreeMap<String, String>,
}

impl ProductRecord {
    /// Creates a record with every extracted field empty and no price
    pub fn empty(url: impl Into<String>, capture_date: NaiveDate, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            capture_date,
            name: String::new(),
            brand: String::new(),
            category: category.into(),
            identifier: String::new(),
            price: PRICE_UNAVAILABLE.to_string(),
            extras: BTreeMap::new(),
        }
    }

    /// Placeholder kept for a product that could not be fetched at all
    pub fn placeholder(
        url: impl Into<String>,
        capture_date: NaiveDate,
        category: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut record = Self::empty(url, capture_date, category);
        record.extras.insert("error".to_string(), reason.into());
        record
    }

    /// Flattens the record into column name / value pairs
    ///
    /// Every base field is always present as a key, even when empty.
    pub fn to_row(&self) -> BTreeMap<String, String> {
        let mut row = BTreeMap::new();
        row.insert("url".to_string(), self.url.clone());
        row.insert(
            "capture_date".to_string(),
            self.capture_date.format(DATE_FORMAT).to_string(),
        );
        row.insert("name".to_string(), self.name.clone());
        row.insert("brand".to_string(), self.brand.clone());
        row.insert("category".to_string(), self.category.clone());
        row.insert("identifier".to_string(), self.identifier.clone());
        row.insert("price".to_string(), self.price.clone());
        for (key, value) in &self.extras {
            row.entry(key.clone()).or_insert_with(|| value.clone());
        }
        row
    }

    /// Returns true if the price field holds a real value
    pub fn has_price(&self) -> bool {
        !self.price.is_empty() && self.price != PRICE_UNAVAILABLE
    }
}
