//! Extraction from loaded pages
//!
//! - `links`: product addresses on a listing page
//! - `fields`: per-field fallback strategies for product pages
//! - `product`: assembles a `ProductRecord` from those strategies

pub mod fields;
mod links;
mod product;

pub use links::{collect_product_links, link_selectors, product_link_probe};
pub use product::ProductExtractor;
