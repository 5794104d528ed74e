//! Batch mode: scrape an explicit list of product pages
//!
//! Unlike the category crawl, each product here is retried with exponential
//! backoff. A product that still cannot be loaded is kept as a placeholder
//! record so every requested address appears in the export.

use crate::browser::BrowserSession;
use crate::config::RetryConfig;
use crate::extract::ProductExtractor;
use crate::state::ProductRecord;
use chrono::Local;
use std::time::Duration;

/// Delay before retry number `attempt` (1-based), before jitter
///
/// `base * multiplier^(attempt - 1)`, capped at `max_delay_ms`.
pub fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let millis = retry.base_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let capped = millis.min(retry.max_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

/// `backoff_delay` scaled by a random factor in 50%..150%
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.5 + fastrand::f64())
}

/// Scrapes each address in order, retrying failed loads
///
/// # Arguments
///
/// * `session` - The browser session, used sequentially
/// * `urls` - Product page addresses
/// * `extractor` - Field extraction settings
/// * `retry` - Attempt limit and backoff
///
/// # Returns
///
/// One record per address, in input order. Addresses that never loaded get a
/// placeholder with an `error` column. A session fault stops fetching; the
/// remaining addresses get placeholders naming the fault.
pub async fn scrape_products(
    session: &mut dyn BrowserSession,
    urls: &[String],
    extractor: &ProductExtractor,
    retry: &RetryConfig,
) -> Vec<ProductRecord> {
    let mut records = Vec::with_capacity(urls.len());
    let mut fault: Option<String> = None;

    for url in urls {
        if let Some(reason) = &fault {
            records.push(placeholder(extractor, url, reason));
            continue;
        }

        let mut last_error = String::from("page could not be loaded");
        let mut record = None;

        for attempt in 1..=retry.max_attempts {
            match extractor.load_product(session, url).await {
                Ok(found) => {
                    record = Some(found);
                    break;
                }
                Err(e) if e.is_session_fault() => {
                    tracing::error!("Browser session lost while scraping {}: {}", url, e);
                    last_error = e.to_string();
                    fault = Some(last_error.clone());
                    break;
                }
                Err(e) => last_error = e.to_string(),
            }

            if attempt < retry.max_attempts {
                let delay = jittered(backoff_delay(retry, attempt));
                tracing::warn!(
                    "Attempt {}/{} failed for {}, retrying in {:?}",
                    attempt,
                    retry.max_attempts,
                    url,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        match record {
            Some(record) => {
                tracing::info!("Scraped product: {}", record.name);
                records.push(record);
            }
            None => {
                let reason = format!("{} (after {} attempts)", last_error, retry.max_attempts);
                tracing::error!("Giving up on {}: {}", url, reason);
                records.push(placeholder(extractor, url, &reason));
            }
        }
    }

    if let Err(e) = session.close().await {
        tracing::warn!("Browser session did not close cleanly: {}", e);
    }
    records
}

fn placeholder(extractor: &ProductExtractor, url: &str, reason: &str) -> ProductRecord {
    ProductRecord::placeholder(url, Local::now().date_naive(), extractor.category(), reason)
}
