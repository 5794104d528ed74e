use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Crawl target and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Root address of the category listing
    #[serde(rename = "category-url")]
    pub category_url: String,

    /// Category label written into every record of the run
    #[serde(rename = "category-label")]
    pub category_label: String,

    /// Optional cap on the number of listing pages to walk
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Products shown per listing page, used to derive page counts from result totals
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Page count used when no pagination signal can be read from the listing
    #[serde(rename = "fallback-total-pages", default = "default_fallback_total_pages")]
    pub fallback_total_pages: u32,

    /// Number of newly extracted records between two checkpoints
    #[serde(rename = "checkpoint-every", default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Lower bound of the randomized pause between listing pages (milliseconds)
    #[serde(rename = "pause-min-ms", default = "default_pause_min_ms")]
    pub pause_min_ms: u64,

    /// Upper bound of the randomized pause between listing pages (milliseconds)
    #[serde(rename = "pause-max-ms", default = "default_pause_max_ms")]
    pub pause_max_ms: u64,

    /// Substring that identifies a product page address
    #[serde(rename = "product-path-marker", default = "default_product_path_marker")]
    pub product_path_marker: String,

    /// Query parameter names tried, in order, to reach a listing page
    #[serde(rename = "page-params", default = "default_page_params")]
    pub page_params: Vec<String>,
}

/// Browser backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserBackend {
    /// Static HTML over reqwest
    #[default]
    Http,
    /// Headless Chrome (requires the `chrome` feature)
    Chrome,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub backend: BrowserBackend,

    /// User agent presented to the target site
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Ceiling for element-presence waits (seconds)
    #[serde(rename = "wait-timeout-secs", default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Ceiling for the cookie-consent overlay wait (seconds)
    #[serde(rename = "consent-timeout-secs", default = "default_consent_timeout_secs")]
    pub consent_timeout_secs: u64,

    /// Ceiling for a single page load (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Control that accepts the cookie-consent overlay
    #[serde(rename = "consent-selector", default = "default_consent_selector")]
    pub consent_selector: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: BrowserBackend::default(),
            user_agent: default_user_agent(),
            headless: true,
            wait_timeout_secs: default_wait_timeout_secs(),
            consent_timeout_secs: default_consent_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            consent_selector: default_consent_selector(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the exported CSV file
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Write a best-effort backup copy on every checkpoint
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Window size when paging through persisted records
    #[serde(rename = "records-per-page", default = "default_records_per_page")]
    pub records_per_page: usize,

    /// Path to the markdown run report
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Retry policy for batch-mode product fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(rename = "backoff-multiplier", default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Selector candidate chains, tried in order
///
/// Defaults cover several generations of a parapharmacy storefront's markup;
/// override them per site in the `[selectors]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: Vec<String>,
    pub heading: String,
    pub brand: Vec<String>,
    pub euros: Vec<String>,
    pub cents: Vec<String>,
    #[serde(rename = "combined-price")]
    pub combined_price: Vec<String>,
    #[serde(rename = "identifier-cells")]
    pub identifier_cells: Vec<String>,
    #[serde(rename = "product-links")]
    pub product_links: Vec<String>,
    pub pagination: Vec<String>,
    #[serde(rename = "page-controls")]
    pub page_controls: Vec<String>,
    #[serde(rename = "result-count")]
    pub result_count: Vec<String>,
    /// Derive the brand from the product name when no brand element exists
    #[serde(rename = "brand-from-name")]
    pub brand_from_name: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: strings(&["h1.product-block-title", "h1.cbBiP"]),
            heading: "h1".to_string(),
            brand: strings(&["p.product-brand", ".brand-name", "[data-testid*='brand']"]),
            euros: strings(&[".vcEUR", "span.price-unit", "div.price-unit"]),
            cents: strings(&[".bYgjT", "span.price-cents"]),
            combined_price: strings(&[".price", ".product-price", "[data-testid*='price']"]),
            identifier_cells: strings(&["td", "div.attribute-value"]),
            product_links: strings(&[
                "a.product-card-link",
                "app-product-card-result-list a.product-visual",
                ".product-thumbnail a",
            ]),
            pagination: strings(&[
                "nav.pagination a",
                ".pagination a",
                ".pagination li",
                "[class*='pagination'] button",
                "li.small-screen",
            ]),
            page_controls: strings(&[
                "nav.pagination a",
                ".pagination a",
                "[class*='pagination'] button",
            ]),
            result_count: strings(&[".product-count", ".result-count"]),
            brand_from_name: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Optional log file written alongside console output
    #[serde(default)]
    pub file: Option<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> u32 {
    24
}

fn default_fallback_total_pages() -> u32 {
    1
}

fn default_checkpoint_every() -> usize {
    5
}

fn default_pause_min_ms() -> u64 {
    1000
}

fn default_pause_max_ms() -> u64 {
    3000
}

fn default_product_path_marker() -> String {
    "/fp/".to_string()
}

fn default_page_params() -> Vec<String> {
    strings(&["page", "p"])
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_wait_timeout_secs() -> u64 {
    30
}

fn default_consent_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_consent_selector() -> String {
    "#onetrust-accept-btn-handler".to_string()
}

fn default_records_per_page() -> usize {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}
