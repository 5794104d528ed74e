//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a synthetic two-page category and its
//! product pages, then run the full crawl cycle end-to-end over HTTP.

use catalog_harvest::browser::open_session;
use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::{run_crawl, scrape_products, CrawlRequest};
use catalog_harvest::extract::ProductExtractor;
use catalog_harvest::output::DownloadError;
use catalog_harvest::{CrawlService, StatusHandle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without a query string
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

struct Product {
    slug: &'static str,
    name: &'static str,
    brand: Option<&'static str>,
    euros: &'static str,
    cents: &'static str,
}

const PAGE_ONE: &[Product] = &[
    Product {
        slug: "creme-hydratante-3401528519015",
        name: "Crème hydratante riche",
        brand: Some("Avène"),
        euros: "15",
        cents: "90",
    },
    Product {
        slug: "serum-eclat-3264680022050",
        name: "Sérum éclat vitamine C",
        brand: Some("Vichy"),
        euros: "29",
        cents: "50",
    },
    Product {
        slug: "le-gel-nettoyant-3282770100006",
        name: "Le gel nettoyant doux",
        brand: None,
        euros: "8",
        cents: "20",
    },
    Product {
        slug: "baume-levres-3337875597180",
        name: "Baume lèvres réparateur",
        brand: Some("La Roche-Posay"),
        euros: "6",
        cents: "45",
    },
];

const PAGE_TWO: &[Product] = &[
    Product {
        slug: "eau-micellaire-3401344019362",
        name: "Eau micellaire apaisante",
        brand: Some("Bioderma"),
        euros: "12",
        cents: "10",
    },
    Product {
        slug: "masque-argile-3700194716342",
        name: "Masque purifiant argile",
        brand: Some("Caudalie"),
        euros: "19",
        cents: "00",
    },
];

fn listing_html(products: &[Product]) -> String {
    let cards: String = products
        .iter()
        .map(|p| format!(r#"<a class="product-card-link" href="/fp/{}">{}</a>"#, p.slug, p.name))
        .collect();
    format!(
        r#"<html><body>
        <button id="onetrust-accept-btn-handler">Accepter</button>
        <h1>Soins du visage</h1>
        <div class="results">{}</div>
        <nav class="pagination"><a href="/c/soins?page=1">1</a><a href="/c/soins?page=2">2</a></nav>
        </body></html>"#,
        cards
    )
}

fn product_html(product: &Product) -> String {
    let brand = product
        .brand
        .map(|b| format!(r#"<p class="product-brand">{}</p>"#, b))
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <h1 class="product-block-title">{}</h1>
        {}
        <div><span class="price-unit">{}</span><span class="price-cents">{}</span></div>
        </body></html>"#,
        product.name, brand, product.euros, product.cents
    )
}

/// Mounts the two listing pages and every product page
async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/c/soins"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(PAGE_TWO)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c/soins"))
        .and(NoQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(PAGE_ONE)))
        .mount(server)
        .await;

    for product in PAGE_ONE.iter().chain(PAGE_TWO) {
        Mock::given(method("GET"))
            .and(path(format!("/fp/{}", product.slug)))
            .respond_with(ResponseTemplate::new(200).set_body_string(product_html(product)))
            .mount(server)
            .await;
    }
}

fn test_config(server: &MockServer, csv: &Path) -> Config {
    let toml = format!(
        r#"
[crawl]
category-url = "{}/c/soins"
category-label = "Soins Visage"
checkpoint-every = 5
pause-min-ms = 0
pause-max-ms = 0

[browser]
wait-timeout-secs = 1
consent-timeout-secs = 1

[output]
csv-path = "{}"
records-per-page = 4

[retry]
max-attempts = 2
base-delay-ms = 1
max-delay-ms = 5
"#,
        server.uri(),
        csv.display()
    );
    parse_config(&toml).expect("test config should parse")
}

fn read_rows(csv: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(csv).expect("export should exist");
    reader
        .deserialize()
        .map(|row| row.expect("row should parse"))
        .collect()
}

#[tokio::test]
async fn test_full_two_page_crawl() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("products.csv");
    let config = test_config(&server, &csv);
    let request = CrawlRequest::from_config(&config);
    let status = StatusHandle::new();

    let report = run_crawl(Arc::new(config), request, status.clone())
        .await
        .expect("crawl should start");

    assert!(report.error.is_none(), "unexpected error: {:?}", report.error);
    assert_eq!(report.pages_planned, 2);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_skipped, 0);
    assert_eq!(report.products_extracted, 6);
    assert_eq!(report.products_failed, 0);
    assert_eq!(report.misses.brand, 1);
    assert!(report.checkpoints >= 2);
    assert_eq!(report.export_path.as_deref(), Some(csv.as_path()));

    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| !row["name"].is_empty()));
    assert!(rows.iter().all(|row| row["category"] == "Soins Visage"));

    let gel = rows
        .iter()
        .find(|row| row["name"] == "Le gel nettoyant doux")
        .expect("brand-less product should be exported");
    assert_eq!(gel["brand"], "");
    assert_eq!(gel["price"], "8,20 €");
    assert_eq!(gel["identifier"], "3282770100006");

    let creme = rows
        .iter()
        .find(|row| row["name"] == "Crème hydratante riche")
        .unwrap();
    assert_eq!(creme["brand"], "Avène");
    assert_eq!(creme["price"], "15,90 €");

    assert!(dir.path().join("products.backup.csv").exists());

    let final_status = status.snapshot();
    assert!(!final_status.in_progress);
    assert_eq!(final_status.processed_count, 6);
    assert_eq!(final_status.total_products_estimate, 8);
}

#[tokio::test]
async fn test_max_pages_caps_the_run() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("products.csv");
    let config = test_config(&server, &csv);
    let request = CrawlRequest {
        category_url: config.crawl.category_url.clone(),
        max_pages: Some(1),
    };

    let report = run_crawl(Arc::new(config), request, StatusHandle::new())
        .await
        .unwrap();

    assert_eq!(report.pages_planned, 1);
    assert_eq!(report.products_extracted, 4);
    assert_eq!(read_rows(&csv).len(), 4);
}

#[tokio::test]
async fn test_service_serves_records_after_run() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("products.csv");
    let service = CrawlService::new(test_config(&server, &csv));

    assert!(matches!(service.download(), Err(DownloadError::NotFound(_))));

    let handle = service
        .start(CrawlRequest::from_config(service.config()))
        .unwrap();
    let report = handle.await.unwrap();
    assert_eq!(report.products_extracted, 6);

    let (status, eta) = service.status();
    assert!(!status.in_progress);
    assert_eq!(eta.to_string(), "pending");

    let last = service.records(99).unwrap();
    assert_eq!(last.page, 2);
    assert_eq!(last.total_pages, 2);
    assert_eq!(last.total_records, 6);
    assert_eq!(last.rows.len(), 2);

    let download = service.download().unwrap();
    assert_eq!(download.file_name, "products.csv");
    assert!(download.len > 0);
}

#[tokio::test]
async fn test_batch_mode_retries_and_placeholders() {
    let server = MockServer::start().await;
    let flaky = &PAGE_ONE[0];

    Mock::given(method("GET"))
        .and(path(format!("/fp/{}", flaky.slug)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/fp/{}", flaky.slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_html(flaky)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir.path().join("products.csv"));
    let urls = vec![
        format!("{}/fp/{}", server.uri(), flaky.slug),
        format!("{}/fp/retire-0000000000000", server.uri()),
    ];

    let mut session = open_session(&config.browser).await.unwrap();
    let extractor = ProductExtractor::from_config(&config);
    let records = scrape_products(session.as_mut(), &urls, &extractor, &config.retry).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Crème hydratante riche");
    assert_eq!(records[0].price, "15,90 €");
    assert!(records[0].extras.get("error").is_none());

    assert_eq!(records[1].url, urls[1]);
    assert_eq!(records[1].price, "Non disponible");
    assert!(records[1].extras["error"].contains("HTTP 404"));
    assert!(records[1].extras["error"].ends_with("(after 2 attempts)"));
}
