//! Integration tests for `SearchClient` and the strategy layer, using
//! wiremock HTTP mocks.

use std::path::PathBuf;
use std::sync::Mutex;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutridash_core::{AppConfig, Environment, ResolvedCountry};
use nutridash_fetch::{fetch_products, FetchStrategy, ProgressSink, SearchClient};

fn test_client(base_url: &str) -> SearchClient {
    // Zero inter-request delay keeps the multi-page tests fast.
    SearchClient::with_base_url(30, "nutridash-test/0.1", 100, 0, base_url)
        .expect("client construction should not fail")
}

fn india() -> ResolvedCountry {
    ResolvedCountry {
        code: "in".to_owned(),
        display_name: "India".to_owned(),
        tag: "en:india".to_owned(),
    }
}

/// Collects progress updates for assertions.
#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn update(&self, message: &str) {
        self.updates.lock().unwrap().push(message.to_owned());
    }
}

fn page_body(products: serde_json::Value, page_count: u32, count: u64) -> serde_json::Value {
    serde_json::json!({
        "products": products,
        "page_count": page_count,
        "count": count,
    })
}

#[tokio::test]
async fn single_page_crawl_issues_exactly_one_request() {
    let server = MockServer::start().await;

    let body = page_body(
        serde_json::json!([{"nutriscore_grade": "a", "brands": "Acme"}]),
        1,
        1,
    );
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let products = client.fetch_all("en:india", &sink).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].brands.as_deref(), Some("Acme"));
    // Verified on drop: exactly one request despite page_count handling.
}

#[tokio::test]
async fn multi_page_crawl_accumulates_all_pages() {
    let server = MockServer::start().await;

    let page1 = page_body(
        serde_json::json!([{"brands": "First"}, {"brands": "Second"}]),
        2,
        3,
    );
    let page2 = page_body(serde_json::json!([{"brands": "Third"}]), 2, 3);

    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("page", "1"))
        .and(query_param("tag_0", "en:india"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page1))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page2))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let products = client.fetch_all("en:india", &sink).await.unwrap();

    let brands: Vec<_> = products.iter().filter_map(|p| p.brands.as_deref()).collect();
    assert_eq!(brands, vec!["First", "Second", "Third"]);

    let updates = sink.updates.lock().unwrap();
    assert_eq!(updates.len(), 2, "one progress update per page");
}

#[tokio::test]
async fn mid_crawl_failure_keeps_partial_result() {
    let server = MockServer::start().await;

    let page1 = page_body(serde_json::json!([{"brands": "Kept"}]), 3, 30);
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page1))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Page 3 must never be requested once page 2 fails.
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page1))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let products = client.fetch_all("en:india", &sink).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].brands.as_deref(), Some("Kept"));
}

#[tokio::test]
async fn first_page_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let result = client.fetch_all("en:india", &sink).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn zero_products_yields_empty_list() {
    let server = MockServer::start().await;

    let body = page_body(serde_json::json!([]), 0, 0);
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let products = client.fetch_all("en:india", &sink).await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn api_products_accept_both_tag_shapes() {
    let server = MockServer::start().await;

    let body = page_body(
        serde_json::json!([{
            "nutriscore_grade": "b",
            "brands": "Acme",
            "categories_tags": ["en:snacks", "en:sweet-snacks"],
            "ingredients_tags": "en:sugar,en:salt"
        }]),
        1,
        1,
    );
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sink = RecordingSink::default();
    let products = client.fetch_all("en:india", &sink).await.unwrap();

    assert_eq!(
        products[0].categories_tags.tags(),
        vec!["en:snacks", "en:sweet-snacks"]
    );
    assert_eq!(products[0].ingredients_tags.tags(), vec!["en:sugar", "en:salt"]);
}

fn test_config(api_base_url: &str) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_owned(),
        database_url: None,
        api_base_url: api_base_url.to_owned(),
        api_page_size: 100,
        api_inter_request_delay_ms: 0,
        api_request_timeout_secs: 5,
        api_user_agent: "nutridash-test/0.1".to_owned(),
        dump_path: PathBuf::from("/nonexistent/products.csv.gz"),
        snapshot_url: "http://127.0.0.1:9/food.parquet".to_owned(),
        snapshot_batch_size: 4096,
        db_max_connections: 1,
        db_min_connections: 1,
        db_acquire_timeout_secs: 1,
    }
}

#[tokio::test]
async fn strategy_degrades_api_failure_to_empty_outcome_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let sink = RecordingSink::default();
    let outcome = fetch_products(FetchStrategy::Api, &india(), &config, &sink).await;

    assert!(outcome.is_empty());
    assert_eq!(outcome.messages.len(), 1);
    assert!(outcome.messages[0].contains("India"), "{:?}", outcome.messages);
}

#[tokio::test]
async fn strategy_reports_empty_result_as_message_not_error() {
    let server = MockServer::start().await;
    let body = page_body(serde_json::json!([]), 0, 0);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let sink = RecordingSink::default();
    let outcome = fetch_products(FetchStrategy::Api, &india(), &config, &sink).await;

    assert!(outcome.is_empty());
    assert_eq!(outcome.messages, vec!["no products found for India".to_owned()]);
}

#[tokio::test]
async fn strategy_degrades_missing_dump_to_empty_outcome() {
    let config = test_config("http://127.0.0.1:9");
    let sink = RecordingSink::default();
    let outcome = fetch_products(FetchStrategy::BulkDump, &india(), &config, &sink).await;

    assert!(outcome.is_empty());
    assert!(outcome.messages[0].contains("dump"), "{:?}", outcome.messages);
}
