//! Rate-limited crawl of the product text-search endpoint.
//!
//! Wraps `reqwest` with typed response deserialization. Page 1's
//! `page_count` is treated as authoritative for the whole crawl; each
//! subsequent page waits a fixed inter-request delay chosen to stay under
//! the documented requests-per-minute ceiling.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use nutridash_core::Product;

use crate::error::FetchError;
use crate::progress::ProgressSink;

const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";
const SEARCH_PATH: &str = "cgi/search.pl";
/// Fixed query term for the food-product text search.
const SEARCH_TERM: &str = "food";

/// Hard ceiling on pages per crawl. Keeps a bad `page_count` from the
/// server from turning into an unbounded crawl; everything fetched up to
/// the ceiling is still returned.
pub(crate) const MAX_PAGES: u32 = 200;

/// One bounded-size response unit from the paginated search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub count: u64,
}

/// Client for the paginated product search.
///
/// Use [`SearchClient::new`] for production or
/// [`SearchClient::with_base_url`] to point at a mock server in tests.
pub struct SearchClient {
    client: Client,
    base_url: Url,
    page_size: u32,
    inter_request_delay_ms: u64,
}

impl SearchClient {
    /// Creates a client pointed at the production search endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        page_size: u32,
        inter_request_delay_ms: u64,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(
            timeout_secs,
            user_agent,
            page_size,
            inter_request_delay_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FetchError::InvalidUrl`] if `base_url`
    /// does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        page_size: u32,
        inter_request_delay_ms: u64,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            page_size,
            inter_request_delay_ms,
        })
    }

    /// Fetches one search page scoped to a countries-tag.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network failure or non-2xx status.
    /// - [`FetchError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn search_page(&self, country_tag: &str, page: u32) -> Result<SearchPage, FetchError> {
        let url = self.build_search_url(country_tag, page);
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Crawls all pages for a country, sleeping the fixed inter-request
    /// delay before every page after the first.
    ///
    /// A page failure after page 1 keeps the accumulated partial result and
    /// stops pagination (no retry). Zero total products yields an empty
    /// list.
    ///
    /// # Errors
    ///
    /// Returns an error only if the first request fails; the caller treats
    /// that as a recoverable empty result.
    pub async fn fetch_all(
        &self,
        country_tag: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Product>, FetchError> {
        let first = self.search_page(country_tag, 1).await?;
        let page_count = first.page_count;
        let total = first.count;
        let mut products = first.products;
        sink.update(&format!(
            "page 1/{page_count}: {} products fetched ({total} total reported)",
            products.len()
        ));

        if page_count <= 1 {
            return Ok(products);
        }

        let last_page = page_count.min(MAX_PAGES);
        if page_count > MAX_PAGES {
            tracing::warn!(page_count, max_pages = MAX_PAGES, "clamping crawl to page ceiling");
        }

        for page in 2..=last_page {
            tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            match self.search_page(country_tag, page).await {
                Ok(batch) => {
                    products.extend(batch.products);
                    sink.update(&format!(
                        "page {page}/{page_count}: {} products fetched",
                        products.len()
                    ));
                }
                Err(err) => {
                    tracing::warn!(
                        page,
                        error = %err,
                        "page request failed; keeping partial result and stopping pagination"
                    );
                    break;
                }
            }
        }

        Ok(products)
    }

    /// Builds the full search URL with percent-encoded query parameters.
    fn build_search_url(&self, country_tag: &str, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(SEARCH_PATH);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", "process");
            pairs.append_pair("search_terms", SEARCH_TERM);
            pairs.append_pair("json", "1");
            pairs.append_pair("page_size", &self.page_size.to_string());
            pairs.append_pair("page", &page.to_string());
            pairs.append_pair("tagtype_0", "countries");
            pairs.append_pair("tag_contains_0", "contains");
            pairs.append_pair("tag_0", country_tag);
        }
        url
    }
}
