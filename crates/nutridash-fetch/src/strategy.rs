//! Strategy selection: three interchangeable fetchers, one outcome shape.

use nutridash_core::{AppConfig, Product, ResolvedCountry};

use crate::api::SearchClient;
use crate::error::FetchError;
use crate::progress::ProgressSink;
use crate::{columnar, dump};

/// The user-selectable data-acquisition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Paginated crawl of the text-search endpoint.
    Api,
    /// Streaming filter of the local compressed dump.
    BulkDump,
    /// Batch filter of the remote columnar snapshot.
    Columnar,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Api => write!(f, "api"),
            FetchStrategy::BulkDump => write!(f, "dump"),
            FetchStrategy::Columnar => write!(f, "columnar"),
        }
    }
}

/// The shared result shape of every strategy.
///
/// `messages` carries user-facing warnings and error explanations; a failed
/// or empty fetch is an empty product list plus a message, never a fault
/// that aborts the session.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub products: Vec<Product>,
    pub messages: Vec<String>,
}

impl FetchOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Runs the selected strategy for a country.
///
/// Every strategy error is degraded here to an empty outcome with an
/// explanatory message; a missing source or an empty result never aborts
/// the session.
pub async fn fetch_products(
    strategy: FetchStrategy,
    country: &ResolvedCountry,
    config: &AppConfig,
    sink: &dyn ProgressSink,
) -> FetchOutcome {
    let result = match strategy {
        FetchStrategy::Api => fetch_via_api(country, config, sink).await,
        FetchStrategy::BulkDump => dump::filter_dump(&config.dump_path, &country.tag, sink),
        FetchStrategy::Columnar => {
            columnar::filter_snapshot(
                &config.snapshot_url,
                &country.tag,
                config.snapshot_batch_size,
                sink,
            )
            .await
        }
    };

    let mut outcome = FetchOutcome::default();
    match result {
        Ok(products) if products.is_empty() => {
            outcome
                .messages
                .push(format!("no products found for {}", country.display_name));
        }
        Ok(products) => outcome.products = products,
        Err(err) => {
            tracing::error!(%strategy, error = %err, "fetch failed");
            outcome.messages.push(format!(
                "fetch via {strategy} failed for {}: {err}",
                country.display_name
            ));
        }
    }
    outcome
}

async fn fetch_via_api(
    country: &ResolvedCountry,
    config: &AppConfig,
    sink: &dyn ProgressSink,
) -> Result<Vec<Product>, FetchError> {
    let client = SearchClient::with_base_url(
        config.api_request_timeout_secs,
        &config.api_user_agent,
        config.api_page_size,
        config.api_inter_request_delay_ms,
        &config.api_base_url,
    )?;
    client.fetch_all(&country.tag, sink).await
}
