//! The three fetch strategies feeding the dashboard's aggregation step.
//!
//! Each strategy produces the same shape, a plain product list, so the
//! aggregator and the render step never care where the data came from:
//!
//! - [`api`] — paginated crawl of the product text-search endpoint with a
//!   fixed inter-request delay.
//! - [`dump`] — streaming filter of the large gzip-compressed tab-delimited
//!   dump.
//! - [`columnar`] — batch filter of the remote columnar snapshot over HTTP.
//!
//! [`fetch_products`] selects a strategy and degrades every failure to an
//! empty result plus a user-facing message; nothing in this crate is fatal
//! to the hosting session.

pub mod api;
pub mod columnar;
pub mod dump;
pub mod error;
pub mod progress;
mod strategy;

pub use api::SearchClient;
pub use error::FetchError;
pub use progress::{ProgressSink, TracingProgress};
pub use strategy::{fetch_products, FetchOutcome, FetchStrategy};
