//! Session-scoped dashboard state.
//!
//! The current product list and aggregation live in an explicit state
//! object created at session start, replaced on each successful fetch or
//! load, and read by the render step. Nothing here is ambient or global.

use chrono::{DateTime, Utc};

use nutridash_core::{aggregate, AggregationResult, Product};

#[derive(Debug, Default)]
pub struct Session {
    country: Option<String>,
    products: Vec<Product>,
    aggregation: Option<AggregationResult>,
    captured_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the session with a freshly fetched product list and its
    /// aggregation.
    pub fn set_products(&mut self, country: &str, products: Vec<Product>) {
        self.aggregation = Some(aggregate(&products));
        self.products = products;
        self.country = Some(country.to_owned());
        self.captured_at = Some(Utc::now());
    }

    /// Replaces the session with a reloaded summary; raw products are not
    /// persisted, so the product list is cleared.
    pub fn set_loaded(
        &mut self,
        country: &str,
        aggregation: AggregationResult,
        captured_at: DateTime<Utc>,
    ) {
        self.products.clear();
        self.aggregation = Some(aggregation);
        self.country = Some(country.to_owned());
        self.captured_at = Some(captured_at);
    }

    #[must_use]
    pub fn aggregation(&self) -> Option<&AggregationResult> {
        self.aggregation.as_ref()
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    #[must_use]
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(brand: &str) -> Product {
        Product {
            brands: Some(brand.to_owned()),
            ..Product::default()
        }
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(session.aggregation().is_none());
        assert!(session.products().is_empty());
        assert!(session.country().is_none());
    }

    #[test]
    fn set_products_replaces_state_and_aggregates() {
        let mut session = Session::new();
        session.set_products("India", vec![product("Acme")]);
        assert_eq!(session.country(), Some("India"));
        assert_eq!(session.products().len(), 1);
        let aggregation = session.aggregation().unwrap();
        assert_eq!(aggregation.top_brands[0].label, "Acme");

        // A second fetch replaces, not appends.
        session.set_products("France", vec![product("Brie"), product("Camembert")]);
        assert_eq!(session.country(), Some("France"));
        assert_eq!(session.products().len(), 2);
    }

    #[test]
    fn set_loaded_clears_products_but_keeps_aggregation() {
        let mut session = Session::new();
        session.set_products("India", vec![product("Acme")]);
        let aggregation = session.aggregation().unwrap().clone();

        session.set_loaded("India", aggregation.clone(), Utc::now());
        assert!(session.products().is_empty());
        assert_eq!(session.aggregation(), Some(&aggregation));
    }
}
