//! Database operations for `saved_summaries`.
//!
//! One row per explicit save action: the aggregated summary of a fetch,
//! plus metadata for the selection list. Rows carry a generated UUID as
//! their true identity; the display name is only the human selection key
//! and may collide for rapid same-country saves.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nutridash_core::{aggregate, AggregationResult, Product};

use crate::DbError;

/// A row from the `saved_summaries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedSummaryRow {
    pub id: Uuid,
    pub country: String,
    pub captured_at: DateTime<Utc>,
    pub display_name: String,
    pub total_products: i64,
    /// Serialized [`AggregationResult`].
    pub graph_data: serde_json::Value,
}

impl SavedSummaryRow {
    /// Deserializes the stored aggregation result.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialize`] if `graph_data` does not match the
    /// aggregation-result shape.
    pub fn aggregation(&self) -> Result<AggregationResult, DbError> {
        let result = serde_json::from_value(self.graph_data.clone())?;
        Ok(result)
    }
}

/// Builds the selection-list name for a saved summary.
#[must_use]
pub fn display_name(country: &str, total_products: usize, captured_at: DateTime<Utc>) -> String {
    format!(
        "{country} ({total_products} products) - {}",
        captured_at.format("%Y-%m-%d %H:%M")
    )
}

/// Aggregates `products` and inserts one summary row.
///
/// Returns the inserted row. On failure nothing is written and the
/// caller's in-memory state is untouched.
///
/// # Errors
///
/// Returns [`DbError::Serialize`] if the aggregation cannot be serialized,
/// or [`DbError::Sqlx`] if the insert fails.
pub async fn save_summary(
    pool: &PgPool,
    country: &str,
    captured_at: DateTime<Utc>,
    products: &[Product],
) -> Result<SavedSummaryRow, DbError> {
    let aggregation = aggregate(products);
    let graph_data = serde_json::to_value(&aggregation)?;
    let name = display_name(country, products.len(), captured_at);

    let row = sqlx::query_as::<_, SavedSummaryRow>(
        "INSERT INTO saved_summaries \
             (id, country, captured_at, display_name, total_products, graph_data) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, country, captured_at, display_name, total_products, graph_data",
    )
    .bind(Uuid::new_v4())
    .bind(country)
    .bind(captured_at)
    .bind(&name)
    .bind(i64::try_from(products.len()).unwrap_or(i64::MAX))
    .bind(graph_data)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Lists all saved summaries, most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_summaries(pool: &PgPool) -> Result<Vec<SavedSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, SavedSummaryRow>(
        "SELECT id, country, captured_at, display_name, total_products, graph_data \
         FROM saved_summaries \
         ORDER BY captured_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Loads a saved summary by exact display-name match.
///
/// When several rows share the name, the newest wins (display names are
/// not unique by construction).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_summary(
    pool: &PgPool,
    display_name: &str,
) -> Result<Option<SavedSummaryRow>, DbError> {
    let row = sqlx::query_as::<_, SavedSummaryRow>(
        "SELECT id, country, captured_at, display_name, total_products, graph_data \
         FROM saved_summaries \
         WHERE display_name = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(display_name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes every saved summary bearing `display_name`.
///
/// Returns `true` if at least one row was removed. Deleting a name that
/// does not exist is not an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_summary(pool: &PgPool, display_name: &str) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM saved_summaries WHERE display_name = $1")
        .bind(display_name)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn display_name_formats_country_count_and_minute() {
        let at = Utc.with_ymd_and_hms(2026, 8, 24, 14, 30, 59).unwrap();
        assert_eq!(
            display_name("India", 120, at),
            "India (120 products) - 2026-08-24 14:30"
        );
    }

    #[test]
    fn saves_within_the_same_minute_collide_on_display_name() {
        // Known limitation of the selection key; the UUID id disambiguates.
        let a = Utc.with_ymd_and_hms(2026, 8, 24, 14, 30, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 24, 14, 30, 58).unwrap();
        assert_eq!(display_name("India", 5, a), display_name("India", 5, b));
    }
}
