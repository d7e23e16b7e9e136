//! Batch filter over the remote columnar product snapshot.
//!
//! Opens the snapshot as a parquet dataset over HTTP (no full download),
//! projects only the five columns the pipeline reads, and iterates
//! fixed-size record batches, keeping rows whose countries-tags column
//! contains the target tag.

use std::sync::Arc;

use arrow::array::{Array, LargeListArray, LargeStringArray, ListArray, StringArray};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use object_store::http::HttpBuilder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use parquet::arrow::async_reader::{ParquetObjectReader, ParquetRecordBatchStreamBuilder};
use parquet::arrow::ProjectionMask;

use nutridash_core::{Product, TagField};

use crate::error::FetchError;
use crate::progress::ProgressSink;

/// The five snapshot columns the pipeline reads.
pub const SNAPSHOT_COLUMNS: [&str; 5] = [
    "countries_tags",
    "nutriscore_grade",
    "brands",
    "categories_tags",
    "ingredients_tags",
];

/// Streams the snapshot at `url` in fixed-size batches and returns the
/// products matching `country_tag`.
///
/// Zero matches at end-of-stream is an empty result with a warning; the
/// caller degrades stream-level faults to an empty result plus a message.
///
/// # Errors
///
/// - [`FetchError::InvalidUrl`] if `url` does not parse.
/// - [`FetchError::ObjectStore`] on HTTP-level failure.
/// - [`FetchError::Parquet`] if the snapshot is not readable parquet.
pub async fn filter_snapshot(
    url: &str,
    country_tag: &str,
    batch_size: usize,
    sink: &dyn ProgressSink,
) -> Result<Vec<Product>, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    let origin = parsed.origin().ascii_serialization();
    let store = HttpBuilder::new().with_url(origin).build()?;
    let path = ObjectPath::from(parsed.path());

    let store: Arc<dyn ObjectStore> = Arc::new(store);
    let meta = store.head(&path).await?;
    sink.update(&format!("opened snapshot ({} bytes)", meta.size));

    let reader = ParquetObjectReader::new(store, meta);
    let builder = ParquetRecordBatchStreamBuilder::new(reader).await?;

    let projection: Vec<usize> = builder
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| SNAPSHOT_COLUMNS.contains(&field.name().as_str()))
        .map(|(index, _)| index)
        .collect();
    let mask = ProjectionMask::roots(builder.parquet_schema(), projection);

    let mut stream = builder
        .with_projection(mask)
        .with_batch_size(batch_size)
        .build()?;

    let mut products = Vec::new();
    let mut processed = 0usize;
    while let Some(batch) = stream.try_next().await? {
        processed += batch.num_rows();
        products.extend(filter_batch(&batch, country_tag));
        sink.update(&format!(
            "processed {processed} rows, matched {} products",
            products.len()
        ));
    }

    if products.is_empty() {
        tracing::warn!(country_tag, "no products matched in snapshot");
    }
    Ok(products)
}

/// Keeps the rows of one record batch whose countries-tags cell contains
/// the target tag, materialized as products.
fn filter_batch(batch: &RecordBatch, country_tag: &str) -> Vec<Product> {
    let mut products = Vec::new();
    for row in 0..batch.num_rows() {
        let countries = tag_cell(batch, "countries_tags", row);
        if !countries.contains_tag(country_tag) {
            continue;
        }
        products.push(Product {
            nutriscore_grade: string_cell(batch, "nutriscore_grade", row),
            brands: string_cell(batch, "brands", row),
            categories_tags: tag_cell(batch, "categories_tags", row),
            ingredients_tags: tag_cell(batch, "ingredients_tags", row),
            countries_tags: countries,
        });
    }
    products
}

/// Reads a nullable string cell from a Utf8 or LargeUtf8 column.
fn string_cell(batch: &RecordBatch, name: &str, row: usize) -> Option<String> {
    let index = batch.schema().index_of(name).ok()?;
    let column = batch.column(index);
    if let Some(array) = column.as_any().downcast_ref::<StringArray>() {
        if array.is_valid(row) {
            return Some(array.value(row).to_owned());
        }
    } else if let Some(array) = column.as_any().downcast_ref::<LargeStringArray>() {
        if array.is_valid(row) {
            return Some(array.value(row).to_owned());
        }
    }
    None
}

/// Reads a tag cell that may be a list of strings or a comma-joined string.
fn tag_cell(batch: &RecordBatch, name: &str, row: usize) -> TagField {
    let Ok(index) = batch.schema().index_of(name) else {
        return TagField::default();
    };
    let column = batch.column(index);

    if let Some(list) = column.as_any().downcast_ref::<ListArray>() {
        if list.is_valid(row) {
            return list_values(&list.value(row));
        }
        return TagField::default();
    }
    if let Some(list) = column.as_any().downcast_ref::<LargeListArray>() {
        if list.is_valid(row) {
            return list_values(&list.value(row));
        }
        return TagField::default();
    }
    string_cell(batch, name, row).map_or_else(TagField::default, TagField::Joined)
}

fn list_values(values: &Arc<dyn Array>) -> TagField {
    if let Some(strings) = values.as_any().downcast_ref::<StringArray>() {
        return TagField::List(
            (0..strings.len())
                .filter(|&i| strings.is_valid(i))
                .map(|i| strings.value(i).to_owned())
                .collect(),
        );
    }
    if let Some(strings) = values.as_any().downcast_ref::<LargeStringArray>() {
        return TagField::List(
            (0..strings.len())
                .filter(|&i| strings.is_valid(i))
                .map(|i| strings.value(i).to_owned())
                .collect(),
        );
    }
    TagField::default()
}

#[cfg(test)]
mod tests {
    use arrow::array::builder::{ListBuilder, StringBuilder};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    /// Builds a two-column batch: list-typed countries_tags plus brands.
    fn test_batch(rows: &[(&[&str], Option<&str>)]) -> RecordBatch {
        let mut countries = ListBuilder::new(StringBuilder::new());
        let mut brands = StringBuilder::new();
        for (tags, brand) in rows {
            for tag in *tags {
                countries.values().append_value(*tag);
            }
            countries.append(true);
            match brand {
                Some(brand) => brands.append_value(*brand),
                None => brands.append_null(),
            }
        }

        let schema = Schema::new(vec![
            Field::new(
                "countries_tags",
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                true,
            ),
            Field::new("brands", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(countries.finish()), Arc::new(brands.finish())],
        )
        .unwrap()
    }

    #[test]
    fn filter_batch_keeps_only_matching_rows() {
        let batch = test_batch(&[
            (&["en:india"], Some("Acme")),
            (&["en:france"], Some("Brie & Co")),
            (&["en:france", "en:india"], Some("Zeta")),
        ]);
        let products = filter_batch(&batch, "en:india");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].brands.as_deref(), Some("Acme"));
        assert_eq!(products[1].brands.as_deref(), Some("Zeta"));
    }

    #[test]
    fn filter_batch_reads_list_typed_tags() {
        let batch = test_batch(&[(&["en:india", "en:nepal"], None)]);
        let products = filter_batch(&batch, "en:india");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].countries_tags.tags(), vec!["en:india", "en:nepal"]);
        assert!(products[0].brands.is_none());
    }

    #[test]
    fn filter_batch_with_no_matches_is_empty() {
        let batch = test_batch(&[(&["en:france"], Some("Acme"))]);
        assert!(filter_batch(&batch, "en:india").is_empty());
    }

    #[test]
    fn missing_projected_column_defaults_to_empty_field() {
        // The batch has no categories/ingredients columns; cells default
        // to empty rather than erroring.
        let batch = test_batch(&[(&["en:india"], Some("Acme"))]);
        let products = filter_batch(&batch, "en:india");
        assert!(products[0].categories_tags.is_empty());
        assert!(products[0].ingredients_tags.is_empty());
        assert!(products[0].nutriscore_grade.is_none());
    }
}
