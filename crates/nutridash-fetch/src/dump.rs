//! Streaming filter of the compressed product dump.
//!
//! The dump is a large gzip'd tab-delimited file with a header row. Two
//! passes keep memory flat: a cheap case-insensitive substring prefilter
//! streams matching raw lines into a uniquely named scratch file, then the
//! much smaller scratch file is parsed into structured records with a
//! re-validation of the countries-tags field (the substring test can hit
//! adjacent fields). The scratch file is removed when the operation ends,
//! success or failure.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;

use nutridash_core::{Product, TagField};

use crate::error::FetchError;
use crate::progress::ProgressSink;

const SCAN_PROGRESS_EVERY: u64 = 100_000;

fn io_err(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Filters the dump at `path` down to products whose countries-tags field
/// contains `country_tag`.
///
/// Malformed lines (decode failure, field-count mismatch) are skipped
/// individually; zero matches is an empty result with a warning, not an
/// error.
///
/// # Errors
///
/// Returns [`FetchError::Io`] if the dump or the scratch file cannot be
/// opened, read, or written.
pub fn filter_dump(
    path: &Path,
    country_tag: &str,
    sink: &dyn ProgressSink,
) -> Result<Vec<Product>, FetchError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(GzDecoder::new(file));
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| io_err(path, e))?,
        None => {
            tracing::warn!(path = %path.display(), "dump is empty");
            return Ok(Vec::new());
        }
    };

    // Pass 1: substring prefilter into the scratch file. NamedTempFile
    // gives each invocation its own path and removes it on drop.
    let mut scratch = NamedTempFile::new().map_err(|e| io_err(path, e))?;
    writeln!(scratch, "{header}").map_err(|e| io_err(scratch.path(), e))?;

    let needle = country_tag.to_lowercase();
    let mut scanned = 0u64;
    let mut candidates = 0u64;
    let mut undecodable = 0u64;
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                undecodable += 1;
                tracing::debug!(error = %err, "skipping undecodable dump line");
                continue;
            }
        };
        scanned += 1;
        if scanned % SCAN_PROGRESS_EVERY == 0 {
            sink.update(&format!(
                "scanned {scanned} lines, {candidates} candidate matches"
            ));
        }
        if line.to_lowercase().contains(&needle) {
            writeln!(scratch, "{line}").map_err(|e| io_err(scratch.path(), e))?;
            candidates += 1;
        }
    }
    scratch.flush().map_err(|e| io_err(scratch.path(), e))?;
    sink.update(&format!(
        "scan complete: {scanned} lines, {candidates} candidate matches"
    ));
    if undecodable > 0 {
        tracing::warn!(undecodable, "skipped undecodable dump lines");
    }

    // Pass 2: structured parse with re-validation.
    let products = parse_filtered(scratch.path(), country_tag)?;
    if products.is_empty() {
        tracing::warn!(country_tag, "no products matched in dump");
    }
    sink.update(&format!("parsed {} matching products", products.len()));
    Ok(products)
}

/// Parses the scratch file: splits the header into column names, zips each
/// data line into a record, and keeps only records whose countries-tags
/// field actually contains the target tag.
fn parse_filtered(path: &Path, country_tag: &str) -> Result<Vec<Product>, FetchError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| io_err(path, e))?,
        None => return Ok(Vec::new()),
    };
    let columns: Vec<&str> = header.split('\t').collect();

    let mut products = Vec::new();
    let mut skipped = 0u64;
    for line in lines {
        let Ok(line) = line else {
            skipped += 1;
            continue;
        };
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != columns.len() {
            skipped += 1;
            continue;
        }
        let product = product_from_record(&columns, &fields);
        if product.countries_tags.contains_tag(country_tag) {
            products.push(product);
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped malformed dump lines");
    }
    Ok(products)
}

/// Zips a header row and a data row into the five pipeline fields.
///
/// `columns` and `fields` must be the same length; the caller has already
/// rejected field-count mismatches.
fn product_from_record(columns: &[&str], fields: &[&str]) -> Product {
    let value = |name: &str| -> Option<String> {
        columns
            .iter()
            .position(|column| *column == name)
            .map(|i| fields[i].to_owned())
            .filter(|v| !v.is_empty())
    };
    let joined = |name: &str| -> TagField {
        value(name).map_or_else(TagField::default, TagField::Joined)
    };

    Product {
        nutriscore_grade: value("nutriscore_grade"),
        brands: value("brands"),
        categories_tags: joined("categories_tags"),
        ingredients_tags: joined("ingredients_tags"),
        countries_tags: joined("countries_tags"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;
    use crate::progress::TracingProgress;

    /// Writes a gzip'd dump with the given lines and returns its handle.
    fn write_dump(lines: &[&str]) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::fast());
        for line in lines {
            writeln!(encoder, "{line}").unwrap();
        }
        encoder.finish().unwrap();
        file
    }

    #[test]
    fn filters_matching_lines_and_populates_fields() {
        let dump = write_dump(&[
            "a\tcountries_tags\tb",
            "1\ten:india\tx",
            "2\ten:france\ty",
            "3\ten:india,en:france\tz",
        ]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert_eq!(products.len(), 2);
        for product in &products {
            assert!(product.countries_tags.contains_tag("en:india"));
        }
    }

    #[test]
    fn record_takes_all_fields_from_its_own_line() {
        let columns = vec!["brands", "countries_tags", "nutriscore_grade"];
        let fields = vec!["Acme", "en:india", "a"];
        let product = product_from_record(&columns, &fields);
        assert_eq!(product.brands.as_deref(), Some("Acme"));
        assert!(product.countries_tags.contains_tag("en:india"));
        assert_eq!(product.nutriscore_grade.as_deref(), Some("a"));
    }

    #[test]
    fn prefilter_false_positive_is_dropped_by_revalidation() {
        // "en:india" appears in an adjacent column, not in countries_tags.
        let dump = write_dump(&[
            "a\tcountries_tags\tb",
            "en:india\ten:france\tx",
            "1\ten:india\ty",
        ]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn prefilter_is_case_insensitive() {
        let dump = write_dump(&["countries_tags", "EN:India"]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped_without_aborting() {
        let dump = write_dump(&[
            "a\tcountries_tags\tb",
            "only-two\tfields",
            "1\ten:india\tok",
        ]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn zero_matches_yields_empty_result() {
        let dump = write_dump(&["a\tcountries_tags\tb", "1\ten:france\tx"]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn empty_dump_yields_empty_result() {
        let dump = write_dump(&[]);
        let products = filter_dump(dump.path(), "en:india", &TracingProgress).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn missing_dump_file_is_an_io_error() {
        let result = filter_dump(
            Path::new("/nonexistent/products.csv.gz"),
            "en:india",
            &TracingProgress,
        );
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}
