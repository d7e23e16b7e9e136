//! The shared aggregation step.
//!
//! Every fetch strategy hands its product list to [`aggregate`], which
//! reduces it to the four frequency tables the dashboard renders. The
//! function is pure: no I/O, deterministic for a given input order (ties
//! among equal counts break on first-encountered order).

use std::collections::HashMap;

use crate::model::{
    strip_language_prefix, AggregationResult, Product, TagCount, UNKNOWN_GRADE,
};

/// Each top-N list keeps at most this many entries.
const TOP_N: usize = 5;

/// Computes the four frequency distributions for a product list.
#[must_use]
pub fn aggregate(products: &[Product]) -> AggregationResult {
    let mut grades: HashMap<String, u64> = HashMap::new();
    let mut brands = TagCounter::default();
    let mut categories = TagCounter::default();
    let mut ingredients = TagCounter::default();

    for product in products {
        let grade = product
            .nutriscore_grade
            .as_deref()
            .map(str::trim)
            .filter(|grade| !grade.is_empty())
            .map_or_else(|| UNKNOWN_GRADE.to_owned(), str::to_uppercase);
        *grades.entry(grade).or_insert(0) += 1;

        if let Some(field) = &product.brands {
            for token in field.split(',') {
                brands.add(token.trim());
            }
        }
        for tag in product.categories_tags.tags() {
            categories.add(strip_language_prefix(tag));
        }
        for tag in product.ingredients_tags.tags() {
            ingredients.add(strip_language_prefix(tag));
        }
    }

    AggregationResult {
        nutriscore_distribution: sorted_grades(grades),
        top_brands: brands.into_top(TOP_N),
        top_categories: categories.into_top(TOP_N),
        top_ingredients: ingredients.into_top(TOP_N),
    }
}

/// Frequency counter that remembers first-insertion order for tie-breaking.
#[derive(Default)]
struct TagCounter {
    counts: HashMap<String, (u64, usize)>,
}

impl TagCounter {
    fn add(&mut self, label: &str) {
        if label.is_empty() {
            return;
        }
        let first_seen = self.counts.len();
        let entry = self.counts.entry(label.to_owned()).or_insert((0, first_seen));
        entry.0 += 1;
    }

    /// Consumes the counter and returns the `n` most frequent labels,
    /// count descending, ties broken by first-seen order.
    fn into_top(self, n: usize) -> Vec<TagCount> {
        let mut entries: Vec<(String, u64, usize)> = self
            .counts
            .into_iter()
            .map(|(label, (count, first_seen))| (label, count, first_seen))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries.truncate(n);
        entries
            .into_iter()
            .map(|(label, count, _)| TagCount { label, count })
            .collect()
    }
}

/// Orders the grade distribution ascending by label with the unknown
/// sentinel sorted last.
fn sorted_grades(grades: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = grades.into_iter().collect();
    entries.sort_by(|a, b| {
        let a_unknown = a.0 == UNKNOWN_GRADE;
        let b_unknown = b.0 == UNKNOWN_GRADE;
        a_unknown.cmp(&b_unknown).then_with(|| a.0.cmp(&b.0))
    });
    entries
}
