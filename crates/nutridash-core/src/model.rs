//! Product records and aggregation results shared by every fetch strategy.
//!
//! Products are ephemeral: a fetch strategy produces them, the aggregator
//! consumes them once, and only the aggregate survives the session unless
//! explicitly saved.

use serde::{Deserialize, Serialize};

/// Sentinel bucket for products whose `nutriscore_grade` is absent or empty.
pub const UNKNOWN_GRADE: &str = "Unknown";

/// A tag-valued field that may arrive either as a comma-joined string
/// (CSV-dump-derived) or as a native list (API- or columnar-derived).
///
/// The untagged serde representation lets both shapes deserialize from the
/// search API's JSON without a custom visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagField {
    List(Vec<String>),
    Joined(String),
}

impl Default for TagField {
    fn default() -> Self {
        TagField::List(Vec::new())
    }
}

impl TagField {
    /// Returns the individual trimmed tags, dropping empty tokens.
    ///
    /// Comma-joined strings are split on `,`; native lists are passed
    /// through element by element.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        match self {
            TagField::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .collect(),
            TagField::List(list) => list
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership test against whole tags.
    #[must_use]
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags().is_empty()
    }
}

/// One food-product record, reduced to the five fields the pipeline reads.
///
/// `countries_tags` is used only for filtering and never shown downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub nutriscore_grade: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub categories_tags: TagField,
    #[serde(default)]
    pub ingredients_tags: TagField,
    #[serde(default)]
    pub countries_tags: TagField,
}

/// One (label, count) entry in a top-N frequency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub label: String,
    pub count: u64,
}

/// The four frequency tables the dashboard renders.
///
/// `nutriscore_distribution` is kept as an ordered sequence (grades
/// ascending, [`UNKNOWN_GRADE`] last) so display order survives the JSON
/// round-trip through the summary store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub nutriscore_distribution: Vec<(String, u64)>,
    pub top_brands: Vec<TagCount>,
    pub top_categories: Vec<TagCount>,
    pub top_ingredients: Vec<TagCount>,
}

/// Strips the `en:` language marker from the front of a tag.
///
/// Strips repeatedly, so the operation is idempotent even for tags like
/// `en:en:sugar` produced by double-prefixed source data.
#[must_use]
pub fn strip_language_prefix(mut tag: &str) -> &str {
    while let Some(rest) = tag.strip_prefix("en:") {
        tag = rest;
    }
    tag
}
