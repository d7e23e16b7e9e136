//! Country catalog and display-name resolution.
//!
//! Data sources address countries by an `en:`-tagged canonical name; the
//! selection list shows a human-readable form. The catalog is built once
//! per session from the static table below, and the resolver maps a chosen
//! display name back to its code and filter tag.

use std::collections::BTreeMap;

/// Country codes and their canonical countries-tag names, as used by the
/// product database.
const COUNTRY_CODE_TO_NAME: &[(&str, &str)] = &[
    ("ar", "en:argentina"),
    ("at", "en:austria"),
    ("au", "en:australia"),
    ("be", "en:belgium"),
    ("bg", "en:bulgaria"),
    ("br", "en:brazil"),
    ("ca", "en:canada"),
    ("ch", "en:switzerland"),
    ("cl", "en:chile"),
    ("cn", "en:china"),
    ("co", "en:colombia"),
    ("cz", "en:czech-republic"),
    ("de", "en:germany"),
    ("dk", "en:denmark"),
    ("eg", "en:egypt"),
    ("es", "en:spain"),
    ("fi", "en:finland"),
    ("fr", "en:france"),
    ("gb", "en:united-kingdom"),
    ("gr", "en:greece"),
    ("hr", "en:croatia"),
    ("hu", "en:hungary"),
    ("id", "en:indonesia"),
    ("ie", "en:ireland"),
    ("il", "en:israel"),
    ("in", "en:india"),
    ("it", "en:italy"),
    ("jp", "en:japan"),
    ("kr", "en:south-korea"),
    ("ma", "en:morocco"),
    ("mx", "en:mexico"),
    ("my", "en:malaysia"),
    ("nl", "en:netherlands"),
    ("no", "en:norway"),
    ("nz", "en:new-zealand"),
    ("pl", "en:poland"),
    ("pt", "en:portugal"),
    ("ro", "en:romania"),
    ("rs", "en:serbia"),
    ("ru", "en:russia"),
    ("se", "en:sweden"),
    ("sg", "en:singapore"),
    ("th", "en:thailand"),
    ("tn", "en:tunisia"),
    ("tr", "en:turkey"),
    ("ua", "en:ukraine"),
    ("us", "en:united-states"),
    ("vn", "en:vietnam"),
    ("za", "en:south-africa"),
];

/// A country resolved from the selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCountry {
    /// Two-letter data-source country code.
    pub code: String,
    /// Human-readable name shown in the selection list.
    pub display_name: String,
    /// The `en:` countries-tag used for filtering.
    pub tag: String,
}

/// Display-name → country lookup built from the static catalog.
#[derive(Debug)]
pub struct CountryCatalog {
    by_display_name: BTreeMap<String, ResolvedCountry>,
}

impl CountryCatalog {
    #[must_use]
    pub fn new() -> Self {
        let by_display_name = COUNTRY_CODE_TO_NAME
            .iter()
            .map(|(code, tag)| {
                let display_name = display_form(tag);
                let country = ResolvedCountry {
                    code: (*code).to_owned(),
                    display_name: display_name.clone(),
                    tag: (*tag).to_owned(),
                };
                (display_name, country)
            })
            .collect();
        Self { by_display_name }
    }

    /// Resolves a display-form name back to its country.
    ///
    /// Names originating from [`Self::display_names`] always resolve; free
    /// text from the command line may not.
    #[must_use]
    pub fn resolve(&self, display_name: &str) -> Option<&ResolvedCountry> {
        self.by_display_name.get(display_name)
    }

    /// The sorted selection list.
    #[must_use]
    pub fn display_names(&self) -> Vec<&str> {
        self.by_display_name.keys().map(String::as_str).collect()
    }
}

impl Default for CountryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes a canonical tag name into its display form: strip the `en:`
/// prefix, replace separators with spaces, capitalize the first letter.
fn display_form(tag: &str) -> String {
    let name = crate::model::strip_language_prefix(tag).replace('-', " ");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => name,
    }
}
