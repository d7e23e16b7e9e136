//! Textual rendering of the four summary charts.

use nutridash_core::{AggregationResult, TagCount};

const BAR_WIDTH: usize = 40;

/// Renders the full four-chart dashboard as text.
#[must_use]
pub fn render(result: &AggregationResult) -> String {
    let mut out = String::new();
    out.push_str(&render_distribution(
        "NutriScore distribution",
        &result.nutriscore_distribution,
    ));
    out.push_str(&render_top("Top 5 brands", &result.top_brands));
    out.push_str(&render_top("Top 5 categories", &result.top_categories));
    out.push_str(&render_top("Top 5 ingredients", &result.top_ingredients));
    out
}

fn render_distribution(title: &str, entries: &[(String, u64)]) -> String {
    let rows: Vec<(&str, u64)> = entries
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect();
    render_chart(title, &rows)
}

fn render_top(title: &str, entries: &[TagCount]) -> String {
    let rows: Vec<(&str, u64)> = entries
        .iter()
        .map(|entry| (entry.label.as_str(), entry.count))
        .collect();
    render_chart(title, &rows)
}

fn render_chart(title: &str, rows: &[(&str, u64)]) -> String {
    let mut out = format!("\n{title}\n");
    if rows.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }

    let max_count = rows.iter().map(|(_, count)| *count).max().unwrap_or(1).max(1);
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    for (label, count) in rows {
        let bar_len = usize::try_from(count * BAR_WIDTH as u64 / max_count).unwrap_or(0);
        let bar = "#".repeat(bar_len.max(usize::from(*count > 0)));
        out.push_str(&format!("  {label:<label_width$}  {bar} {count}\n"));
    }
    out
}
