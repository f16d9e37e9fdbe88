//! Plain-text rendering of a loaded dashboard.

use std::fmt::Write as _;

use census_explorer_dashboard::view::TableView;
use census_explorer_dashboard::{DashboardView, NotificationLevel};

/// Renders the header, headline cards, map focus and metric table.
#[must_use]
pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = write!(out, "{} | {}", view.zip_display, view.primary_label);
    if let (Some(period), true) = (view.comparison_period, view.comparison_loaded) {
        let _ = write!(out, " vs {period}");
    }
    out.push('\n');

    if let Some(marker) = view.map.as_ref().and_then(|m| m.marker.as_ref()) {
        let place = marker.popup.lines().nth(1).unwrap_or_default();
        let _ = writeln!(
            out,
            "{place} ({:.4}, {:.4})",
            marker.latitude, marker.longitude
        );
    }

    if !view.cards.is_empty() {
        out.push_str("\nHighlights\n");
        let width = view.cards.iter().map(|c| c.label.len()).max().unwrap_or(0);
        for card in &view.cards {
            let _ = write!(out, "  {:<width$}  {:>10}", card.label, card.primary_display);
            if let Some(delta) = &card.delta_display {
                let _ = write!(out, "  {delta}");
            }
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&render_table(&view.table));
    out
}

/// Renders the metric table section by section.
#[must_use]
pub fn render_table(table: &TableView) -> String {
    let width = table
        .rows()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0)
        .max("Metric".len());

    let mut out = String::new();
    let _ = write!(out, "{:<width$}  {:>16}", "Metric", table.primary_header);
    if let Some(header) = &table.comparison_header {
        let _ = write!(out, "  {header}");
    }
    out.push('\n');

    for section in &table.sections {
        let _ = writeln!(out, "{}", section.title);
        for row in &section.rows {
            let _ = write!(out, "  {:<w$}{:>16}", row.label, row.primary_display, w = width);
            if let Some(text) = row.comparison.text() {
                let _ = write!(out, "  {text}");
            }
            out.push('\n');
        }
    }

    out
}

/// Renders one notification line for stderr.
#[must_use]
pub fn render_notification(level: NotificationLevel, message: &str) -> String {
    format!("[{level}] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_explorer_compare::compare_records;
    use census_explorer_geography_models::{ZipCode, ZipLocation};
    use census_explorer_metric::default_catalog;
    use census_explorer_metric_models::{FlatRecord, Period, RawValue};

    fn record(pairs: &[(&str, &str)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (*k, RawValue::from(*v)))
            .collect()
    }

    fn view(comparison: Option<&FlatRecord>, location: Option<&ZipLocation>) -> DashboardView {
        let primary = record(&[("DP04_0001E", "1500"), ("DP02_0001E", "800")]);
        let results = compare_records(default_catalog(), &primary, comparison);
        DashboardView::build(
            ZipCode::parse("10001").unwrap(),
            Period::LATEST,
            comparison.map(|_| Period::from_year(2022)),
            comparison.is_some(),
            &results,
            location,
        )
    }

    #[test]
    fn primary_only_has_no_comparison_column() {
        let text = render_view(&view(None, None));

        assert!(text.starts_with("ZIP Code: 10001 | 2023 (2019-2023)\n"));
        assert!(!text.contains(" vs "));
        assert!(text.contains("1,500"));
    }

    #[test]
    fn comparison_adds_header_and_deltas() {
        let comparison = record(&[("DP04_0001E", "1000")]);
        let text = render_view(&view(Some(&comparison), None));

        assert!(text.contains("vs 2022"));
        assert!(text.contains("+500 (50.0%)"));
    }

    #[test]
    fn located_view_prints_place() {
        let location = ZipLocation {
            zip: ZipCode::parse("10001").unwrap(),
            latitude: 40.7484,
            longitude: -73.9967,
            place_name: "New York City".to_string(),
            state_abbr: "NY".to_string(),
        };
        let text = render_view(&view(None, Some(&location)));

        assert!(text.contains("New York City, NY (40.7484, -73.9967)"));
    }

    #[test]
    fn notification_line() {
        assert_eq!(
            render_notification(NotificationLevel::Warning, "Could not load"),
            "[warning] Could not load"
        );
    }
}
