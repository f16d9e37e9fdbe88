//! Presentation adapters.
//!
//! Table, summary cards, charts and the map marker are independent
//! consumers of one [`ComparisonResult`] list. None of them feed anything
//! back into the fetch or compare steps.

use census_explorer_compare::{Comparison, ComparisonResult, Direction};
use census_explorer_geography_models::{ZipCode, ZipLocation};
use census_explorer_metric_models::{MetricCategory, Period};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Map centre before any lookup (New York City).
pub const DEFAULT_MAP_CENTER: (f64, f64) = (40.7128, -74.0060);
/// Zoom level before any lookup.
pub const DEFAULT_MAP_ZOOM: u8 = 10;
/// Zoom level after a successful lookup.
pub const LOCATED_MAP_ZOOM: u8 = 12;

/// Codes shown as summary cards, in display order.
pub const SUMMARY_CARD_CODES: &[&str] = &[
    "DP03_0001E",
    "DP03_0062E",
    "DP04_0089E",
    "DP03_0009PE",
    "DP04_0001E",
    "ZBP_ESTAB",
];

/// The comparison cell of a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonCell {
    /// No comparison period selected; the column is not shown.
    Hidden,
    /// Comparison column shown but there is no value (`-`).
    NoComparison,
    /// Comparison value shown without a delta. `direction` is always
    /// [`Direction::Unavailable`].
    Informational { display: String, direction: Direction },
    /// Comparison value with its delta line.
    Delta {
        display: String,
        #[serde(rename = "deltaDisplay")]
        delta_display: String,
        direction: Direction,
    },
}

impl ComparisonCell {
    fn new(comparison: &Comparison, shown: bool) -> Self {
        if !shown {
            return Self::Hidden;
        }
        match comparison {
            Comparison::NoComparison => Self::NoComparison,
            Comparison::Informational {
                compare_display,
                direction,
            } => Self::Informational {
                display: compare_display.clone(),
                direction: *direction,
            },
            Comparison::Numeric {
                compare_display,
                direction,
                ..
            } => Self::Delta {
                display: compare_display.clone(),
                delta_display: comparison.delta_display().unwrap_or_default(),
                direction: *direction,
            },
        }
    }

    /// Text shown in the cell. `None` when the column is hidden.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Hidden => None,
            Self::NoComparison => Some("-".to_string()),
            Self::Informational { display, .. } => Some(display.clone()),
            Self::Delta {
                display,
                delta_display,
                ..
            } => Some(format!("{display} {delta_display}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub code: String,
    pub label: String,
    pub primary_display: String,
    pub comparison: ComparisonCell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSection {
    pub category: MetricCategory,
    pub title: String,
    pub rows: Vec<TableRow>,
}

/// The comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    /// Primary column header (the period year).
    pub primary_header: String,
    /// Comparison column header (`vs <year>`), absent when hidden.
    pub comparison_header: Option<String>,
    pub sections: Vec<TableSection>,
}

impl TableView {
    #[must_use]
    pub fn build(
        results: &[ComparisonResult],
        primary: Period,
        comparison: Option<Period>,
    ) -> Self {
        let shown = comparison.is_some();
        let sections = MetricCategory::all()
            .iter()
            .map(|&category| TableSection {
                category,
                title: category.label().to_string(),
                rows: results
                    .iter()
                    .filter(|r| r.category == category)
                    .map(|r| TableRow {
                        code: r.code.clone(),
                        label: r.label.clone(),
                        primary_display: r.primary_display.clone(),
                        comparison: ComparisonCell::new(&r.comparison, shown),
                    })
                    .collect(),
            })
            .filter(|section| !section.rows.is_empty())
            .collect();

        Self {
            primary_header: primary.to_string(),
            comparison_header: comparison.map(|p| format!("vs {p}")),
            sections,
        }
    }

    /// Every row, section by section.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }
}

/// A headline metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    pub code: String,
    pub label: String,
    pub primary_display: String,
    pub delta_display: Option<String>,
    pub direction: Option<Direction>,
}

impl SummaryCard {
    /// Cards for [`SUMMARY_CARD_CODES`] present in `results`.
    #[must_use]
    pub fn build_all(results: &[ComparisonResult]) -> Vec<Self> {
        SUMMARY_CARD_CODES
            .iter()
            .filter_map(|code| results.iter().find(|r| r.code == *code))
            .map(|r| Self {
                code: r.code.clone(),
                label: r.label.clone(),
                primary_display: r.primary_display.clone(),
                delta_display: r.comparison.delta_display(),
                direction: match r.comparison {
                    Comparison::Numeric { direction, .. } => Some(direction),
                    _ => None,
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    Doughnut,
    Bar,
}

/// One bar or slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub code: String,
    pub label: String,
    pub primary: Option<f64>,
    pub comparison: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

struct ChartDefinition {
    id: &'static str,
    title: &'static str,
    kind: ChartKind,
    codes: &'static [(&'static str, &'static str)],
}

const CHARTS: &[ChartDefinition] = &[
    ChartDefinition {
        id: "housing_tenure",
        title: "Housing Tenure",
        kind: ChartKind::Doughnut,
        codes: &[("B25003_002E", "Owner"), ("B25003_003E", "Renter")],
    },
    ChartDefinition {
        id: "housing_structures",
        title: "Housing Structure Mix",
        kind: ChartKind::Bar,
        codes: &[
            ("B25024_002E", "1-unit detached"),
            ("B25024_003E", "1-unit attached"),
            ("B25024_005E", "5-9 units"),
            ("B25024_010E", "Mobile homes"),
        ],
    },
    ChartDefinition {
        id: "occupations",
        title: "Occupation Mix (%)",
        kind: ChartKind::Bar,
        codes: &[
            ("DP03_0110PE", "Management/Business"),
            ("DP03_0118PE", "Service"),
            ("DP03_0112PE", "Sales/Office"),
            ("DP03_0116PE", "Production/Transport"),
            ("DP03_0114PE", "Natural resources"),
        ],
    },
    ChartDefinition {
        id: "business_patterns",
        title: "Business Patterns",
        kind: ChartKind::Bar,
        codes: &[
            ("ZBP_ESTAB", "Establishments"),
            ("ZBP_EMP", "Employees"),
            ("ZBP_PAYANN", "Payroll ($000)"),
        ],
    },
];

impl ChartView {
    /// Every chart, skipping those with no numeric primary value at all.
    #[must_use]
    pub fn build_all(results: &[ComparisonResult]) -> Vec<Self> {
        CHARTS
            .iter()
            .map(|def| Self {
                id: def.id.to_string(),
                title: def.title.to_string(),
                kind: def.kind,
                points: def
                    .codes
                    .iter()
                    .map(|(code, label)| {
                        let result = results.iter().find(|r| r.code == *code);
                        ChartPoint {
                            code: (*code).to_string(),
                            label: (*label).to_string(),
                            primary: result.and_then(ComparisonResult::primary_number),
                            comparison: result.and_then(|r| match r.comparison {
                                Comparison::Numeric { compare_value, .. } => Some(compare_value),
                                _ => None,
                            }),
                        }
                    })
                    .collect(),
            })
            .filter(|chart| chart.points.iter().any(|p| p.primary.is_some()))
            .collect()
    }
}

/// Marker placed on the located ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub zip: ZipCode,
    pub latitude: f64,
    pub longitude: f64,
    pub popup: String,
}

impl MapMarker {
    #[must_use]
    pub fn new(location: &ZipLocation) -> Self {
        Self {
            zip: location.zip.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            popup: format!(
                "ZIP Code: {}\n{}, {}\nLat: {:.4}, Lon: {:.4}",
                location.zip,
                location.place_name,
                location.state_abbr,
                location.latitude,
                location.longitude
            ),
        }
    }
}

/// Map viewport plus the marker, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub marker: Option<MapMarker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_MAP_CENTER.0,
            longitude: DEFAULT_MAP_CENTER.1,
            zoom: DEFAULT_MAP_ZOOM,
            marker: None,
        }
    }
}

impl MapView {
    /// Viewport centred on `marker`.
    #[must_use]
    pub fn focused(marker: MapMarker) -> Self {
        Self {
            latitude: marker.latitude,
            longitude: marker.longitude,
            zoom: LOCATED_MAP_ZOOM,
            marker: Some(marker),
        }
    }
}

/// Everything the dashboard renders for one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub zip: ZipCode,
    /// `ZIP Code: <zip>`.
    pub zip_display: String,
    pub primary_period: Period,
    pub primary_label: String,
    pub comparison_period: Option<Period>,
    /// Whether the comparison period was selected and loaded.
    pub comparison_loaded: bool,
    pub table: TableView,
    pub cards: Vec<SummaryCard>,
    pub charts: Vec<ChartView>,
    /// `None` when the lookup failed; the map keeps its previous state.
    pub map: Option<MapView>,
}

impl DashboardView {
    #[must_use]
    pub fn build(
        zip: ZipCode,
        primary: Period,
        comparison: Option<Period>,
        comparison_loaded: bool,
        results: &[ComparisonResult],
        location: Option<&ZipLocation>,
    ) -> Self {
        Self {
            zip_display: format!("ZIP Code: {zip}"),
            zip,
            primary_period: primary,
            primary_label: primary.label(),
            comparison_period: comparison,
            comparison_loaded,
            table: TableView::build(results, primary, comparison),
            cards: SummaryCard::build_all(results),
            charts: ChartView::build_all(results),
            map: location.map(|l| MapView::focused(MapMarker::new(l))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_explorer_compare::compare_records;
    use census_explorer_metric::default_catalog;
    use census_explorer_metric_models::{FlatRecord, RawValue};

    fn record(pairs: &[(&str, &str)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (*k, RawValue::from(*v)))
            .collect()
    }

    fn nyc() -> ZipLocation {
        ZipLocation {
            zip: ZipCode::parse("10001").unwrap(),
            latitude: 40.750_633,
            longitude: -73.997_177,
            place_name: "New York City".to_string(),
            state_abbr: "NY".to_string(),
        }
    }

    #[test]
    fn hidden_comparison_column_without_period() {
        let primary = record(&[("DP04_0001E", "12500")]);
        let results = compare_records(default_catalog(), &primary, None);
        let table = TableView::build(&results, Period::LATEST, None);

        assert_eq!(table.primary_header, "2023");
        assert_eq!(table.comparison_header, None);
        assert_eq!(table.sections.len(), 2);
        assert_eq!(table.sections[0].title, "Housing & Residential Investment");
        assert_eq!(table.sections[1].title, "Business & Employment");
        assert!(table.rows().all(|r| r.comparison == ComparisonCell::Hidden));
        assert_eq!(table.rows().count(), default_catalog().len());
    }

    #[test]
    fn delta_cells_with_comparison() {
        let primary = record(&[("DP04_0001E", "12500"), ("DP04_0046E", "4.5")]);
        let comparison = record(&[("DP04_0001E", "10000"), ("DP04_0046E", "-")]);
        let results = compare_records(default_catalog(), &primary, Some(&comparison));
        let table = TableView::build(&results, Period::LATEST, Some(Period::from_year(2022)));

        assert_eq!(table.comparison_header.as_deref(), Some("vs 2022"));
        let row = table.rows().find(|r| r.code == "DP04_0001E").unwrap();
        assert_eq!(
            row.comparison,
            ComparisonCell::Delta {
                display: "10.0K".to_string(),
                delta_display: "+2.5K (25.0%)".to_string(),
                direction: Direction::Increase,
            }
        );
        let row = table.rows().find(|r| r.code == "DP04_0046E").unwrap();
        assert_eq!(
            row.comparison,
            ComparisonCell::Informational {
                display: "N/A".to_string(),
                direction: Direction::Unavailable,
            }
        );
        let cell = serde_json::to_value(&row.comparison).unwrap();
        assert_eq!(cell["direction"], "unavailable");
        let row = table.rows().find(|r| r.code == "B25035_001E").unwrap();
        assert_eq!(row.comparison, ComparisonCell::NoComparison);
        assert_eq!(row.comparison.text().as_deref(), Some("-"));
    }

    #[test]
    fn cards_follow_display_order() {
        let primary = record(&[
            ("DP03_0062E", "85000"),
            ("DP04_0001E", "12500"),
            ("ZBP_ESTAB", "321"),
        ]);
        let results = compare_records(default_catalog(), &primary, None);
        let cards = SummaryCard::build_all(&results);

        let codes: Vec<&str> = cards.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, SUMMARY_CARD_CODES);
        let income = &cards[1];
        assert_eq!(income.primary_display, "85.0K");
        assert_eq!(income.delta_display, None);
        assert_eq!(cards[0].primary_display, "N/A");
    }

    #[test]
    fn charts_skip_series_without_data() {
        let primary = record(&[("B25003_002E", "800"), ("B25003_003E", "1200")]);
        let comparison = record(&[("B25003_002E", "750")]);
        let results = compare_records(default_catalog(), &primary, Some(&comparison));
        let charts = ChartView::build_all(&results);

        assert_eq!(charts.len(), 1);
        let tenure = &charts[0];
        assert_eq!(tenure.id, "housing_tenure");
        assert_eq!(tenure.kind, ChartKind::Doughnut);
        assert_eq!(tenure.points[0].primary, Some(800.0));
        assert_eq!(tenure.points[0].comparison, Some(750.0));
        assert_eq!(tenure.points[1].comparison, None);
    }

    #[test]
    fn marker_popup_and_zoom() {
        let marker = MapMarker::new(&nyc());
        assert_eq!(
            marker.popup,
            "ZIP Code: 10001\nNew York City, NY\nLat: 40.7506, Lon: -73.9972"
        );
        let map = MapView::focused(marker);
        assert_eq!(map.zoom, LOCATED_MAP_ZOOM);

        let default = MapView::default();
        assert_eq!((default.latitude, default.longitude), DEFAULT_MAP_CENTER);
        assert_eq!(default.zoom, DEFAULT_MAP_ZOOM);
    }

    #[test]
    fn every_chart_and_card_code_is_in_catalog() {
        let catalog = default_catalog();
        for code in SUMMARY_CARD_CODES {
            assert!(catalog.get(code).is_some(), "{code}");
        }
        for def in CHARTS {
            for (code, _) in def.codes {
                assert!(catalog.get(code).is_some(), "{code}");
            }
        }
    }
}
