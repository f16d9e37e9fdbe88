//! One-shot dashboard load from the command line.

use std::sync::Arc;

use census_explorer_cli_utils::{IndicatifProgress, MultiProgress};
use census_explorer_dashboard::{DashboardServices, LoadRequest, Notification, run_load};
use census_explorer_geocoder::ZippopotamLookup;
use census_explorer_metric::default_catalog;
use census_explorer_metric_models::{MetricSelection, Period};
use census_explorer_server_models::ApiDashboard;
use census_explorer_source::PeriodFetcher;
use census_explorer_source::config::{SourceConfig, build_client, build_sources};

use crate::render::{render_notification, render_view};

/// Options for a single lookup.
#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub zip: String,
    pub year: Option<String>,
    pub compare: Option<String>,
    /// Restrict the fetch to core metrics.
    pub core: bool,
    /// Print the dashboard as JSON instead of a table.
    pub json: bool,
}

impl LookupOptions {
    fn request(&self) -> LoadRequest {
        let year = self
            .year
            .clone()
            .unwrap_or_else(|| Period::LATEST.year().to_string());
        let request = LoadRequest::new(self.zip.clone(), year);
        match &self.compare {
            Some(compare) => request.with_comparison(compare.clone()),
            None => request,
        }
    }
}

/// Loads one ZIP code and prints the result to stdout.
///
/// # Errors
///
/// Returns an error if the input is invalid, a client cannot be built or
/// the primary period cannot be fetched.
pub async fn run(
    multi: &MultiProgress,
    options: &LookupOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SourceConfig::from_env();
    if options.core {
        config.selection = MetricSelection::Core;
    }

    let request = options.request();
    request.validate()?;

    let catalog = Arc::new(default_catalog().clone());
    let progress = IndicatifProgress::chunks_bar(multi, "Fetching ACS tables");
    let sources = build_sources(&config, &catalog, Some(Arc::clone(&progress)))?;
    let fetcher = PeriodFetcher::new(catalog, sources).with_selection(config.selection);
    let lookup = ZippopotamLookup::from_env(build_client(config.timeout)?);
    let services = DashboardServices::new(fetcher, Arc::new(lookup));

    let report = run_load(&services, &request).await;
    progress.finish("Done".to_string());
    let report = report?;

    for (level, message) in report.notifications() {
        eprintln!("{}", render_notification(level, &message));
    }

    if options.json {
        let now = chrono::Utc::now();
        let notifications = report
            .notifications()
            .into_iter()
            .map(|(level, message)| Notification::new(level, message, now))
            .collect();
        let body = ApiDashboard {
            view: report.view,
            notifications,
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render_view(&report.view));
    }

    Ok(())
}
