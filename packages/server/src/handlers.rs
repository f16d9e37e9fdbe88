//! HTTP handler functions for the census explorer API.

use actix_web::{HttpResponse, web};
use census_explorer_dashboard::{LoadError, LoadRequest, Notification, run_load};
use census_explorer_metric_models::Period;
use census_explorer_server_models::{
    ApiDashboard, ApiError, ApiHealth, ApiMetric, ApiMetricSection, ApiPeriod, ApiPeriods,
    DashboardQueryParams,
};
use chrono::Utc;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/metrics`
///
/// Returns the metric catalog grouped into table sections.
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let sections: Vec<ApiMetricSection> = state
        .catalog
        .sections()
        .into_iter()
        .map(|(category, metrics)| ApiMetricSection {
            category,
            title: category.label().to_string(),
            metrics: metrics.into_iter().map(ApiMetric::from).collect(),
        })
        .collect();

    HttpResponse::Ok().json(sections)
}

/// `GET /api/periods`
pub async fn periods() -> HttpResponse {
    HttpResponse::Ok().json(ApiPeriods {
        default_year: Period::LATEST.year(),
        periods: Period::available().into_iter().map(ApiPeriod::from).collect(),
    })
}

/// `GET /api/dashboard?zip=&year=&compareYear=`
///
/// Loads one ZIP code for a primary period and an optional comparison
/// period. Answers 400 for invalid input and 502 when the primary period
/// cannot be fetched.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let request = LoadRequest {
        zip: params.zip.unwrap_or_default(),
        year: params
            .year
            .filter(|y| !y.trim().is_empty())
            .unwrap_or_else(|| Period::LATEST.to_string()),
        compare_year: params.compare_year,
    };

    match run_load(&state.services, &request).await {
        Ok(report) => {
            let now = Utc::now();
            let notifications = report
                .notifications()
                .into_iter()
                .map(|(level, message)| Notification::new(level, message, now))
                .collect();
            HttpResponse::Ok().json(ApiDashboard {
                view: report.view,
                notifications,
            })
        }
        Err(e @ LoadError::Validation { .. }) => {
            HttpResponse::BadRequest().json(ApiError::new(e.user_message()))
        }
        Err(e @ LoadError::PrimaryFetch { .. }) => {
            HttpResponse::BadGateway().json(ApiError::new(e.user_message()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure_api;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use census_explorer_dashboard::DashboardServices;
    use census_explorer_gateway::{GatewayConfig, GatewayState, ReqwestUpstream};
    use census_explorer_geocoder::StaticLookup;
    use census_explorer_geography_models::{ZipCode, ZipLocation};
    use census_explorer_metric::default_catalog;
    use census_explorer_metric_models::{FlatRecord, MetricSelection, MetricSource, RawValue};
    use census_explorer_source::business::BusinessPatternSource;
    use census_explorer_source::config::build_client;
    use census_explorer_source::fixture::FixtureSource;
    use census_explorer_source::{DataSource, PeriodFetcher};
    use std::sync::Arc;
    use std::time::Duration;

    fn zip() -> ZipCode {
        ZipCode::parse("10001").unwrap()
    }

    fn state() -> web::Data<AppState> {
        let catalog = Arc::new(default_catalog().clone());
        let record: FlatRecord = catalog
            .codes_for_source(MetricSource::Acs, MetricSelection::All)
            .into_iter()
            .map(|code| (code, RawValue::from("2500")))
            .collect();
        let acs = FixtureSource::new(MetricSource::Acs)
            .with_record(&zip(), Period::LATEST, record)
            .failing_period(Period::from_year(2018));
        let sources: Vec<Arc<dyn DataSource>> =
            vec![Arc::new(acs), Arc::new(BusinessPatternSource::new())];
        let lookup = StaticLookup::new().with_location(ZipLocation {
            zip: zip(),
            latitude: 40.7484,
            longitude: -73.9967,
            place_name: "New York City".to_string(),
            state_abbr: "NY".to_string(),
        });

        web::Data::new(AppState {
            catalog: Arc::clone(&catalog),
            services: DashboardServices::new(
                PeriodFetcher::new(catalog, sources),
                Arc::new(lookup),
            ),
        })
    }

    fn gateway() -> web::Data<GatewayState> {
        web::Data::new(GatewayState::new(
            GatewayConfig {
                api_key: None,
                ..GatewayConfig::default()
            },
            Arc::new(ReqwestUpstream::new(
                build_client(Duration::from_secs(1)).unwrap(),
            )),
        ))
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .app_data(gateway())
                .service(web::scope("/api").configure(configure_api)),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: serde_json::Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn metrics_are_grouped_by_section() {
        let (status, body) = get("/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let sections = body.as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["title"], "Housing & Residential Investment");
        assert_eq!(sections[0]["metrics"].as_array().unwrap().len(), 25);
        assert_eq!(sections[1]["metrics"].as_array().unwrap().len(), 28);
    }

    #[actix_web::test]
    async fn periods_list_labels() {
        let (_, body) = get("/api/periods").await;
        assert_eq!(body["defaultYear"], 2023);
        assert_eq!(body["periods"][0]["label"], "2023 (2019-2023)");
        assert_eq!(body["periods"].as_array().unwrap().len(), 7);
    }

    #[actix_web::test]
    async fn dashboard_renders_primary_only() {
        let (status, body) = get("/api/dashboard?zip=10001&year=2023").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["zipDisplay"], "ZIP Code: 10001");
        assert!(body["table"]["comparisonHeader"].is_null());
        assert_eq!(body["table"]["sections"][0]["rows"][0]["primaryDisplay"], "2.5K");
        assert_eq!(body["map"]["zoom"], 12);
        assert_eq!(body["notifications"][0]["level"], "success");
    }

    #[actix_web::test]
    async fn dashboard_degrades_when_comparison_fails() {
        let (status, body) = get("/api/dashboard?zip=10001&year=2023&compareYear=2018").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["table"]["comparisonHeader"], "vs 2018");
        assert_eq!(
            body["table"]["sections"][0]["rows"][0]["comparison"]["kind"],
            "no_comparison"
        );
        assert_eq!(body["notifications"][0]["level"], "warning");
        assert_eq!(
            body["notifications"][0]["message"],
            "Could not load comparison data"
        );
    }

    #[actix_web::test]
    async fn dashboard_rejects_bad_zip() {
        let (status, body) = get("/api/dashboard?zip=abcde").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please enter a valid 5-digit ZIP code");
    }

    #[actix_web::test]
    async fn dashboard_primary_failure_is_502() {
        let (status, body) = get("/api/dashboard?zip=10001&year=2018").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Error loading data: ")
        );
    }

    #[actix_web::test]
    async fn gateway_is_mounted_under_api() {
        let (status, body) = get("/api/census?zip=10001&year=2023&vars=B01003_001E").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Census API key not set in environment.");
    }
}
