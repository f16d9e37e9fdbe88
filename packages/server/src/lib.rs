#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the census explorer dashboard.
//!
//! Serves the dashboard API (`/api/dashboard`, `/api/metrics`,
//! `/api/periods`), the credentialed Census pass-through (`/api/census`)
//! and, when built, the static frontend from `app/dist`.

mod handlers;
pub mod interactive;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use census_explorer_dashboard::DashboardServices;
use census_explorer_gateway::{GatewayConfig, GatewayState, ReqwestUpstream};
use census_explorer_geocoder::ZippopotamLookup;
use census_explorer_metric::{MetricCatalog, default_catalog};
use census_explorer_source::config::{SourceConfig, build_client, build_sources};
use census_explorer_source::{PeriodFetcher, SourceError};

/// Directory holding the built frontend.
const STATIC_DIR: &str = "app/dist";

/// Shared application state.
pub struct AppState {
    /// Metric catalog shared by every request.
    pub catalog: Arc<MetricCatalog>,
    /// Sources and location lookup behind `/api/dashboard`.
    pub services: DashboardServices,
}

impl AppState {
    /// Builds the state from the environment (see
    /// [`census_explorer_source::config`]).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if an HTTP client cannot be built.
    pub fn from_env() -> Result<Self, SourceError> {
        let config = SourceConfig::from_env();
        let catalog = Arc::new(default_catalog().clone());
        let sources = build_sources(&config, &catalog, None)?;
        let fetcher =
            PeriodFetcher::new(Arc::clone(&catalog), sources).with_selection(config.selection);
        let lookup = ZippopotamLookup::from_env(build_client(config.timeout)?);
        log::info!(
            "Serving {} metrics ({} selection), map lookup via {}",
            catalog.len(),
            config.selection,
            lookup.base_url()
        );

        Ok(Self {
            catalog,
            services: DashboardServices::new(fetcher, Arc::new(lookup)),
        })
    }
}

/// Registers every `/api` route. Mount under `web::scope("/api")`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(handlers::metrics))
        .route("/periods", web::get().to(handlers::periods))
        .route("/dashboard", web::get().to(handlers::dashboard))
        .configure(census_explorer_gateway::configure);
}

/// Starts the census explorer API server.
///
/// Reads the source, gateway and bind configuration from the environment
/// and runs the Actix-Web HTTP server. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`) and initialises logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the state cannot be built, or if
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Loading configuration...");
    let state = web::Data::new(AppState::from_env().map_err(std::io::Error::other)?);

    let timeout = census_explorer_source::config::http_timeout_from_env();
    let gateway_client = build_client(timeout).map_err(std::io::Error::other)?;
    let gateway = web::Data::new(GatewayState::new(
        GatewayConfig::from_env(),
        Arc::new(ReqwestUpstream::new(gateway_client)),
    ));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let serve_static = Path::new(STATIC_DIR).is_dir();
    if !serve_static {
        log::info!("{STATIC_DIR} not found; serving the API only");
    }

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(gateway.clone())
            .service(web::scope("/api").configure(configure_api));

        // Serve frontend static files (production)
        app.configure(|cfg| {
            if serve_static {
                cfg.service(Files::new("/", STATIC_DIR).index_file("index.html"));
            }
        })
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
