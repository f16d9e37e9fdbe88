//! Actix-Web endpoint for the gateway.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use crate::{CensusQueryParams, GatewayConfig, Upstream, forward};

/// Shared gateway state.
#[derive(Clone)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub upstream: Arc<dyn Upstream>,
}

impl GatewayState {
    #[must_use]
    pub fn new(config: GatewayConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self { config, upstream }
    }
}

/// `GET /census?zip=&year=&vars=[&dataset=]`
pub async fn census(
    state: web::Data<GatewayState>,
    params: web::Query<CensusQueryParams>,
) -> HttpResponse {
    let reply = forward(state.upstream.as_ref(), &state.config, &params).await;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    HttpResponse::build(status).json(reply.body)
}

/// Registers the gateway route. Mount under `/api` to expose
/// `/api/census`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/census", web::get().to(census));
}
