pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;
pub mod webhooks;

use axum::{routing::get, Router};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::extractors::Json;
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Full application router with per-IP rate limit tiers applied.
pub fn router(rate_limit_config: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .layer(rate_limit::relaxed_layer(rate_limit_config.relaxed_rpm))
        .merge(auth::router(rate_limit_config))
        .merge(products::router())
        .merge(orders::router(rate_limit_config))
        .merge(webhooks::router())
        .merge(admin::router())
}
