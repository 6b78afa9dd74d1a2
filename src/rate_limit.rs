//! Per-IP rate limiting tiers.
//!
//! Three tiers, matched to endpoint cost: strict for /checkout (each
//! request is a payment provider round trip), standard for the
//! credential endpoints (bcrypt + DB), relaxed for /health. RPM values
//! come from [`crate::config::RateLimitConfig`].

use std::sync::Arc;
use std::time::Duration;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;

pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    NoOpMiddleware<QuantaInstant>,
    axum::body::Body,
>;

fn layer(requests_per_minute: u32) -> RateLimitLayer {
    assert!(requests_per_minute > 0, "Rate limit must be greater than 0");

    let config = GovernorConfigBuilder::default()
        .period(Duration::from_secs(60) / requests_per_minute)
        .burst_size(requests_per_minute)
        .finish()
        .expect("Failed to build rate limiter config");

    GovernorLayer::new(Arc::new(config))
}

/// Tier for /checkout, which calls the payment provider.
pub fn strict_layer(requests_per_minute: u32) -> RateLimitLayer {
    layer(requests_per_minute)
}

/// Tier for register/login.
pub fn standard_layer(requests_per_minute: u32) -> RateLimitLayer {
    layer(requests_per_minute)
}

/// Tier for lightweight endpoints like /health.
pub fn relaxed_layer(requests_per_minute: u32) -> RateLimitLayer {
    layer(requests_per_minute)
}
