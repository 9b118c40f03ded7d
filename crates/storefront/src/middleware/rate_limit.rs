//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the auth endpoints are limited (~10 requests per minute per IP):
//! they are the one surface where hammering the backend does damage
//! (credential guessing, OTP spam). The catalog is read-only and stays
//! unlimited.

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

/// Rate limiter layer type for Axum.
///
/// `SmartIpKeyExtractor` reads the usual proxy headers (`x-forwarded-for`,
/// `x-real-ip`, `forwarded`) and falls back to the peer address, so the
/// server must be built with `into_make_service_with_connect_info`.
pub type RateLimiterLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5) // Allow burst of 5 requests
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
