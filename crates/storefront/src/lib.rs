//! EcoBloom Storefront library.
//!
//! This crate provides the storefront functionality as a library, allowing
//! it to be driven end-to-end by the integration test suite without a real
//! process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod validate;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router with sessions and tracing attached.
///
/// Sentry layers are added in `main` only, so test harnesses get the same
/// router without an error-tracking dependency.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes(state.config()))
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not probe the backend.
async fn health() -> &'static str {
    "ok"
}
