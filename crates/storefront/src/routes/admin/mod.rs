//! Admin route handlers: plant CRUD and order management.
//!
//! Every handler takes the `RequireAdmin` extractor; anonymous and
//! non-admin sessions land back on the home page before any of this code
//! runs. Mutations follow one refresh policy: change upstream, then
//! redirect back to the current filtered page so it refetches.

pub mod orders;
pub mod plants;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants/new", get(plants::new_page))
        .route("/plants", post(plants::create))
        .route("/plants/{id}/edit", get(plants::edit_page))
        .route("/plants/{id}", post(plants::update))
        .route("/plants/{id}/delete", post(plants::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/payment-status", post(orders::set_payment_status))
        .route("/orders/{id}/status", post(orders::set_tracking_status))
        .route("/orders/{id}/delete", post(orders::delete))
}
