//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (filter/search/paginate)
//! GET  /health                 - Health check (registered in lib.rs)
//!
//! # Plants
//! GET  /plants/{id}            - Plant detail
//! GET  /api/plants/search      - Search suggestions (JSON)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Checkout page for one handed-off item
//! POST /checkout               - Place the order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! GET  /auth/verify-otp        - Post-registration OTP page
//! POST /auth/verify-otp        - Verify the registration OTP
//! GET  /auth/verify-account    - Two-step account verification
//! POST /auth/verify-account/send   - Step 1: request an OTP
//! POST /auth/verify-account/resend - Step 2: resend (30 s cooldown)
//! POST /auth/verify-account    - Step 2: submit the OTP
//! GET  /auth/forgot-password   - Two-step password reset
//! POST /auth/forgot-password/send   - Step 1: request an OTP
//! POST /auth/forgot-password/resend - Step 2: resend
//! POST /auth/forgot-password   - Step 2: OTP + new password
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Profile overview
//! POST /account/profile        - Update name/phone
//! POST /account/password       - Change password
//! GET  /account/orders         - Personal order history
//!
//! # Admin (requires admin)
//! GET  /admin/plants/new       - Add-plant form
//! POST /admin/plants           - Create plant (multipart)
//! GET  /admin/plants/{id}/edit - Edit-plant form
//! POST /admin/plants/{id}      - Update plant (multipart)
//! POST /admin/plants/{id}/delete - Delete plant
//! GET  /admin/orders           - Order management table
//! POST /admin/orders/{id}/payment-status - Update payment status
//! POST /admin/orders/{id}/status         - Update tracking status
//! POST /admin/orders/{id}/delete         - Delete order
//!
//! # Contact
//! GET  /contact                - Contact form
//! POST /contact                - Submit contact message
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod plants;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::config::StorefrontConfig;
use crate::middleware;
use crate::state::AppState;

/// Query parameters for error/success display, shared by every page that
/// lands after a POST/redirect/GET hop.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Redirect to `path` with a message appended as a query parameter.
fn flash(path: &str, key: &str, message: &str) -> Redirect {
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{sep}{key}={}",
        urlencoding::encode(message)
    ))
}

/// Redirect to `path` carrying a user-facing error message.
pub(crate) fn flash_error(path: &str, message: &str) -> Redirect {
    flash(path, "error", message)
}

/// Redirect to `path` carrying a user-facing success message.
pub(crate) fn flash_success(path: &str, message: &str) -> Redirect {
    flash(path, "success", message)
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/verify-otp",
            get(auth::verify_otp_page).post(auth::verify_otp),
        )
        .route(
            "/verify-account",
            get(auth::verify_account_page).post(auth::verify_account),
        )
        .route("/verify-account/send", post(auth::verify_account_send))
        .route("/verify-account/resend", post(auth::verify_account_resend))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::reset_password),
        )
        .route("/forgot-password/send", post(auth::forgot_password_send))
        .route(
            "/forgot-password/resend",
            post(auth::forgot_password_resend),
        )
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/orders", get(account::orders))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    let mut auth_router = auth_routes();
    if config.auth_rate_limit {
        auth_router = auth_router.layer(middleware::auth_rate_limiter());
    }

    Router::new()
        // Catalog
        .route("/", get(home::index))
        // Plant detail + search suggestions
        .route("/plants/{id}", get(plants::show))
        .route("/api/plants/search", get(plants::search))
        // Checkout
        .route(
            "/checkout",
            get(checkout::show).post(checkout::place_order),
        )
        // Auth routes
        .nest("/auth", auth_router)
        // Account routes
        .nest("/account", account_routes())
        // Admin routes
        .nest("/admin", admin::routes())
        // Contact
        .route("/contact", get(contact::page).post(contact::submit))
}
