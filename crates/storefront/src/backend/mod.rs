//! EcoBloom backend API client.
//!
//! # Architecture
//!
//! - Plain REST/JSON over `reqwest`; the backend is the source of truth and
//!   there is NO local sync - every page render calls it directly
//! - Every endpoint answers the `{success, message?, ...}` envelope; the
//!   client normalizes it so handlers only see `Result`
//! - The backend issues a session cookie at login; the client captures it as
//!   an [`AuthToken`] and replays it on authenticated calls
//! - The category list is cached in-memory via `moka` (5 minute TTL); list
//!   pages are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use ecobloom_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let token = client.login("user@example.com", "hunter2secret").await?;
//! let me = client.me(&token).await?;
//! let page = client.plants(&PlantQuery { page: 1, limit: 12, ..Default::default() }).await?;
//! ```

mod client;
pub mod types;

pub use client::{AdminOrderQuery, BackendClient, PlantQuery};
pub use types::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the EcoBloom backend.
///
/// Two tiers: transport failures (`Http`, `Status`, `Parse`) and logical
/// failures (`Rejected`), which the backend signals with `success: false`
/// regardless of HTTP status. Both tiers surface to the user through
/// [`BackendError::user_message`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status without an envelope message.
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered `success: false`. The payload is the envelope
    /// message, or empty when the backend sent none.
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// Login succeeded but the response carried no auth cookie.
    #[error("login response did not set the auth cookie")]
    MissingAuthCookie,
}

impl BackendError {
    /// Whether this is a transport-tier failure (as opposed to a logical
    /// `success: false` from the backend).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// The message to show the user.
    ///
    /// Logical failures surface the backend's own message when it sent one;
    /// everything else falls back to the screen-specific wording, so
    /// transport details never leak into the page.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// The backend session cookie value captured at login.
///
/// Held in the storefront session and replayed as a `Cookie` header on every
/// authenticated backend call. The value never appears in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw cookie value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw cookie value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_message() {
        let err = BackendError::Rejected("Invalid credentials".to_string());
        assert_eq!(err.user_message("Login failed"), "Invalid credentials");
    }

    #[test]
    fn user_message_falls_back_for_empty_rejection() {
        let err = BackendError::Rejected(String::new());
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn user_message_hides_transport_detail() {
        let err = BackendError::Status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.user_message("Failed to load plants"), "Failed to load plants");
        assert!(err.is_transport());
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new("super-secret-cookie-value");
        assert_eq!(format!("{token:?}"), "AuthToken([REDACTED])");
    }
}
