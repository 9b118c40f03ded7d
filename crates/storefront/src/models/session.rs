//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use ecobloom_core::{Email, Phone, UserId};

use crate::backend::{AuthToken, SessionUser};

/// Session-stored user identity.
///
/// Populated by the identity probe at login, patched in place after a
/// successful profile edit, and cleared on logout. Carries the backend
/// session cookie so authenticated calls can be replayed on the user's
/// behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Contact number, if set.
    pub number: Option<Phone>,
    /// Whether the admin screens are open to this user.
    pub is_admin: bool,
    /// Whether the account passed OTP verification.
    pub is_verified: bool,
    /// Backend session cookie (redacted from Debug via `AuthToken`).
    token: AuthToken,
}

impl CurrentUser {
    /// Build the session identity from a probe result and the login token.
    #[must_use]
    pub fn new(user: SessionUser, token: AuthToken) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            number: user.number,
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            token,
        }
    }

    /// The backend session cookie for authenticated calls.
    #[must_use]
    pub const fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Apply a successful profile edit without re-probing.
    pub fn apply_profile(&mut self, name: String, number: Option<Phone>) {
        self.name = name;
        self.number = number;
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the unix timestamp of the last OTP resend (cooldown).
    pub const OTP_LAST_SENT: &str = "otp_last_sent";
}
