//! Domain models for the storefront.
//!
//! All authoritative data lives in the backend; the only state the
//! storefront itself owns is the session-held identity.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
