//! Form validation run before any backend call.
//!
//! Every submit handler validates with these helpers first and redirects
//! back with the message on failure - a failed validation never produces a
//! network request. Errors are the user-facing strings verbatim.

use ecobloom_core::{Email, Phone, Rupees};

/// Minimum password length accepted by the forms.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A required text field: trims and rejects empty input.
///
/// # Errors
///
/// Returns `"<label> is required"` for empty input.
pub fn required(value: &str, label: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required"));
    }
    Ok(trimmed.to_string())
}

/// Email shape check.
///
/// # Errors
///
/// Returns a user-facing message when the input is not a plausible email.
pub fn email(value: &str) -> Result<Email, String> {
    Email::parse(value).map_err(|_| "Enter a valid email".to_string())
}

/// Phone check: exactly 10 digits.
///
/// # Errors
///
/// Returns a user-facing message otherwise.
pub fn phone(value: &str) -> Result<Phone, String> {
    Phone::parse(value).map_err(|_| "Enter a valid 10-digit phone".to_string())
}

/// Password length check.
///
/// # Errors
///
/// Returns a user-facing message for passwords shorter than
/// [`MIN_PASSWORD_LENGTH`].
pub fn password(value: &str) -> Result<(), String> {
    if value.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

/// New/confirm password agreement check.
///
/// # Errors
///
/// Returns a user-facing message when the two entries differ.
pub fn matching_passwords(new: &str, confirm: &str) -> Result<(), String> {
    if new != confirm {
        return Err("New & confirm password must match".to_string());
    }
    Ok(())
}

/// Price check: a non-negative number.
///
/// # Errors
///
/// Returns a user-facing message for negative or non-numeric input.
pub fn price(value: &str) -> Result<Rupees, String> {
    Rupees::parse(value).map_err(|_| "Enter a valid non-negative price".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_empty() {
        assert_eq!(required("  Asha  ", "Name").unwrap(), "Asha");
        assert_eq!(required("   ", "Name").unwrap_err(), "Name is required");
        assert_eq!(required("", "Street").unwrap_err(), "Street is required");
    }

    #[test]
    fn email_maps_all_failures_to_one_message() {
        assert!(email("a@b.com").is_ok());
        for bad in ["", "plain", "@x.com", "a@nodot"] {
            assert_eq!(email(bad).unwrap_err(), "Enter a valid email");
        }
    }

    #[test]
    fn phone_requires_exactly_ten_digits() {
        assert!(phone("9876543210").is_ok());
        for bad in ["98765", "98765432101", "98765o3210", ""] {
            assert_eq!(phone(bad).unwrap_err(), "Enter a valid 10-digit phone");
        }
    }

    #[test]
    fn password_enforces_minimum_length() {
        assert!(password("longenough").is_ok());
        assert!(password("12345678").is_ok());
        assert_eq!(
            password("1234567").unwrap_err(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn matching_passwords_compares_exactly() {
        assert!(matching_passwords("abcdefgh", "abcdefgh").is_ok());
        assert!(matching_passwords("abcdefgh", "abcdefgH").is_err());
    }

    #[test]
    fn price_rejects_negative_and_garbage() {
        assert!(price("199").is_ok());
        assert!(price("0").is_ok());
        assert!(price("49.50").is_ok());
        for bad in ["-1", "free", ""] {
            assert_eq!(price(bad).unwrap_err(), "Enter a valid non-negative price");
        }
    }
}
