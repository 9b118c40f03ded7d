//! Status enums for orders.
//!
//! Payment state and fulfillment tracking move independently: an order can
//! be paid but still pending dispatch, or delivered with payment failed
//! (refused COD). The backend stores both as lowercase strings; payment
//! methods keep their display casing on the wire.

use serde::{Deserialize, Serialize};

/// Whether payment for an order has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// All variants, in dropdown order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Paid, Self::Failed];

    /// The lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Capitalized form for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Order fulfillment stage, independent of payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl TrackingStatus {
    /// All variants, in fulfillment order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Capitalized form for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid tracking status: {s}")),
        }
    }
}

/// How the customer pays for an order.
///
/// Serialized exactly as displayed ("COD", "UPI", "Card", "NetBanking");
/// the backend stores these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "UPI")]
    Upi,
    Card,
    NetBanking,
}

impl PaymentMethod {
    /// All variants, in checkout display order.
    pub const ALL: [Self; 4] = [Self::Cod, Self::Upi, Self::Card, Self::NetBanking];

    /// The wire (and display) form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::Upi => "UPI",
            Self::Card => "Card",
            Self::NetBanking => "NetBanking",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "UPI" => Ok(Self::Upi),
            "Card" => Ok(Self::Card),
            "NetBanking" => Ok(Self::NetBanking),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_wire_form() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        for status in TrackingStatus::ALL {
            assert_eq!(status.as_str().parse::<TrackingStatus>().unwrap(), status);
        }
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
    }

    #[test]
    fn serde_uses_lowercase_for_statuses() {
        assert_eq!(
            serde_json::to_string(&TrackingStatus::Shipped).unwrap(),
            "\"shipped\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"failed\"").unwrap(),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn serde_keeps_payment_method_casing() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::NetBanking).unwrap(),
            "\"NetBanking\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"COD\"").unwrap(),
            PaymentMethod::Cod
        );
    }

    #[test]
    fn defaults_match_backend_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(TrackingStatus::default(), TrackingStatus::Pending);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cod);
    }
}
