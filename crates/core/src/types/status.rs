//! Status enums for orders and payments.
//!
//! Values use the backend's snake_case strings. Labels are the Albanian
//! strings shown to customers and staff.

use serde::{Deserialize, Serialize};

/// Order lifecycle status, owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order (used for admin filters and selects).
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value sent to the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Albanian display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Në pritje",
            Self::Processing => "Në përpunim",
            Self::Shipped => "Dërguar",
            Self::Delivered => "Dorëzuar",
            Self::Cancelled => "Anuluar",
        }
    }

    /// CSS modifier for the status badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge-pending",
            Self::Processing | Self::Shipped => "badge-active",
            Self::Delivered => "badge-success",
            Self::Cancelled => "badge-danger",
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// How the customer pays for an order.
///
/// The payment itself happens outside this codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
}

impl PaymentMethod {
    /// All payment methods offered at checkout.
    pub const ALL: [Self; 2] = [Self::CashOnDelivery, Self::Card];

    /// Wire value sent to the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Card => "card",
        }
    }

    /// Albanian display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Pagesë në dorëzim",
            Self::Card => "Kartë",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(OrderStatus::from_wire(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_wire("lost"), None);
    }

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::Pending.label(), "Në pritje");
        assert_eq!(OrderStatus::Cancelled.badge_class(), "badge-danger");
    }

    #[test]
    fn test_payment_method_serde() {
        let method: PaymentMethod = serde_json::from_str("\"cash_on_delivery\"").unwrap();
        assert_eq!(method, PaymentMethod::CashOnDelivery);
        assert_eq!(PaymentMethod::Card.label(), "Kartë");
    }
}
