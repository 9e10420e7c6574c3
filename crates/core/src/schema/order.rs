//! Order payloads: calculation, creation, history, tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, OrderId, OrderStatus, PaymentMethod, Price, ProductId, TrackingCode};

/// One cart line sent to `calculate-order` / `create-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Contact and delivery details for customers checking out without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

/// Body of `POST /calculate-order/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCalculationRequest {
    pub items: Vec<OrderLineRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub use_loyalty_points: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// Server-computed price breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCalculation {
    pub subtotal: Price,
    #[serde(default)]
    pub discount: Price,
    #[serde(default)]
    pub shipping_cost: Price,
    #[serde(default)]
    pub loyalty_points_used: i64,
    #[serde(default)]
    pub loyalty_discount: Price,
    pub total: Price,
    #[serde(default)]
    pub loyalty_points_earned: i64,
}

/// Body of `POST /orders/create/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<GuestInfo>,
    pub payment_method: PaymentMethod,
    pub use_loyalty_points: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Response of `POST /orders/create/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub tracking_code: TrackingCode,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
}

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderItem {
    /// Line total (price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Delivery address captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tracking_code: TrackingCode,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub subtotal: Price,
    #[serde(default)]
    pub discount: Price,
    #[serde(default)]
    pub shipping_cost: Price,
    #[serde(default)]
    pub loyalty_discount: Price,
    pub total: Price,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PATCH /admin/orders/{id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_calculation_request_omits_empty_options() {
        let req = OrderCalculationRequest {
            items: vec![OrderLineRequest {
                product_id: ProductId::new(3),
                quantity: 2,
            }],
            address_id: None,
            city: Some("Tiranë".to_string()),
            use_loyalty_points: false,
            coupon_code: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("address_id").is_none());
        assert!(json.get("coupon_code").is_none());
        assert_eq!(json["city"], "Tiranë");
        assert_eq!(json["items"][0]["product_id"], 3);
    }

    #[test]
    fn test_order_decodes_with_defaults() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 10,
                "tracking_code": "LD-ABC123",
                "status": "shipped",
                "created_at": "2026-03-01T10:00:00Z",
                "subtotal": "2400.00",
                "total": "2700.00",
                "items": [{"product_name": "Lego", "quantity": 2, "price": "1200.00"}]
            }"#,
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.discount, Price::ZERO);
        assert_eq!(order.items[0].line_total(), Price::from_lek(2400));
    }
}
