//! Order management.

use lodra_core::schema::{Order, OrderStatusUpdate, Paginated};
use lodra_core::{CustomerId, OrderId, OrderStatus};
use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use super::{AdminClient, ApiError, ListOrPage};

/// Query parameters for `GET /admin/orders/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerId>,
}

impl AdminClient {
    /// Get a page of orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(page = query.page))]
    pub async fn list_orders(
        &self,
        token: &SecretString,
        query: &OrderQuery,
    ) -> Result<Paginated<Order>, ApiError> {
        let request = self
            .request(Method::GET, "admin/orders/", Some(token))?
            .query(query);
        Ok(self.send::<ListOrPage<Order>>(request).await?.into_page())
    }

    /// Get one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        let request = self.request(Method::GET, &format!("admin/orders/{id}/"), Some(token))?;
        self.send(request).await
    }

    /// Move an order to another status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend refuses the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = status.as_str()))]
    pub async fn update_order_status(
        &self,
        token: &SecretString,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("admin/orders/{id}/"), Some(token))?
            .json(&OrderStatusUpdate { status });
        self.send(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query_serializes_filters() {
        let query = OrderQuery {
            page: 1,
            page_size: 20,
            status: Some(OrderStatus::Shipped),
            customer: Some(CustomerId::new(9)),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"page": 1, "page_size": 20, "status": "shipped", "customer": 9})
        );
    }
}
