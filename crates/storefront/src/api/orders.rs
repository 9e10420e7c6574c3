//! Order endpoints: price calculation, creation, history, guest tracking.

use lodra_core::schema::{
    CreateOrderRequest, CreatedOrder, Order, OrderCalculation, OrderCalculationRequest, Paginated,
};
use lodra_core::{OrderId, TrackingCode};
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::{ApiError, BackendClient};

impl BackendClient {
    /// Ask the backend to price the cart.
    ///
    /// Works for guests; with a token the customer's loyalty balance and saved
    /// addresses apply.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the lines.
    #[instrument(skip(self, token, body), fields(lines = body.items.len()))]
    pub async fn calculate_order(
        &self,
        token: Option<&SecretString>,
        body: &OrderCalculationRequest,
    ) -> Result<OrderCalculation, ApiError> {
        let request = self
            .request(Method::POST, "calculate-order/", token)?
            .json(body);
        self.send(request).await
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the order.
    #[instrument(skip(self, token, body), fields(lines = body.items.len(), guest = body.guest.is_some()))]
    pub async fn create_order(
        &self,
        token: Option<&SecretString>,
        body: &CreateOrderRequest,
    ) -> Result<CreatedOrder, ApiError> {
        let request = self
            .request(Method::POST, "orders/create/", token)?
            .json(body);
        self.send(request).await
    }

    /// The customer's order history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn my_orders(
        &self,
        token: &SecretString,
        page: u32,
        page_size: u32,
    ) -> Result<Paginated<Order>, ApiError> {
        let request = self
            .request(Method::GET, "orders/", Some(token))?
            .query(&[("page", page), ("page_size", page_size)]);
        let page: Paginated<Order> = self.send(request).await?;
        Ok(Paginated {
            results: page
                .results
                .into_iter()
                .map(|o| self.resolve_order(o))
                .collect(),
            ..page
        })
    }

    /// One of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not belong to the customer.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        let request = self.request(Method::GET, &format!("orders/{id}/"), Some(token))?;
        let order: Order = self.send(request).await?;
        Ok(self.resolve_order(order))
    }

    /// Look up an order by tracking code (no account needed).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the code is unknown.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn track_order(&self, code: &TrackingCode) -> Result<Order, ApiError> {
        let path = format!("orders/track/{}/", urlencoding::encode(code.as_str()));
        let request = self.request(Method::GET, &path, None)?;
        let order: Order = self.send(request).await?;
        Ok(self.resolve_order(order))
    }
}
