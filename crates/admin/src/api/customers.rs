//! Customer lookup.

use lodra_core::CustomerId;
use lodra_core::schema::{Customer, Paginated};
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::{AdminClient, ApiError, ListOrPage, ListQuery};

impl AdminClient {
    /// Get a page of customers, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(page = query.page))]
    pub async fn list_customers(
        &self,
        token: &SecretString,
        query: &ListQuery,
    ) -> Result<Paginated<Customer>, ApiError> {
        let request = self
            .request(Method::GET, "admin/customers/", Some(token))?
            .query(query);
        Ok(self.send::<ListOrPage<Customer>>(request).await?.into_page())
    }

    /// Get one customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the customer does not exist.
    #[instrument(skip(self, token), fields(customer_id = %id))]
    pub async fn get_customer(
        &self,
        token: &SecretString,
        id: CustomerId,
    ) -> Result<Customer, ApiError> {
        let request = self.request(Method::GET, &format!("admin/customers/{id}/"), Some(token))?;
        self.send(request).await
    }
}
