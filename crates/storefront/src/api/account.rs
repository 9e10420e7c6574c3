//! Authentication and account endpoints.

use lodra_core::AddressId;
use lodra_core::schema::{
    AccessToken, Address, AddressInput, LoginRequest, LoyaltyPoints, ProfileUpdate,
    RefreshRequest, RegisterRequest, TokenPair, User,
};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::{ApiError, BackendClient, ListOrPage};

impl BackendClient {
    /// Exchange credentials for an access/refresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Validation` for bad
    /// credentials.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, ApiError> {
        let request = self.request(Method::POST, "login/", None)?.json(credentials);
        self.send(request).await
    }

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with field errors (e.g. email taken).
    #[instrument(skip(self, body))]
    pub async fn register(&self, body: &RegisterRequest) -> Result<(), ApiError> {
        let request = self.request(Method::POST, "register/", None)?.json(body);
        self.send_empty(request).await
    }

    /// Trade a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the refresh token expired.
    #[instrument(skip(self, refresh))]
    pub async fn refresh_token(&self, refresh: &SecretString) -> Result<SecretString, ApiError> {
        let body = RefreshRequest {
            refresh: refresh.expose_secret().to_string(),
        };
        let request = self.request(Method::POST, "token/refresh/", None)?.json(&body);
        let token: AccessToken = self.send(request).await?;
        Ok(SecretString::from(token.access))
    }

    /// The logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "me/", Some(token))?;
        self.send(request).await
    }

    /// Update name and phone.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, body))]
    pub async fn update_me(
        &self,
        token: &SecretString,
        body: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let request = self.request(Method::PATCH, "me/", Some(token))?.json(body);
        self.send(request).await
    }

    /// Saved delivery addresses.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &SecretString) -> Result<Vec<Address>, ApiError> {
        let request = self.request(Method::GET, "me/addresses/", Some(token))?;
        let list: ListOrPage<Address> = self.send(request).await?;
        Ok(list.into_vec())
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, body))]
    pub async fn create_address(
        &self,
        token: &SecretString,
        body: &AddressInput,
    ) -> Result<Address, ApiError> {
        let request = self
            .request(Method::POST, "me/addresses/", Some(token))?
            .json(body);
        self.send(request).await
    }

    /// Replace an address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the address does not belong to the user.
    #[instrument(skip(self, token, body), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &SecretString,
        id: AddressId,
        body: &AddressInput,
    ) -> Result<Address, ApiError> {
        let request = self
            .request(Method::PUT, &format!("me/addresses/{id}/"), Some(token))?
            .json(body);
        self.send(request).await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the address does not belong to the user.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(&self, token: &SecretString, id: AddressId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("me/addresses/{id}/"), Some(token))?;
        self.send_empty(request).await
    }

    /// Loyalty balance and history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn loyalty_points(&self, token: &SecretString) -> Result<LoyaltyPoints, ApiError> {
        let request = self.request(Method::GET, "loyalty-points/", Some(token))?;
        self.send(request).await
    }
}
