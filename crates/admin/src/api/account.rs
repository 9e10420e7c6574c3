//! Staff authentication and dashboard statistics.

use lodra_core::schema::{AccessToken, DashboardStats, LoginRequest, RefreshRequest, TokenPair, User};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::{AdminClient, ApiError};

impl AdminClient {
    /// Exchange staff credentials for a token pair.
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

    /// Profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "me/", Some(token))?;
        self.send(request).await
    }

    /// Store-wide counters for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-staff tokens.
    #[instrument(skip(self, token))]
    pub async fn stats(&self, token: &SecretString) -> Result<DashboardStats, ApiError> {
        let request = self.request(Method::GET, "admin/stats/", Some(token))?;
        self.send(request).await
    }
}
