//! Staff login state and authenticated backend calls.
//!
//! The backend issues the same tokens to customers and staff, so every login
//! is checked for `is_staff` before anything is written to the session.

use std::future::Future;

use lodra_core::schema::{LoginRequest, User};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tower_sessions::Session;

use crate::api::{AdminClient, ApiError};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};

/// Why a staff login was refused.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials(Option<String>),

    /// Valid account without staff rights.
    #[error("user is not staff")]
    NotStaff,

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
}

impl LoginError {
    /// Albanian message for the login form.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidCredentials(Some(detail)) => detail.clone(),
            Self::InvalidCredentials(None) => "Email ose fjalëkalim i gabuar.".to_string(),
            Self::NotStaff => "Kjo llogari nuk ka të drejta administratori.".to_string(),
            Self::Api(ApiError::RateLimited(_)) => {
                "Shumë përpjekje. Provoni përsëri pas pak.".to_string()
            }
            Self::Api(_) | Self::Session(_) => {
                "Nuk mund të lidhemi me serverin. Provoni përsëri pas pak.".to_string()
            }
        }
    }
}

/// Authenticate against the backend and store the staff identity.
///
/// The session ID is cycled before the tokens are written.
///
/// # Errors
///
/// Returns `LoginError::NotStaff` for customer accounts, and
/// `LoginError::InvalidCredentials` when the backend rejects the password.
pub async fn log_in(
    session: &Session,
    api: &AdminClient,
    credentials: &LoginRequest,
) -> Result<CurrentAdmin, LoginError> {
    let tokens = match api.login(credentials).await {
        Ok(tokens) => tokens,
        Err(ApiError::Unauthorized) => return Err(LoginError::InvalidCredentials(None)),
        Err(err @ ApiError::Validation(_)) => {
            return Err(LoginError::InvalidCredentials(
                err.first_message().map(String::from),
            ));
        }
        Err(err) => return Err(LoginError::Api(err)),
    };

    let access = SecretString::from(tokens.access.clone());
    let user: User = match tokens.user {
        Some(user) => user,
        None => api.me(&access).await.map_err(LoginError::Api)?,
    };

    let Some(admin) = CurrentAdmin::from_staff(&user) else {
        tracing::warn!(user_id = %user.id, "Non-staff login refused");
        return Err(LoginError::NotStaff);
    };

    session.cycle_id().await?;
    session.insert(session_keys::TOKEN, &tokens.access).await?;
    session
        .insert(session_keys::REFRESH_TOKEN, &tokens.refresh)
        .await?;
    session.insert(session_keys::CURRENT_ADMIN, &admin).await?;
    set_sentry_user(&admin.id, &admin.email);
    tracing::info!(admin_id = %admin.id, "Staff logged in");

    Ok(admin)
}

/// End the staff session.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn log_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

async fn stored_secret(session: &Session, key: &str) -> Option<SecretString> {
    session
        .get::<String>(key)
        .await
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
}

/// Run an authenticated backend call, refreshing the access token once.
///
/// When the refresh token is rejected too, the session is flushed and
/// `ApiError::Unauthorized` is returned, which renders as a redirect to the
/// login page.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if nobody is logged in, or the error of
/// the backend call.
pub async fn with_token<T, F, Fut>(
    session: &Session,
    api: &AdminClient,
    call: F,
) -> Result<T, AppError>
where
    F: Fn(SecretString) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let token = stored_secret(session, session_keys::TOKEN)
        .await
        .ok_or_else(|| AppError::Unauthorized("no access token".to_string()))?;

    match call(token).await {
        Err(ApiError::Unauthorized) => {}
        other => return other.map_err(AppError::from),
    }

    let Some(refresh) = stored_secret(session, session_keys::REFRESH_TOKEN).await else {
        log_out(session).await?;
        return Err(ApiError::Unauthorized.into());
    };

    let token = match api.refresh_token(&refresh).await {
        Ok(token) => token,
        Err(ApiError::Unauthorized | ApiError::Validation(_)) => {
            tracing::info!("Staff refresh token rejected, logging out");
            log_out(session).await?;
            return Err(ApiError::Unauthorized.into());
        }
        Err(e) => return Err(e.into()),
    };

    session
        .insert(session_keys::TOKEN, token.expose_secret())
        .await?;

    call(token).await.map_err(AppError::from)
}
