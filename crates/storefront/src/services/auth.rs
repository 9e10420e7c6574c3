//! Login state and authenticated backend calls.
//!
//! The access and refresh tokens live in the session next to the user
//! profile. They are never rendered into HTML.

use std::future::Future;

use lodra_core::schema::{TokenPair, User};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use crate::api::{ApiError, BackendClient};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::session_keys;

/// Store a fresh login in the session.
///
/// The session ID is cycled first so a pre-login session cookie cannot be
/// reused. Cart and wishlist are kept.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn log_in(
    session: &Session,
    tokens: &TokenPair,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::TOKEN, &tokens.access).await?;
    session
        .insert(session_keys::REFRESH_TOKEN, &tokens.refresh)
        .await?;
    session.insert(session_keys::USER, user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(())
}

/// Drop the tokens and the user from the session.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn log_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::TOKEN).await?;
    session.remove::<String>(session_keys::REFRESH_TOKEN).await?;
    session.remove::<User>(session_keys::USER).await?;
    clear_sentry_user();
    Ok(())
}

/// The logged-in user, if any.
pub async fn current_user(session: &Session) -> Option<User> {
    session.get::<User>(session_keys::USER).await.ok().flatten()
}

/// Replace the stored user after a profile update.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn store_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER, user).await
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

/// The stored access token, if any.
pub async fn access_token(session: &Session) -> Option<SecretString> {
    stored_secret(session, session_keys::TOKEN).await
}

/// Run an authenticated backend call.
///
/// If the backend rejects the access token, it is refreshed once with the
/// stored refresh token and the call is retried. When refreshing fails the
/// login is dropped and `ApiError::Unauthorized` is returned, which renders
/// as a redirect to the login page.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if nobody is logged in, or the error of
/// the backend call.
///
/// # Example
///
/// ```rust,ignore
/// let api = state.api();
/// let orders = with_token(&session, api, |token| async move {
///     api.my_orders(&token, page, 10).await
/// })
/// .await?;
/// ```
pub async fn with_token<T, F, Fut>(
    session: &Session,
    api: &BackendClient,
    call: F,
) -> Result<T, AppError>
where
    F: Fn(SecretString) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let token = access_token(session)
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
            tracing::info!("Refresh token rejected, logging out");
            log_out(session).await?;
            return Err(ApiError::Unauthorized.into());
        }
        Err(e) => return Err(e.into()),
    };

    session
        .insert(session_keys::TOKEN, token.expose_secret())
        .await?;
    tracing::debug!("Access token refreshed");

    call(token).await.map_err(AppError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lodra_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(4),
            email: "ana@lodra.al".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Hoxha".to_string(),
            phone: None,
            is_staff: false,
            loyalty_points: 120,
        }
    }

    #[tokio::test]
    async fn test_log_in_and_out() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let tokens = TokenPair {
            access: "access-1".to_string(),
            refresh: "refresh-1".to_string(),
            user: None,
        };

        log_in(&session, &tokens, &user()).await.unwrap();
        assert_eq!(current_user(&session).await.unwrap().id, UserId::new(4));
        assert_eq!(
            access_token(&session).await.unwrap().expose_secret(),
            "access-1"
        );

        log_out(&session).await.unwrap();
        assert!(current_user(&session).await.is_none());
        assert!(access_token(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_with_token_requires_login() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let api = BackendClient::new(
            &crate::config::BackendConfig::with_api_url("http://127.0.0.1:9/api").unwrap(),
        )
        .unwrap();

        let result: Result<(), AppError> =
            with_token(&session, &api, |_token| async { Ok(()) }).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
