//! Authentication extractors.
//!
//! The logged-in user is stored in the session by `services::auth::log_in`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use lodra_core::schema::User;
use tower_sessions::Session;

use crate::models::session_keys;

/// Extractor that requires a logged-in customer.
///
/// If nobody is logged in, returns a redirect to the login page that comes
/// back to the requested path afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Përshëndetje, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub User);

/// Error returned when authentication is required but nobody is logged in.
pub enum AuthRejection {
    /// Redirect to the login page (full page requests).
    RedirectToLogin(String),
    /// Tell htmx to navigate to the login page (fragment requests).
    HxRedirectToLogin(String),
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(to) => Redirect::to(&to).into_response(),
            Self::HxRedirectToLogin(to) => (StatusCode::OK, [("HX-Redirect", to)]).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `path` afterwards.
#[must_use]
pub fn login_url(path: &str) -> String {
    if path.is_empty() || path == "/" {
        "/auth/login".to_string()
    } else {
        format!("/auth/login?next={}", urlencoding::encode(path))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: Option<User> = session.get(session_keys::USER).await.ok().flatten();

        user.map(Self).ok_or_else(|| {
            let to = login_url(parts.uri.path());
            if parts.headers.contains_key("hx-request") {
                AuthRejection::HxRedirectToLogin(to)
            } else {
                AuthRejection::RedirectToLogin(to)
            }
        })
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<User>(session_keys::USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}
