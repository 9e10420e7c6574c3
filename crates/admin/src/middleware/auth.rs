//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring staff authentication in route handlers.
//! The identity is written by `services::auth::log_in` after the backend
//! confirmed `is_staff`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires staff authentication.
///
/// If nobody is logged in, returns a redirect to the login page for full
/// page requests, or an `HX-Redirect` for htmx fragment requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Mirë se erdhe, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when staff authentication is required but nobody is logged in.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (full page requests).
    RedirectToLogin,
    /// Tell htmx to navigate to the login page (fragment requests).
    HxRedirectToLogin,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HxRedirectToLogin => {
                (StatusCode::OK, [("HX-Redirect", LOGIN_PATH)]).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();

        admin.map(Self).ok_or_else(|| {
            if parts.headers.contains_key("hx-request") {
                AdminAuthRejection::HxRedirectToLogin
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        })
    }
}

/// Extractor that optionally gets the current staff member.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if nobody is
/// logged in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use lodra_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts_with_session(session: Option<Session>, htmx: bool) -> Parts {
        let mut builder = Request::builder().uri("/orders");
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    #[tokio::test]
    async fn test_rejects_anonymous_requests() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let mut parts = parts_with_session(Some(session.clone()), false);
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::RedirectToLogin));

        let mut parts = parts_with_session(Some(session), true);
        let response = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(
            response.headers().get("HX-Redirect").map(|v| v.as_bytes()),
            Some(b"/login".as_slice())
        );
    }

    #[tokio::test]
    async fn test_accepts_stored_admin() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let admin = CurrentAdmin {
            id: UserId::new(1),
            email: "staf@lodra.al".to_string(),
            name: "Staf".to_string(),
        };
        session
            .insert(session_keys::CURRENT_ADMIN, &admin)
            .await
            .unwrap();

        let mut parts = parts_with_session(Some(session), false);
        let RequireAdminAuth(found) = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found, admin);
    }
}
