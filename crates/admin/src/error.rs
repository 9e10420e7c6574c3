//! Unified error handling for admin.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend REST call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    title: &'static str,
    message: String,
}

impl AppError {
    /// Whether the staff member has to log in again.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Api(err) => err.is_unavailable(),
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::Unauthorized) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Api(ApiError::Forbidden) => StatusCode::FORBIDDEN,
            Self::Api(ApiError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Api(ApiError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> (&'static str, String) {
        match self.status() {
            StatusCode::NOT_FOUND => (
                "Nuk u gjet",
                "Regjistri që kërkuat nuk ekziston ose është fshirë.".to_string(),
            ),
            StatusCode::BAD_REQUEST => {
                let detail = match self {
                    Self::BadRequest(msg) => Some(msg.clone()),
                    Self::Api(err) => err.first_message().map(String::from),
                    _ => None,
                };
                (
                    "Kërkesë e pavlefshme",
                    detail.unwrap_or_else(|| "Të dhënat e dërguara nuk janë të vlefshme.".to_string()),
                )
            }
            StatusCode::FORBIDDEN => (
                "Nuk keni leje",
                "Llogaria juaj nuk ka të drejta administratori.".to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => (
                "Shumë kërkesa",
                "Ju lutemi prisni pak dhe provoni përsëri.".to_string(),
            ),
            StatusCode::BAD_GATEWAY => (
                "Shërbimi nuk është i disponueshëm",
                "Nuk mund të lidhemi me serverin. Provoni përsëri pas pak.".to_string(),
            ),
            _ => (
                "Gabim i brendshëm",
                "Diçka shkoi keq. Provoni përsëri pas pak.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else {
            tracing::debug!(error = %self, "Admin request rejected");
        }

        if self.status() == StatusCode::UNAUTHORIZED {
            return Redirect::to("/login").into_response();
        }

        // Don't expose internal error details to clients
        let status = self.status();
        let (title, message) = self.public_message();
        (
            status,
            ErrorTemplate {
                status: status.as_u16(),
                title,
                message,
            },
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate Sentry events with the logged-in staff member.
pub fn set_sentry_user(user_id: &impl ToString, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("order 4".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status {
                status: 500,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_expired_login_redirects() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").map(|v| v.as_bytes()),
            Some(b"/login".as_slice())
        );
    }
}
