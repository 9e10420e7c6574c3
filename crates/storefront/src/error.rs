//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>` when
//! a failure should replace the whole page; listing pages instead degrade to
//! empty results with a notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the storefront.
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

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Standalone error page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    title: &'static str,
    message: String,
}

impl AppError {
    /// Whether this error is a server-side failure worth reporting.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Api(err) => err.is_unavailable(),
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiError::Forbidden => StatusCode::FORBIDDEN,
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Albanian title and message for the error page. Internal details are
    /// never exposed.
    fn public_message(&self) -> (&'static str, String) {
        match self.status() {
            StatusCode::NOT_FOUND => (
                "Faqja nuk u gjet",
                "Faqja që kërkuat nuk ekziston ose është hequr.".to_string(),
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
                "Nuk keni leje për të parë këtë faqe.".to_string(),
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
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        // Expired sessions go back to the login form
        if matches!(self, Self::Unauthorized(_) | Self::Api(ApiError::Unauthorized)) {
            return Redirect::to("/auth/login").into_response();
        }

        let status = self.status();
        let (title, message) = self.public_message();
        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message,
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
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
    fn test_app_error_display() {
        let err = AppError::NotFound("product lego-city".to_string());
        assert_eq!(err.to_string(), "Not found: product lego-city");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_errors_map_to_gateway_statuses() {
        assert_eq!(
            get_status(AppError::Api(ApiError::NotFound("/products/x/".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status {
                status: 503,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").map(|v| v.as_bytes()),
            Some(b"/auth/login".as_slice())
        );
    }

    #[test]
    fn test_server_errors_are_reported() {
        assert!(AppError::Internal("x".to_string()).is_server_error());
        assert!(!AppError::NotFound("x".to_string()).is_server_error());
        assert!(!AppError::Api(ApiError::Unauthorized).is_server_error());
    }
}
