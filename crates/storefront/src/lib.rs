//! Lodra Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod page;
pub mod routes;
pub mod services;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use axum::http::Request;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront application with its full middleware stack.
///
/// Layer order (outermost first) is documented in [`middleware`].
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// Peer addresses are attached to requests so the auth rate limiter can key
/// on them when no proxy header is present.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{BackendConfig, StorefrontConfig, UiConfig};

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            static_dir: "static".to_string(),
            backend: BackendConfig::with_api_url("http://127.0.0.1:9/api").unwrap(),
            ui: UiConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        app(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_empty_cart_count_without_backend() {
        let response = test_app()
            .oneshot(Request::get("/cart/count").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::X_FRAME_OPTIONS).unwrap(),
            "DENY"
        );
        assert!(response.headers().contains_key("permissions-policy"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains(">0</span>"));
    }

    #[tokio::test]
    async fn test_account_redirects_anonymous_visitors() {
        let response = test_app()
            .oneshot(Request::get("/account").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        let location = response.headers().get(header::LOCATION).unwrap();
        assert!(location.to_str().unwrap().starts_with("/auth/login"));
    }
}
