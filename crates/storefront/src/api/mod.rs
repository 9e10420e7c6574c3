//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for catalog, pricing, loyalty points
//!   and orders. No local sync, direct REST calls.
//! - Category and brand lists are cached in memory via `moka` (5 minute TTL).
//! - Relative image paths in responses are resolved against the image base URL
//!   before they reach templates.
//!
//! Authenticated calls take the customer's access token and send it as
//! `Authorization: Bearer <token>`. Refreshing expired tokens is the caller's
//! job (see `services::auth::with_token`).

mod account;
mod cache;
mod catalog;
mod orders;

pub use catalog::{ProductQuery, ProductSort};

use std::sync::Arc;
use std::time::Duration;

use lodra_core::schema::{Brand, Category, FieldErrors, Order, Paginated, Product};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing, invalid or expired token (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (HTTP 403).
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation errors (HTTP 400).
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(FieldErrors),

    /// Rate limited by the backend (HTTP 429).
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl ApiError {
    /// Message for a single field, if the backend rejected it.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Validation(errors) => errors.get(name)?.first().map(String::as_str),
            _ => None,
        }
    }

    /// First validation message, preferring `detail` and `non_field_errors`.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        let Self::Validation(errors) = self else {
            return None;
        };
        ["detail", "non_field_errors"]
            .iter()
            .find_map(|key| errors.get(*key).and_then(|m| m.first()))
            .or_else(|| errors.values().find_map(|m| m.first()))
            .map(String::as_str)
    }

    /// Whether the backend could not be reached or failed on its side.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Decode(_) | Self::Url(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// List endpoints may answer with a plain array or a paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrPage<T> {
    List(Vec<T>),
    Page(Paginated<T>),
}

impl<T> ListOrPage<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Page(page) => page.results,
        }
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    config: BackendConfig,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lodra-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                config: config.clone(),
                cache,
            }),
        })
    }

    /// Backend configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Check the backend answers at all (used by readiness probes).
    ///
    /// # Errors
    ///
    /// Returns an error if the categories endpoint fails.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let request = self.request(Method::GET, "categories/", None)?;
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    /// Build a request for a path relative to the API base URL.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, ApiError> {
        let url: Url = self.inner.config.api_url.join(path)?;
        let builder = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &url, &body));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %url,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Decode(e))
            }
        }
    }

    /// Send a request whose response body is ignored (e.g. `204 No Content`).
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited(1));
        }
        let url = response.url().path().to_string();
        let body = response.text().await?;
        Err(error_for_status(status, &url, &body))
    }

    // -------------------------------------------------------------------------
    // Image resolution
    // -------------------------------------------------------------------------

    fn resolve(&self, path: Option<&str>) -> Option<String> {
        self.inner.config.resolve_image(path)
    }

    fn resolve_product(&self, mut product: Product) -> Product {
        product.image = self.resolve(product.image.as_deref());
        product.images = product
            .images
            .iter()
            .filter_map(|image| self.resolve(Some(image)))
            .collect();
        product
    }

    fn resolve_category(&self, mut category: Category) -> Category {
        category.image = self.resolve(category.image.as_deref());
        category
    }

    fn resolve_brand(&self, mut brand: Brand) -> Brand {
        brand.logo = self.resolve(brand.logo.as_deref());
        brand
    }

    fn resolve_order(&self, mut order: Order) -> Order {
        for item in &mut order.items {
            item.image = self.resolve(item.image.as_deref());
        }
        order
    }
}

/// Map a non-success response onto an [`ApiError`].
fn error_for_status(status: StatusCode, path: &str, body: &str) -> ApiError {
    match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(parse_field_errors(body)),
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
        _ => {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }
        }
    }
}

/// Flatten a validation body into field errors.
///
/// Accepts `{"field": ["msg"]}`, `{"field": "msg"}`, nested objects (joined
/// with `.`), and plain string or list bodies (stored under `detail`).
fn parse_field_errors(body: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => collect_messages(&mut errors, "detail", &value),
        Err(_) if !body.trim().is_empty() => {
            errors.insert("detail".to_string(), vec![body.trim().to_string()]);
        }
        Err(_) => {}
    }
    errors
}

fn collect_messages(errors: &mut FieldErrors, key: &str, value: &serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::String(message) => errors
            .entry(key.to_string())
            .or_default()
            .push(message.clone()),
        Value::Array(items) => {
            for item in items {
                collect_messages(errors, key, item);
            }
        }
        Value::Object(map) => {
            for (field, nested) in map {
                let nested_key = if key == "detail" {
                    field.clone()
                } else {
                    format!("{key}.{field}")
                };
                collect_messages(errors, &nested_key, nested);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_errors_lists_and_strings() {
        let errors = parse_field_errors(
            r#"{"email": ["Ky email ekziston."], "phone": "Numër i pavlefshëm"}"#,
        );
        assert_eq!(errors["email"], vec!["Ky email ekziston."]);
        assert_eq!(errors["phone"], vec!["Numër i pavlefshëm"]);
    }

    #[test]
    fn test_parse_field_errors_nested_and_plain() {
        let errors = parse_field_errors(r#"{"guest": {"city": ["E detyrueshme"]}}"#);
        assert_eq!(errors["guest.city"], vec!["E detyrueshme"]);

        let errors = parse_field_errors(r#"["Stoku nuk mjafton"]"#);
        assert_eq!(errors["detail"], vec!["Stoku nuk mjafton"]);

        let errors = parse_field_errors("Bad Request");
        assert_eq!(errors["detail"], vec!["Bad Request"]);

        assert!(parse_field_errors("").is_empty());
    }

    #[test]
    fn test_first_message_prefers_detail() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Email keq".to_string()]);
        errors.insert(
            "non_field_errors".to_string(),
            vec!["Kredenciale të gabuara".to_string()],
        );
        let err = ApiError::Validation(errors);
        assert_eq!(err.first_message(), Some("Kredenciale të gabuara"));
        assert_eq!(err.field("email"), Some("Email keq"));
        assert_eq!(err.field("phone"), None);
        assert_eq!(ApiError::Unauthorized.first_message(), None);
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, "/me/", ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "/products/x/", ""),
            ApiError::NotFound(path) if path == "/products/x/"
        ));
        let err = error_for_status(StatusCode::BAD_GATEWAY, "/orders/", "upstream");
        assert!(err.is_unavailable());
        assert!(!ApiError::Forbidden.is_unavailable());
    }

    #[test]
    fn test_resolves_images_in_payloads() {
        let client = BackendClient::new(
            &BackendConfig::with_api_url("https://api.lodra.al/api/").unwrap(),
        )
        .unwrap();
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "name": "Top", "slug": "top", "price": "100",
                "image": "/media/top.jpg", "images": ["a.jpg", ""]}"#,
        )
        .unwrap();

        let product = client.resolve_product(product);
        assert_eq!(
            product.image.as_deref(),
            Some("https://api.lodra.al/api/media/top.jpg")
        );
        assert_eq!(product.images, vec!["https://api.lodra.al/api/a.jpg"]);
    }

    #[test]
    fn test_list_or_page_accepts_both_shapes() {
        let plain: ListOrPage<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(plain.into_vec(), vec![1, 2]);

        let paged: ListOrPage<u32> =
            serde_json::from_str(r#"{"count": 1, "results": [7]}"#).unwrap();
        assert_eq!(paged.into_vec(), vec![7]);
    }
}
