//! Backend REST client for staff endpoints.
//!
//! # Architecture
//!
//! - Every call carries the staff member's access token. Refreshing expired
//!   tokens is the caller's job (see `services::auth::with_token`).
//! - Category and brand lists feed the product form's selects and are cached
//!   in memory via `moka` (1 minute TTL). Creating, updating or deleting a
//!   category or brand invalidates the cache.
//! - Relative image paths are resolved against the image base URL.

mod account;
mod cache;
mod catalog;
mod customers;
mod orders;

pub use catalog::ListQuery;
pub use orders::OrderQuery;

use std::sync::Arc;
use std::time::Duration;

use lodra_core::schema::{FieldErrors, Paginated, Product};
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

    /// The token belongs to someone without staff rights (HTTP 403).
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

    /// Normalize to a page. A plain array is one page holding everything.
    fn into_page(self) -> Paginated<T> {
        match self {
            Self::List(items) => Paginated {
                count: items.len() as u64,
                next: None,
                previous: None,
                results: items,
            },
            Self::Page(page) => page,
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
// AdminClient
// =============================================================================

/// Client for the backend REST API, staff side.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    config: BackendConfig,
    cache: Cache<CacheKey, CacheValue>,
}

impl AdminClient {
    /// Create a new admin client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(Duration::from_secs(60))
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lodra-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                config: config.clone(),
                cache,
            }),
        })
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

        let path = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &path, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e)
        })
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
        let path = response.url().path().to_string();
        let body = response.text().await?;
        Err(error_for_status(status, &path, &body))
    }

    fn resolve(&self, path: Option<&str>) -> Option<String> {
        self.inner.config.resolve_image(path)
    }

    fn resolve_product(&self, mut product: Product) -> Product {
        product.image = self.resolve(product.image.as_deref());
        product
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
/// `{"field": ["msg"]}` and `{"field": "msg"}` keep their field; plain
/// string or list bodies are stored under `detail`.
fn parse_field_errors(body: &str) -> FieldErrors {
    use serde_json::Value;

    fn collect(errors: &mut FieldErrors, key: &str, value: &Value) {
        match value {
            Value::String(message) => errors
                .entry(key.to_string())
                .or_default()
                .push(message.clone()),
            Value::Array(items) => items.iter().for_each(|item| collect(errors, key, item)),
            Value::Object(map) => {
                for (field, nested) in map {
                    let nested_key = if key == "detail" {
                        field.clone()
                    } else {
                        format!("{key}.{field}")
                    };
                    collect(errors, &nested_key, nested);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    let mut errors = FieldErrors::new();
    match serde_json::from_str::<Value>(body) {
        Ok(value) => collect(&mut errors, "detail", &value),
        Err(_) if !body.trim().is_empty() => {
            errors.insert("detail".to_string(), vec![body.trim().to_string()]);
        }
        Err(_) => {}
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_errors() {
        let errors = parse_field_errors(r#"{"price": ["Çmimi duhet të jetë pozitiv."], "name": "Ekziston"}"#);
        assert_eq!(errors["price"], vec!["Çmimi duhet të jetë pozitiv."]);
        assert_eq!(errors["name"], vec!["Ekziston"]);

        let errors = parse_field_errors(r#"{"detail": "Nuk keni leje."}"#);
        assert_eq!(
            ApiError::Validation(errors).first_message(),
            Some("Nuk keni leje.")
        );
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "/admin/stats/", ""),
            ApiError::Forbidden
        ));
        assert!(error_for_status(StatusCode::SERVICE_UNAVAILABLE, "/admin/orders/", "").is_unavailable());
        assert!(!ApiError::NotFound("/x/".to_string()).is_unavailable());
    }

    #[test]
    fn test_plain_list_becomes_single_page() {
        let list: ListOrPage<u32> = serde_json::from_str("[4, 5, 6]").unwrap();
        let page = list.into_page();
        assert_eq!(page.count, 3);
        assert_eq!(page.results, vec![4, 5, 6]);
    }
}
