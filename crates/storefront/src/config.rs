//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `LODRA_API_URL` - Base URL of the backend REST API (e.g. `https://api.lodra.al/api/`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `LODRA_IMAGE_URL` - Base URL for relative image paths (default: `LODRA_API_URL`)
//! - `LODRA_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `CHECKOUT_REFRESH_SECS` - Checkout price recalculation interval (default: 10)
//! - `SEARCH_DEBOUNCE_MS` - Search input debounce (default: 500)
//! - `PRODUCTS_PER_PAGE` - Listing page size (default: 12)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Browser-side timing and page sizes
    pub ui: UiConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API base URL, always ending in `/`
    pub api_url: Url,
    /// Image base URL, always ending in `/`
    pub image_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Timings and sizes rendered into pages.
#[derive(Debug, Clone, Copy)]
pub struct UiConfig {
    /// How often the checkout summary re-fetches `calculate-order`
    pub checkout_refresh_secs: u64,
    /// Debounce for the search box
    pub search_debounce_ms: u64,
    /// Products per listing page
    pub products_per_page: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            checkout_refresh_secs: 10,
            search_debounce_ms: 500,
            products_per_page: 12,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let static_dir = get_env_or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static");

        let backend = BackendConfig::from_env()?;
        let ui = UiConfig {
            checkout_refresh_secs: get_parsed_env("CHECKOUT_REFRESH_SECS", "10")?,
            search_debounce_ms: get_parsed_env("SEARCH_DEBOUNCE_MS", "500")?,
            products_per_page: get_parsed_env("PRODUCTS_PER_PAGE", "12")?,
        };
        if ui.checkout_refresh_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_REFRESH_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            backend,
            ui,
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_base_url("LODRA_API_URL", &get_required_env("LODRA_API_URL")?)?;
        let image_url = match get_optional_env("LODRA_IMAGE_URL") {
            Some(raw) => parse_base_url("LODRA_IMAGE_URL", &raw)?,
            None => api_url.clone(),
        };
        let timeout = Duration::from_secs(get_parsed_env("LODRA_API_TIMEOUT_SECS", "10")?);

        Ok(Self {
            api_url,
            image_url,
            timeout,
        })
    }

    /// Build a backend config from an API base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn with_api_url(raw: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("LODRA_API_URL", raw)?;
        Ok(Self {
            image_url: api_url.clone(),
            api_url,
            timeout: Duration::from_secs(10),
        })
    }

    /// Resolve an image path from the backend against the image base URL.
    ///
    /// Absolute URLs pass through unchanged; empty paths resolve to `None`.
    #[must_use]
    pub fn resolve_image(&self, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
            return Some(path.to_string());
        }
        self.image_url
            .join(path.trim_start_matches('/'))
            .ok()
            .map(String::from)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable (or its default) parsed into `T`.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL and make sure it ends with `/` so `Url::join` appends.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url =
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("X", "https://api.lodra.al/api").unwrap();
        assert_eq!(url.as_str(), "https://api.lodra.al/api/");
        assert_eq!(
            url.join("products/").unwrap().as_str(),
            "https://api.lodra.al/api/products/"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("X", "ftp://lodra.al"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_base_url("X", "not a url").is_err());
    }

    #[test]
    fn test_resolve_image() {
        let mut backend = BackendConfig::with_api_url("https://api.lodra.al/api").unwrap();
        backend.image_url = parse_base_url("X", "https://cdn.lodra.al/media").unwrap();

        assert_eq!(
            backend.resolve_image(Some("/products/lego.jpg")).as_deref(),
            Some("https://cdn.lodra.al/media/products/lego.jpg")
        );
        assert_eq!(
            backend.resolve_image(Some("https://img.example.com/a.png")).as_deref(),
            Some("https://img.example.com/a.png")
        );
        assert_eq!(
            backend.resolve_image(Some("//cdn.lodra.al/a.png")).as_deref(),
            Some("//cdn.lodra.al/a.png")
        );
        assert_eq!(backend.resolve_image(Some("  ")), None);
        assert_eq!(backend.resolve_image(None), None);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            static_dir: "static".to_string(),
            backend: BackendConfig::with_api_url("http://localhost:8000/api").unwrap(),
            ui: UiConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }
}
