//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin dashboard
//! - `LODRA_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_STATIC_DIR` - Static asset directory (default: crates/admin/static)
//! - `ADMIN_PAGE_SIZE` - Rows per table page (default: 20)
//! - `LODRA_IMAGE_URL` - Base URL for relative image paths (default: `LODRA_API_URL`)
//! - `LODRA_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Rows per table page
    pub page_size: u32,
    /// Backend REST API configuration
    pub backend: BackendConfig,
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

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let page_size: u32 = get_parsed_env("ADMIN_PAGE_SIZE", "20")?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host: get_parsed_env("ADMIN_HOST", "127.0.0.1")?,
            port: get_parsed_env("ADMIN_PORT", "3001")?,
            base_url: get_required_env("ADMIN_BASE_URL")?,
            static_dir: get_env_or_default("ADMIN_STATIC_DIR", "crates/admin/static"),
            page_size,
            backend: BackendConfig::from_env()?,
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
        Ok(Self {
            api_url,
            image_url,
            timeout: Duration::from_secs(get_parsed_env("LODRA_API_TIMEOUT_SECS", "10")?),
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

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL and make sure it ends with `/`.
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
    fn test_with_api_url_normalizes() {
        let backend = BackendConfig::with_api_url("http://localhost:8000/api").unwrap();
        assert_eq!(backend.api_url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            backend.resolve_image(Some("media/ari.jpg")).as_deref(),
            Some("http://localhost:8000/api/media/ari.jpg")
        );
        assert_eq!(
            backend.resolve_image(Some("//cdn.lodra.al/ari.jpg")).as_deref(),
            Some("//cdn.lodra.al/ari.jpg")
        );
        assert!(BackendConfig::with_api_url("mailto:staff@lodra.al").is_err());
    }

    #[test]
    fn test_secure_cookie_follows_base_url() {
        let config = AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.lodra.al".to_string(),
            static_dir: "static".to_string(),
            page_size: 20,
            backend: BackendConfig::with_api_url("https://api.lodra.al/api").unwrap(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        assert!(config.is_secure());
        assert_eq!(config.socket_addr().port(), 3001);
    }
}
