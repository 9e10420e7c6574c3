//! CSP nonce middleware and policy.
//!
//! Every request gets a fresh nonce. Templates put it on `<script>` tags and
//! `security_headers_middleware` puts it in the `Content-Security-Policy`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Origin htmx is loaded from.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// A CSP nonce value for inline scripts (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must run before `security_headers_middleware` so the header and the page
/// agree on the nonce.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}

/// Build the `Content-Security-Policy` value.
///
/// `image_origin` is the backend image host; product photos are served from
/// there rather than from this app.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>, image_origin: &str) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.is_empty() => format!("'self' 'nonce-{nonce}' {HTMX_ORIGIN}"),
        _ => format!("'self' {HTMX_ORIGIN}"),
    };
    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {image_origin}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_includes_nonce_and_image_origin() {
        let policy = content_security_policy(Some("abc"), "https://cdn.lodra.al");
        assert!(policy.contains("script-src 'self' 'nonce-abc' https://unpkg.com;"));
        assert!(policy.contains("img-src 'self' data: https://cdn.lodra.al;"));
        assert!(policy.contains("frame-ancestors 'none'"));

        let policy = content_security_policy(None, "https://cdn.lodra.al");
        assert!(!policy.contains("nonce-"));
    }
}
