//! CSP nonce middleware and the admin policy.
//!
//! Every request gets a fresh nonce that `<script>` tags in the layout carry.

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

/// A CSP nonce value (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Store a fresh nonce in request extensions.
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
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self(String::new())))
    }
}

/// Admin `Content-Security-Policy`.
///
/// No inline scripts without the nonce, no framing, forms only to self.
/// Product images and brand logos come from `image_origin`.
#[must_use]
pub fn admin_policy(nonce: &str, image_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self' 'nonce-{nonce}' {HTMX_ORIGIN}; \
         style-src 'self'; \
         img-src 'self' data: {image_origin}; \
         connect-src 'self'; \
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
    fn test_admin_policy() {
        let policy = admin_policy("n0nce", "https://api.lodra.al");
        assert!(policy.contains("'nonce-n0nce'"));
        assert!(policy.contains("img-src 'self' data: https://api.lodra.al;"));
        assert!(policy.ends_with("frame-ancestors 'none'"));
    }
}
