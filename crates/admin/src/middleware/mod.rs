//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for script tags)
//! 5. Security headers (stricter CSP for admin)
//! 6. Session layer (tower-sessions with in-memory store)
//! 7. Rate limiting on the login POST (governor)
//! 8. Auth extractors on every page except login and health

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdminAuth, RequireAdminAuth};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::login_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
