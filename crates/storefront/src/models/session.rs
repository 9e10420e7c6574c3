//! Session-related types.
//!
//! The browser session stands in for per-browser local storage: it holds the
//! auth tokens, the logged-in user, the cart and the wishlist. Values are
//! plain JSON blobs without versioning; a blob that fails to decode is
//! treated as absent.

use serde::{Deserialize, Serialize};

/// Session keys.
pub mod keys {
    /// Backend access token.
    pub const TOKEN: &str = "token";

    /// Backend refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// The logged-in user (`lodra_core::schema::User`).
    pub const USER: &str = "user";

    /// Saved-for-later products.
    pub const WISHLIST: &str = "wishlist";

    /// Shopping cart lines.
    pub const CART: &str = "cart";

    /// One-shot toast shown on the next rendered page.
    pub const FLASH: &str = "flash";

    /// Tracking code of the most recent order placed from this browser.
    pub const LAST_TRACKING_CODE: &str = "last_tracking_code";
}

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Info => "toast-info",
        }
    }
}

/// A toast message carried across one redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }
}
