//! Shared data every full page renders: layout chrome, toast, badges.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::CspNonce;
use crate::models::Flash;
use crate::services::{auth, storage};
use crate::state::AppState;

/// Layout context for full pages.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// CSP nonce for inline scripts.
    pub nonce: String,
    /// Greeting name of the logged-in customer.
    pub user_name: Option<String>,
    /// Toast queued by the previous request.
    pub flash: Option<Flash>,
    /// Sum of cart quantities for the header badge.
    pub cart_count: u32,
    /// Wishlist size for the header badge.
    pub wishlist_count: usize,
    /// Debounce for the header search box.
    pub search_debounce_ms: u64,
    /// Request path, used to highlight navigation.
    pub current_path: String,
    /// Search box prefill.
    pub search_query: String,
}

impl PageContext {
    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.user_name.is_some()
    }

    /// Whether `prefix` is the active navigation section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }

    /// Prefill the header search box.
    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = CspNonce::from_request_parts(parts, state).await?.0;
        let mut page = Self {
            nonce,
            search_debounce_ms: state.config().ui.search_debounce_ms,
            current_path: parts.uri.path().to_string(),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            page.user_name = auth::current_user(&session)
                .await
                .map(|user| user.display_name());
            page.flash = storage::take_flash(&session).await;
            page.cart_count = storage::load_cart(&session).await.total_items();
            page.wishlist_count = storage::load_wishlist(&session).await.len();
        }

        Ok(page)
    }
}
