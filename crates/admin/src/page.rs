//! Layout context for admin pages.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::CspNonce;
use crate::models::{CurrentAdmin, Flash, session_keys};
use crate::services::flash::take_flash;
use crate::state::AppState;

/// Shared data for the admin layout.
#[derive(Debug, Clone, Default)]
pub struct AdminPage {
    pub nonce: String,
    /// Logged-in staff member's name.
    pub admin_name: Option<String>,
    pub flash: Option<Flash>,
    pub current_path: String,
}

impl AdminPage {
    /// Whether `prefix` is the active sidebar section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

impl FromRequestParts<AppState> for AdminPage {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = CspNonce::from_request_parts(parts, state).await?.0;
        let mut page = Self {
            nonce,
            current_path: parts.uri.path().to_string(),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            page.admin_name = session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten()
                .map(|admin| admin.name);
            page.flash = take_flash(&session).await;
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar_highlight() {
        let page = AdminPage {
            current_path: "/orders/12".to_string(),
            ..AdminPage::default()
        };
        assert!(page.is_active("/orders"));
        assert!(!page.is_active("/"));
        assert!(!page.is_active("/products"));
    }
}
