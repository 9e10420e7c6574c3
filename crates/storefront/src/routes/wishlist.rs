//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use lodra_core::{ProductId, Wishlist, WishlistItem};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::is_htmx;
use crate::error::AppError;
use crate::filters;
use crate::page::PageContext;
use crate::services::storage;
use crate::state::AppState;

/// Event htmx listens for to refresh the header badge.
pub const WISHLIST_UPDATED: &str = "wishlist-updated";

#[derive(Debug, Deserialize)]
pub struct ToggleWishlistForm {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromWishlistForm {
    pub product_id: ProductId,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub page: PageContext,
    pub wishlist: Wishlist,
}

/// Wishlist items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_items.html")]
pub struct WishlistItemsTemplate {
    pub wishlist: Wishlist,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_toggle.html")]
pub struct WishlistButtonTemplate {
    pub slug: String,
    pub active: bool,
    /// New badge count, swapped out of band.
    pub count: usize,
}

/// Display wishlist page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> WishlistShowTemplate {
    WishlistShowTemplate {
        page,
        wishlist: storage::load_wishlist(&session).await,
    }
}

/// Add or remove a product (HTMX). Returns the heart button in its new state.
#[instrument(skip(state, session, headers, form), fields(slug = %form.slug))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ToggleWishlistForm>,
) -> Result<Response, AppError> {
    let product = state.api().get_product(&form.slug).await?;
    let item = WishlistItem::from_product(&product);
    let (wishlist, active) = storage::update_wishlist(&session, |w| w.toggle(item)).await?;
    tracing::info!(product_id = %product.id, active, "Wishlist toggled");

    if !is_htmx(&headers) {
        return Ok(Redirect::to(&format!("/products/{}", product.slug)).into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", WISHLIST_UPDATED)]),
        WishlistButtonTemplate {
            slug: product.slug,
            active,
            count: wishlist.len(),
        },
    )
        .into_response())
}

/// Remove a product from the wishlist page (HTMX).
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromWishlistForm>,
) -> Result<Response, AppError> {
    let (wishlist, _) =
        storage::update_wishlist(&session, |w| w.remove(form.product_id)).await?;

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/wishlist").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", WISHLIST_UPDATED)]),
        WishlistItemsTemplate { wishlist },
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_button_reflects_state() {
        let on = WishlistButtonTemplate {
            slug: "ari-pelushi".to_string(),
            active: true,
            count: 1,
        }
        .render()
        .unwrap();
        assert!(on.contains("is-active"));
        assert!(on.contains("ari-pelushi"));

        let off = WishlistButtonTemplate {
            slug: "ari-pelushi".to_string(),
            active: false,
            count: 0,
        }
        .render()
        .unwrap();
        assert!(!off.contains("is-active"));
    }
}
