//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; adding an item looks the product up
//! on the backend so the stored name, price and image are current.
//!
//! Plain form posts (no htmx) are answered with a redirect to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use lodra_core::{Cart, CartItem, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::is_htmx;
use crate::error::AppError;
use crate::filters;
use crate::models::Flash;
use crate::page::PageContext;
use crate::services::storage;
use crate::state::AppState;

/// Event htmx listens for to refresh the header badge.
pub const CART_UPDATED: &str = "cart-updated";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: Cart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> CartShowTemplate {
    CartShowTemplate {
        page,
        cart: storage::load_cart(&session).await,
    }
}

/// Add item to cart (HTMX).
///
/// Returns the updated count badge and triggers `cart-updated`.
#[instrument(skip(state, session, headers, form), fields(slug = %form.slug))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product = state.api().get_product(&form.slug).await?;
    if !product.in_stock() {
        return Err(AppError::BadRequest(
            "Ky produkt nuk është në gjendje".to_string(),
        ));
    }

    let quantity = form.quantity.unwrap_or(1);
    let (cart, ()) = storage::update_cart(&session, |cart| {
        cart.add_item(CartItem::from_product(&product), quantity);
    })
    .await?;
    tracing::info!(product_id = %product.id, quantity, "Added to cart");

    if !is_htmx(&headers) {
        storage::set_flash(&session, Flash::success("Produkti u shtua në shportë")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartCountTemplate {
            count: cart.total_items(),
        },
    )
        .into_response())
}

/// Set the quantity of a cart line (HTMX). Zero removes the line.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let (cart, ()) = storage::update_cart(&session, |cart| {
        cart.update_quantity(form.product_id, form.quantity);
    })
    .await?;

    Ok(items_response(&headers, cart))
}

/// Remove a cart line (HTMX).
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let (cart, removed) =
        storage::update_cart(&session, |cart| cart.remove_item(form.product_id)).await?;
    if removed {
        tracing::info!(product_id = %form.product_id, "Removed from cart");
    }

    Ok(items_response(&headers, cart))
}

/// Get cart count badge (HTMX).
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: storage::load_cart(&session).await.total_items(),
    }
}

fn items_response(headers: &HeaderMap, cart: Cart) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use askama::Template;
    use lodra_core::Price;

    use super::*;

    #[test]
    fn test_count_badge_renders_quantity() {
        let html = CartCountTemplate { count: 3 }.render().unwrap();
        assert!(html.contains("cart-count"));
        assert!(html.contains('3'));
    }

    #[test]
    fn test_items_fragment_lists_lines() {
        let mut cart = Cart::new();
        cart.add_item(
            CartItem {
                id: ProductId::new(7),
                name: "Puzzle 500 copë".to_string(),
                slug: "puzzle-500".to_string(),
                price: Price::from_lek(1500),
                quantity: 1,
                image: None,
            },
            2,
        );
        let html = CartItemsTemplate { cart }.render().unwrap();
        assert!(html.contains("Puzzle 500 copë"));
        assert!(html.contains(&Price::from_lek(3000).display()));
        assert_eq!(html.matches(r#"hx-sync="body:queue all""#).count(), 2);
    }

    #[test]
    fn test_empty_items_fragment() {
        let html = CartItemsTemplate { cart: Cart::new() }.render().unwrap();
        assert!(html.contains("Shporta juaj është bosh"));
    }
}
