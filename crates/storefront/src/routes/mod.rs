//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products, categories, brands)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Catalog
//! GET  /products               - Product listing (q, category, brand, ordering, page)
//! GET  /products/search        - Search suggestions fragment (HTMX, debounced)
//! GET  /products/{slug}        - Product detail
//! GET  /categories/{slug}      - Listing filtered by category
//! GET  /brands/{slug}          - Listing filtered by brand
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Toggle membership (returns heart button fragment)
//! POST /wishlist/remove        - Remove item (returns wishlist_items fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout page (redirects to /cart when empty)
//! POST /checkout               - Place the order
//! POST /checkout/summary       - Price breakdown fragment
//! GET  /checkout/success/{code} - Confirmation page
//! GET  /orders/track           - Guest order lookup (?code=)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (rate limited)
//! POST /auth/logout            - Logout action
//! POST /auth/password-strength - Password strength meter fragment
//!
//! # Account (requires auth)
//! GET  /account                - Profile and loyalty points
//! POST /account                - Update profile
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail
//! GET  /account/addresses      - Address list
//! POST /account/addresses      - Create address
//! POST /account/addresses/{id} - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Whether the request was sent by htmx.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/search", get(products::search))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/summary", post(checkout::summary))
        .route("/success/{code}", get(checkout::success))
}

/// Create the auth routes router.
///
/// The login and register forms share one per-IP rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .route("/password-strength", post(auth::password_strength))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index).post(account::update_profile))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Catalog
        .nest("/products", product_routes())
        .route("/categories/{slug}", get(products::category))
        .route("/brands/{slug}", get(products::brand))
        // Cart and wishlist
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        // Checkout and tracking
        .nest("/checkout", checkout_routes())
        .route("/orders/track", get(orders::track))
        // Auth
        .nest("/auth", auth_routes())
        // Account
        .nest("/account", account_routes())
}
