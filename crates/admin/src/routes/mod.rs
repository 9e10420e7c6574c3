//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Dashboard
//! GET  /                       - Counters and recent orders
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited, staff only)
//! POST /logout                 - Logout
//!
//! # Catalog (HTMX modal forms)
//! GET  /products               - Product table (q, page)
//! GET  /products/new           - Create form fragment
//! POST /products               - Create
//! GET  /products/{id}/edit     - Edit form fragment
//! POST /products/{id}          - Update
//! POST /products/{id}/delete   - Delete
//! GET/POST /categories...      - Same shape as products
//! GET/POST /brands...          - Same shape as products
//!
//! # Orders
//! GET  /orders                 - Order table (status, page)
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/status     - Change status
//!
//! # Customers
//! GET  /customers              - Customer table (q, page)
//! GET  /customers/{id}         - Customer detail with orders
//! ```

pub mod auth;
pub mod brands;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use url::form_urlencoded;

use crate::error::AppError;
use crate::forms::FormErrors;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Form-level message when a save fails for reasons the form cannot show.
pub const SAVE_FAILED: &str = "Ruajtja dështoi. Provoni përsëri pas pak.";

/// Notice shown when a table could not be loaded.
pub const LOAD_FAILED: &str = "Të dhënat nuk mund të ngarkoheshin. Provoni përsëri pas pak.";

/// Links shown on either side of the current page.
pub(crate) const PAGE_RADIUS: u32 = 2;

/// Whether the request was sent by htmx.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Navigate after a successful mutation.
///
/// htmx requests get `HX-Redirect` so the whole page reloads instead of the
/// response being swapped into the modal.
pub(crate) fn redirect(headers: &HeaderMap, to: &str) -> Response {
    if is_htmx(headers) {
        (StatusCode::OK, [("HX-Redirect", to.to_string())]).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

/// Sort a mutation result into success, errors to show in the modal form,
/// or a failure that replaces the page (expired login).
pub(crate) fn form_outcome<T>(
    result: Result<T, AppError>,
) -> Result<Result<T, FormErrors>, AppError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.requires_login() => Err(e),
        Err(AppError::Api(err)) if !err.is_unavailable() => Ok(Err(FormErrors::from_api(&err))),
        Err(e) => {
            tracing::error!(error = %e, "Save failed");
            Ok(Err(FormErrors::general(SAVE_FAILED)))
        }
    }
}

/// Query string of the searchable tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub page: Option<u32>,
    pub q: Option<String>,
}

impl TableQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(String::from)
    }

    /// URL of `page` under `base`, keeping the search.
    #[must_use]
    pub fn page_href(&self, base: &str, page: u32) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = self.search() {
            query.append_pair("q", &q);
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
        let query = query.finish();
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }
}

/// One `<option>` of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub(crate) fn new(value: impl ToString, label: impl Into<String>, current: &str) -> Self {
        let value = value.to_string();
        Self {
            selected: value == current,
            value,
            label: label.into(),
        }
    }
}

/// Slice one page out of a fully loaded list.
pub(crate) fn page_slice<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    let start = usize::try_from(u64::from(page.saturating_sub(1)) * u64::from(per_page))
        .unwrap_or(usize::MAX);
    items
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect()
}

/// Case-insensitive substring match used by the locally paginated tables.
pub(crate) fn matches_search(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new_form))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_form))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the brand routes router.
pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(brands::index).post(brands::create))
        .route("/new", get(brands::new_form))
        .route("/{id}", post(brands::update))
        .route("/{id}/edit", get(brands::edit_form))
        .route("/{id}/delete", post(brands::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::show))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Dashboard
        .route("/", get(dashboard::index))
        // Auth
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(login)
        // Catalog
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/brands", brand_routes())
        // Orders and customers
        .nest("/orders", order_routes())
        .nest("/customers", customer_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_href_keeps_search() {
        let query = TableQuery {
            page: Some(2),
            q: Some(" lego ".to_string()),
        };
        assert_eq!(query.page_href("/products", 3), "/products?q=lego&page=3");
        assert_eq!(TableQuery::default().page_href("/products", 1), "/products");
    }

    #[test]
    fn test_page_slice() {
        let items: Vec<u32> = (1..=45).collect();
        assert_eq!(page_slice(&items, 1, 20).len(), 20);
        assert_eq!(page_slice(&items, 3, 20), (41..=45).collect::<Vec<_>>());
        assert!(page_slice(&items, 4, 20).is_empty());
    }

    #[test]
    fn test_matches_search() {
        assert!(matches_search("Lodra Druri", Some("druri")));
        assert!(matches_search("Lodra Druri", None));
        assert!(!matches_search("Kukulla", Some("tren")));
    }

    #[test]
    fn test_form_outcome() {
        let mut fields = lodra_core::schema::FieldErrors::new();
        fields.insert("price".to_string(), vec!["Vlerë e pavlefshme.".to_string()]);
        let rejected: Result<(), AppError> =
            Err(crate::api::ApiError::Validation(fields).into());
        let errors = form_outcome(rejected).unwrap().unwrap_err();
        assert_eq!(errors.get("price"), Some("Vlerë e pavlefshme."));

        let down: Result<(), AppError> = Err(crate::api::ApiError::Status {
            status: 503,
            body: String::new(),
        }
        .into());
        let errors = form_outcome(down).unwrap().unwrap_err();
        assert_eq!(errors.general.as_deref(), Some(SAVE_FAILED));

        let expired: Result<(), AppError> = Err(crate::api::ApiError::Unauthorized.into());
        assert!(form_outcome(expired).is_err());
    }

    #[test]
    fn test_mutations_redirect_htmx_with_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(redirect(&headers, "/products").status(), StatusCode::SEE_OTHER);

        headers.insert("hx-request", "true".parse().unwrap());
        let response = redirect(&headers, "/products");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("HX-Redirect").map(|v| v.as_bytes()),
            Some(b"/products".as_slice())
        );
    }
}
