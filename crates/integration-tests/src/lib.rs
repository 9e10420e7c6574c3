//! End-to-end test harness for Lodra.
//!
//! Each test starts a [`StubBackend`] that answers the REST endpoints the
//! frontends call, then boots the real storefront or admin app against it
//! on an ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lodra-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Email of the stub's staff account.
pub const STAFF_EMAIL: &str = "staf@lodra.al";
/// Email of the stub's customer account.
pub const CUSTOMER_EMAIL: &str = "prind@lodra.al";
/// Password accepted for both accounts.
pub const PASSWORD: &str = "Lodra-2024!";
/// Slug of the stub's only product.
pub const PRODUCT_SLUG: &str = "kamion-zjarrfikes";
/// Tracking code the stub knows about.
pub const TRACKING_CODE: &str = "LD-7F3K9Q";
/// Number of products the stub reports for admin listings.
pub const PRODUCT_COUNT: u64 = 45;
/// Product name the stub refuses as a duplicate.
pub const DUPLICATE_PRODUCT: &str = "Dublikatë";
/// Field error the stub returns for [`DUPLICATE_PRODUCT`].
pub const DUPLICATE_MESSAGE: &str = "Ekziston një produkt me këtë emër.";
/// Category the stub starts with.
pub const SEED_CATEGORY: &str = "Lodra druri";

/// Calls received by the stub, for asserting on side effects.
#[derive(Debug, Default)]
pub struct Calls {
    pub login: AtomicUsize,
    pub register: AtomicUsize,
    pub calculate: AtomicUsize,
    pub refresh: AtomicUsize,
    pub category_lists: AtomicUsize,
    pub last_calculation: Mutex<Option<Value>>,
    pub last_products_query: Mutex<Option<HashMap<String, String>>>,
    pub last_order: Mutex<Option<Value>>,
    /// `("POST", body)`, `("PUT 5", body)` or `("DELETE 5", null)`.
    pub product_writes: Mutex<Vec<(String, Value)>>,
    categories: Mutex<Vec<Value>>,
    access_expired: AtomicBool,
    refresh_rejected: AtomicBool,
}

impl Calls {
    #[must_use]
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Reject every access token issued at login from now on. Refreshed
    /// tokens stay valid.
    pub fn expire_access_tokens(&self) {
        self.access_expired.store(true, Ordering::SeqCst);
    }

    /// Answer 401 to every refresh request.
    pub fn reject_refresh(&self) {
        self.refresh_rejected.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn product_writes(&self) -> Vec<(String, Value)> {
        self.product_writes.lock().unwrap().clone()
    }
}

/// A running stub backend.
pub struct StubBackend {
    pub addr: SocketAddr,
    pub calls: Arc<Calls>,
}

impl StubBackend {
    /// Start the stub on an ephemeral port.
    pub async fn start() -> Self {
        let calls = Arc::new(Calls {
            categories: Mutex::new(vec![category_json(1, SEED_CATEGORY)]),
            ..Calls::default()
        });
        let api = Router::new()
            .route("/login/", post(login))
            .route("/register/", post(register))
            .route("/token/refresh/", post(refresh))
            .route("/me/", get(me))
            .route("/loyalty-points/", get(loyalty_points))
            .route("/products/", get(products).post(create_product))
            .route(
                "/products/{slug}/",
                get(product).put(update_product).delete(delete_product),
            )
            .route("/categories/", get(categories).post(create_category))
            .route("/categories/{id}/", axum::routing::delete(delete_category))
            .route("/brands/", get(empty_list))
            .route("/calculate-order/", post(calculate))
            .route("/orders/create/", post(create_order))
            .route("/orders/track/{code}/", get(track))
            .route("/admin/stats/", get(stats))
            .route("/admin/orders/", get(empty_page))
            .with_state(calls.clone());
        let app = Router::new().nest("/api", api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, calls }
    }

    /// Base URL of the stub's API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }
}

/// Start the storefront against `backend` and return its base URL.
pub async fn spawn_storefront(backend: &StubBackend) -> String {
    use lodra_storefront::config::{BackendConfig, StorefrontConfig, UiConfig};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = StorefrontConfig {
        host: addr.ip(),
        port: addr.port(),
        base_url: format!("http://{addr}"),
        static_dir: "../storefront/static".to_string(),
        backend: BackendConfig::with_api_url(&backend.api_url()).unwrap(),
        ui: UiConfig::default(),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let app = lodra_storefront::app(lodra_storefront::state::AppState::new(config).unwrap());
    tokio::spawn(lodra_storefront::serve(listener, app, std::future::pending()));
    format!("http://{addr}")
}

/// Start the admin dashboard against `backend` and return its base URL.
pub async fn spawn_admin(backend: &StubBackend) -> String {
    use lodra_admin::config::{AdminConfig, BackendConfig};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = AdminConfig {
        host: addr.ip(),
        port: addr.port(),
        base_url: format!("http://{addr}"),
        static_dir: "../admin/static".to_string(),
        page_size: 20,
        backend: BackendConfig::with_api_url(&backend.api_url()).unwrap(),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let app = lodra_admin::app(lodra_admin::state::AppState::new(config).unwrap());
    tokio::spawn(lodra_admin::serve(listener, app, std::future::pending()));
    format!("http://{addr}")
}

/// A browser-like client: keeps cookies, does not follow redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

// =============================================================================
// Stub handlers
// =============================================================================

fn user(email: &str) -> Value {
    json!({
        "id": if email == STAFF_EMAIL { 1 } else { 2 },
        "email": email,
        "first_name": if email == STAFF_EMAIL { "Arta" } else { "Blerim" },
        "last_name": "Hoxha",
        "is_staff": email == STAFF_EMAIL,
        "loyalty_points": 0,
    })
}

fn token_owner(calls: &Calls, headers: &HeaderMap) -> Option<&'static str> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let expired = calls.access_expired.load(Ordering::SeqCst);
    match token {
        "staff-access" if !expired => Some(STAFF_EMAIL),
        "customer-access" if !expired => Some(CUSTOMER_EMAIL),
        "staff-renewed" => Some(STAFF_EMAIL),
        "customer-renewed" => Some(CUSTOMER_EMAIL),
        _ => None,
    }
}

fn category_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": "",
        "image": null,
        "parent": null,
        "product_count": 0,
    })
}

fn product_json(id: u64, name: &str, slug: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "description": "",
        "price": "1250.00",
        "discount_price": null,
        "stock": 5,
        "image": null,
        "category": null,
        "brand": null,
        "is_featured": false,
    })
}

async fn login(State(calls): State<Arc<Calls>>, Json(body): Json<Value>) -> Response {
    calls.login.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let token = match email {
        STAFF_EMAIL => "staff",
        CUSTOMER_EMAIL => "customer",
        _ => "",
    };
    if token.is_empty() || password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response();
    }
    Json(json!({
        "access": format!("{token}-access"),
        "refresh": format!("{token}-refresh"),
        "user": user(email),
    }))
    .into_response()
}

async fn register(State(calls): State<Arc<Calls>>) -> StatusCode {
    calls.register.fetch_add(1, Ordering::SeqCst);
    StatusCode::CREATED
}

async fn refresh(State(calls): State<Arc<Calls>>, Json(body): Json<Value>) -> Response {
    calls.refresh.fetch_add(1, Ordering::SeqCst);
    let owner = match body["refresh"].as_str() {
        Some("staff-refresh") => "staff",
        Some("customer-refresh") => "customer",
        _ => "",
    };
    if owner.is_empty() || calls.refresh_rejected.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        )
            .into_response();
    }
    Json(json!({"access": format!("{owner}-renewed")})).into_response()
}

async fn loyalty_points(State(calls): State<Arc<Calls>>, headers: HeaderMap) -> Response {
    if token_owner(&calls, &headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"balance": 120, "lifetime_earned": 340, "history": []})).into_response()
}

async fn me(State(calls): State<Arc<Calls>>, headers: HeaderMap) -> Response {
    match token_owner(&calls, &headers) {
        Some(email) => Json(user(email)).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn products(
    State(calls): State<Arc<Calls>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: u64 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let page_size: u64 = query
        .get("page_size")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20);
    *calls.last_products_query.lock().unwrap() = Some(query);

    let first = (page - 1) * page_size + 1;
    let last = (page * page_size).min(PRODUCT_COUNT);
    let results: Vec<Value> = (first..=last)
        .map(|n| product_json(n, &format!("Lodër {n}"), &format!("loder-{n}")))
        .collect();
    Json(json!({
        "count": PRODUCT_COUNT,
        "next": null,
        "previous": null,
        "results": results,
    }))
}

async fn product(Path(slug): Path<String>) -> Response {
    if slug == PRODUCT_SLUG {
        Json(product_json(2, "Kamion zjarrfikës", PRODUCT_SLUG)).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
    }
}

async fn create_product(State(calls): State<Arc<Calls>>, Json(body): Json<Value>) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    if name == DUPLICATE_PRODUCT {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": [DUPLICATE_MESSAGE]})),
        )
            .into_response();
    }
    calls
        .product_writes
        .lock()
        .unwrap()
        .push(("POST".to_string(), body));
    (StatusCode::CREATED, Json(product_json(46, &name, "produkt-i-ri"))).into_response()
}

async fn update_product(
    State(calls): State<Arc<Calls>>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    calls
        .product_writes
        .lock()
        .unwrap()
        .push((format!("PUT {id}"), body));
    Json(product_json(id, &name, &format!("loder-{id}")))
}

async fn delete_product(State(calls): State<Arc<Calls>>, Path(id): Path<u64>) -> StatusCode {
    calls
        .product_writes
        .lock()
        .unwrap()
        .push((format!("DELETE {id}"), Value::Null));
    StatusCode::NO_CONTENT
}

async fn categories(State(calls): State<Arc<Calls>>) -> Json<Value> {
    calls.category_lists.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(calls.categories.lock().unwrap().clone()))
}

async fn create_category(
    State(calls): State<Arc<Calls>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut list = calls.categories.lock().unwrap();
    let id = list.iter().filter_map(|c| c["id"].as_u64()).max().unwrap_or(0) + 1;
    let category = category_json(id, body["name"].as_str().unwrap_or_default());
    list.push(category.clone());
    (StatusCode::CREATED, Json(category))
}

async fn delete_category(State(calls): State<Arc<Calls>>, Path(id): Path<u64>) -> StatusCode {
    calls
        .categories
        .lock()
        .unwrap()
        .retain(|c| c["id"].as_u64() != Some(id));
    StatusCode::NO_CONTENT
}

async fn create_order(State(calls): State<Arc<Calls>>, Json(body): Json<Value>) -> Json<Value> {
    *calls.last_order.lock().unwrap() = Some(body);
    Json(json!({
        "id": 78,
        "tracking_code": TRACKING_CODE,
        "total": "2800.00",
        "status": "pending",
    }))
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn empty_page() -> Json<Value> {
    Json(json!({"count": 0, "next": null, "previous": null, "results": []}))
}

async fn calculate(State(calls): State<Arc<Calls>>, Json(body): Json<Value>) -> Json<Value> {
    calls.calculate.fetch_add(1, Ordering::SeqCst);
    let quantity: u64 = body["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["quantity"].as_u64()).sum())
        .unwrap_or(0);
    *calls.last_calculation.lock().unwrap() = Some(body);

    let subtotal = 1250 * quantity;
    Json(json!({
        "subtotal": subtotal.to_string(),
        "discount": "0",
        "shipping_cost": "300",
        "loyalty_points_used": 0,
        "loyalty_discount": "0",
        "total": (subtotal + 300).to_string(),
        "loyalty_points_earned": 0,
    }))
}

async fn track(Path(code): Path<String>) -> Response {
    if code != TRACKING_CODE {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    Json(json!({
        "id": 77,
        "tracking_code": TRACKING_CODE,
        "status": "shipped",
        "payment_method": "cash_on_delivery",
        "created_at": "2024-05-02T09:30:00Z",
        "items": [
            {"product_id": 2, "product_name": "Kamion zjarrfikës", "quantity": 1, "price": "1250.00"}
        ],
        "subtotal": "1250.00",
        "shipping_cost": "300.00",
        "total": "1550.00",
    }))
    .into_response()
}

async fn stats(State(calls): State<Arc<Calls>>, headers: HeaderMap) -> Response {
    if token_owner(&calls, &headers) != Some(STAFF_EMAIL) {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(json!({
        "products_count": PRODUCT_COUNT,
        "orders_count": 12,
        "customers_count": 30,
        "pending_orders": 3,
        "revenue": "184500.00",
    }))
    .into_response()
}
