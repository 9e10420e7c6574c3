//! Admin dashboard flows against the stub backend.

#![allow(clippy::unwrap_used)]

use lodra_integration_tests::{
    CUSTOMER_EMAIL, Calls, DUPLICATE_MESSAGE, DUPLICATE_PRODUCT, PASSWORD, SEED_CATEGORY,
    STAFF_EMAIL, StubBackend, browser, spawn_admin,
};
use reqwest::{Client, StatusCode, header::LOCATION};

async fn log_in(client: &Client, base: &str, email: &str) -> reqwest::Response {
    client
        .post(format!("{base}/login"))
        .form(&[("email", email), ("password", PASSWORD)])
        .send()
        .await
        .unwrap()
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers().get(LOCATION).unwrap().to_str().unwrap()
}

fn hx_redirect(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get("hx-redirect")
        .map(|v| v.to_str().unwrap())
}

async fn staff_browser(base: &str) -> Client {
    let client = browser();
    let resp = log_in(&client, base, STAFF_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    client
}

async fn get_html(client: &Client, url: String) -> String {
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap()
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;

    let resp = browser().get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert!(location(&resp).starts_with("/login"));
}

#[tokio::test]
async fn test_customer_account_is_refused() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = browser();

    let resp = log_in(&client, &base, CUSTOMER_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Kjo llogari nuk ka të drejta administratori."));
    assert!(!html.contains(PASSWORD));

    // Nothing was stored in the session.
    let resp = client.get(format!("{base}/products")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert!(location(&resp).starts_with("/login"));
}

#[tokio::test]
async fn test_wrong_password_is_refused() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;

    let resp = browser()
        .post(format!("{base}/login"))
        .form(&[("email", STAFF_EMAIL), ("password", "gabim")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Email ose fjalëkalim i gabuar."));
}

#[tokio::test]
async fn test_staff_sees_dashboard_counters() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = browser();

    let resp = log_in(&client, &base, STAFF_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let html = client
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Mirë se erdhe, Arta Hoxha!"));
    assert!(html.contains("184.500 Lekë"));
    assert!(html.contains("Nuk ka porosi ende."));
}

#[tokio::test]
async fn test_product_table_paginates_through_backend() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = browser();
    log_in(&client, &base, STAFF_EMAIL).await;

    let resp = client
        .get(format!("{base}/products?page=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();

    let query = backend.calls.last_products_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
    assert_eq!(query.get("page_size").map(String::as_str), Some("20"));
    assert!(!query.contains_key("search"));

    assert!(html.contains("Lodër 21"));
    assert!(!html.contains("Lodër 41"));
    assert!(html.contains(r#"<span class="current" aria-current="page">2</span>"#));
    assert!(html.contains(r#"href="/products?page=3""#));
    assert!(html.contains(r#"href="/products""#));
    assert!(html.contains("21–40 nga 45"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = browser();
    log_in(&client, &base, STAFF_EMAIL).await;

    let resp = client.post(format!("{base}/logout")).send().await.unwrap();
    assert!(resp.status().is_redirection());

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_redirection());
}

#[tokio::test]
async fn test_product_create_redirects_and_flashes() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = staff_browser(&base).await;

    let resp = client
        .post(format!("{base}/products"))
        .header("HX-Request", "true")
        .form(&[
            ("name", "Tren druri"),
            ("price", "1.250"),
            ("stock", "4"),
            ("description", ""),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_redirect(&resp), Some("/products"));

    let writes = backend.calls.product_writes();
    assert_eq!(writes.len(), 1);
    let (method, body) = &writes[0];
    assert_eq!(method, "POST");
    assert_eq!(body["name"], "Tren druri");
    assert_eq!(body["price"], "1250");
    assert_eq!(body["stock"], 4);

    let html = get_html(&client, format!("{base}/products")).await;
    assert!(html.contains("u krijua."));
}

#[tokio::test]
async fn test_invalid_product_form_is_rerendered_without_saving() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = staff_browser(&base).await;

    let resp = client
        .post(format!("{base}/products"))
        .header("HX-Request", "true")
        .form(&[("name", "Tren druri"), ("price", "pesë"), ("stock", "4")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_redirect(&resp), None);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Çmimi duhet të jetë një numër jo negativ"));
    assert!(html.contains("value=\"Tren druri\""));
    assert!(backend.calls.product_writes().is_empty());
}

#[tokio::test]
async fn test_backend_field_errors_are_shown_in_the_modal() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = staff_browser(&base).await;

    let resp = client
        .post(format!("{base}/products"))
        .header("HX-Request", "true")
        .form(&[("name", DUPLICATE_PRODUCT), ("price", "900"), ("stock", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_redirect(&resp), None);
    assert!(resp.text().await.unwrap().contains(DUPLICATE_MESSAGE));
}

#[tokio::test]
async fn test_product_update_and_delete() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = staff_browser(&base).await;

    let resp = client
        .post(format!("{base}/products/5"))
        .header("HX-Request", "true")
        .form(&[("name", "Lodër 5"), ("price", "1300,50"), ("stock", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(hx_redirect(&resp), Some("/products"));

    let resp = client
        .post(format!("{base}/products/5/delete"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(hx_redirect(&resp), Some("/products"));

    let writes = backend.calls.product_writes();
    let methods: Vec<&str> = writes.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(methods, vec!["PUT 5", "DELETE 5"]);
    assert_eq!(writes[0].1["price"], "1300.50");

    let html = get_html(&client, format!("{base}/products")).await;
    assert!(html.contains("Produkti u fshi."));
}

#[tokio::test]
async fn test_category_changes_refresh_the_cached_list() {
    let backend = StubBackend::start().await;
    let base = spawn_admin(&backend).await;
    let client = staff_browser(&base).await;

    let html = get_html(&client, format!("{base}/categories")).await;
    assert!(html.contains(SEED_CATEGORY));
    get_html(&client, format!("{base}/categories")).await;
    assert_eq!(Calls::count(&backend.calls.category_lists), 1);

    let resp = client
        .post(format!("{base}/categories"))
        .header("HX-Request", "true")
        .form(&[("name", "Puzzle"), ("description", ""), ("parent", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(hx_redirect(&resp), Some("/categories"));

    let html = get_html(&client, format!("{base}/categories")).await;
    assert!(html.contains("Puzzle"));
    assert_eq!(Calls::count(&backend.calls.category_lists), 2);

    let resp = client
        .post(format!("{base}/categories/1/delete"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(hx_redirect(&resp), Some("/categories"));

    let html = get_html(&client, format!("{base}/categories")).await;
    assert!(!html.contains(SEED_CATEGORY));
    assert!(html.contains("Puzzle"));
}
