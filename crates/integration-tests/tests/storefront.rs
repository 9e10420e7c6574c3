//! Storefront flows against the stub backend.

#![allow(clippy::unwrap_used)]

use lodra_integration_tests::{
    CUSTOMER_EMAIL, Calls, PASSWORD, PRODUCT_SLUG, StubBackend, TRACKING_CODE, browser,
    spawn_storefront,
};
use reqwest::{Client, StatusCode, header::LOCATION};

async fn log_in_customer(client: &Client, base: &str) {
    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", CUSTOMER_EMAIL), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/account");
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers().get(LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;

    let resp = browser().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cart_count_survives_between_requests() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = browser();

    let resp = client
        .post(format!("{base}/cart/add"))
        .header("HX-Request", "true")
        .form(&[("slug", PRODUCT_SLUG), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("hx-trigger"));
    assert!(resp.text().await.unwrap().contains(">2</span>"));

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">2</span>"));

    // A fresh browser has its own empty cart.
    let other = browser()
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(other.contains(">0</span>"));
}

#[tokio::test]
async fn test_register_with_mismatched_passwords_never_reaches_backend() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;

    let resp = browser()
        .post(format!("{base}/auth/register"))
        .form(&[
            ("first_name", "Blerim"),
            ("last_name", "Hoxha"),
            ("email", "blerim@lodra.al"),
            ("phone", "0691234567"),
            ("password", PASSWORD),
            ("password_confirm", "Lodra-2025!"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Fjalëkalimet nuk përputhen"));
    assert!(html.contains("blerim@lodra.al"));
    assert_eq!(Calls::count(&backend.calls.register), 0);
}

#[tokio::test]
async fn test_checkout_summary_prices_the_session_cart() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = browser();

    client
        .post(format!("{base}/cart/add"))
        .header("HX-Request", "true")
        .form(&[("slug", PRODUCT_SLUG), ("quantity", "2")])
        .send()
        .await
        .unwrap();

    let html = client
        .post(format!("{base}/checkout/summary"))
        .header("HX-Request", "true")
        .form(&[
            ("full_name", "Blerim Hoxha"),
            ("email", "blerim@lodra.al"),
            ("phone", "0691234567"),
            ("address", "Rruga e Durrësit 10"),
            ("city", "Tiranë"),
            ("use_loyalty_points", "on"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("2.500 Lekë"));
    assert!(html.contains("2.800 Lekë"));
    assert_eq!(Calls::count(&backend.calls.calculate), 1);

    let body = backend.calls.last_calculation.lock().unwrap().clone().unwrap();
    assert_eq!(body["items"][0]["product_id"], 2);
    assert_eq!(body["items"][0]["quantity"], 2);
    // Guests cannot redeem points.
    assert_eq!(body["use_loyalty_points"], false);
}

#[tokio::test]
async fn test_checkout_summary_with_empty_cart_skips_backend() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;

    let html = browser()
        .post(format!("{base}/checkout/summary"))
        .form(&[("city", "Tiranë")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Shporta juaj është bosh"));
    assert_eq!(Calls::count(&backend.calls.calculate), 0);
}

#[tokio::test]
async fn test_tracking_normalizes_code() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;

    let html = browser()
        .get(format!("{base}/orders/track?code=%20ld-7f3k9q%20"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains(TRACKING_CODE));
    assert!(html.contains("Dërguar"));
    assert!(html.contains("1.550 Lekë"));
}

#[tokio::test]
async fn test_tracking_unknown_code() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;

    let html = browser()
        .get(format!("{base}/orders/track?code=LD-000000"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Nuk u gjet asnjë porosi me këtë kod"));
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_once() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = browser();
    log_in_customer(&client, &base).await;

    backend.calls.expire_access_tokens();

    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("<strong>120</strong> pikë"));
    assert_eq!(Calls::count(&backend.calls.refresh), 1);

    // The renewed token is kept in the session.
    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(Calls::count(&backend.calls.refresh), 1);
}

#[tokio::test]
async fn test_rejected_refresh_logs_the_customer_out() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = browser();
    log_in_customer(&client, &base).await;

    backend.calls.expire_access_tokens();
    backend.calls.reject_refresh();

    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");
    assert_eq!(Calls::count(&backend.calls.refresh), 1);

    // Logged out: the next visit is turned away without calling the backend.
    let resp = client.get(format!("{base}/account")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert!(location(&resp).starts_with("/auth/login"));
    assert_eq!(Calls::count(&backend.calls.refresh), 1);
}

#[tokio::test]
async fn test_guest_checkout_places_order_and_clears_cart() {
    let backend = StubBackend::start().await;
    let base = spawn_storefront(&backend).await;
    let client = browser();

    client
        .post(format!("{base}/cart/add"))
        .header("HX-Request", "true")
        .form(&[("slug", PRODUCT_SLUG), ("quantity", "2")])
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/checkout"))
        .form(&[
            ("full_name", "Blerim Hoxha"),
            ("email", "blerim@lodra.al"),
            ("phone", "069 123 4567"),
            ("address", "Rruga e Kavajës 5"),
            ("city", "Tiranë"),
            ("payment_method", "cash_on_delivery"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/checkout/success/{TRACKING_CODE}"));

    let order = backend.calls.last_order.lock().unwrap().clone().unwrap();
    assert_eq!(order["items"][0]["product_id"], 2);
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["guest"]["email"], "blerim@lodra.al");
    assert_eq!(order["payment_method"], "cash_on_delivery");
    assert_eq!(order["use_loyalty_points"], false);

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">0</span>"));

    let success = client
        .get(format!("{base}/checkout/success/{TRACKING_CODE}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(success.contains(TRACKING_CODE));

    let track = client
        .get(format!("{base}/orders/track"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(track.contains(&format!("value=\"{TRACKING_CODE}\"")));
}
