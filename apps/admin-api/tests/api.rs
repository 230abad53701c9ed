//! Router-level tests: the full axum app over an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use facturo_api::{build_router, AppConfig, AppState};
use facturo_db::{Database, DbConfig};

const ADMIN_EMAIL: &str = "admin@example.com";

async fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.admin_email = Some(ADMIN_EMAIL.to_string());
    config.auth.secure_cookies = false;
    config.auth.session_secret = "router-test-secret".to_string();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    build_router(Arc::new(AppState::new(&config, db)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Signs up and signs in; returns (customer id, token).
async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, customer) = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Test User", "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {customer}");

    let (status, session) = send(
        app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        customer["id"].as_str().unwrap().to_string(),
        session["token"].as_str().unwrap().to_string(),
    )
}

async fn create_product(app: &Router, admin: &str, name: &str, price: i64, stock: i64) -> String {
    let (status, product) = send(
        app,
        Method::POST,
        "/api/products",
        Some(admin),
        Some(json!({ "name": name, "price": price, "category": "home", "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create product failed: {product}");
    product["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["migrations"], "1/1");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app().await;

    for uri in ["/api/me", "/api/cart", "/api/invoices", "/api/customers"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    let (status, _) = send(&app, Method::GET, "/api/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_and_admin_resolution() {
    let app = app().await;
    send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Boss", "email": "Admin@Example.com", "password": "secret1" })),
    )
    .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/session")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": ADMIN_EMAIL, "password": "secret1" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/me")
        .header(COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["role"], "admin");
    assert_eq!(me["isAdmin"], true);
    assert_eq!(me["profile"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn signup_rejects_short_password_and_duplicates() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "A", "email": "a@example.com", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    register(&app, "a@example.com").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "name": "A", "email": "A@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn product_writes_are_admin_only() {
    let app = app().await;
    let (_, admin) = register(&app, ADMIN_EMAIL).await;
    let (_, user) = register(&app, "user@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&user),
        Some(json!({ "name": "Mug", "price": 1500, "category": "home", "stock": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let id = create_product(&app, &admin, "Mug", 1500, 3).await;

    // Anonymous catalog reads
    let (status, list) = send(&app, Method::GET, "/api/products?category=home", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/products/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{id}"), Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn cart_clamps_and_ignores_bad_input() {
    let app = app().await;
    let (_, admin) = register(&app, ADMIN_EMAIL).await;
    let (_, user) = register(&app, "user@example.com").await;
    let mug = create_product(&app, &admin, "Mug", 1000, 3).await;

    let (_, cart) = send(&app, Method::POST, "/api/cart/items", Some(&user), Some(json!({ "productId": mug, "quantity": 2 }))).await;
    assert_eq!(cart["items"][0]["quantity"], 2);

    let (_, cart) = send(&app, Method::POST, "/api/cart/items", Some(&user), Some(json!({ "productId": mug, "quantity": 5 }))).await;
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["summary"]["total"], 3000);

    let uri = format!("/api/cart/items/{mug}");
    let (status, cart) = send(&app, Method::PUT, &uri, Some(&user), Some(json!("abc"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 3);

    let (_, cart) = send(&app, Method::PUT, &uri, Some(&user), Some(json!({ "quantity": "1" }))).await;
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (_, cart) = send(&app, Method::PUT, &uri, Some(&user), Some(json!(0))).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    // Persisted between requests
    send(&app, Method::POST, "/api/cart/items", Some(&user), Some(json!({ "productId": mug }))).await;
    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(&user), None).await;
    assert_eq!(cart["summary"]["itemCount"], 1);
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (_, cart) = send(&app, Method::DELETE, "/api/cart", Some(&user), None).await;
    assert_eq!(cart["summary"]["total"], 0);
}

#[tokio::test]
async fn checkout_creates_paid_invoice() {
    let app = app().await;
    let (_, admin) = register(&app, ADMIN_EMAIL).await;
    let (uid, user) = register(&app, "user@example.com").await;
    let mug = create_product(&app, &admin, "Mug", 100, 5).await;

    let (status, body) = send(&app, Method::POST, "/api/checkout", Some(&user), Some(json!({ "paymentMethod": "card" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_CART");

    let (_, cart) = send(&app, Method::POST, "/api/cart/items", Some(&user), Some(json!({ "productId": mug, "quantity": 2 }))).await;
    assert_eq!(cart["summary"]["total"], 200);
    let (status, invoice) = send(&app, Method::POST, "/api/checkout", Some(&user), Some(json!({ "paymentMethod": "pse" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["status"], "paid");
    assert_eq!(invoice["paymentMethod"], "pse");
    assert_eq!(invoice["customerId"], uid.as_str());
    // the paid amount is the cart total shown before checkout
    assert_eq!(invoice["taxRate"], 0);
    assert_eq!(invoice["totals"]["subtotal"], 200);
    assert_eq!(invoice["totals"]["taxAmount"], 0);
    assert_eq!(invoice["totals"]["total"], cart["summary"]["total"]);
    assert!(invoice["invoiceNumber"].as_str().unwrap().starts_with("FAC-"));

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(&user), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (_, product) = send(&app, Method::GET, &format!("/api/products/{mug}"), None, None).await;
    assert_eq!(product["stock"], 3);
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = app().await;
    let (_, admin) = register(&app, ADMIN_EMAIL).await;
    let (user_id, user) = register(&app, "user@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(&user),
        Some(json!({
            "customerId": user_id,
            "items": [{ "description": "Bulk", "quantity": 1i64 << 62, "unitPrice": 4 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, list) = send(&app, Method::GET, "/api/invoices", Some(&user), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({ "name": "Yacht", "price": i64::MAX, "category": "toys", "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mug = create_product(&app, &admin, "Mug", 100, 5).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/products/{mug}"),
        Some(&admin),
        Some(json!({ "name": "Mug", "price": 100, "category": "home", "stock": i64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = send(&app, Method::GET, "/api/cart", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["summary"]["total"], 0);
}

#[tokio::test]
async fn invoices_are_scoped_to_their_owner() {
    let app = app().await;
    let (_, admin) = register(&app, ADMIN_EMAIL).await;
    let (alice_id, alice) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;

    let (status, invoice) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(&alice),
        Some(json!({
            "customerId": alice_id,
            "items": [{ "description": "Consulting", "quantity": 2, "unitPrice": 100 }],
            "taxRate": 1900,
            "discount": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["status"], "pending");
    assert_eq!(invoice["totals"]["total"], 228);
    let uri = format!("/api/invoices/{}", invoice["id"].as_str().unwrap());

    // Bob cannot create for Alice, nor see her invoice
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(&bob),
        Some(json!({
            "customerId": alice_id,
            "items": [{ "description": "x", "quantity": 1, "unitPrice": 1 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, list) = send(&app, Method::GET, "/api/invoices", Some(&bob), None).await;
    assert!(list.as_array().unwrap().is_empty());

    // Even asking for Alice's id, Bob only gets his own
    let (_, list) = send(&app, Method::GET, &format!("/api/invoices?customerId={alice_id}"), Some(&bob), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = send(&app, Method::GET, "/api/invoices", Some(&admin), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Status changes are admin-only
    let status_uri = format!("{uri}/status");
    let (status, _) = send(&app, Method::PUT, &status_uri, Some(&alice), Some(json!({ "status": "paid" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, paid) = send(&app, Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "paid" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");

    let (_, reopened) = send(&app, Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "pending" }))).await;
    assert_eq!(reopened["status"], "pending");

    let paid_uri = format!("{uri}/paid");
    let (status, _) = send(&app, Method::POST, &paid_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    for _ in 0..2 {
        let (status, paid) = send(&app, Method::POST, &paid_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");
    }
}

#[tokio::test]
async fn print_renders_plain_text() {
    let app = app().await;
    let (alice_id, alice) = register(&app, "alice@example.com").await;
    let (_, invoice) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(&alice),
        Some(json!({
            "customerId": alice_id,
            "items": [{ "description": "Consulting", "quantity": 1, "unitPrice": 5000 }]
        })),
    )
    .await;

    let request = Request::builder()
        .uri(format!("/api/invoices/{}/print", invoice["id"].as_str().unwrap()))
        .header(AUTHORIZATION, format!("Bearer {alice}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(invoice["invoiceNumber"].as_str().unwrap()));
    assert!(text.contains("Consulting"));
}

#[tokio::test]
async fn customer_management() {
    let app = app().await;
    let (admin_id, admin) = register(&app, ADMIN_EMAIL).await;
    let (alice_id, alice) = register(&app, "alice@example.com").await;
    let (bob_id, _) = register(&app, "bob@example.com").await;

    let (status, _) = send(&app, Method::GET, "/api/customers", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, list) = send(&app, Method::GET, "/api/customers", Some(&admin), None).await;
    assert_eq!(list.as_array().unwrap().len(), 3);

    // Own record yes, someone else's no
    let (status, _) = send(&app, Method::GET, &format!("/api/customers/{alice_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &format!("/api/customers/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The configured admin is protected
    let (status, body) = send(&app, Method::PUT, &format!("/api/customers/{admin_id}/role"), Some(&admin), Some(json!({ "role": "user" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    let (status, _) = send(&app, Method::DELETE, &format!("/api/customers/{admin_id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promotion takes effect on Alice's next request
    let (status, _) = send(&app, Method::PUT, &format!("/api/customers/{alice_id}/role"), Some(&admin), Some(json!({ "role": "admin" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = send(&app, Method::GET, "/api/me", Some(&alice), None).await;
    assert_eq!(me["role"], "admin");

    // Deleted customers show up as a placeholder on their invoices
    let (_, invoice) = send(
        &app,
        Method::POST,
        "/api/invoices",
        Some(&admin),
        Some(json!({
            "customerId": bob_id,
            "items": [{ "description": "Setup", "quantity": 1, "unitPrice": 100 }]
        })),
    )
    .await;
    let (status, _) = send(&app, Method::DELETE, &format!("/api/customers/{bob_id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, view) = send(&app, Method::GET, &format!("/api/invoices/{}", invoice["id"].as_str().unwrap()), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["customer"]["name"], "Deleted customer");
    assert_eq!(view["customer"]["email"], "Not available");
}

#[tokio::test]
async fn sign_out_expires_cookie() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/auth/session")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}
