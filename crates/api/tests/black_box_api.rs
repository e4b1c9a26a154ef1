use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use storefront_auth::{JwtClaims, Role};
use storefront_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = storefront_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, user_id: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    storefront_auth::jwt::encode_hs256(&claims, jwt_secret.as_bytes())
        .expect("failed to encode jwt")
}

fn dec(v: &str) -> Decimal {
    v.parse().unwrap()
}

fn data_decimal(body: &serde_json::Value, field: &str) -> Decimal {
    body["data"][field]
        .as_str()
        .unwrap_or_else(|| panic!("{field} missing from data payload"))
        .parse()
        .unwrap()
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    admin_token: &str,
    price: &str,
    stock: i64,
) -> String {
    let res = client
        .post(format!("{}/products", base_url))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": "Widget",
            "price": price,
            "stock": stock,
            "specs": { "color": "red" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_coupon(
    client: &reqwest::Client,
    base_url: &str,
    admin_token: &str,
    code: &str,
    value: &str,
) {
    let now = Utc::now();
    let res = client
        .post(format!("{}/coupons", base_url))
        .bearer_auth(admin_token)
        .json(&json!({
            "code": code,
            "title": "Test coupon",
            "discount_kind": "percentage",
            "discount_value": value,
            "valid_from": now - ChronoDuration::days(1),
            "valid_to": now + ChronoDuration::days(1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/cart", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn identity_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let user_id = UserId::new();
    let token = mint_jwt(jwt_secret, user_id, vec![Role::customer()]);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "customer"));
}

#[tokio::test]
async fn customers_cannot_reach_admin_surface() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let token = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Nope", "price": "1.00", "stock": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/admin/orders", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cart_coupon_checkout_flow() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "100.00", 10).await;
    create_coupon(&client, &srv.base_url, &admin, "SAVE10", "10").await;

    // Add two units.
    let res = client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(data_decimal(&body, "subtotal"), dec("200"));

    // Apply the coupon.
    let res = client
        .post(format!("{}/cart/coupon", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "code": "SAVE10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(data_decimal(&body, "discount"), dec("20"));
    assert_eq!(data_decimal(&body, "total"), dec("180"));

    // Checkout.
    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(data_decimal(&body, "total"), dec("180"));
    assert_eq!(body["data"]["status"], "PENDING");
    let order_number = body["data"]["order_number"].as_str().unwrap();
    assert!(order_number.starts_with("ORD"));

    // Cart is gone (a fresh empty one is created on read).
    let res = client
        .get(format!("{}/cart", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());

    // The order shows up in history.
    let res = client
        .get(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_number"].as_str().unwrap(), order_number);

    // Stock was decremented.
    let res = client
        .get(format!("{}/products/{}", srv.base_url, product_id))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["stock"], 8);
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    // Touch the cart so it exists, then try to check out.
    client
        .get(format!("{}/cart", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "cart_empty");
}

#[tokio::test]
async fn redeem_is_one_shot_per_user() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    create_coupon(&client, &srv.base_url, &admin, "ONESHOT", "25").await;

    let res = client
        .post(format!("{}/coupons/redeem", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "code": "ONESHOT", "order_amount": "200.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(data_decimal(&body, "discount"), dec("50"));
    assert_eq!(data_decimal(&body, "final_price"), dec("150"));

    let res = client
        .post(format!("{}/coupons/redeem", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "code": "ONESHOT", "order_amount": "200.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "coupon_already_used");
}

#[tokio::test]
async fn adding_more_than_stock_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "10.00", 3).await;

    let res = client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
}

#[tokio::test]
async fn admin_drives_the_order_lifecycle() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "10.00", 5).await;

    client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Pending -> Processing is fine.
    let res = client
        .patch(format!("{}/admin/orders/{}", srv.base_url, order_id))
        .bearer_auth(&admin)
        .json(&json!({ "status": "PROCESSING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["status"], "PROCESSING");

    // Skipping to Delivered is not.
    let res = client
        .patch(format!("{}/admin/orders/{}", srv.base_url, order_id))
        .bearer_auth(&admin)
        .json(&json!({ "status": "DELIVERED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Stats reflect the single order.
    let res = client
        .get(format!("{}/admin/orders/stats", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total_orders"], 1);
    assert_eq!(data_decimal(&body, "total_revenue"), dec("10"));
}

#[tokio::test]
async fn redeeming_a_non_positive_amount_is_invalid_input() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    create_coupon(&client, &srv.base_url, &admin, "SAVE10", "10").await;

    let res = client
        .post(format!("{}/coupons/redeem", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "code": "SAVE10", "order_amount": "-200.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    // The rejected attempt did not consume the user's one use.
    let res = client
        .post(format!("{}/coupons/redeem", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "code": "SAVE10", "order_amount": "200.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn delivery_address_flows_into_the_order() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "10.00", 5).await;

    let res = client
        .post(format!("{}/addresses", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({
            "full_name": "Jordan Reyes",
            "address": "12 Canal Road",
            "city": "Lahore",
            "state": "Punjab",
            "postal_code": "54000",
            "country": "PK",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let address_id = body["data"]["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();

    // An address the store has never seen is rejected.
    let res = client
        .put(format!("{}/cart/address", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "address_id": UserId::new().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Another customer cannot use this address either.
    let other = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&other)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let res = client
        .put(format!("{}/cart/address", srv.base_url))
        .bearer_auth(&other)
        .json(&json!({ "address_id": address_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The owner sets it and checkout snapshots it.
    let res = client
        .put(format!("{}/cart/address", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({ "address_id": address_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["address_id"].as_str().unwrap(), address_id);
}

#[tokio::test]
async fn support_tickets_reach_the_admin_queue() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let customer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/support", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({
            "contact": "jordan@example.com",
            "billing_name": "Jordan Reyes",
            "billing_date": Utc::now(),
            "product_serial_no": "SN-1",
            "product_model_no": "MD-1",
            "issue_type": "no_power",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // The customer sees their own ticket.
    let res = client
        .get(format!("{}/support", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // The admin queue has it; customers cannot read the queue.
    let res = client
        .get(format!("{}/admin/support", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["issue_type"], "no_power");

    let res = client
        .get(format!("{}/admin/support", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customers_cannot_read_foreign_orders() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::admin()]);
    let buyer = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let snoop = mint_jwt(jwt_secret, UserId::new(), vec![Role::customer()]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "10.00", 5).await;
    client
        .post(format!("{}/cart/items", srv.base_url))
        .bearer_auth(&buyer)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .bearer_auth(&snoop)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The owner still can.
    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
