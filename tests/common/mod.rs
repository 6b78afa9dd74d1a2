//! Test utilities and fixtures for storefront integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;

pub use storefront::db::{init_db, queries, AppState, DbPool};
pub use storefront::error::{AppError, Result};
pub use storefront::handlers::{admin, auth, orders, products, webhooks};
pub use storefront::jwt;
pub use storefront::models::*;
pub use storefront::payments::{
    verify_signature, CreateSessionRequest, PaymentGateway, PaymentSession,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Password used by all fixture accounts. Hashed at the minimum bcrypt
/// cost so test setup stays fast.
pub const TEST_PASSWORD: &str = "password123";

static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create a pooled test database with schema initialized.
///
/// Shared-cache in-memory databases let every pooled connection see the
/// same data, which plain `:memory:` does not. The pool holds idle
/// connections, so the database lives as long as the pool.
pub fn test_pool() -> DbPool {
    let n = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let uri = format!("file:storefront_test_{}?mode=memory&cache=shared", n);
    let manager = SqliteConnectionManager::file(uri).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")
    });
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .expect("Failed to build test pool");
    {
        let conn = pool.get().expect("Failed to get test connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    pool
}

/// In-memory payment gateway: records session requests, never talks to a
/// network, and verifies webhook signatures with the test secret.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CreateSessionRequest>>,
    pub fail_next: AtomicBool,
    counter: AtomicUsize,
}

impl FakeGateway {
    /// Make the next `create_checkout_session` call fail, simulating a
    /// provider outage.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn session_requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<PaymentSession> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::UpstreamPayment("simulated outage".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentSession {
            id: format!("cs_test_{}", n),
            url: format!("https://pay.example.test/cs_test_{}", n),
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        verify_signature(TEST_WEBHOOK_SECRET, payload, signature)
    }
}

/// AppState backed by a fresh test database and a FakeGateway. The
/// gateway handle is returned separately so tests can inspect it.
pub fn test_state() -> (AppState, Arc<FakeGateway>) {
    let gateway = Arc::new(FakeGateway::default());
    let state = AppState {
        db: test_pool(),
        gateway: gateway.clone(),
        client_url: "http://localhost:5173".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        secure_cookies: false,
    };
    (state, gateway)
}

/// Router with all endpoints but no rate-limit layers. The per-IP
/// governor needs a peer address, which `oneshot` requests don't have.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/categories", get(products::list_categories))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/checkout", post(orders::checkout))
        .route("/orders/mine", get(orders::my_orders))
        .route("/orders/webhook", post(webhooks::payment_webhook))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/orders", get(admin::all_orders))
        .with_state(state)
}

// ============ Fixtures ============

pub fn create_test_user(conn: &Connection, email: &str, role: UserRole) -> User {
    let password_hash = bcrypt::hash(TEST_PASSWORD, 4).expect("Failed to hash test password");
    queries::create_user(
        conn,
        &CreateUser {
            name: format!("Test {}", email),
            email: email.to_string(),
            password_hash,
            role,
        },
    )
    .expect("Failed to create test user")
}

pub fn create_test_product(
    conn: &Connection,
    title: &str,
    category: &str,
    price_cents: i64,
    stock_quantity: i64,
) -> Product {
    queries::create_product(
        conn,
        &CreateProduct {
            title: title.to_string(),
            description: format!("{} description", title),
            price_cents,
            category: category.to_string(),
            stock_quantity,
            image_url: None,
        },
    )
    .expect("Failed to create test product")
}

/// Create a pending order for one product directly at the query layer,
/// bypassing the checkout-time availability check.
pub fn create_test_order(
    conn: &Connection,
    user_id: &str,
    product: &Product,
    quantity: i64,
) -> Order {
    let items = vec![OrderItem {
        product_id: product.id.clone(),
        title: product.title.clone(),
        quantity,
        unit_price_cents: product.price_cents,
    }];
    queries::create_order(conn, user_id, &items).expect("Failed to create test order")
}

/// Session cookie header value for a user, signed with the test secret.
pub fn auth_cookie(user_id: &str) -> String {
    let token = jwt::sign_token(TEST_JWT_SECRET, user_id).expect("Failed to sign test token");
    format!("{}={}", jwt::COOKIE_NAME, token)
}

// ============ Webhook helpers ============

pub fn sign_webhook_at(payload: &[u8], timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac = HmacSha256::new_from_slice(TEST_WEBHOOK_SECRET.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

pub fn sign_webhook(payload: &[u8]) -> String {
    sign_webhook_at(payload, chrono::Utc::now().timestamp())
}

pub fn completed_event(order_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_test_completed",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_test_0", "metadata": { "order_id": order_id } } }
    })
    .to_string()
    .into_bytes()
}

pub fn expired_event(order_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_test_expired",
        "type": "checkout.session.expired",
        "data": { "object": { "id": "cs_test_0", "metadata": { "order_id": order_id } } }
    })
    .to_string()
    .into_bytes()
}

/// A signed webhook request for the given payload.
pub fn webhook_request(payload: Vec<u8>) -> Request<Body> {
    let signature = sign_webhook(&payload);
    Request::builder()
        .method("POST")
        .uri("/orders/webhook")
        .header("content-type", "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

// ============ Request helpers ============

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body should be valid JSON")
}
