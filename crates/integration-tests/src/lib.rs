//! Integration test harness for the EcoBloom storefront.
//!
//! Spawns the real application router over HTTP next to a stub of the
//! EcoBloom backend, so tests drive the full path: browser-shaped requests
//! with a cookie jar on one side, recorded backend traffic on the other.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecobloom-integration-tests
//! ```
//!
//! Tests marked `#[ignore]` additionally require a real backend reachable
//! via `ECOBLOOM_API_URL` plus admin credentials; see `tests/live_backend.rs`.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)] // test harness

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};

use ecobloom_storefront::config::{BackendConfig, StorefrontConfig};
use ecobloom_storefront::state::AppState;

// =============================================================================
// Stub fixtures
// =============================================================================

/// A registered, verified customer the stub accepts.
pub const USER_EMAIL: &str = "asha@example.com";
pub const USER_PASSWORD: &str = "plantsarelife1";
const USER_TOKEN: &str = "stub-user-token";

/// An admin account the stub accepts.
pub const ADMIN_EMAIL: &str = "admin@ecobloom.in";
pub const ADMIN_PASSWORD: &str = "greenthumb22x";
const ADMIN_TOKEN: &str = "stub-admin-token";

/// The OTP the stub treats as correct.
pub const GOOD_OTP: &str = "424242";

/// How many plants the stub catalog holds.
pub const STUB_PLANT_COUNT: usize = 30;

/// A deterministic 24-hex object id for plant `n`.
#[must_use]
pub fn plant_id(n: usize) -> String {
    format!("{n:024x}")
}

/// A deterministic 24-hex object id for order `n`.
#[must_use]
pub fn order_id(n: usize) -> String {
    format!("a{n:023x}")
}

// =============================================================================
// Stub backend state
// =============================================================================

/// Per-endpoint hit counters, for "no network call was made" assertions.
#[derive(Default)]
pub struct Hits {
    pub login: AtomicUsize,
    pub me: AtomicUsize,
    pub register: AtomicUsize,
    pub resend_otp: AtomicUsize,
    pub verify_otp: AtomicUsize,
    pub forgot_password: AtomicUsize,
    pub update_profile: AtomicUsize,
    pub change_password: AtomicUsize,
    pub plants: AtomicUsize,
    pub plants_create: AtomicUsize,
    pub plants_delete: AtomicUsize,
    pub orders_create: AtomicUsize,
    pub orders_mine: AtomicUsize,
    pub orders_admin: AtomicUsize,
    pub contacts: AtomicUsize,
}

impl Hits {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared stub state: counters plus the most recent interesting payloads.
#[derive(Default)]
pub struct StubState {
    pub hits: Hits,
    /// Raw query string of the last `GET /plants` call.
    pub last_plants_query: Mutex<Option<String>>,
    /// Body of the last tracking-status PATCH, with the order id.
    pub last_tracking_patch: Mutex<Option<(String, Value)>>,
    /// Body of the last payment-status PATCH, with the order id.
    pub last_payment_patch: Mutex<Option<(String, Value)>>,
    /// Body of the last `POST /orders`.
    pub last_order_body: Mutex<Option<Value>>,
    /// Body of the last `PUT /users/me`.
    pub last_profile_body: Mutex<Option<Value>>,
    /// Fields of the last multipart `POST /plants`: name, categories, image
    /// byte count.
    pub last_plant_upload: Mutex<Option<(String, Vec<String>, usize)>>,
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "token").then(|| value.to_string())
    })
}

fn stub_user(token: &str) -> Option<Value> {
    match token {
        USER_TOKEN => Some(json!({
            "_id": "66f2a90d9c3b5e0012ab34cd",
            "name": "Asha",
            "email": USER_EMAIL,
            "number": "9876543210",
            "isAdmin": false,
            "isVerified": true,
            "createdAt": "2025-11-02T10:15:00Z",
        })),
        ADMIN_TOKEN => Some(json!({
            "_id": "66f2a90d9c3b5e0012ab34ce",
            "name": "Kiran",
            "email": ADMIN_EMAIL,
            "number": "9876500000",
            "isAdmin": true,
            "isVerified": true,
            "createdAt": "2025-10-01T08:00:00Z",
        })),
        _ => None,
    }
}

/// The fixed stub catalog: ids `plant_id(1..=30)`, categories cycling
/// Indoor/Outdoor/Succulent, every fifth plant out of stock.
fn stub_plants() -> Vec<Value> {
    (1..=STUB_PLANT_COUNT)
        .map(|n| {
            let category = ["Indoor", "Outdoor", "Succulent"][n % 3];
            json!({
                "_id": plant_id(n),
                "name": format!("Plant {n}"),
                "price": 100 + n,
                "image": format!("https://img.ecobloom.test/{n}.jpg"),
                "available": n % 5 != 0,
                "categories": [category],
            })
        })
        .collect()
}

fn reject(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

// =============================================================================
// Stub handlers
// =============================================================================

async fn login(State(stub): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    Hits::bump(&stub.hits.login);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let token = match (email, password) {
        (USER_EMAIL, USER_PASSWORD) => USER_TOKEN,
        (ADMIN_EMAIL, ADMIN_PASSWORD) => ADMIN_TOKEN,
        _ => {
            return Json(json!({ "success": false, "message": "Invalid credentials" }))
                .into_response();
        }
    };

    (
        [(header::SET_COOKIE, format!("token={token}; Path=/"))],
        Json(json!({ "success": true, "message": "Logged in" })),
    )
        .into_response()
}

async fn me(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    Hits::bump(&stub.hits.me);
    match token_from_cookie(&headers).and_then(|t| stub_user(&t)) {
        Some(user) => Json(json!({ "success": true, "user": user })).into_response(),
        None => reject("Not logged in"),
    }
}

async fn register(State(stub): State<Arc<StubState>>, Json(_body): Json<Value>) -> Json<Value> {
    Hits::bump(&stub.hits.register);
    Json(json!({ "success": true, "message": "Registered" }))
}

async fn resend_otp(State(stub): State<Arc<StubState>>, Json(_body): Json<Value>) -> Json<Value> {
    Hits::bump(&stub.hits.resend_otp);
    Json(json!({ "success": true, "message": "OTP sent" }))
}

async fn verify_otp(State(stub): State<Arc<StubState>>, Json(body): Json<Value>) -> Json<Value> {
    Hits::bump(&stub.hits.verify_otp);
    if body["otp"].as_str() == Some(GOOD_OTP) {
        Json(json!({ "success": true, "message": "Verified" }))
    } else {
        Json(json!({ "success": false, "message": "Invalid OTP" }))
    }
}

async fn forgot_password(
    State(stub): State<Arc<StubState>>,
    Json(_body): Json<Value>,
) -> Json<Value> {
    Hits::bump(&stub.hits.forgot_password);
    Json(json!({ "success": true, "message": "OTP sent" }))
}

async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn update_profile(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    Hits::bump(&stub.hits.update_profile);
    if token_from_cookie(&headers).and_then(|t| stub_user(&t)).is_none() {
        return reject("Not logged in");
    }
    *stub.last_profile_body.lock().unwrap() = Some(body);
    Json(json!({ "success": true, "message": "Profile updated" })).into_response()
}

async fn change_password(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    Hits::bump(&stub.hits.change_password);
    if token_from_cookie(&headers).and_then(|t| stub_user(&t)).is_none() {
        return reject("Not logged in");
    }
    if body["currentPassword"].as_str() == Some(USER_PASSWORD)
        || body["currentPassword"].as_str() == Some(ADMIN_PASSWORD)
    {
        Json(json!({ "success": true })).into_response()
    } else {
        Json(json!({ "success": false, "message": "Current password is incorrect" }))
            .into_response()
    }
}

async fn plants(State(stub): State<Arc<StubState>>, uri: Uri) -> Json<Value> {
    Hits::bump(&stub.hits.plants);
    let query = uri.query().unwrap_or_default().to_string();
    *stub.last_plants_query.lock().unwrap() = Some(query.clone());

    let mut page = 1_usize;
    let mut limit = 12_usize;
    let mut category = None;
    let mut available = None;
    let mut search = None;
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urldecode(value);
        match key {
            "page" => page = value.parse().unwrap_or(1),
            "limit" => limit = value.parse().unwrap_or(12),
            "category" => category = Some(value),
            "available" => available = Some(value == "true"),
            "search" => search = Some(value.to_lowercase()),
            _ => {}
        }
    }

    let filtered: Vec<Value> = stub_plants()
        .into_iter()
        .filter(|p| {
            category.as_ref().is_none_or(|c| {
                p["categories"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .any(|k| k.as_str() == Some(c.as_str()))
            })
        })
        .filter(|p| available.is_none_or(|a| p["available"].as_bool() == Some(a)))
        .filter(|p| {
            search.as_ref().is_none_or(|s| {
                p["name"].as_str().unwrap().to_lowercase().contains(s)
            })
        })
        .collect();

    let total = filtered.len();
    let start = (page.saturating_sub(1)) * limit;
    let page_items: Vec<Value> = filtered.into_iter().skip(start).take(limit).collect();

    Json(json!({ "plants": page_items, "total": total }))
}

async fn plant_by_id(Path(id): Path<String>) -> Response {
    match stub_plants()
        .into_iter()
        .find(|p| p["_id"].as_str() == Some(id.as_str()))
    {
        Some(plant) => Json(json!({ "success": true, "plant": plant })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Plant not found" })),
        )
            .into_response(),
    }
}

async fn create_plant(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    mut multipart: axum::extract::Multipart,
) -> Response {
    Hits::bump(&stub.hits.plants_create);
    if token_from_cookie(&headers).as_deref() != Some(ADMIN_TOKEN) {
        return reject("Admin only");
    }

    let mut name = String::new();
    let mut plant_categories = Vec::new();
    let mut image_bytes = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name().unwrap_or_default() {
            "name" => name = field.text().await.unwrap(),
            "categories[]" => plant_categories.push(field.text().await.unwrap()),
            "image" => image_bytes = field.bytes().await.unwrap().len(),
            _ => {
                let _ = field.bytes().await;
            }
        }
    }
    *stub.last_plant_upload.lock().unwrap() = Some((name, plant_categories, image_bytes));

    Json(json!({ "success": true, "message": "Plant added" })).into_response()
}

async fn delete_plant(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Response {
    Hits::bump(&stub.hits.plants_delete);
    if token_from_cookie(&headers).as_deref() != Some(ADMIN_TOKEN) {
        return reject("Admin only");
    }
    Json(json!({ "success": true })).into_response()
}

async fn categories() -> Json<Value> {
    Json(json!({
        "categories": [
            { "_id": "c000000000000000000000a1", "keywords": ["Indoor", "Easy Care"] },
            { "_id": "c000000000000000000000a2", "keywords": ["Bonsai"] },
        ]
    }))
}

async fn create_order(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    Hits::bump(&stub.hits.orders_create);
    if token_from_cookie(&headers).and_then(|t| stub_user(&t)).is_none() {
        return reject("Not logged in");
    }
    *stub.last_order_body.lock().unwrap() = Some(body);
    Json(json!({ "success": true, "order": { "_id": order_id(9) } })).into_response()
}

fn stub_orders() -> Vec<Value> {
    vec![
        json!({
            "_id": order_id(1),
            "items": [
                { "plant": plant_id(1), "quantity": 2, "priceAtPurchase": 101 },
            ],
            "paymentMethod": "COD",
            "paymentStatus": "pending",
            "status": "pending",
            "createdAt": "2026-07-30T12:00:00Z",
            "user": { "name": "Asha", "email": USER_EMAIL },
        }),
        json!({
            "_id": order_id(2),
            "items": [
                { "plant": plant_id(2), "quantity": 1, "price": 102 },
            ],
            "totalAmount": 102,
            "paymentMethod": "UPI",
            "paymentStatus": "paid",
            "status": "confirmed",
            "createdAt": "2026-07-31T09:30:00Z",
            "customerName": "Ravi",
            "customerEmail": "ravi@example.com",
        }),
    ]
}

async fn my_orders(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    Hits::bump(&stub.hits.orders_mine);
    if token_from_cookie(&headers).and_then(|t| stub_user(&t)).is_none() {
        return reject("Not logged in");
    }
    let orders = stub_orders();
    Json(json!({ "orders": [orders[0]], "total": 1 })).into_response()
}

async fn admin_orders(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    Hits::bump(&stub.hits.orders_admin);
    if token_from_cookie(&headers).as_deref() != Some(ADMIN_TOKEN) {
        return reject("Admin only");
    }
    let orders = stub_orders();
    Json(json!({ "orders": orders, "total": 2 })).into_response()
}

async fn patch_payment_status(
    State(stub): State<Arc<StubState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    *stub.last_payment_patch.lock().unwrap() = Some((id, body));
    Json(json!({ "success": true }))
}

async fn patch_tracking_status(
    State(stub): State<Arc<StubState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    *stub.last_tracking_patch.lock().unwrap() = Some((id, body));
    Json(json!({ "success": true }))
}

async fn delete_order(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({ "success": true }))
}

async fn contacts(State(stub): State<Arc<StubState>>, Json(_body): Json<Value>) -> Json<Value> {
    Hits::bump(&stub.hits.contacts);
    Json(json!({ "success": true }))
}

fn urldecode(value: &str) -> String {
    // Good enough for the stub: %20 and + both mean space
    let mut out = String::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(' '),
            b'%' => {
                let hi = bytes.next().unwrap_or(b'0');
                let lo = bytes.next().unwrap_or(b'0');
                let hex = [hi, lo];
                let hex = std::str::from_utf8(&hex).unwrap_or("20");
                out.push(u8::from_str_radix(hex, 16).unwrap_or(b' ') as char);
            }
            other => out.push(other as char),
        }
    }
    out
}

fn stub_router(stub: Arc<StubState>) -> Router {
    Router::new()
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/me", get(me).put(update_profile))
        .route("/users/register", post(register))
        .route("/users/resend-otp", post(resend_otp))
        .route("/users/verify-otp", post(verify_otp))
        .route("/users/forgot-password", post(forgot_password))
        .route("/users/change-password", patch(change_password))
        .route("/plants", get(plants).post(create_plant))
        .route("/plants/{id}", get(plant_by_id).delete(delete_plant))
        .route("/categories", get(categories))
        .route("/orders", post(create_order))
        .route("/orders/me", get(my_orders))
        .route("/orders/admin/orders", get(admin_orders))
        .route(
            "/orders/admin/orders/{id}",
            patch(patch_payment_status).delete(delete_order),
        )
        .route(
            "/orders/admin/orders/{id}/status",
            patch(patch_tracking_status),
        )
        .route("/contacts", post(contacts))
        .with_state(stub)
}

// =============================================================================
// Test application
// =============================================================================

/// A running storefront wired to a fresh stub backend.
pub struct TestApp {
    pub base_url: String,
    pub backend: Arc<StubState>,
}

impl TestApp {
    /// Spawn the stub backend and the storefront on ephemeral ports.
    ///
    /// # Panics
    ///
    /// Panics if either server fails to bind.
    pub async fn spawn() -> Self {
        let stub = Arc::new(StubState::default());

        let backend_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend_addr: SocketAddr = backend_listener.local_addr().unwrap();
        let backend_router = stub_router(Arc::clone(&stub));
        tokio::spawn(async move {
            axum::serve(backend_listener, backend_router).await.unwrap();
        });

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6j"),
            backend: BackendConfig {
                base_url: format!("http://{backend_addr}"),
                auth_cookie: "token".to_string(),
                timeout_secs: 5,
            },
            // Tests hammer the auth routes from one IP; the limiter is
            // covered by its own config flag, not exercised here
            auth_rate_limit: false,
            sentry_dsn: None,
        };

        let state = AppState::new(config).unwrap();
        let app = ecobloom_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            backend: stub,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A browser-shaped client: cookie jar, redirects followed.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// A client that stops at redirects, for asserting Location targets.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn no_redirect_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Log `client` in through the real login form.
    ///
    /// # Panics
    ///
    /// Panics if the login flow does not land on the catalog.
    pub async fn login(&self, client: &reqwest::Client, email: &str, password: &str) {
        let resp = client
            .post(self.url("/auth/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.url().path(), "/", "login should land on the catalog");
    }
}
