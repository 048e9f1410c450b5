//! Integration tests for Emporium.
//!
//! [`FakeBackend`] serves the storefront REST API from memory on an
//! ephemeral port, so the tests in `tests/` drive the real [`ApiClient`]
//! (cookies, status codes and wire shapes included) without a database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! # Seed data
//!
//! | Product | Sizes (stock) | Price |
//! |---|---|---|
//! | `p-runner` Trail Runner | 9 (2), 10 (5) | 2500 |
//! | `p-tee` Logo Tee | S (10), M (1), L (0) | 500 |
//! | `p-tote` Canvas Tote | none, flat stock 3 | 799.50 |
//!
//! Accounts: [`SHOPPER_EMAIL`], [`OTHER_SHOPPER_EMAIL`] and [`ADMIN_EMAIL`],
//! all with [`PASSWORD`]. `POST /api/auth/register` adds more.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use emporium_core::{Money, OrderStatus, ProductSnapshot};
use emporium_storefront::api::Credentials;
use emporium_storefront::{ApiClient, ApiConfig, CartStore, SyncAdapter};

pub const SHOPPER_EMAIL: &str = "asha@example.com";
pub const OTHER_SHOPPER_EMAIL: &str = "ravi@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "correct horse battery";

const SESSION_COOKIE: &str = "sid";

/// Credentials for the seeded shopper.
#[must_use]
pub fn shopper() -> Credentials {
    Credentials::new(SHOPPER_EMAIL, PASSWORD)
}

/// Credentials for a second seeded shopper.
#[must_use]
pub fn other_shopper() -> Credentials {
    Credentials::new(OTHER_SHOPPER_EMAIL, PASSWORD)
}

/// Credentials for the seeded admin.
#[must_use]
pub fn admin() -> Credentials {
    Credentials::new(ADMIN_EMAIL, PASSWORD)
}

/// A client pointed at a port nothing listens on.
///
/// # Panics
///
/// Panics if no local port can be reserved.
#[must_use]
pub fn unreachable_client() -> ApiClient {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve a port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    client_for(&format!("http://{addr}/"))
}

/// A logged-in session: client, sync adapter and the adopted server cart.
pub struct Shopper {
    pub client: ApiClient,
    pub sync: SyncAdapter<ApiClient>,
    pub store: CartStore,
}

fn client_for(base_url: &str) -> ApiClient {
    let config = ApiConfig::new(base_url).expect("valid base url");
    ApiClient::new(&config).expect("build api client")
}

// =============================================================================
// Backend state
// =============================================================================

struct Account {
    id: String,
    name: String,
    email: String,
    password: String,
    role: &'static str,
}

impl Account {
    fn seeded(id: &str, name: &str, email: &str, role: &'static str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    pub product_id: String,
    pub size: Option<String>,
    pub quantity: i64,
}

struct OrderRow {
    product_id: String,
    name: String,
    size: Option<String>,
    quantity: i64,
}

struct StoredOrder {
    id: String,
    owner: String,
    items: Vec<OrderRow>,
    total: Money,
    status: OrderStatus,
    created_at: String,
}

#[derive(Default)]
struct BackendState {
    products: Vec<ProductSnapshot>,
    accounts: Vec<Account>,
    /// Session id to account email.
    sessions: HashMap<String, String>,
    /// Account email to cart rows. No entry means "no cart yet".
    carts: HashMap<String, Vec<CartRow>>,
    orders: Vec<StoredOrder>,
    failing: HashSet<String>,
    /// Paths whose successful replies get an unreadable body.
    garbled: HashSet<String>,
    next_id: u64,
}

impl BackendState {
    fn seeded() -> Self {
        let products = [
            json!({
                "_id": "p-runner",
                "name": "Trail Runner",
                "price": 2500,
                "image": "runner.jpg",
                "category": "Shoes",
                "sizes": [{"size": "9", "stock": 2}, {"size": "10", "stock": 5}]
            }),
            json!({
                "_id": "p-tee",
                "name": "Logo Tee",
                "price": 500,
                "image": "tee.jpg",
                "category": "Apparel",
                "sizes": [
                    {"size": "S", "stock": 10},
                    {"size": "M", "stock": 1},
                    {"size": "L", "stock": 0}
                ]
            }),
            json!({
                "_id": "p-tote",
                "name": "Canvas Tote",
                "price": 799.5,
                "image": "tote.jpg",
                "category": "Bags",
                "sizes": [],
                "stock": 3
            }),
        ]
        .into_iter()
        .map(|value| serde_json::from_value(value).expect("seed product"))
        .collect();

        Self {
            products,
            accounts: vec![
                Account::seeded("u-asha", "Asha", SHOPPER_EMAIL, "user"),
                Account::seeded("u-ravi", "Ravi", OTHER_SHOPPER_EMAIL, "user"),
                Account::seeded("u-admin", "Admin", ADMIN_EMAIL, "admin"),
            ],
            ..Self::default()
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn product(&self, id: &str) -> Option<&ProductSnapshot> {
        self.products.iter().find(|p| p.id.as_str() == id)
    }

    fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }

    fn user_json(&self, email: &str) -> Value {
        self.account(email).map_or(Value::Null, |a| {
            json!({"_id": a.id, "name": a.name, "email": a.email, "role": a.role})
        })
    }

    fn session_email(&self, headers: &HeaderMap) -> Option<String> {
        self.sessions.get(&session_id(headers)?).cloned()
    }

    /// Units available for a product and size. Sizeless products use the
    /// flat stock.
    fn available(&self, product_id: &str, size: Option<&str>) -> Result<i64, Response> {
        let product = self
            .product(product_id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Product not found"))?;
        if !product.has_sizes() {
            return Ok(product.stock);
        }
        let size = size
            .filter(|s| !s.is_empty())
            .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Please select a size"))?;
        product
            .sizes
            .iter()
            .find(|s| s.size == size)
            .map(|s| s.stock)
            .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Size not available"))
    }

    fn adjust_stock(&mut self, product_id: &str, size: Option<&str>, delta: i64) {
        let Some(product) = self.products.iter_mut().find(|p| p.id.as_str() == product_id) else {
            return;
        };
        if product.sizes.is_empty() {
            product.stock += delta;
        } else if let Some(entry) = product
            .sizes
            .iter_mut()
            .find(|s| Some(s.size.as_str()) == size)
        {
            entry.stock += delta;
        }
    }

    fn normalize_size(&self, product_id: &str, size: Option<String>) -> Option<String> {
        match self.product(product_id) {
            Some(product) if product.has_sizes() => size.filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    fn cart_json(&self, email: &str) -> Value {
        let Some(rows) = self.carts.get(email) else {
            return Value::Null;
        };
        let items: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "productId": self.product(&row.product_id),
                    "size": row.size,
                    "quantity": row.quantity,
                })
            })
            .collect();
        json!({ "user": email, "items": items })
    }

    fn order_json(order: &StoredOrder) -> Value {
        let items: Vec<Value> = order
            .items
            .iter()
            .map(|row| {
                json!({
                    "productId": {"_id": row.product_id, "name": row.name},
                    "size": row.size,
                    "quantity": row.quantity,
                })
            })
            .collect();
        json!({
            "_id": order.id,
            "items": items,
            "totalAmount": order.total,
            "status": order.status,
            "createdAt": order.created_at,
        })
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_authorized() -> Response {
    reject(StatusCode::UNAUTHORIZED, "Not authorized, no token")
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// Server
// =============================================================================

/// In-memory storefront backend bound to an ephemeral local port.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Start a seeded backend.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));

        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/me", get(me))
            .route("/api/auth/login", post(login))
            .route("/api/auth/admin/login", post(admin_login))
            .route("/api/auth/logout", post(logout))
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(get_product))
            .route("/api/cart", get(get_cart))
            .route("/api/cart/add", post(add_to_cart))
            .route("/api/cart/update", put(update_cart))
            .route("/api/cart/remove", post(remove_from_cart))
            .route("/api/cart/clear", delete(clear_cart))
            .route("/api/orders", post(place_order).get(list_orders))
            .route("/api/orders/{id}", get(get_order))
            .route("/api/orders/cancel/{id}", put(cancel_order))
            .layer(middleware::from_fn_with_state(state.clone(), inject_faults))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });

        Self { addr, state }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A fresh client with its own cookie jar (its own session).
    #[must_use]
    pub fn client(&self) -> ApiClient {
        client_for(&self.base_url())
    }

    /// Log in on a fresh client and adopt the server cart.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    pub async fn login(&self, credentials: &Credentials) -> Shopper {
        let client = self.client();
        let sync = SyncAdapter::new(client.clone());
        let mut store = CartStore::new();
        sync.login(&mut store, credentials)
            .await
            .expect("seeded account logs in");
        Shopper {
            client,
            sync,
            store,
        }
    }

    /// Answer every request to `path` with 503 until [`heal`](Self::heal).
    pub fn fail(&self, path: &str) {
        lock(&self.state).failing.insert(path.to_string());
    }

    /// Let requests to `path` run as usual but replace any successful reply
    /// body with something that is not JSON.
    pub fn garble(&self, path: &str) {
        lock(&self.state).garbled.insert(path.to_string());
    }

    pub fn heal(&self, path: &str) {
        let mut state = lock(&self.state);
        state.failing.remove(path);
        state.garbled.remove(path);
    }

    pub fn set_stock(&self, product_id: &str, size: Option<&str>, stock: i64) {
        let mut state = lock(&self.state);
        let current = state.available(product_id, size).unwrap_or(0);
        state.adjust_stock(product_id, size, stock - current);
    }

    #[must_use]
    pub fn stock(&self, product_id: &str, size: Option<&str>) -> i64 {
        lock(&self.state).available(product_id, size).unwrap_or(0)
    }

    /// Remove a product from the catalog, leaving carts that reference it.
    pub fn delete_product(&self, product_id: &str) {
        lock(&self.state)
            .products
            .retain(|p| p.id.as_str() != product_id);
    }

    /// Put rows straight into an account's server cart.
    pub fn seed_cart(&self, email: &str, rows: &[(&str, Option<&str>, i64)]) {
        let rows = rows
            .iter()
            .map(|(product_id, size, quantity)| CartRow {
                product_id: (*product_id).to_string(),
                size: size.map(str::to_string),
                quantity: *quantity,
            })
            .collect();
        lock(&self.state).carts.insert(email.to_string(), rows);
    }

    /// An account's server cart, or `None` if it has none.
    #[must_use]
    pub fn server_cart(&self, email: &str) -> Option<Vec<CartRow>> {
        lock(&self.state).carts.get(email).cloned()
    }

    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) {
        if let Some(order) = lock(&self.state)
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
        {
            order.status = status;
        }
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }
}

async fn inject_faults(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (failing, garbled) = {
        let state = lock(&state);
        let path = request.uri().path();
        (state.failing.contains(path), state.garbled.contains(path))
    };
    if failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response();
    }

    let response = next.run(request).await;
    if garbled && response.status().is_success() {
        return (response.status(), "<html>OK</html>").into_response();
    }
    response
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut state = lock(&state);
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Please fill all fields");
    }
    if state.account(&body.email).is_some() {
        return reject(StatusCode::BAD_REQUEST, "User already exists");
    }

    let id = state.next_id("u");
    state.accounts.push(Account {
        id,
        name: body.name,
        email: body.email,
        password: body.password,
        role: "user",
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    )
        .into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match state.session_email(&headers) {
        Some(email) => Json(json!({ "user": state.user_json(&email) })).into_response(),
        None => not_authorized(),
    }
}

fn open_session(state: &Shared, body: &LoginBody, admin_only: bool) -> Response {
    let mut state = lock(state);
    let Some(account) = state.account(&body.email) else {
        return reject(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    if body.password != account.password {
        return reject(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    if admin_only && account.role != "admin" {
        return reject(StatusCode::FORBIDDEN, "Access denied, admin only");
    }

    let email = account.email.clone();
    let sid = state.next_id("sid");
    state.sessions.insert(sid.clone(), email.clone());

    let cookie = format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly");
    let mut response = Json(json!({ "user": state.user_json(&email) })).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    open_session(&state, &body, false)
}

async fn admin_login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    open_session(&state, &body, true)
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(sid) = session_id(&headers) {
        lock(&state).sessions.remove(&sid);
    }

    let mut response = Json(json!({ "message": "Logged out" })).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("sid=; Path=/; Max-Age=0"),
    );
    response
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Response {
    Json(json!(lock(&state).products)).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    match lock(&state).product(&id) {
        Some(product) => Json(json!(product)).into_response(),
        None => reject(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    product_id: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    quantity: i64,
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    Json(state.cart_json(&email)).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    if body.quantity <= 0 {
        return reject(StatusCode::BAD_REQUEST, "Quantity must be positive");
    }
    let size = state.normalize_size(&body.product_id, body.size);
    let available = match state.available(&body.product_id, size.as_deref()) {
        Ok(available) => available,
        Err(response) => return response,
    };

    let rows = state.carts.entry(email.clone()).or_default();
    let current = rows
        .iter()
        .find(|r| r.product_id == body.product_id && r.size == size)
        .map_or(0, |r| r.quantity);
    if current + body.quantity > available {
        return reject(
            StatusCode::BAD_REQUEST,
            &format!("Only {} left in stock", available.max(0)),
        );
    }

    match rows
        .iter_mut()
        .find(|r| r.product_id == body.product_id && r.size == size)
    {
        Some(row) => row.quantity += body.quantity,
        None => rows.push(CartRow {
            product_id: body.product_id,
            size,
            quantity: body.quantity,
        }),
    }
    Json(state.cart_json(&email)).into_response()
}

async fn update_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    let size = state.normalize_size(&body.product_id, body.size);
    let available = match state.available(&body.product_id, size.as_deref()) {
        Ok(available) => available,
        Err(response) => return response,
    };
    if body.quantity > available {
        return reject(
            StatusCode::BAD_REQUEST,
            &format!("Only {} left in stock", available.max(0)),
        );
    }

    let rows = state.carts.entry(email.clone()).or_default();
    let Some(index) = rows
        .iter()
        .position(|r| r.product_id == body.product_id && r.size == size)
    else {
        return reject(StatusCode::NOT_FOUND, "Item not in cart");
    };
    if body.quantity <= 0 {
        rows.remove(index);
    } else if let Some(row) = rows.get_mut(index) {
        row.quantity = body.quantity;
    }
    Json(state.cart_json(&email)).into_response()
}

async fn remove_from_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    let size = state.normalize_size(&body.product_id, body.size);
    if let Some(rows) = state.carts.get_mut(&email) {
        rows.retain(|r| !(r.product_id == body.product_id && r.size == size));
    }
    Json(state.cart_json(&email)).into_response()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    if let Some(rows) = state.carts.get_mut(&email) {
        rows.clear();
    }
    Json(json!({ "message": "Cart cleared" })).into_response()
}

// =============================================================================
// Orders
// =============================================================================

async fn place_order(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    let rows = state.carts.get(&email).cloned().unwrap_or_default();
    if rows.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let mut items = Vec::with_capacity(rows.len());
    let mut total = Money::ZERO;
    for row in &rows {
        let Some(product) = state.product(&row.product_id) else {
            return reject(StatusCode::BAD_REQUEST, "A product in your cart no longer exists");
        };
        let available = state
            .available(&row.product_id, row.size.as_deref())
            .unwrap_or(0);
        if row.quantity > available {
            return reject(
                StatusCode::BAD_REQUEST,
                &format!("Insufficient stock for {}", product.name),
            );
        }
        total = total + product.price.times(u32::try_from(row.quantity).unwrap_or(0));
        items.push(OrderRow {
            product_id: row.product_id.clone(),
            name: product.name.clone(),
            size: row.size.clone(),
            quantity: row.quantity,
        });
    }

    for row in &rows {
        state.adjust_stock(&row.product_id, row.size.as_deref(), -row.quantity);
    }
    state.carts.insert(email.clone(), Vec::new());

    let order = StoredOrder {
        id: state.next_id("order"),
        owner: email,
        items,
        total,
        status: OrderStatus::Pending,
        created_at: "2026-10-17T10:00:00.000Z".to_string(),
    };
    let body = json!({ "message": "Order placed", "order": BackendState::order_json(&order) });
    state.orders.push(order);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    let orders: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .filter(|o| o.owner == email)
        .map(BackendState::order_json)
        .collect();
    Json(json!(orders)).into_response()
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    match state.orders.iter().find(|o| o.id == id && o.owner == email) {
        Some(order) => Json(BackendState::order_json(order)).into_response(),
        None => reject(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn cancel_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let Some(email) = state.session_email(&headers) else {
        return not_authorized();
    };
    let Some(order) = state
        .orders
        .iter_mut()
        .find(|o| o.id == id && o.owner == email)
    else {
        return reject(StatusCode::NOT_FOUND, "Order not found");
    };
    if !order.status.is_cancellable() {
        return reject(StatusCode::BAD_REQUEST, "Order cannot be cancelled");
    }
    order.status = OrderStatus::Cancelled;

    let restock: Vec<(String, Option<String>, i64)> = order
        .items
        .iter()
        .map(|row| (row.product_id.clone(), row.size.clone(), row.quantity))
        .collect();
    for (product_id, size, quantity) in restock {
        state.adjust_stock(&product_id, size.as_deref(), quantity);
    }
    Json(json!({ "message": "Order cancelled" })).into_response()
}
