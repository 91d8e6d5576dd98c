//! Integration tests for the bakery client.
//!
//! [`MockBackend`] is an in-process stand-in for the API gateway and the
//! services behind it, served by axum on an ephemeral port. It records every
//! request so tests can prove that guarded operations never reach the
//! network.
//!
//! # Fixture
//!
//! | user    | password   | role      |
//! |---------|------------|-----------|
//! | `alice` | `pw`       | client    |
//! | `root`  | `admin-pw` | admin     |
//! | `carl`  | `courier`  | courier   |
//! | `wendy` | `stock`    | warehouse |
//!
//! Products 1 (Croissant, 1.50), 2 (Baguette, 2.20) and 3 (Rye loaf, 4.50);
//! warehouse 1 with bins holding 50 croissants and 5 baguettes; storage
//! rule 1; order 100 and shipment `TRK-0001` for alice.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use bakery_client::models::{
    BinLocation, CartItem, Order, OrderItem, Product, Shipment, ShipmentItem, Staff, StorageRule,
    User, Warehouse, WmsAllocation, WmsCheckResponse, WmsCommitItem, WmsCommitResponse, WmsItem,
    WmsShortage,
};
use bakery_client::session::SessionCache;
use bakery_client::{ClientConfig, Storefront};
use bakery_core::{
    BinId, CartItemId, OrderId, Price, ProductId, Quantity, ShipmentId, ShipmentItemId,
    ShipmentStatus, StorageRuleId, UserId, UserRole, WarehouseId,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// =============================================================================
// MockBackend
// =============================================================================

/// A running mock gateway.
pub struct MockBackend {
    url: String,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a seeded backend on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr: SocketAddr = listener.local_addr().expect("Mock backend has no address");

        let (shutdown, signal) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await;
        });

        Self {
            url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown),
            server,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never for a started backend; the URL is always valid.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api_url(&self.url).expect("Mock URL is valid")
    }

    /// A storefront with an in-memory session cache.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::with_cache(
            self.config(),
            Arc::new(bakery_client::session::MemorySessionCache::new()),
        )
    }

    /// A storefront sharing the given session cache.
    #[must_use]
    pub fn storefront_with_cache(&self, cache: Arc<dyn SessionCache>) -> Storefront {
        Storefront::with_cache(self.config(), cache)
    }

    /// A storefront logged in as a fixture user, with the request log reset.
    ///
    /// # Panics
    ///
    /// Panics if the credentials are rejected.
    pub async fn logged_in(&self, username: &str, password: &str) -> Storefront {
        let app = self.storefront();
        app.session()
            .login(username, &password.to_string().into())
            .await
            .expect("Fixture login failed");
        self.reset_requests();
        app
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.data.lock().log.len()
    }

    /// Requests received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.data.lock().log.clone()
    }

    pub fn reset_requests(&self) {
        self.state.data.lock().log.clear();
    }

    /// Invalidate every issued token; the next authenticated call gets 401.
    pub fn expire_sessions(&self) {
        self.state.data.lock().sessions.clear();
    }

    /// Let `n` more requests see their sessions, then invalidate every token.
    pub fn expire_sessions_after(&self, n: usize) {
        self.state.data.lock().sessions_left = Some(n);
    }

    /// Let `n` more cart deletes succeed, then reject the rest with 500.
    pub fn fail_cart_deletes_after(&self, n: usize) {
        self.state.data.lock().cart_deletes_left = Some(n);
    }

    /// Put a line with a chosen id into a user's server cart.
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist or `quantity` is zero.
    pub fn seed_cart_item(&self, id: i32, username: &str, product_id: i32, quantity: u32) {
        let mut data = self.state.data.lock();
        let user_id = data
            .account(username)
            .map(|account| account.user.id)
            .expect("Unknown fixture user");
        data.cart.push(CartItem {
            id: CartItemId::new(id),
            user_id,
            product_id: ProductId::new(product_id),
            quantity: Quantity::new(quantity).expect("Quantity must be positive"),
        });
    }

    /// The server-side cart of a user, in insertion order.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<CartItem> {
        let data = self.state.data.lock();
        let Some(user_id) = data.account(username).map(|a| a.user.id) else {
            return Vec::new();
        };
        data.cart
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Drop a product from the catalog (cart lines keep pointing at it).
    pub fn remove_product(&self, id: i32) {
        self.state
            .data
            .lock()
            .products
            .retain(|p| p.id != ProductId::new(id));
    }

    /// Stop accepting connections and close idle ones.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.server).await;
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Default)]
struct MockState {
    data: Arc<Mutex<Data>>,
}

struct Account {
    user: User,
    password: String,
}

struct Data {
    accounts: Vec<Account>,
    sessions: HashMap<String, UserId>,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    warehouses: Vec<Warehouse>,
    bins: Vec<BinLocation>,
    rules: Vec<StorageRule>,
    shipments: Vec<Shipment>,
    orders: Vec<Order>,
    next_id: i32,
    cart_deletes_left: Option<usize>,
    sessions_left: Option<usize>,
    log: Vec<String>,
}

impl Data {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.username == username)
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.accounts
            .iter()
            .map(|a| &a.user)
            .find(|user| user.id == id)
    }

    fn issue_token(&mut self, user_id: UserId) -> String {
        let token = format!("tok-{user_id}-{}", self.id());
        self.sessions.insert(token.clone(), user_id);
        token
    }

    fn stock(&self, product_id: ProductId) -> i32 {
        self.bins
            .iter()
            .filter(|bin| bin.product_id == Some(product_id))
            .filter_map(|bin| bin.quantity)
            .sum()
    }

    fn shortages(&self, items: &[WmsItem]) -> Vec<WmsShortage> {
        items
            .iter()
            .filter_map(|item| {
                let requested = i32::try_from(item.quantity.get()).unwrap_or(i32::MAX);
                let available = self.stock(item.product_id);
                (available < requested).then_some(WmsShortage {
                    product_id: item.product_id,
                    requested,
                    available,
                })
            })
            .collect()
    }
}

fn account(id: i32, username: &str, password: &str, first: &str, role: UserRole) -> Account {
    Account {
        user: User {
            id: UserId::new(id),
            username: username.to_string(),
            email: format!("{username}@bakery.example"),
            first_name: first.to_string(),
            last_name: "Test".to_string(),
            user_role: role,
        },
        password: password.to_string(),
    }
}

fn product(id: i32, name: &str, cents: i64, rule: Option<i32>) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        short_description: format!("Fresh {}", name.to_lowercase()),
        full_description: String::new(),
        price: Price::from_cents(cents),
        weight: 250.0,
        composition: "flour, water, salt".to_string(),
        photo: format!("{id}.jpg"),
        storage_rule_id: rule.map(StorageRuleId::new),
    }
}

fn bin(id: i32, code: &str, product_id: Option<i32>, quantity: Option<i32>) -> BinLocation {
    BinLocation {
        id: BinId::new(id),
        warehouse_id: WarehouseId::new(1),
        zone: "A".to_string(),
        aisle: "1".to_string(),
        rack: "1".to_string(),
        bin_code: code.to_string(),
        storage_rule_id: None,
        product_id: product_id.map(ProductId::new),
        quantity,
    }
}

impl Default for Data {
    fn default() -> Self {
        let alice = UserId::new(1);
        Self {
            accounts: vec![
                account(1, "alice", "pw", "Alice", UserRole::Client),
                account(2, "root", "admin-pw", "Rita", UserRole::Admin),
                account(3, "carl", "courier", "Carl", UserRole::Courier),
                account(4, "wendy", "stock", "Wendy", UserRole::Warehouse),
            ],
            sessions: HashMap::new(),
            products: vec![
                product(1, "Croissant", 150, None),
                product(2, "Baguette", 220, None),
                product(3, "Rye loaf", 450, Some(1)),
            ],
            cart: Vec::new(),
            warehouses: vec![Warehouse {
                id: WarehouseId::new(1),
                name: "Central".to_string(),
                address: "1 Mill Road".to_string(),
                working_hours: Some("06:00-22:00".to_string()),
            }],
            bins: vec![
                bin(1, "A-01", Some(1), Some(50)),
                bin(2, "A-02", Some(2), Some(5)),
                bin(3, "A-03", None, None),
            ],
            rules: vec![StorageRule {
                id: StorageRuleId::new(1),
                name: "Dry".to_string(),
                description: Some("Keep dry".to_string()),
                is_hazardous: false,
                is_oversized: false,
                temp_min: Some(10.0),
                temp_max: Some(25.0),
            }],
            shipments: vec![Shipment {
                id: ShipmentId::new(1),
                order_id: OrderId::new(100),
                user_id: alice,
                address: "5 Baker Street".to_string(),
                tracking_code: "TRK-0001".to_string(),
                status: ShipmentStatus::Created,
                courier_id: None,
                created_at: "2024-05-01T08:00:00".to_string(),
                updated_at: "2024-05-01T08:00:00".to_string(),
                items: vec![ShipmentItem {
                    id: ShipmentItemId::new(1),
                    product_id: ProductId::new(1),
                    quantity: Quantity::ONE,
                }],
            }],
            orders: vec![Order {
                id: OrderId::new(100),
                user_id: Some(alice),
                status: "paid".to_string(),
                created_at: "2024-05-01T07:55:00".to_string(),
                items: vec![OrderItem {
                    product_id: ProductId::new(1),
                    quantity: Quantity::ONE,
                    price: Some(Price::from_cents(150)),
                }],
                total: None,
            }],
            next_id: 1000,
            cart_deletes_left: None,
            sessions_left: None,
            log: Vec::new(),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Error answer in the shape the real services use.
struct Failure {
    status: StatusCode,
    body: serde_json::Value,
}

impl Failure {
    /// FastAPI style: `{"detail": ...}`.
    fn detail(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "detail": message }),
        }
    }

    /// Gateway style: `{"error": ...}`.
    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn unauthorized() -> Self {
        Self::detail(StatusCode::UNAUTHORIZED, "Not authenticated")
    }

    fn not_found(what: &str) -> Self {
        Self::error(StatusCode::NOT_FOUND, &format!("{what} not found"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type Reply<T> = Result<Json<T>, Failure>;

fn token_from(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "access_token")
        .map(|(_, value)| {
            value
                .trim_matches('"')
                .trim_start_matches("Bearer ")
                .to_string()
        })
}

fn current_user(data: &Data, headers: &HeaderMap) -> Result<User, Failure> {
    token_from(headers)
        .and_then(|token| data.sessions.get(&token).copied())
        .and_then(|id| data.user(id).cloned())
        .ok_or_else(Failure::unauthorized)
}

fn current_staff(data: &Data, headers: &HeaderMap) -> Result<User, Failure> {
    let user = current_user(data, headers)?;
    if user.user_role.is_staff() {
        Ok(user)
    } else {
        Err(Failure::detail(StatusCode::FORBIDDEN, "Not enough permissions"))
    }
}

fn session_cookie(token: &str) -> String {
    format!("access_token=\"Bearer {token}\"; HttpOnly; Path=/; SameSite=lax")
}

// =============================================================================
// Router
// =============================================================================

fn router(state: MockState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/info", get(info))
        .route("/auth/staff", get(staff_list))
        .route("/user/profile", put(update_profile))
        .route("/product/list", get(product_list))
        .route("/product/info/{id}", get(product_info))
        .route("/product/add", post(product_add))
        .route("/product/update/{id}", put(product_update))
        .route("/product/verify/{name}", get(product_verify))
        .route("/cart", get(cart_list))
        .route("/cart/add", post(cart_add))
        .route("/cart/update/{item_id}", put(cart_update))
        .route("/cart/delete/{item_id}", axum::routing::delete(cart_delete))
        .route(
            "/warehouse/warehouses",
            get(warehouse_list).post(warehouse_create),
        )
        .route(
            "/warehouse/warehouses/{id}",
            put(warehouse_update).delete(warehouse_delete),
        )
        .route("/warehouse/locations/bins", get(bin_list).post(bin_create))
        .route(
            "/warehouse/locations/bins/{id}",
            put(bin_update).delete(bin_delete),
        )
        .route("/warehouse/storage-rules", get(rule_list).post(rule_create))
        .route(
            "/warehouse/storage-rules/{id}",
            axum::routing::delete(rule_delete),
        )
        .route("/warehouse/wms/check", post(wms_check))
        .route("/warehouse/wms/commit", post(wms_commit))
        .route("/shipping", post(shipment_create))
        .route("/shipping/list", get(shipment_list))
        .route("/shipping/{code}/status", patch(shipment_status))
        .route("/orders", get(order_list))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    {
        let mut data = state.data.lock();
        data.log.push(line);
        match data.sessions_left {
            Some(0) => {
                data.sessions.clear();
                data.sessions_left = None;
            }
            Some(left) => data.sessions_left = Some(left - 1),
            None => {}
        }
    }
    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    let mut data = state.data.lock();
    let Some(user) = data
        .account(&body.username)
        .filter(|a| a.password == body.password)
        .map(|a| a.user.clone())
    else {
        return Failure::detail(StatusCode::UNAUTHORIZED, "Incorrect username or password")
            .into_response();
    };
    let token = data.issue_token(user.id);
    (
        [(SET_COOKIE, session_cookie(&token))],
        Json(json!({ "message": "Logged in", "user": user })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    user_role: Option<UserRole>,
}

async fn register(State(state): State<MockState>, Json(body): Json<RegisterBody>) -> Response {
    let mut data = state.data.lock();
    if data.account(&body.username).is_some() {
        return Failure::detail(StatusCode::BAD_REQUEST, "Username already registered")
            .into_response();
    }
    let id = UserId::new(data.id());
    let user = User {
        id,
        username: body.username,
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        user_role: body.user_role.unwrap_or_default(),
    };
    data.accounts.push(Account {
        user: user.clone(),
        password: body.password,
    });
    let token = data.issue_token(id);
    (
        [(SET_COOKIE, session_cookie(&token))],
        Json(json!({ "message": "Registered", "user": user })),
    )
        .into_response()
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from(&headers) {
        state.data.lock().sessions.remove(&token);
    }
    (
        [(
            SET_COOKIE,
            "access_token=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/; SameSite=lax"
                .to_string(),
        )],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

async fn info(State(state): State<MockState>, headers: HeaderMap) -> Reply<User> {
    current_user(&state.data.lock(), &headers).map(Json)
}

async fn staff_list(State(state): State<MockState>, headers: HeaderMap) -> Reply<Vec<Staff>> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    Ok(Json(
        data.accounts
            .iter()
            .filter(|a| a.user.user_role.is_staff())
            .map(|a| Staff {
                id: a.user.id,
                first_name: a.user.first_name.clone(),
                last_name: a.user.last_name.clone(),
                user_role: a.user.user_role,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
struct ProfileBody {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

async fn update_profile(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ProfileBody>,
) -> Reply<User> {
    let mut data = state.data.lock();
    let id = current_user(&data, &headers)?.id;
    let account = data
        .accounts
        .iter_mut()
        .find(|a| a.user.id == id)
        .ok_or_else(Failure::unauthorized)?;
    if let Some(email) = body.email {
        account.user.email = email;
    }
    if let Some(first_name) = body.first_name {
        account.user.first_name = first_name;
    }
    if let Some(last_name) = body.last_name {
        account.user.last_name = last_name;
    }
    Ok(Json(account.user.clone()))
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Deserialize)]
struct ProductBody {
    name: String,
    price: Price,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    full_description: String,
    #[serde(default)]
    composition: String,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    photo: String,
    #[serde(default)]
    storage_rule_id: Option<StorageRuleId>,
}

impl ProductBody {
    fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            short_description: self.short_description,
            full_description: self.full_description,
            price: self.price,
            weight: self.weight,
            composition: self.composition,
            photo: self.photo,
            storage_rule_id: self.storage_rule_id,
        }
    }
}

async fn product_list(State(state): State<MockState>) -> Json<Vec<Product>> {
    Json(state.data.lock().products.clone())
}

async fn product_info(
    State(state): State<MockState>,
    Path(id): Path<i32>,
) -> Reply<serde_json::Value> {
    let data = state.data.lock();
    let product = data
        .products
        .iter()
        .find(|p| p.id == ProductId::new(id))
        .ok_or_else(|| Failure::detail(StatusCode::NOT_FOUND, "Product not found"))?;
    Ok(Json(json!({ "product": product })))
}

async fn product_add(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    if data.products.iter().any(|p| p.name == body.name) {
        return Err(Failure::detail(
            StatusCode::BAD_REQUEST,
            "Product with this name already exists",
        ));
    }
    let id = ProductId::new(data.id());
    data.products.push(body.into_product(id));
    Ok(Json(json!(null)))
}

async fn product_update(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<ProductBody>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let id = ProductId::new(id);
    let slot = data
        .products
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| Failure::not_found("Product"))?;
    *slot = body.into_product(id);
    Ok(Json(json!({ "message": "Product updated" })))
}

async fn product_verify(
    State(state): State<MockState>,
    Path(name): Path<String>,
) -> Json<serde_json::Value> {
    let data = state.data.lock();
    Json(match data.products.iter().find(|p| p.name == name) {
        Some(p) => json!({ "exists": true, "id": p.id, "name": p.name }),
        None => json!({ "exists": false, "id": null, "name": null }),
    })
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
struct CartBody {
    product_id: ProductId,
    quantity: Quantity,
}

async fn cart_list(State(state): State<MockState>, headers: HeaderMap) -> Reply<Vec<CartItem>> {
    let data = state.data.lock();
    let user = current_user(&data, &headers)?;
    Ok(Json(
        data.cart
            .iter()
            .filter(|item| item.user_id == user.id)
            .cloned()
            .collect(),
    ))
}

async fn cart_add(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    let user = current_user(&data, &headers)?;
    if !data.products.iter().any(|p| p.id == body.product_id) {
        return Err(Failure::not_found("Product"));
    }
    if let Some(item) = data
        .cart
        .iter_mut()
        .find(|item| item.user_id == user.id && item.product_id == body.product_id)
    {
        item.quantity = Quantity::new(item.quantity.get() + body.quantity.get())
            .map_err(|e| Failure::error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        return Ok(Json(json!({ "message": "Cart updated" })));
    }
    let id = CartItemId::new(data.id());
    data.cart.push(CartItem {
        id,
        user_id: user.id,
        product_id: body.product_id,
        quantity: body.quantity,
    });
    Ok(Json(json!({ "message": "Added to cart", "id": id })))
}

async fn cart_update(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(item_id): Path<i32>,
    Json(body): Json<CartBody>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    let user = current_user(&data, &headers)?;
    let item = data
        .cart
        .iter_mut()
        .find(|item| item.id == CartItemId::new(item_id) && item.user_id == user.id)
        .ok_or_else(|| Failure::error(StatusCode::NOT_FOUND, "Invalid cart item ID"))?;
    item.product_id = body.product_id;
    item.quantity = body.quantity;
    Ok(Json(json!({ "message": "Cart updated" })))
}

async fn cart_delete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(item_id): Path<i32>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    let user = current_user(&data, &headers)?;
    match data.cart_deletes_left {
        Some(0) => {
            return Err(Failure::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cart service unavailable",
            ));
        }
        Some(left) => data.cart_deletes_left = Some(left - 1),
        None => {}
    }
    let before = data.cart.len();
    data.cart
        .retain(|item| !(item.id == CartItemId::new(item_id) && item.user_id == user.id));
    if data.cart.len() == before {
        return Err(Failure::error(StatusCode::NOT_FOUND, "Invalid cart item ID"));
    }
    Ok(Json(json!({ "message": "Removed from cart" })))
}

// =============================================================================
// Warehouse
// =============================================================================

#[derive(Deserialize)]
struct WarehouseBody {
    name: String,
    address: String,
    #[serde(default)]
    working_hours: Option<String>,
}

async fn warehouse_list(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> Reply<Vec<Warehouse>> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    Ok(Json(data.warehouses.clone()))
}

async fn warehouse_create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<WarehouseBody>,
) -> Reply<Warehouse> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let warehouse = Warehouse {
        id: WarehouseId::new(data.id()),
        name: body.name,
        address: body.address,
        working_hours: body.working_hours,
    };
    data.warehouses.push(warehouse.clone());
    Ok(Json(warehouse))
}

async fn warehouse_update(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<WarehouseBody>,
) -> Reply<Warehouse> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let warehouse = data
        .warehouses
        .iter_mut()
        .find(|w| w.id == WarehouseId::new(id))
        .ok_or_else(|| Failure::not_found("Warehouse"))?;
    warehouse.name = body.name;
    warehouse.address = body.address;
    warehouse.working_hours = body.working_hours;
    Ok(Json(warehouse.clone()))
}

async fn warehouse_delete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<StatusCode, Failure> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let id = WarehouseId::new(id);
    if data.bins.iter().any(|bin| bin.warehouse_id == id) {
        return Err(Failure::detail(
            StatusCode::CONFLICT,
            "Warehouse still has bins",
        ));
    }
    data.warehouses.retain(|w| w.id != id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct BinQuery {
    warehouse_id: Option<i32>,
}

#[derive(Deserialize)]
struct BinBody {
    warehouse_id: WarehouseId,
    zone: String,
    aisle: String,
    rack: String,
    bin_code: String,
    #[serde(default)]
    storage_rule_id: Option<StorageRuleId>,
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    quantity: Option<i32>,
}

impl BinBody {
    fn into_bin(self, id: BinId) -> BinLocation {
        BinLocation {
            id,
            warehouse_id: self.warehouse_id,
            zone: self.zone,
            aisle: self.aisle,
            rack: self.rack,
            bin_code: self.bin_code,
            storage_rule_id: self.storage_rule_id,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

async fn bin_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<BinQuery>,
) -> Reply<Vec<BinLocation>> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    Ok(Json(
        data.bins
            .iter()
            .filter(|bin| {
                query
                    .warehouse_id
                    .is_none_or(|id| bin.warehouse_id == WarehouseId::new(id))
            })
            .cloned()
            .collect(),
    ))
}

async fn bin_create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<BinBody>,
) -> Reply<BinLocation> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    if !data.warehouses.iter().any(|w| w.id == body.warehouse_id) {
        return Err(Failure::not_found("Warehouse"));
    }
    let bin = body.into_bin(BinId::new(data.id()));
    data.bins.push(bin.clone());
    Ok(Json(bin))
}

async fn bin_update(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<BinBody>,
) -> Reply<BinLocation> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let id = BinId::new(id);
    let slot = data
        .bins
        .iter_mut()
        .find(|bin| bin.id == id)
        .ok_or_else(|| Failure::not_found("Bin"))?;
    *slot = body.into_bin(id);
    Ok(Json(slot.clone()))
}

async fn bin_delete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<StatusCode, Failure> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    data.bins.retain(|bin| bin.id != BinId::new(id));
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct RuleBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_hazardous: bool,
    #[serde(default)]
    is_oversized: bool,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
}

async fn rule_list(State(state): State<MockState>, headers: HeaderMap) -> Reply<Vec<StorageRule>> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    Ok(Json(data.rules.clone()))
}

async fn rule_create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<RuleBody>,
) -> Reply<StorageRule> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let rule = StorageRule {
        id: StorageRuleId::new(data.id()),
        name: body.name,
        description: body.description,
        is_hazardous: body.is_hazardous,
        is_oversized: body.is_oversized,
        temp_min: body.temp_min,
        temp_max: body.temp_max,
    };
    data.rules.push(rule.clone());
    Ok(Json(rule))
}

async fn rule_delete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<StatusCode, Failure> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    data.rules.retain(|rule| rule.id != StorageRuleId::new(id));
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct WmsBody {
    items: Vec<WmsItem>,
}

async fn wms_check(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<WmsBody>,
) -> Reply<WmsCheckResponse> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    let shortages = data.shortages(&body.items);
    Ok(Json(WmsCheckResponse {
        ok: shortages.is_empty(),
        shortages,
    }))
}

async fn wms_commit(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<WmsBody>,
) -> Reply<WmsCommitResponse> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let shortages = data.shortages(&body.items);
    if !shortages.is_empty() {
        return Ok(Json(WmsCommitResponse {
            ok: false,
            shortages,
            items: Vec::new(),
        }));
    }

    let mut items = Vec::new();
    for item in &body.items {
        let mut left = i32::try_from(item.quantity.get()).unwrap_or(i32::MAX);
        let mut allocations = Vec::new();
        for bin in data
            .bins
            .iter_mut()
            .filter(|bin| bin.product_id == Some(item.product_id))
        {
            let held = bin.quantity.unwrap_or(0);
            let take = held.min(left);
            if take == 0 {
                continue;
            }
            bin.quantity = Some(held - take);
            left -= take;
            allocations.push(WmsAllocation {
                warehouse_id: bin.warehouse_id,
                bin_id: bin.id,
                deducted: take,
            });
        }
        items.push(WmsCommitItem {
            product_id: item.product_id,
            deducted: allocations.iter().map(|a| a.deducted).sum(),
            allocations,
        });
    }
    Ok(Json(WmsCommitResponse {
        ok: true,
        shortages: Vec::new(),
        items,
    }))
}

// =============================================================================
// Shipping and orders
// =============================================================================

#[derive(Deserialize)]
struct ShipmentBody {
    order_id: OrderId,
    user_id: UserId,
    address: String,
    #[serde(default)]
    courier_id: Option<UserId>,
    items: Vec<WmsItem>,
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: ShipmentStatus,
    #[serde(default)]
    courier_id: Option<UserId>,
}

async fn shipment_create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ShipmentBody>,
) -> Reply<Shipment> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let id = data.id();
    let items = body
        .items
        .iter()
        .map(|item| ShipmentItem {
            id: ShipmentItemId::new(data.id()),
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();
    let shipment = Shipment {
        id: ShipmentId::new(id),
        order_id: body.order_id,
        user_id: body.user_id,
        address: body.address,
        tracking_code: format!("TRK-{id:04}"),
        status: if body.courier_id.is_some() {
            ShipmentStatus::Assigned
        } else {
            ShipmentStatus::Created
        },
        courier_id: body.courier_id,
        created_at: "2024-05-02T09:00:00".to_string(),
        updated_at: "2024-05-02T09:00:00".to_string(),
        items,
    };
    data.shipments.push(shipment.clone());
    Ok(Json(shipment))
}

async fn shipment_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Reply<Vec<Shipment>> {
    let data = state.data.lock();
    current_staff(&data, &headers)?;
    Ok(Json(
        data.shipments
            .iter()
            .filter(|s| {
                query
                    .status
                    .as_deref()
                    .is_none_or(|status| s.status.as_str() == status)
            })
            .cloned()
            .collect(),
    ))
}

async fn shipment_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Json(body): Json<StatusBody>,
) -> Reply<serde_json::Value> {
    let mut data = state.data.lock();
    current_staff(&data, &headers)?;
    let shipment = data
        .shipments
        .iter_mut()
        .find(|s| s.tracking_code == code)
        .ok_or_else(|| Failure::error(StatusCode::NOT_FOUND, "Shipment not found"))?;
    shipment.status = body.status;
    if body.courier_id.is_some() {
        shipment.courier_id = body.courier_id;
    }
    shipment.updated_at = "2024-05-02T10:00:00".to_string();
    Ok(Json(json!({ "message": "Status updated" })))
}

async fn order_list(State(state): State<MockState>, headers: HeaderMap) -> Reply<Vec<Order>> {
    let data = state.data.lock();
    let user = current_user(&data, &headers)?;
    Ok(Json(
        data.orders
            .iter()
            .filter(|order| order.user_id == Some(user.id))
            .cloned()
            .collect(),
    ))
}
