//! Wire types exchanged with the API gateway.
//!
//! Field names follow the backend's JSON exactly. Optional fields default so
//! that older services which omit them still deserialize.

use bakery_core::{
    BinId, CartItemId, Email, OrderId, Price, ProductId, Quantity, ShipmentId, ShipmentItemId,
    ShipmentStatus, StorageRuleId, UserId, UserRole, WarehouseId,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

// =============================================================================
// Accounts
// =============================================================================

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub user_role: UserRole,
}

impl User {
    /// "First Last", falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of login and register answers.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub message: Option<String>,
    pub user: User,
}

/// Login request body.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// New account fields, for self-registration and for staff creation.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    /// Left empty for storefront sign-up; the auth service then assigns `client`.
    pub user_role: Option<UserRole>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("user_role", &self.user_role)
            .finish()
    }
}

/// Register request body, borrowing from a [`Registration`].
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
}

impl<'a> From<&'a Registration> for RegisterRequest<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            username: &registration.username,
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            user_role: registration.user_role,
        }
    }
}

/// Profile fields the user can change. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    /// Whether nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

/// A non-client account as listed by `/auth/staff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub user_role: UserRole,
}

// =============================================================================
// Catalog
// =============================================================================

/// A bakery product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    pub price: Price,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub composition: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub storage_rule_id: Option<StorageRuleId>,
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub composition: String,
    pub weight: f64,
    pub price: Price,
    pub photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_rule_id: Option<StorageRuleId>,
}

/// Answer of `/product/info/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductInfoResponse {
    #[serde(default)]
    pub product: Option<Product>,
}

/// Answer of `/product/verify/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCheck {
    pub exists: bool,
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// A cart line as stored by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Body of `/cart/add` and `/cart/update/{id}`.
#[derive(Debug, Serialize)]
pub(crate) struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

// =============================================================================
// Warehouse
// =============================================================================

/// A warehouse site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub working_hours: Option<String>,
}

/// Fields for creating or updating a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseInput {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
}

/// A storage bin, optionally holding one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinLocation {
    pub id: BinId,
    pub warehouse_id: WarehouseId,
    pub zone: String,
    pub aisle: String,
    pub rack: String,
    pub bin_code: String,
    #[serde(default)]
    pub storage_rule_id: Option<StorageRuleId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// Fields for creating or updating a bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinInput {
    pub warehouse_id: WarehouseId,
    pub zone: String,
    pub aisle: String,
    pub rack: String,
    pub bin_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_rule_id: Option<StorageRuleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

/// Storage constraints attached to products and bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRule {
    pub id: StorageRuleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_hazardous: bool,
    #[serde(default)]
    pub is_oversized: bool,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
}

/// Fields for creating a storage rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRuleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_hazardous: bool,
    pub is_oversized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
}

/// One product line for a WMS check or commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

#[derive(Debug, Serialize)]
pub(crate) struct WmsRequest<'a> {
    pub items: &'a [WmsItem],
}

/// A product that cannot be fully served from stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsShortage {
    pub product_id: ProductId,
    pub requested: i32,
    pub available: i32,
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsCheckResponse {
    pub ok: bool,
    #[serde(default)]
    pub shortages: Vec<WmsShortage>,
}

/// Stock taken from one bin during a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsAllocation {
    pub warehouse_id: WarehouseId,
    pub bin_id: BinId,
    pub deducted: i32,
}

/// Per-product outcome of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsCommitItem {
    pub product_id: ProductId,
    pub deducted: i32,
    #[serde(default)]
    pub allocations: Vec<WmsAllocation>,
}

/// Result of a stock commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmsCommitResponse {
    pub ok: bool,
    #[serde(default)]
    pub shortages: Vec<WmsShortage>,
    #[serde(default)]
    pub items: Vec<WmsCommitItem>,
}

// =============================================================================
// Shipping
// =============================================================================

/// One product line of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub id: ShipmentItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub address: String,
    pub tracking_code: String,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub courier_id: Option<UserId>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub items: Vec<ShipmentItem>,
}

/// Fields for creating a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_id: Option<UserId>,
    pub items: Vec<WmsItem>,
}

/// Body of `PATCH /shipping/{code}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShipmentStatusUpdate {
    pub status: ShipmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier_id: Option<UserId>,
}

// =============================================================================
// Orders
// =============================================================================

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(default)]
    pub price: Option<Price>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: Option<Price>,
}

impl Order {
    /// Server total, or the sum of priced lines when the server sent none.
    #[must_use]
    pub fn total(&self) -> Price {
        self.total.unwrap_or_else(|| {
            self.items
                .iter()
                .filter_map(|item| item.price.map(|price| price.times(item.quantity)))
                .sum()
        })
    }
}
