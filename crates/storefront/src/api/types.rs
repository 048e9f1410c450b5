//! Wire types for the storefront REST API.
//!
//! Field names follow the backend (`_id`, camelCase). Only the fields the
//! client uses are modelled; unknown fields are ignored.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use emporium_core::{
    LineItem, LineKey, Money, OrderId, OrderStatus, ProductId, ProductSnapshot, UserId, UserRole,
};

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Session
// =============================================================================

/// Logged-in account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

/// `{ user }` envelope used by the auth endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: Option<User>,
}

/// Login credentials.
///
/// The password is held as a secret and only exposed while serializing the
/// login request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        }
    }
}

/// A new shopper account.
///
/// Like [`Credentials`], the password stays secret until the request body
/// is serialized.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

impl Registration {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Registration> for RegisterRequest<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            name: &registration.name,
            email: &registration.email,
            password: registration.password.expose_secret(),
        }
    }
}

/// `{ message }` acknowledgement.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// The server's cart of record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCart {
    #[serde(default)]
    pub items: Vec<ServerCartEntry>,
}

/// One server cart entry, with the product embedded as it was at fetch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCartEntry {
    /// Embedded product. `None` when the product has since been deleted.
    #[serde(rename = "productId")]
    pub product: Option<ProductSnapshot>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: i64,
}

impl ServerCart {
    /// Translate the server cart into local line items.
    ///
    /// Entries whose product no longer exists or whose quantity is not
    /// positive are dropped. An empty size string means "no size".
    #[must_use]
    pub fn into_line_items(self) -> Vec<LineItem> {
        self.items
            .into_iter()
            .filter_map(|entry| {
                let Some(product) = entry.product else {
                    tracing::warn!("Dropping server cart entry for a deleted product");
                    return None;
                };
                let qty = u32::try_from(entry.quantity).ok().filter(|q| *q > 0)?;
                let size = entry.size.filter(|s| !s.is_empty());
                Some(LineItem::from_server(&product, size, qty))
            })
            .collect()
    }
}

/// Body of the add and update cart endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: u32,
}

impl CartLineRequest {
    #[must_use]
    pub fn new(key: &LineKey, quantity: u32) -> Self {
        Self {
            product_id: key.product_id.clone(),
            size: key.size.clone(),
            quantity,
        }
    }
}

/// Body of the remove cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKeyRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
}

impl From<&LineKey> for CartKeyRequest {
    fn from(key: &LineKey) -> Self {
        Self {
            product_id: key.product_id.clone(),
            size: key.size.clone(),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// `{ order: { _id } }` returned by order creation.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderCreated {
    pub order: OrderRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderRef {
    #[serde(rename = "_id")]
    pub id: OrderId,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "productId")]
    pub product: Option<OrderProduct>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// Product reference embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    #[serde(rename = "_id", default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
}

impl OrderLine {
    /// Product name, or a placeholder for deleted products.
    #[must_use]
    pub fn product_name(&self) -> &str {
        self.product
            .as_ref()
            .map_or("(removed product)", |p| p.name.as_str())
    }
}
