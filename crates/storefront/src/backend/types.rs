//! Wire types for the EcoBloom backend API.
//!
//! The backend is a Mongo-backed REST service: ids arrive as `_id`, field
//! names are camelCase, and several shapes are inconsistent between
//! endpoints (totals sometimes precomputed, plant references sometimes
//! populated). The types here absorb that inconsistency so the rest of the
//! crate sees one canonical view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecobloom_core::{
    CategoryId, Email, OrderId, PaymentMethod, PaymentStatus, Phone, PlantId, Rupees,
    TrackingStatus, UserId,
};

// =============================================================================
// Envelope
// =============================================================================

/// The uniform `{success, message?}` envelope for mutation endpoints.
///
/// A 200 response can still carry `success: false`; callers must branch on
/// the flag, not the status code.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// The identity returned by `GET /users/me`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub number: Option<Phone>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response shape of the identity probe.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Registration payload for `POST /users/register`.
#[derive(Debug, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub number: String,
    pub password: String,
}

// =============================================================================
// Plants and categories
// =============================================================================

/// A catalog plant. Only `_id` is guaranteed; everything else is defaulted
/// because partially populated copies appear inside orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    #[serde(rename = "_id")]
    pub id: PlantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Rupees,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
}

/// A backend category: an id plus keyword strings. The first keyword is the
/// conventional display label.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    /// Display label: the first keyword, or a placeholder.
    #[must_use]
    pub fn label(&self) -> &str {
        self.keywords.first().map_or("Category", String::as_str)
    }
}

/// A category reference on a plant: either a bare keyword string or a
/// populated category object, depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Keyword(String),
    Full(Category),
}

impl CategoryRef {
    /// Display label for chips and dropdowns.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword,
            Self::Full(category) => category.label(),
        }
    }

    /// The value submitted back to the backend: the raw keyword, or the
    /// category id for populated entries.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword,
            Self::Full(category) => category.id.as_str(),
        }
    }
}

/// One page of the catalog: `GET /plants` returns `{plants[], total}`.
#[derive(Debug, Default, Deserialize)]
pub struct PlantPage {
    #[serde(default)]
    pub plants: Vec<Plant>,
    #[serde(default)]
    pub total: u64,
}

/// Response shape of `GET /plants/:id`.
#[derive(Debug, Deserialize)]
pub struct PlantResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub plant: Option<Plant>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /categories` answers either a bare array or `{categories: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CategoriesResponse {
    Wrapped {
        #[serde(default)]
        categories: Vec<Category>,
    },
    Bare(Vec<Category>),
}

impl CategoriesResponse {
    /// Flatten to the category list.
    #[must_use]
    pub fn into_vec(self) -> Vec<Category> {
        match self {
            Self::Wrapped { categories } | Self::Bare(categories) => categories,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Shipping address snapshot stored on every order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub country: String,
}

/// A plant reference on an order line: bare id or populated plant.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlantRef {
    Id(PlantId),
    Populated(Box<Plant>),
}

impl PlantRef {
    /// The referenced plant id.
    #[must_use]
    pub fn id(&self) -> &PlantId {
        match self {
            Self::Id(id) => id,
            Self::Populated(plant) => &plant.id,
        }
    }

    /// The plant name, when the reference is populated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated(plant) => Some(plant.name.as_str()),
        }
    }

    /// The current catalog price, when the reference is populated.
    #[must_use]
    pub fn price(&self) -> Option<Rupees> {
        match self {
            Self::Id(_) => None,
            Self::Populated(plant) => Some(plant.price),
        }
    }
}

/// One order line.
///
/// The unit price arrives as `priceAtPurchase` on most endpoints but as
/// `price` on some, and occasionally only on the populated plant.
/// [`OrderItem::unit_price`] resolves in that order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub plant: Option<PlantRef>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, alias = "price")]
    pub price_at_purchase: Option<Rupees>,
}

impl OrderItem {
    /// Unit price: the purchase-time snapshot, falling back to the populated
    /// plant's catalog price, then zero.
    #[must_use]
    pub fn unit_price(&self) -> Rupees {
        self.price_at_purchase
            .or_else(|| self.plant.as_ref().and_then(PlantRef::price))
            .unwrap_or(Rupees::ZERO)
    }

    /// `unit_price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Rupees {
        self.unit_price().times(self.quantity)
    }
}

/// Customer identity nested under an order's `user` field when populated.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// An order as returned by the order endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, rename = "status")]
    pub tracking_status: TrackingStatus,
    /// Precomputed total; `total` on personal endpoints, `totalAmount` on
    /// the admin endpoint, absent on some.
    #[serde(default, alias = "totalAmount")]
    pub total: Option<Rupees>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

impl Order {
    /// Canonical order total: the precomputed field when the backend sent
    /// one, otherwise the sum of `unit_price × quantity` over the lines.
    #[must_use]
    pub fn total(&self) -> Rupees {
        self.total
            .unwrap_or_else(|| self.items.iter().map(OrderItem::line_total).sum())
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Customer display name: the inline field, else the populated user's.
    #[must_use]
    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.name.as_deref()))
    }

    /// Customer email: the populated user's, else the inline field.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.email.as_deref())
            .or(self.customer_email.as_deref())
    }
}

/// One page of orders. The total arrives as `total` or `count`; when both
/// are missing the page length stands in.
#[derive(Debug, Default, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default, alias = "count")]
    pub total: Option<u64>,
}

impl OrderPage {
    /// Total order count for pagination.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.orders.len() as u64)
    }
}

/// Order line payload for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub plant: PlantId,
    pub quantity: u32,
    pub price_at_purchase: Rupees,
}

/// Order payload for `POST /orders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub address: Address,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Contact
// =============================================================================

/// Contact form payload for `POST /contacts`.
#[derive(Debug, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

// =============================================================================
// Plant admin payloads
// =============================================================================

/// Text fields shared by plant create and update.
#[derive(Debug, Clone)]
pub struct PlantFields {
    pub name: String,
    pub price: Rupees,
    pub categories: Vec<String>,
    pub available: bool,
}

/// An uploaded plant image, passed through to the backend unmodified.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
