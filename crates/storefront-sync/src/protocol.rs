//! # Record Service Wire Rows
//!
//! Row shapes exchanged with the record service, plus the change events it
//! pushes over a subscription.
//!
//! ## Table Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Remote Tables                                    │
//! │                                                                         │
//! │  produk                          kategori_produk                        │
//! │  ──────                          ───────────────                        │
//! │  id_produk      (auto key)  ┌──► id_kategori     (auto key)            │
//! │  nama_produk                │    nama_kategori                          │
//! │  harga                      │                                           │
//! │  jumlah_produk              │    user                                   │
//! │  id_kategori  ──────────────┘    ────                                   │
//! │                                  id, username, email, password_hash     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Mapping
//! ```text
//! id_produk                       → Product.id (ProductId::Remote)
//! nama_produk                     → Product.name
//! harga                           → Product.price
//! jumlah_produk                   → Product.quantity
//! kategori_produk.nama_kategori   → Product.category ("Unknown" if missing)
//! ```
//!
//! ## Change Event Format
//! ```json
//! { "event_type": "UPDATE", "table": "produk", "payload": { "id_produk": 3, ... } }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use storefront_core::{Category, Product, ProductId, UNKNOWN_CATEGORY};

use crate::error::{SyncError, SyncResult};
use crate::service::Query;

// =============================================================================
// Table & Column Names
// =============================================================================

/// Product table.
pub const PRODUCT_TABLE: &str = "produk";

/// Category table.
pub const CATEGORY_TABLE: &str = "kategori_produk";

/// User account table.
pub const USER_TABLE: &str = "user";

pub const PRODUCT_ID: &str = "id_produk";
pub const PRODUCT_NAME: &str = "nama_produk";
pub const PRODUCT_PRICE: &str = "harga";
pub const PRODUCT_QUANTITY: &str = "jumlah_produk";
pub const CATEGORY_ID: &str = "id_kategori";
pub const CATEGORY_NAME: &str = "nama_kategori";
pub const USER_ID: &str = "id";
pub const USERNAME: &str = "username";

// =============================================================================
// Product Rows
// =============================================================================

/// A product row as selected with its category joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id_produk: i64,
    pub nama_produk: String,
    pub harga: i64,
    pub jumlah_produk: i64,
    /// Embedded category; `null` when the foreign key dangles or is unset.
    #[serde(default)]
    pub kategori_produk: Option<CategoryNameRow>,
}

/// The embedded `kategori_produk(nama_kategori)` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNameRow {
    #[serde(default)]
    pub nama_kategori: Option<String>,
}

impl ProductRow {
    /// Maps the row onto a domain product. `purchased` starts false; the
    /// coordinator carries local flags over separately.
    pub fn into_product(self) -> Product {
        let category = self
            .kategori_produk
            .and_then(|c| c.nama_kategori)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

        Product {
            id: ProductId::Remote(self.id_produk),
            name: self.nama_produk,
            price: self.harga,
            quantity: self.jumlah_produk,
            category,
            purchased: false,
        }
    }
}

/// Row sent when creating a product. The service assigns `id_produk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInsertRow {
    pub nama_produk: String,
    pub id_kategori: i64,
    pub jumlah_produk: i64,
    pub harga: i64,
}

/// Changed columns for an update. Unset fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdateRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_produk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harga: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jumlah_produk: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_kategori: Option<i64>,
}

impl ProductUpdateRow {
    pub fn is_empty(&self) -> bool {
        self.nama_produk.is_none()
            && self.harga.is_none()
            && self.jumlah_produk.is_none()
            && self.id_kategori.is_none()
    }
}

// =============================================================================
// Category & User Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id_kategori: i64,
    pub nama_kategori: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id_kategori,
            name: row.nama_kategori,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsertRow {
    pub nama_kategori: String,
}

/// A stored user account. Only the Argon2 PHC string is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInsertRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// Change Events
// =============================================================================

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A row change pushed over a subscription.
///
/// `payload` is the new row for inserts and updates, the old row for
/// deletes. Listeners only use the event as a trigger to re-pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_type: ChangeKind,
    pub table: String,
    #[serde(default)]
    pub payload: Value,
}

impl ChangeEvent {
    pub fn new(event_type: ChangeKind, table: &str, payload: Value) -> Self {
        ChangeEvent {
            event_type,
            table: table.to_string(),
            payload,
        }
    }

    /// Serializes to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// Canonical Queries
// =============================================================================

/// All products with their category name, ordered by id ascending.
pub fn product_query() -> Query {
    Query::table(PRODUCT_TABLE)
        .columns(&[PRODUCT_ID, PRODUCT_NAME, PRODUCT_QUANTITY, PRODUCT_PRICE])
        .embed(CATEGORY_TABLE, &[CATEGORY_NAME])
        .order_by(PRODUCT_ID, true)
}

/// All categories ordered by name.
pub fn category_query() -> Query {
    Query::table(CATEGORY_TABLE)
        .columns(&[CATEGORY_ID, CATEGORY_NAME])
        .order_by(CATEGORY_NAME, true)
}

/// Decodes every row or fails as a whole.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> SyncResult<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row)
                .map_err(|e| SyncError::Decode(format!("row {}: {}", index, e)))
        })
        .collect()
}

/// Encodes a row for an insert or update call.
pub fn encode_row<T: Serialize>(row: &T) -> SyncResult<Value> {
    Ok(serde_json::to_value(row)?)
}
