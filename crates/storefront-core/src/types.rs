//! # Domain Types
//!
//! Core domain types used throughout the storefront client.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  ProductDraft   │   │  ProductPatch   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (ProductId) │   │  name  (text)   │   │  name?          │       │
//! │  │  name           │   │  price (text)   │   │  price?         │       │
//! │  │  price (rupiah) │   │  quantity(text) │   │  quantity?      │       │
//! │  │  quantity       │   │  category?      │   │  category?      │       │
//! │  │  category       │   └────────┬────────┘   └─────────────────┘       │
//! │  │  purchased      │            │ validate                              │
//! │  └─────────────────┘            ▼                                       │
//! │                        ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │   NewProduct    │   │    Category     │       │
//! │                        │  parsed, > 0    │   │  id, name       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A product id is either the integer key the record service assigned
//! (`ProductId::Remote`) or a UUID v4 string generated on this device
//! (`ProductId::Local`, offline mode only). Ids are never reused.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Category label shown when a product row carries no category join.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

// =============================================================================
// Product Id
// =============================================================================

/// Unique, immutable product identifier.
///
/// Serialized untagged, so JSON carries a plain number or a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ProductId {
    /// Auto-increment key assigned by the record service.
    Remote(i64),

    /// Locally generated UUID v4 (offline mode).
    Local(String),
}

impl ProductId {
    /// Generates a fresh local id.
    pub fn generate_local() -> Self {
        ProductId::Local(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the remote key, if this id was assigned by the record service.
    pub fn as_remote(&self) -> Option<i64> {
        match self {
            ProductId::Remote(id) => Some(*id),
            ProductId::Local(_) => None,
        }
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Remote(id) => write!(f, "{}", id),
            ProductId::Local(id) => write!(f, "{}", id),
        }
    }
}

/// Parses user input: integers become remote ids, anything else local.
impl std::str::FromStr for ProductId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(id) => ProductId::Remote(id),
            Err(_) => ProductId::Local(s.to_string()),
        })
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        ProductId::Remote(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId::Local(id.to_string())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A sellable item.
///
/// ## Invariants
/// - `name` and `category` are non-empty
/// - `price > 0` and `quantity > 0`
///
/// These are checked before a product enters the store, never after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Whole rupiah (no minor unit).
    pub price: i64,
    pub quantity: i64,
    /// Category label (the joined category name when remote-backed).
    pub category: String,
    /// Local UI flag; never sent upstream.
    #[serde(default)]
    pub purchased: bool,
}

impl Product {
    /// Builds a product from validated input with the given id.
    pub fn from_new(id: ProductId, new: &NewProduct) -> Self {
        Product {
            id,
            name: new.name.clone(),
            price: new.price,
            quantity: new.quantity,
            category: new.category.label().to_string(),
            purchased: false,
        }
    }

    /// Returns a copy with the patch merged in. Unset patch fields keep
    /// their current values.
    pub fn merged(&self, patch: &ProductPatch) -> Self {
        Product {
            id: self.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            price: patch.price.unwrap_or(self.price),
            quantity: patch.quantity.unwrap_or(self.quantity),
            category: patch
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            purchased: self.purchased,
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category as stored by the record service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// How the user picked a category on the add form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
#[ts(export)]
pub enum CategoryChoice {
    /// Picked from the remote category list.
    Existing(Category),

    /// Typed as free text (offline mode, or resolved by name when online).
    Label(String),
}

impl CategoryChoice {
    /// The display label for this choice.
    pub fn label(&self) -> &str {
        match self {
            CategoryChoice::Existing(category) => &category.name,
            CategoryChoice::Label(label) => label,
        }
    }
}

// =============================================================================
// Drafts and Patches
// =============================================================================

/// Raw form input for a new product.
///
/// Price and quantity are kept as the text the user typed; validation
/// parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub category: Option<CategoryChoice>,
}

impl ProductDraft {
    /// Convenience constructor for a free-text category.
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        quantity: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        ProductDraft {
            name: name.into(),
            price: price.into(),
            quantity: quantity.into(),
            category: Some(CategoryChoice::Label(category.into())),
        }
    }
}

/// A validated draft: every field present, numbers parsed and positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub category: CategoryChoice,
}

/// Partial update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
    }
}

// =============================================================================
// Theme
// =============================================================================

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Returns the other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ValidationError::NotAllowed {
                field: "theme".to_string(),
                allowed: vec!["light".to_string(), "dark".to_string()],
            }),
        }
    }
}
