//! # storefront-core: Pure Product Logic
//!
//! This crate holds the product store and everything it needs, as pure code
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front end (CLI / app screens)                │   │
//! │  │    Product list ──► Add form ──► Detail form ──► Theme, Links   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-sync (async layer)                   │   │
//! │  │    SyncCoordinator, RecordService, KeyValueStore, accounts      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   store   │  │ validation│  │  deeplink │  │   │
//! │  │   │  Product  │  │  Product  │  │   form    │  │  jualpc:// │  │   │
//! │  │   │  Draft    │  │  Store    │  │   rules   │  │  routes   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO ASYNC                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, drafts, patches, Theme)
//! - [`store`] - The in-memory `ProductStore`
//! - [`validation`] - Form validation and price/quantity parsing
//! - [`money`] - Rupiah formatting
//! - [`deeplink`] - `jualpc://` routing
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{ProductDraft, ProductStore};
//!
//! let mut store = ProductStore::new();
//! let mouse = store
//!     .add(&ProductDraft::new("Mouse", "50000", "3", "Peripherals"))
//!     .unwrap();
//!
//! assert_eq!(store.list().len(), 1);
//! assert!(!mouse.purchased);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod deeplink;
pub mod error;
pub mod money;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use deeplink::Route;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Rupiah;
pub use store::{ProductStore, Snapshot, SubscriberId};
pub use types::*;
