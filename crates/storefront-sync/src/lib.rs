//! # storefront-sync: Sync Coordinator for the Storefront Client
//!
//! This crate keeps the product store from `storefront-core` consistent
//! with the remote record service, or with local storage when offline.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Sync Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  AppContext (init / shutdown)                    │  │
//! │  │   theme • session • deferred deep link • accounts                │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │  ┌────────────────────────────▼─────────────────────────────────────┐  │
//! │  │                       SyncCoordinator                            │  │
//! │  │   pull-on-focus • write-through • tickets & generations          │  │
//! │  └───────┬─────────────────────┬─────────────────────┬──────────────┘  │
//! │          ▼                     ▼                     ▼                  │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌──────────────────────┐  │
//! │  │ RecordService  │  │  ChangeListener    │  │   KeyValueStore      │  │
//! │  │                │  │                    │  │                      │  │
//! │  │ select/insert/ │  │ change event →     │  │ products (offline),  │  │
//! │  │ update/delete/ │  │ full re-pull       │  │ purchased_ids,       │  │
//! │  │ subscribe      │  │                    │  │ user_data, app_theme │  │
//! │  └────────────────┘  └────────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  STATUS EVENTS (to SyncEventEmitter):                                  │
//! │  • emit_status   - mode, attached, counts, last refresh/error          │
//! │  • emit_products - snapshot after every applied change                 │
//! │  • emit_error    - failed pulls and persistence problems               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`coordinator`] - `SyncCoordinator`, status, emitter, builder
//! - [`listener`] - Background change listener
//! - [`service`] - `RecordService` trait, query builder, memory adapter
//! - [`protocol`] - Wire rows, change events, canonical queries
//! - [`persistence`] - `KeyValueStore` trait, memory and file stores
//! - [`preferences`] - Theme load/save/toggle
//! - [`account`] - Registration, login, session
//! - [`context`] - `AppContext` with explicit init/teardown
//! - [`config`] - Configuration (mode, timeouts, data dir)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_sync::{AppContext, FileKeyValueStore, MemoryRecordService, StorefrontConfig};
//!
//! let config = StorefrontConfig::load_or_default(None);
//! let context = AppContext::builder(config)
//!     .with_storage(Arc::new(FileKeyValueStore::new("storage.json")))
//!     .with_service(Arc::new(MemoryRecordService::storefront()))
//!     .build()?;
//!
//! context.init().await;
//! context.coordinator().attach().await?;
//! println!("{} products", context.coordinator().products().len());
//! context.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod listener;
pub mod persistence;
pub mod preferences;
pub mod protocol;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use account::{AccountService, Credentials, Registration, UserProfile, UserSession};
pub use config::{StorefrontConfig, SyncMode};
pub use context::{AppContext, AppContextBuilder};
pub use coordinator::{
    NoOpEmitter, RefreshOutcome, SharedStore, SyncCoordinator, SyncCoordinatorBuilder,
    SyncEventEmitter, SyncStatus,
};
pub use error::{SyncError, SyncResult};
pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use protocol::{ChangeEvent, ChangeKind};
pub use service::{ChangeSubscription, Filter, MemoryRecordService, Query, RecordService};
