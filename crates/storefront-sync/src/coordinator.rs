//! # Sync Coordinator
//!
//! Keeps the in-memory [`ProductStore`] consistent with its authority: the
//! record service in online mode, local key-value storage in offline mode.
//!
//! ## Coordinator Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SyncCoordinator Architecture                       │
//! │                                                                         │
//! │  UI ── on_focus ──┐        ┌── add / update / remove ── UI              │
//! │                   ▼        ▼                                            │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        SyncCoordinator                           │  │
//! │  │                                                                  │  │
//! │  │  PULL:   select products ⋈ categories → replace_all              │  │
//! │  │  PUSH:   validate → remote write (timeout) → mirror locally      │  │
//! │  │  LOCAL:  toggle_purchased → purchased_ids                        │  │
//! │  └───────────┬──────────────────────────────────▲───────────────────┘  │
//! │              │ subscribe                        │ refresh              │
//! │              ▼                                  │                      │
//! │  ┌────────────────────────┐        ┌────────────┴───────────┐          │
//! │  │     RecordService      │ ─────► │     ChangeListener     │          │
//! │  │  (produk, kategori)    │ events │   (background task)    │          │
//! │  └────────────────────────┘        └────────────────────────┘          │
//! │                                                                         │
//! │  STATUS EVENTS (to emitter):                                           │
//! │  emit_status   - { mode, attached, product_count, last_refresh_at }    │
//! │  emit_products - current snapshot after every applied change           │
//! │  emit_error    - { message, retryable }                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every pull takes a ticket before it goes out. On return:              │
//! │                                                                         │
//! │  if generation changed (detach happened)  → Stale, discard             │
//! │  if ticket <= last_applied                → Stale, discard             │
//! │  else                                     → apply, last_applied=ticket │
//! │                                                                         │
//! │  Mirrored writes take a ticket too, so a pull that left before the     │
//! │  write can never roll it back.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! Pull failures keep the previous snapshot and are reported, never
//! returned. Write failures return the error and leave the store untouched.
//! Nothing is retried automatically.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use storefront_core::validation::{validate_draft, validate_patch, validate_product};
use storefront_core::{
    Category, CategoryChoice, CoreError, Product, ProductDraft, ProductId, ProductPatch,
    ProductStore, Snapshot, ValidationError,
};

use crate::config::{StorefrontConfig, SyncMode};
use crate::error::{SyncError, SyncResult};
use crate::listener::{ChangeListener, ChangeListenerHandle};
use crate::persistence::{keys, read_json, write_json, KeyValueStore, MemoryKeyValueStore};
use crate::protocol::{
    category_query, decode_rows, encode_row, product_query, CategoryInsertRow, CategoryRow,
    ProductInsertRow, ProductRow, ProductUpdateRow, CATEGORY_TABLE, PRODUCT_ID, PRODUCT_TABLE,
};
use crate::service::{with_timeout, Filter, RecordService};

/// The product store shared between the coordinator and the UI.
pub type SharedStore = Arc<RwLock<ProductStore>>;

// =============================================================================
// Sync Status
// =============================================================================

/// Current sync status for external queries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    /// Sync mode.
    pub mode: SyncMode,

    /// Whether a change listener is running.
    pub attached: bool,

    /// Products currently in the store.
    pub product_count: usize,

    /// Last applied pull (RFC 3339).
    pub last_refresh_at: Option<String>,

    /// Last error message (if any).
    pub last_error: Option<String>,

    /// Number of pulls applied.
    pub refresh_count: u64,
}

/// Result of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The store now holds `count` products from the pull.
    Applied { count: usize },

    /// A newer change had already been applied; the response was dropped.
    Stale,

    /// The pull failed; the previous snapshot is kept.
    Failed { message: String },

    /// Nothing to pull (offline mode).
    Skipped,
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { .. })
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives coordinator events (implemented by the front end).
pub trait SyncEventEmitter: Send + Sync {
    /// Emits a sync status change event.
    fn emit_status(&self, status: &SyncStatus);

    /// Emits the product list after it changed.
    fn emit_products(&self, products: &Snapshot);

    /// Emits a sync error event.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_products(&self, _products: &Snapshot) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Coordinator State
// =============================================================================

pub(crate) struct CoordinatorInner {
    config: Arc<StorefrontConfig>,
    store: SharedStore,
    service: Option<Arc<dyn RecordService>>,
    kv: Arc<dyn KeyValueStore>,
    emitter: Arc<dyn SyncEventEmitter>,
    status: RwLock<SyncStatus>,

    /// Bumped on every detach; pulls that straddle it are discarded.
    generation: AtomicU64,
    tickets: AtomicU64,
    last_applied: Mutex<u64>,

    /// Ids flagged purchased. Lock order: last_applied, purchased, store.
    purchased: Mutex<HashSet<ProductId>>,

    listener: tokio::sync::Mutex<Option<ChangeListenerHandle>>,
}

impl CoordinatorInner {
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }
}

// =============================================================================
// Sync Coordinator
// =============================================================================

/// Coordinates the product store with the record service or local storage.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SyncCoordinator {
    /// Offline coordinator over in-memory storage.
    pub fn offline(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::from_parts(
            StorefrontConfig::with_mode(SyncMode::Offline),
            None,
            kv,
            Arc::new(NoOpEmitter),
            Arc::new(RwLock::new(ProductStore::new())),
        )
    }

    fn from_parts(
        config: StorefrontConfig,
        service: Option<Arc<dyn RecordService>>,
        kv: Arc<dyn KeyValueStore>,
        emitter: Arc<dyn SyncEventEmitter>,
        store: SharedStore,
    ) -> Self {
        let status = SyncStatus {
            mode: config.mode(),
            product_count: store.read().len(),
            ..Default::default()
        };

        SyncCoordinator {
            inner: Arc::new(CoordinatorInner {
                config: Arc::new(config),
                store,
                service,
                kv,
                emitter,
                status: RwLock::new(status),
                generation: AtomicU64::new(0),
                tickets: AtomicU64::new(0),
                last_applied: Mutex::new(0),
                purchased: Mutex::new(HashSet::new()),
                listener: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<CoordinatorInner>) -> Self {
        SyncCoordinator { inner }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the current sync status.
    pub fn status(&self) -> SyncStatus {
        self.inner.status.read().clone()
    }

    pub fn mode(&self) -> SyncMode {
        self.inner.config.mode()
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The shared store, for subscribing to snapshots.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.inner.store)
    }

    /// Current product list.
    pub fn products(&self) -> Snapshot {
        self.inner.store.read().list()
    }

    /// One product by id, from the local store.
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.inner.store.read().get(id).cloned()
    }

    pub async fn is_attached(&self) -> bool {
        self.inner.listener.lock().await.is_some()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads local state and, online, performs the initial pull.
    ///
    /// Offline this hydrates the store from `products`. Stored records that
    /// no longer validate are dropped with a warning.
    pub async fn start(&self) -> RefreshOutcome {
        info!(mode = %self.mode(), "Starting sync coordinator");

        if !self.inner.config.is_sync_enabled() {
            return self.hydrate_offline().await;
        }

        if let Some(ids) = read_json::<Vec<ProductId>>(&*self.inner.kv, keys::PURCHASED_IDS).await
        {
            debug!(count = ids.len(), "Loaded purchased flags");
            *self.inner.purchased.lock() = ids.into_iter().collect();
        }

        if self.inner.config.sync.refresh_on_start {
            self.refresh().await
        } else {
            self.publish_status();
            RefreshOutcome::Skipped
        }
    }

    async fn hydrate_offline(&self) -> RefreshOutcome {
        let stored = read_json::<Vec<Product>>(&*self.inner.kv, keys::PRODUCTS)
            .await
            .unwrap_or_default();

        let total = stored.len();
        let valid: Vec<Product> = stored
            .into_iter()
            .filter(|product| match validate_product(product) {
                Ok(()) => true,
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "Dropping invalid stored product");
                    false
                }
            })
            .collect();
        if valid.len() != total {
            warn!(dropped = total - valid.len(), "Stored product list had invalid records");
        }

        let count = {
            let mut purchased = self.inner.purchased.lock();
            *purchased = valid
                .iter()
                .filter(|p| p.purchased)
                .map(|p| p.id.clone())
                .collect();

            let mut store = self.inner.store.write();
            store.replace_all(valid);
            store.len()
        };

        info!(count, "Hydrated product store from local storage");
        self.publish_products();
        self.publish_status();
        RefreshOutcome::Applied { count }
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Pulls the full product list and replaces the store with it.
    ///
    /// Never fails: errors are logged, emitted, recorded in the status and
    /// reported as [`RefreshOutcome::Failed`].
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(service) = self.online_service() else {
            return RefreshOutcome::Skipped;
        };

        let generation = self.inner.generation();
        let ticket = self.inner.next_ticket();
        debug!(ticket, generation, "Pulling products");

        let pulled = with_timeout(self.inner.config.request_timeout(), service.select(&product_query()))
            .await
            .and_then(decode_rows::<ProductRow>)
            .and_then(accept_rows);

        let products = match pulled {
            Ok(products) => products,
            Err(e) => {
                warn!(ticket, error = %e, "Product pull failed, keeping previous snapshot");
                self.record_error(&e);
                return RefreshOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        let (count, pruned) = {
            let mut last_applied = self.inner.last_applied.lock();
            if generation != self.inner.generation() || ticket <= *last_applied {
                debug!(ticket, last_applied = *last_applied, "Discarding stale pull");
                return RefreshOutcome::Stale;
            }
            *last_applied = ticket;

            let mut purchased = self.inner.purchased.lock();
            let before = purchased.len();
            purchased.retain(|id| products.iter().any(|p| &p.id == id));
            let pruned = purchased.len() != before;

            let flagged: Vec<Product> = products
                .into_iter()
                .map(|mut p| {
                    p.purchased = purchased.contains(&p.id);
                    p
                })
                .collect();

            let mut store = self.inner.store.write();
            let dropped = store.replace_all(flagged);
            if dropped > 0 {
                warn!(dropped, "Pull returned duplicate product ids");
            }
            (store.len(), pruned)
        };

        if pruned {
            self.persist_purchased().await;
        }

        {
            let mut status = self.inner.status.write();
            status.refresh_count += 1;
            status.last_refresh_at = Some(chrono::Utc::now().to_rfc3339());
            status.last_error = None;
        }

        info!(ticket, count, "Applied product pull");
        self.publish_products();
        self.publish_status();
        RefreshOutcome::Applied { count }
    }

    /// Screen-focus hook: same as [`refresh`](Self::refresh).
    pub async fn on_focus(&self) -> RefreshOutcome {
        self.refresh().await
    }

    // =========================================================================
    // Change Subscription
    // =========================================================================

    /// Opens the product change channel and pulls once.
    ///
    /// Attaching twice is a no-op. Offline there is nothing to attach to.
    ///
    /// ## Errors
    /// Fails if the change channel cannot be opened.
    pub async fn attach(&self) -> SyncResult<RefreshOutcome> {
        let Some(service) = self.online_service() else {
            return Ok(RefreshOutcome::Skipped);
        };

        {
            let mut listener = self.inner.listener.lock().await;
            if listener.is_some() {
                debug!("Already attached");
                return Ok(RefreshOutcome::Skipped);
            }

            let subscription = with_timeout(
                self.inner.config.request_timeout(),
                service.subscribe(PRODUCT_TABLE),
            )
            .await?;

            let generation = self.inner.generation();
            *listener = Some(ChangeListener::spawn(
                Arc::downgrade(&self.inner),
                subscription,
                generation,
            ));
            info!(generation, "Attached to product changes");
        }

        self.inner.status.write().attached = true;
        self.publish_status();

        Ok(self.refresh().await)
    }

    /// Closes the change channel. Pulls still in flight are discarded.
    pub async fn detach(&self) {
        let handle = self.inner.listener.lock().await.take();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(handle) = handle {
            handle.shutdown().await;
            info!(generation, "Detached from product changes");
        }

        self.inner.status.write().attached = false;
        self.publish_status();
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Adds a product.
    ///
    /// Online the record service assigns the id and the product is mirrored
    /// locally only after the insert succeeds. Offline the store assigns a
    /// local id and the list is persisted.
    pub async fn add(&self, draft: &ProductDraft) -> SyncResult<Product> {
        let new = validate_draft(draft)?;

        let Some(service) = self.online_service() else {
            let product = self.inner.store.write().add(draft)?;
            info!(product_id = %product.id, "Product added locally");
            self.after_offline_write().await;
            return Ok(product);
        };

        let category = self.resolve_category(&new.category).await?;
        let row = ProductInsertRow {
            nama_produk: new.name.clone(),
            id_kategori: category.id,
            jumlah_produk: new.quantity,
            harga: new.price,
        };

        let inserted = with_timeout(
            self.inner.config.request_timeout(),
            service.insert(PRODUCT_TABLE, encode_row(&row)?),
        )
        .await?;

        let id = inserted
            .get(PRODUCT_ID)
            .and_then(Value::as_i64)
            .ok_or_else(|| SyncError::Decode("insert response is missing id_produk".into()))?;

        let product = Product {
            id: ProductId::Remote(id),
            name: new.name,
            price: new.price,
            quantity: new.quantity,
            category: category.name,
            purchased: false,
        };

        let product = self.mirror(|store| store.insert(product))?;
        info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// ## Errors
    /// - Validation errors before anything else
    /// - `ProductNotFound` if the id is not in the store, or the record
    ///   service reports no matching row
    pub async fn update(&self, id: &ProductId, patch: &ProductPatch) -> SyncResult<Product> {
        let mut patch = validate_patch(patch)?;

        if !self.inner.store.read().contains(id) {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        let Some(service) = self.online_service() else {
            let product = self.inner.store.write().update(id, &patch)?;
            info!(product_id = %id, "Product updated locally");
            self.after_offline_write().await;
            return Ok(product);
        };

        let key = id
            .as_remote()
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let mut row = ProductUpdateRow {
            nama_produk: patch.name.clone(),
            harga: patch.price,
            jumlah_produk: patch.quantity,
            id_kategori: None,
        };
        if let Some(ref label) = patch.category {
            let category = self
                .resolve_category(&CategoryChoice::Label(label.clone()))
                .await?;
            row.id_kategori = Some(category.id);
            patch.category = Some(category.name);
        }

        if !row.is_empty() {
            let affected = with_timeout(
                self.inner.config.request_timeout(),
                service.update(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, key), encode_row(&row)?),
            )
            .await?;

            if affected == 0 {
                return Err(CoreError::ProductNotFound(id.to_string()).into());
            }
        }

        let product = self.mirror(|store| store.update(id, &patch))?;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Removes a product. Returns `false` if nothing was removed.
    pub async fn remove(&self, id: &ProductId) -> SyncResult<bool> {
        let Some(service) = self.online_service() else {
            let removed = self.inner.store.write().remove(id);
            if removed {
                self.inner.purchased.lock().remove(id);
                info!(product_id = %id, "Product removed locally");
                self.after_offline_write().await;
            }
            return Ok(removed);
        };

        let Some(key) = id.as_remote() else {
            debug!(product_id = %id, "Local id has no remote row");
            return Ok(false);
        };

        let affected = with_timeout(
            self.inner.config.request_timeout(),
            service.delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, key)),
        )
        .await?;

        let removed_locally = self.mirror(|store| Ok::<_, CoreError>(store.remove(id)))?;
        let was_purchased = self.inner.purchased.lock().remove(id);
        if was_purchased {
            self.persist_purchased().await;
        }

        info!(product_id = %id, affected, "Product removed");
        Ok(affected > 0 || removed_locally)
    }

    /// Flips the purchased flag. Local only; never sent upstream.
    pub async fn toggle_purchased(&self, id: &ProductId) -> SyncResult<Product> {
        let product = {
            let mut purchased = self.inner.purchased.lock();
            let product = self.inner.store.write().toggle_purchased(id)?;
            if product.purchased {
                purchased.insert(id.clone());
            } else {
                purchased.remove(id);
            }
            product
        };

        debug!(product_id = %id, purchased = product.purchased, "Toggled purchased");
        if self.inner.config.is_sync_enabled() {
            self.persist_purchased().await;
            self.publish_products();
        } else {
            self.after_offline_write().await;
        }
        Ok(product)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Categories ordered by name.
    ///
    /// Offline these are the distinct labels in the store, numbered by
    /// position.
    pub async fn categories(&self) -> SyncResult<Vec<Category>> {
        let Some(service) = self.online_service() else {
            return Ok(self.local_categories());
        };

        let rows = with_timeout(self.inner.config.request_timeout(), service.select(&category_query()))
            .await?;
        Ok(decode_rows::<CategoryRow>(rows)?
            .into_iter()
            .map(Category::from)
            .collect())
    }

    /// Creates a remote category. Names are unique, case-insensitively.
    pub async fn add_category(&self, name: &str) -> SyncResult<Category> {
        let name = storefront_core::validation::validate_category_label(name)?;

        let Some(service) = self.online_service() else {
            return Err(SyncError::NotConfigured(
                "categories are managed by the record service".into(),
            ));
        };

        let existing = self.categories().await?;
        if existing.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
            return Err(ValidationError::Duplicate {
                field: "category".into(),
                value: name,
            }
            .into());
        }

        let inserted = with_timeout(
            self.inner.config.request_timeout(),
            service.insert(
                CATEGORY_TABLE,
                encode_row(&CategoryInsertRow {
                    nama_kategori: name,
                })?,
            ),
        )
        .await?;

        let category: Category = serde_json::from_value::<CategoryRow>(inserted)?.into();
        info!(category_id = category.id, name = %category.name, "Category added");
        Ok(category)
    }

    fn local_categories(&self) -> Vec<Category> {
        let mut labels: Vec<String> = Vec::new();
        for product in self.inner.store.read().list().iter() {
            if !labels.iter().any(|l| l.eq_ignore_ascii_case(&product.category)) {
                labels.push(product.category.clone());
            }
        }
        labels.sort_by_key(|l| l.to_lowercase());

        labels
            .into_iter()
            .enumerate()
            .map(|(index, name)| Category {
                id: index as i64 + 1,
                name,
            })
            .collect()
    }

    /// Picks the remote category for a form choice. Free-text labels are
    /// matched by name, case-insensitively.
    async fn resolve_category(&self, choice: &CategoryChoice) -> SyncResult<Category> {
        match choice {
            CategoryChoice::Existing(category) => Ok(category.clone()),
            CategoryChoice::Label(label) => {
                let categories = self.categories().await?;
                categories
                    .iter()
                    .find(|c| c.name.trim().eq_ignore_ascii_case(label.trim()))
                    .cloned()
                    .ok_or_else(|| {
                        ValidationError::NotAllowed {
                            field: "category".into(),
                            allowed: categories.iter().map(|c| c.name.clone()).collect(),
                        }
                        .into()
                    })
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn online_service(&self) -> Option<Arc<dyn RecordService>> {
        if self.inner.config.is_sync_enabled() {
            self.inner.service.clone()
        } else {
            None
        }
    }

    /// Applies a confirmed remote write to the store under a fresh ticket.
    fn mirror<T, E>(&self, apply: impl FnOnce(&mut ProductStore) -> Result<T, E>) -> SyncResult<T>
    where
        SyncError: From<E>,
    {
        let result = {
            let ticket = self.inner.next_ticket();
            let mut last_applied = self.inner.last_applied.lock();
            *last_applied = (*last_applied).max(ticket);
            let mut store = self.inner.store.write();
            apply(&mut *store)?
        };

        let count = self.inner.store.read().len();
        self.inner.status.write().product_count = count;
        self.publish_products();
        Ok(result)
    }

    async fn after_offline_write(&self) {
        let snapshot = self.products();
        if let Err(e) = write_json(&*self.inner.kv, keys::PRODUCTS, &*snapshot).await {
            warn!(error = %e, "Failed to persist product list");
            self.record_error(&e);
        }
        self.inner.status.write().product_count = snapshot.len();
        self.inner.emitter.emit_products(&snapshot);
    }

    async fn persist_purchased(&self) {
        let mut ids: Vec<ProductId> = self.inner.purchased.lock().iter().cloned().collect();
        ids.sort_by_key(|id| id.to_string());

        if let Err(e) = write_json(&*self.inner.kv, keys::PURCHASED_IDS, &ids).await {
            warn!(error = %e, "Failed to persist purchased flags");
            self.record_error(&e);
        }
    }

    fn record_error(&self, error: &SyncError) {
        let message = error.to_string();
        self.inner.status.write().last_error = Some(message.clone());
        self.inner.emitter.emit_error(&message, error.is_retryable());
    }

    fn publish_products(&self) {
        let snapshot = self.products();
        self.inner.emitter.emit_products(&snapshot);
    }

    fn publish_status(&self) {
        let count = self.inner.store.read().len();
        let status = {
            let mut status = self.inner.status.write();
            status.product_count = count;
            status.clone()
        };
        self.inner.emitter.emit_status(&status);
    }
}

/// Maps pulled rows to products. One row that would not pass the store's
/// own checks fails the whole pull.
fn accept_rows(rows: Vec<ProductRow>) -> SyncResult<Vec<Product>> {
    rows.into_iter()
        .map(|row| {
            let product = row.into_product();
            if let Err(e) = validate_product(&product) {
                warn!(product_id = %product.id, error = %e, "Pulled row is invalid");
                return Err(e.into());
            }
            Ok(product)
        })
        .collect()
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("mode", &self.mode())
            .field("status", &self.status())
            .finish()
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a SyncCoordinator with options.
pub struct SyncCoordinatorBuilder {
    config: StorefrontConfig,
    service: Option<Arc<dyn RecordService>>,
    kv: Option<Arc<dyn KeyValueStore>>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
    store: Option<SharedStore>,
}

impl SyncCoordinatorBuilder {
    /// Creates a new builder with the given config.
    pub fn new(config: StorefrontConfig) -> Self {
        SyncCoordinatorBuilder {
            config,
            service: None,
            kv: None,
            emitter: None,
            store: None,
        }
    }

    /// Sets the record service.
    pub fn with_service(mut self, service: Arc<dyn RecordService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets local key-value storage. Defaults to in-memory.
    pub fn with_storage(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Shares an existing store instead of creating one.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the SyncCoordinator.
    pub fn build(self) -> SyncResult<SyncCoordinator> {
        self.config.validate()?;

        if self.config.is_sync_enabled() && self.service.is_none() {
            return Err(SyncError::InvalidConfig(
                "Record service required in online mode".into(),
            ));
        }

        let kv = self.kv.unwrap_or_else(|| {
            debug!("No storage configured, using in-memory storage");
            Arc::new(MemoryKeyValueStore::new())
        });
        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(RwLock::new(ProductStore::new())));

        Ok(SyncCoordinator::from_parts(
            self.config,
            self.service,
            kv,
            emitter,
            store,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryRecordService;

    #[test]
    fn test_sync_status_default() {
        let status = SyncStatus::default();
        assert_eq!(status.mode, SyncMode::Online);
        assert!(!status.attached);
        assert_eq!(status.refresh_count, 0);
    }

    #[test]
    fn test_online_build_requires_service() {
        let err = SyncCoordinatorBuilder::new(StorefrontConfig::default())
            .build()
            .unwrap_err();
        assert!(err.is_config_error());

        let coordinator = SyncCoordinatorBuilder::new(StorefrontConfig::default())
            .with_service(Arc::new(MemoryRecordService::storefront()))
            .build()
            .unwrap();
        assert_eq!(coordinator.mode(), SyncMode::Online);
    }

    #[tokio::test]
    async fn test_offline_refresh_and_attach_are_skipped() {
        let coordinator = SyncCoordinator::offline(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(coordinator.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(coordinator.attach().await.unwrap(), RefreshOutcome::Skipped);
        assert!(!coordinator.is_attached().await);
    }

    #[tokio::test]
    async fn test_offline_categories_are_distinct_labels() {
        let coordinator = SyncCoordinator::offline(Arc::new(MemoryKeyValueStore::new()));
        for (name, category) in [("Mouse", "Peripherals"), ("SSD", "storage"), ("Pad", "peripherals")] {
            coordinator
                .add(&ProductDraft::new(name, "1000", "1", category))
                .await
                .unwrap();
        }

        let names: Vec<String> = coordinator
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Peripherals", "storage"]);
    }
}
