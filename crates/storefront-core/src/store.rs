//! # Product Store
//!
//! The single in-memory source of truth for the product list.
//!
//! ## Snapshot Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Immutable Snapshots                                  │
//! │                                                                         │
//! │  list() ──► Arc<[Product]> v1 ─┐                                        │
//! │                                │  readers keep v1 alive                 │
//! │  update(id, patch)             │                                        │
//! │      │                         │                                        │
//! │      ▼                         │                                        │
//! │  build new Vec ──► Arc<[Product]> v2 ──► notify subscribers             │
//! │                                                                         │
//! │  A record is never mutated in place: it is replaced in a fresh list.   │
//! │  Readers holding v1 never observe a torn v2.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! | Operation          | Absent id        | Validation                 |
//! |--------------------|------------------|----------------------------|
//! | `add`              | n/a (new id)     | draft, before insert       |
//! | `insert`           | appended         | full record                |
//! | `remove`           | no-op, `false`   | none                       |
//! | `update`           | `ProductNotFound`| patch, then merged record  |
//! | `toggle_purchased` | `ProductNotFound`| none                       |
//! | `replace_all`      | n/a              | trusted (sync pull)        |
//!
//! The store is single-writer by construction and holds no lock of its own.
//! Concurrent callers wrap it (see `SharedStore` in storefront-sync).

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, ProductDraft, ProductId, ProductPatch};
use crate::validation::{validate_draft, validate_patch, validate_product};

/// An immutable view of the product list.
pub type Snapshot = Arc<[Product]>;

/// Change listener. Called with every new snapshot, while the store is
/// borrowed mutably; it must not call back into the store.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Handle returned by [`ProductStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Ordered, id-unique list of products with change notification.
pub struct ProductStore {
    products: Snapshot,
    version: u64,
    listeners: Vec<(SubscriberId, Listener)>,
    next_subscriber: u64,
}

impl ProductStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        ProductStore {
            products: Arc::from(Vec::new()),
            version: 0,
            listeners: Vec::new(),
            next_subscriber: 0,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the current snapshot. No side effects.
    pub fn list(&self) -> Snapshot {
        Arc::clone(&self.products)
    }

    /// Looks up a product by id.
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Returns true if a product with this id exists.
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Monotonic counter bumped on every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Validates a draft, assigns a fresh local id and appends the product.
    ///
    /// ## Errors
    /// `CoreError::Validation` naming the first invalid field. The store is
    /// unchanged on error.
    pub fn add(&mut self, draft: &ProductDraft) -> CoreResult<Product> {
        let new = validate_draft(draft)?;

        let mut id = ProductId::generate_local();
        while self.contains(&id) {
            id = ProductId::generate_local();
        }

        let product = Product::from_new(id, &new);
        let mut next = self.products.to_vec();
        next.push(product.clone());
        self.commit(next);

        Ok(product)
    }

    /// Inserts a product whose id was assigned elsewhere (the record
    /// service). An existing record with the same id is replaced in place,
    /// keeping its position.
    pub fn insert(&mut self, product: Product) -> CoreResult<Product> {
        validate_product(&product)?;

        let mut next = self.products.to_vec();
        match next.iter().position(|p| p.id == product.id) {
            Some(index) => next[index] = product.clone(),
            None => next.push(product.clone()),
        }
        self.commit(next);

        Ok(product)
    }

    /// Removes the product with this id. Returns `false` (and changes
    /// nothing) if it is absent.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let next: Vec<Product> = self
            .products
            .iter()
            .filter(|p| &p.id != id)
            .cloned()
            .collect();
        self.commit(next);
        true
    }

    /// Merges a patch into the product with this id.
    ///
    /// ## Errors
    /// - `CoreError::Validation` if a patched field is invalid
    /// - `CoreError::ProductNotFound` if the id is absent
    pub fn update(&mut self, id: &ProductId, patch: &ProductPatch) -> CoreResult<Product> {
        let patch = validate_patch(patch)?;
        let index = self.position(id)?;

        let merged = self.products[index].merged(&patch);
        validate_product(&merged)?;

        let mut next = self.products.to_vec();
        next[index] = merged.clone();
        self.commit(next);

        Ok(merged)
    }

    /// Flips the local `purchased` flag.
    pub fn toggle_purchased(&mut self, id: &ProductId) -> CoreResult<Product> {
        let index = self.position(id)?;

        let mut toggled = self.products[index].clone();
        toggled.purchased = !toggled.purchased;

        let mut next = self.products.to_vec();
        next[index] = toggled.clone();
        self.commit(next);

        Ok(toggled)
    }

    /// Replaces the whole list, preserving input order.
    ///
    /// Callers validate every record first (a pull rejects the whole batch
    /// on one bad row). Duplicate ids collapse to their first occurrence;
    /// the number dropped is returned.
    pub fn replace_all(&mut self, products: Vec<Product>) -> usize {
        let total = products.len();
        let mut next: Vec<Product> = Vec::with_capacity(total);
        for product in products {
            if !next.iter().any(|p| p.id == product.id) {
                next.push(product);
            }
        }

        let dropped = total - next.len();
        self.commit(next);
        dropped
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// Registers a listener for every subsequent snapshot.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, id: &ProductId) -> CoreResult<usize> {
        self.products
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    fn commit(&mut self, next: Vec<Product>) {
        self.products = Arc::from(next);
        self.version += 1;

        for (_, listener) in &self.listeners {
            listener(&self.products);
        }
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("products", &self.products)
            .field("version", &self.version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn mouse_draft() -> ProductDraft {
        ProductDraft::new("Mouse", "50000", "3", "Peripherals")
    }

    fn remote(id: i64, name: &str, price: i64) -> Product {
        Product {
            id: ProductId::Remote(id),
            name: name.to_string(),
            price,
            quantity: 1,
            category: "Peripherals".to_string(),
            purchased: false,
        }
    }

    #[test]
    fn test_add_mouse() {
        let mut store = ProductStore::new();
        let product = store.add(&mouse_draft()).unwrap();

        let list = store.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], product);
        assert_eq!(product.name, "Mouse");
        assert_eq!(product.price, 50_000);
        assert_eq!(product.quantity, 3);
        assert_eq!(product.category, "Peripherals");
        assert!(!product.purchased);
        assert!(matches!(product.id, ProductId::Local(_)));
    }

    #[test]
    fn test_add_same_draft_twice_gives_distinct_ids() {
        let mut store = ProductStore::new();
        let a = store.add(&mouse_draft()).unwrap();
        let b = store.add(&mouse_draft()).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_ids_unique_among_current() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);
        for _ in 0..20 {
            store.add(&mouse_draft()).unwrap();
        }

        let ids: HashSet<_> = store.list().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn test_add_invalid_draft_leaves_store_unchanged() {
        let mut store = ProductStore::new();
        let mut draft = mouse_draft();
        draft.quantity = "0".into();

        let err = store.add(&draft).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);
        let before = store.list();
        let version = store.version();

        assert!(!store.remove(&ProductId::Remote(99)));
        assert_eq!(&*store.list(), &*before);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_remove_present() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000), remote(2, "Mouse", 50_000)]);

        assert!(store.remove(&ProductId::Remote(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "Mouse");
    }

    #[test]
    fn test_update_price_only() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000), remote(2, "Mouse", 50_000)]);

        store
            .update(
                &ProductId::Remote(1),
                &ProductPatch {
                    price: Some(175_000),
                    ..Default::default()
                },
            )
            .unwrap();

        let list = store.list();
        let matching: Vec<_> = list.iter().filter(|p| p.id == ProductId::Remote(1)).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].price, 175_000);
        assert_eq!(matching[0].name, "Keyboard");
        assert_eq!(matching[0].quantity, 1);
        assert_eq!(list[1], remote(2, "Mouse", 50_000));
    }

    #[test]
    fn test_update_missing_id() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);
        let before = store.list();

        let err = store
            .update(
                &ProductId::from("missing-id"),
                &ProductPatch {
                    name: Some("x".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::ProductNotFound(ref id) if id == "missing-id"));
        assert_eq!(&*store.list(), &*before);
    }

    #[test]
    fn test_update_rejects_invalid_patch() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);

        let err = store
            .update(
                &ProductId::Remote(1),
                &ProductPatch {
                    quantity: Some(-1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(store.list()[0].quantity, 1);
    }

    #[test]
    fn test_toggle_purchased() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);

        assert!(store.toggle_purchased(&ProductId::Remote(1)).unwrap().purchased);
        assert!(!store.toggle_purchased(&ProductId::Remote(1)).unwrap().purchased);
        assert!(store.toggle_purchased(&ProductId::Remote(2)).is_err());
    }

    #[test]
    fn test_replace_all_returns_exactly_input() {
        let mut store = ProductStore::new();
        store.add(&mouse_draft()).unwrap();

        let input = vec![remote(3, "C", 3), remote(1, "A", 1), remote(2, "B", 2)];
        assert_eq!(store.replace_all(input.clone()), 0);
        assert_eq!(&*store.list(), &input[..]);

        // Idempotent
        store.replace_all(input.clone());
        assert_eq!(&*store.list(), &input[..]);
    }

    #[test]
    fn test_replace_all_collapses_duplicates() {
        let mut store = ProductStore::new();
        let dropped = store.replace_all(vec![remote(1, "A", 1), remote(1, "A again", 2)]);

        assert_eq!(dropped, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "A");
    }

    #[test]
    fn test_insert_upserts_by_id() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000), remote(2, "Mouse", 50_000)]);

        store.insert(remote(1, "Keyboard TKL", 160_000)).unwrap();
        store.insert(remote(3, "Monitor", 2_000_000)).unwrap();

        let names: Vec<_> = store.list().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Keyboard TKL", "Mouse", "Monitor"]);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = ProductStore::new();
        store.replace_all(vec![remote(1, "Keyboard", 150_000)]);
        let old = store.list();

        store
            .update(
                &ProductId::Remote(1),
                &ProductPatch {
                    name: Some("Keyboard TKL".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(old[0].name, "Keyboard");
        assert_eq!(store.list()[0].name, "Keyboard TKL");
    }

    #[test]
    fn test_subscribers_notified() {
        let mut store = ProductStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let id = store.subscribe(Arc::new(move |_snapshot| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        store.add(&mouse_draft()).unwrap();
        store.replace_all(Vec::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(store.unsubscribe(id));
        store.add(&mouse_draft()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!store.unsubscribe(id));
    }
}
