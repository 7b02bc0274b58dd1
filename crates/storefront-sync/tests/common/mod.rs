// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use storefront_core::Snapshot;
use storefront_sync::protocol::{CATEGORY_TABLE, PRODUCT_TABLE};
use storefront_sync::{
    KeyValueStore, MemoryKeyValueStore, MemoryRecordService, RecordService, StorefrontConfig,
    SyncCoordinator, SyncCoordinatorBuilder, SyncEventEmitter, SyncMode, SyncStatus,
};

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
});

pub fn setup_tracing() {
    Lazy::force(&TRACING_INIT);
}

// --- Recording Emitter ---
#[derive(Default)]
pub struct RecordingEmitter {
    pub statuses: Mutex<Vec<SyncStatus>>,
    pub product_counts: Mutex<Vec<usize>>,
    pub errors: Mutex<Vec<(String, bool)>>,
}

impl RecordingEmitter {
    pub fn last_status(&self) -> Option<SyncStatus> {
        self.statuses.lock().last().cloned()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }
}

impl SyncEventEmitter for RecordingEmitter {
    fn emit_status(&self, status: &SyncStatus) {
        self.statuses.lock().push(status.clone());
    }

    fn emit_products(&self, products: &Snapshot) {
        self.product_counts.lock().push(products.len());
    }

    fn emit_error(&self, message: &str, retryable: bool) {
        self.errors.lock().push((message.to_string(), retryable));
    }
}

// --- Fixtures ---

/// Categories: 1 Peripherals, 2 Storage.
/// Products:   1 Keyboard (Peripherals), 2 Mouse (Peripherals), 3 SSD (Storage).
pub async fn seeded_service() -> Arc<MemoryRecordService> {
    let service = Arc::new(MemoryRecordService::storefront());

    for name in ["Peripherals", "Storage"] {
        service
            .insert(CATEGORY_TABLE, json!({ "nama_kategori": name }))
            .await
            .unwrap();
    }

    for (name, price, quantity, category) in [
        ("Keyboard", 150_000, 2, 1),
        ("Mouse", 50_000, 3, 1),
        ("SSD", 900_000, 5, 2),
    ] {
        service
            .insert(
                PRODUCT_TABLE,
                json!({
                    "nama_produk": name,
                    "harga": price,
                    "jumlah_produk": quantity,
                    "id_kategori": category
                }),
            )
            .await
            .unwrap();
    }

    service
}

pub fn online_config(timeout_ms: u64) -> StorefrontConfig {
    let mut config = StorefrontConfig::with_mode(SyncMode::Online);
    config.sync.request_timeout_ms = timeout_ms;
    config
}

pub struct Harness {
    pub service: Arc<MemoryRecordService>,
    pub kv: Arc<MemoryKeyValueStore>,
    pub emitter: Arc<RecordingEmitter>,
    pub coordinator: SyncCoordinator,
}

pub async fn online_harness() -> Harness {
    let service = seeded_service().await;
    online_harness_with(service, Arc::new(MemoryKeyValueStore::new()), 2_000)
}

pub fn online_harness_with(
    service: Arc<MemoryRecordService>,
    kv: Arc<MemoryKeyValueStore>,
    timeout_ms: u64,
) -> Harness {
    let emitter = Arc::new(RecordingEmitter::default());
    let coordinator = SyncCoordinatorBuilder::new(online_config(timeout_ms))
        .with_service(service.clone() as Arc<dyn RecordService>)
        .with_storage(kv.clone() as Arc<dyn KeyValueStore>)
        .with_emitter(emitter.clone() as Arc<dyn SyncEventEmitter>)
        .build()
        .unwrap();

    Harness {
        service,
        kv,
        emitter,
        coordinator,
    }
}

pub fn offline_coordinator(kv: Arc<MemoryKeyValueStore>) -> SyncCoordinator {
    SyncCoordinatorBuilder::new(StorefrontConfig::with_mode(SyncMode::Offline))
        .with_storage(kv as Arc<dyn KeyValueStore>)
        .build()
        .unwrap()
}

/// Polls `condition` until it holds or `limit` passes.
pub async fn wait_until<F, Fut>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
