// tests/coordinator_tests.rs
mod common;
use common::*;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use storefront_core::{
    Category, CategoryChoice, CoreError, Product, ProductDraft, ProductId, ProductPatch,
    ValidationError,
};
use storefront_sync::persistence::{keys, read_json, write_json};
use storefront_sync::protocol::{PRODUCT_ID, PRODUCT_TABLE};
use storefront_sync::{Filter, MemoryKeyValueStore, Query, RecordService, RefreshOutcome, SyncError};

fn storage_draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price: "1200000".to_string(),
        quantity: "1".to_string(),
        category: Some(CategoryChoice::Existing(Category {
            id: 2,
            name: "Storage".to_string(),
        })),
    }
}

async fn remote_row(h: &Harness, id: i64) -> Option<serde_json::Value> {
    h.service
        .select(&Query::table(PRODUCT_TABLE).eq(PRODUCT_ID, id))
        .await
        .unwrap()
        .into_iter()
        .next()
}

// --- Pull ---

#[tokio::test]
async fn test_refresh_maps_rows_in_id_order() {
    setup_tracing();
    let h = online_harness().await;
    h.service
        .insert(
            PRODUCT_TABLE,
            json!({ "nama_produk": "Cable", "harga": 10000, "jumlah_produk": 1 }),
        )
        .await
        .unwrap();

    assert_eq!(h.coordinator.refresh().await, RefreshOutcome::Applied { count: 4 });

    let products = h.coordinator.products();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Keyboard", "Mouse", "SSD", "Cable"]);
    assert_eq!(
        products[0],
        Product {
            id: ProductId::Remote(1),
            name: "Keyboard".into(),
            price: 150_000,
            quantity: 2,
            category: "Peripherals".into(),
            purchased: false,
        }
    );
    assert_eq!(products[3].category, "Unknown");

    let status = h.coordinator.status();
    assert_eq!(status.refresh_count, 1);
    assert_eq!(status.product_count, 4);
    assert!(status.last_refresh_at.is_some());
    assert_eq!(h.emitter.product_counts.lock().last(), Some(&4));
}

#[tokio::test]
async fn test_failed_pull_keeps_previous_snapshot() {
    setup_tracing();
    let h = online_harness().await;
    assert!(h.coordinator.refresh().await.is_applied());
    let before = h.coordinator.products();

    h.service.set_offline(true);
    let outcome = h.coordinator.on_focus().await;
    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    assert_eq!(h.coordinator.products(), before);
    assert!(h.coordinator.status().last_error.is_some());

    let errors = h.emitter.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1, "network failures are reported as retryable");

    h.service.set_offline(false);
    assert!(h.coordinator.refresh().await.is_applied());
    assert!(h.coordinator.status().last_error.is_none());
}

#[tokio::test]
async fn test_invalid_pulled_row_fails_the_whole_pull() {
    setup_tracing();
    let h = online_harness().await;
    assert!(h.coordinator.refresh().await.is_applied());
    let before = h.coordinator.products();
    let version = h.coordinator.store().read().version();
    let published = h.emitter.product_counts.lock().len();

    h.service
        .insert(
            PRODUCT_TABLE,
            json!({ "nama_produk": "", "harga": 0, "jumlah_produk": -3, "id_kategori": 1 }),
        )
        .await
        .unwrap();

    let outcome = h.coordinator.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    assert_eq!(h.coordinator.products(), before);
    assert_eq!(h.coordinator.store().read().version(), version);
    assert!(h.coordinator.product(&ProductId::Remote(4)).is_none());
    assert_eq!(h.emitter.product_counts.lock().len(), published);

    let errors = h.emitter.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].1, "bad remote data is not retryable");
}

#[tokio::test]
async fn test_update_after_rejected_pull_reports_not_found() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    h.service
        .insert(
            PRODUCT_TABLE,
            json!({ "nama_produk": "", "harga": 0, "jumlah_produk": -3, "id_kategori": 1 }),
        )
        .await
        .unwrap();
    h.coordinator.refresh().await;

    let patch = ProductPatch {
        name: Some("Fixed".into()),
        ..Default::default()
    };
    let err = h
        .coordinator
        .update(&ProductId::Remote(4), &patch)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(remote_row(&h, 4).await.unwrap()["nama_produk"], "");
}

// --- Add ---

#[tokio::test]
async fn test_add_validation_never_reaches_service() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    // Any remote call would now fail with a network error instead.
    h.service.set_offline(true);

    let err = h
        .coordinator
        .add(&ProductDraft::new("", "50000", "3", "Peripherals"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = h
        .coordinator
        .add(&ProductDraft::new("Mouse", "lima puluh", "3", "Peripherals"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert_eq!(h.service.row_count(PRODUCT_TABLE), 3);
    assert_eq!(h.coordinator.products().len(), 3);
}

#[tokio::test]
async fn test_add_uses_remote_key_and_resolves_label() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let pad = h
        .coordinator
        .add(&ProductDraft::new("Mousepad", "Rp 25.000", "4", "peripherals"))
        .await
        .unwrap();

    assert_eq!(pad.id, ProductId::Remote(4));
    assert_eq!(pad.category, "Peripherals");
    assert_eq!(pad.price, 25_000);
    assert!(!pad.purchased);
    assert_eq!(h.coordinator.product(&pad.id), Some(pad.clone()));

    let row = remote_row(&h, 4).await.unwrap();
    assert_eq!(row["harga"], json!(25000));
    assert_eq!(row["id_kategori"], json!(1));
}

#[tokio::test]
async fn test_same_draft_twice_gets_two_ids() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let first = h.coordinator.add(&storage_draft("NVMe")).await.unwrap();
    let second = h.coordinator.add(&storage_draft("NVMe")).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(h.coordinator.products().len(), 5);
}

#[tokio::test]
async fn test_add_with_unknown_category_label_is_rejected() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let err = h
        .coordinator
        .add(&ProductDraft::new("Chair", "100000", "1", "Furniture"))
        .await
        .unwrap_err();

    match err {
        SyncError::Core(CoreError::Validation(ValidationError::NotAllowed { field, allowed })) => {
            assert_eq!(field, "category");
            assert_eq!(allowed, vec!["Peripherals", "Storage"]);
        }
        other => panic!("Expected NotAllowed, got {:?}", other),
    }
    assert_eq!(h.service.row_count(PRODUCT_TABLE), 3);
}

#[tokio::test]
async fn test_failed_insert_leaves_store_untouched() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    let before = h.coordinator.products();
    let version = h.coordinator.store().read().version();

    h.service.set_offline(true);
    let err = h.coordinator.add(&storage_draft("NVMe")).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(h.coordinator.products(), before);
    assert_eq!(h.coordinator.store().read().version(), version);
}

// --- Update ---

#[tokio::test]
async fn test_update_price_changes_only_price() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    let mouse = ProductId::Remote(2);
    let before = h.coordinator.product(&mouse).unwrap();

    let patch = ProductPatch {
        price: Some(55_000),
        ..Default::default()
    };
    let updated = h.coordinator.update(&mouse, &patch).await.unwrap();

    assert_eq!(updated.price, 55_000);
    assert_eq!(updated.name, before.name);
    assert_eq!(updated.quantity, before.quantity);
    assert_eq!(updated.category, before.category);

    let matching: Vec<_> = h
        .coordinator
        .products()
        .iter()
        .filter(|p| p.id == mouse)
        .cloned()
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].price, 55_000);

    assert_eq!(remote_row(&h, 2).await.unwrap()["harga"], json!(55000));
}

#[tokio::test]
async fn test_update_category_by_label() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let patch = ProductPatch {
        category: Some("storage".into()),
        ..Default::default()
    };
    let updated = h
        .coordinator
        .update(&ProductId::Remote(1), &patch)
        .await
        .unwrap();

    assert_eq!(updated.category, "Storage");
    assert_eq!(remote_row(&h, 1).await.unwrap()["id_kategori"], json!(2));
}

#[tokio::test]
async fn test_update_missing_id_is_not_found() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    let before = h.coordinator.products();

    let patch = ProductPatch {
        name: Some("x".into()),
        ..Default::default()
    };
    let err = h
        .coordinator
        .update(&ProductId::from("missing-id"), &patch)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(h.coordinator.products(), before);
}

#[tokio::test]
async fn test_update_of_row_deleted_elsewhere_is_not_found() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    h.service
        .delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 3))
        .await
        .unwrap();

    let patch = ProductPatch {
        quantity: Some(9),
        ..Default::default()
    };
    let err = h
        .coordinator
        .update(&ProductId::Remote(3), &patch)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(h.coordinator.product(&ProductId::Remote(3)).unwrap().quantity, 5);
}

#[tokio::test]
async fn test_invalid_patch_is_rejected_before_lookup() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let patch = ProductPatch {
        price: Some(0),
        ..Default::default()
    };
    let err = h
        .coordinator
        .update(&ProductId::from("missing-id"), &patch)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

// --- Remove ---

#[tokio::test]
async fn test_remove_deletes_remote_then_local() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    let keyboard = ProductId::Remote(1);

    assert!(h.coordinator.remove(&keyboard).await.unwrap());
    assert_eq!(h.service.row_count(PRODUCT_TABLE), 2);
    assert!(h.coordinator.product(&keyboard).is_none());

    let before = h.coordinator.products();
    assert!(!h.coordinator.remove(&keyboard).await.unwrap());
    assert_eq!(h.coordinator.products(), before);
}

#[tokio::test]
async fn test_failed_delete_keeps_product() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    h.service.set_offline(true);
    assert!(h.coordinator.remove(&ProductId::Remote(1)).await.is_err());
    assert!(h.coordinator.product(&ProductId::Remote(1)).is_some());
}

// --- Purchased Flag ---

#[tokio::test]
async fn test_purchased_flag_is_local_and_survives_pulls_and_restarts() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    let mouse = ProductId::Remote(2);

    let toggled = h.coordinator.toggle_purchased(&mouse).await.unwrap();
    assert!(toggled.purchased);
    assert!(remote_row(&h, 2).await.unwrap().get("purchased").is_none());
    assert_eq!(
        read_json::<Vec<ProductId>>(&*h.kv, keys::PURCHASED_IDS).await,
        Some(vec![mouse.clone()])
    );

    assert!(h.coordinator.refresh().await.is_applied());
    assert!(h.coordinator.product(&mouse).unwrap().purchased);

    let restarted = online_harness_with(h.service.clone(), h.kv.clone(), 2_000);
    assert!(restarted.coordinator.start().await.is_applied());
    assert!(restarted.coordinator.product(&mouse).unwrap().purchased);
    assert!(!restarted.coordinator.product(&ProductId::Remote(1)).unwrap().purchased);
}

#[tokio::test]
async fn test_purchased_flags_are_pruned_with_their_products() {
    let h = online_harness().await;
    h.coordinator.refresh().await;
    h.coordinator
        .toggle_purchased(&ProductId::Remote(2))
        .await
        .unwrap();

    h.service
        .delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 2))
        .await
        .unwrap();
    h.coordinator.refresh().await;

    assert_eq!(
        read_json::<Vec<ProductId>>(&*h.kv, keys::PURCHASED_IDS).await,
        Some(vec![])
    );
}

#[tokio::test]
async fn test_toggle_missing_id_is_not_found() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    let err = h
        .coordinator
        .toggle_purchased(&ProductId::Remote(99))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// --- Timeouts & Ordering ---

#[tokio::test(start_paused = true)]
async fn test_slow_service_times_out() {
    let service = seeded_service().await;
    let h = online_harness_with(service, Arc::new(MemoryKeyValueStore::new()), 1_000);
    assert!(h.coordinator.refresh().await.is_applied());

    h.service.set_latency(Duration::from_secs(30));

    let err = h.coordinator.add(&storage_draft("NVMe")).await.unwrap_err();
    assert!(matches!(err, SyncError::Timeout(1_000)));
    assert_eq!(h.service.row_count(PRODUCT_TABLE), 3);
    assert_eq!(h.coordinator.products().len(), 3);

    match h.coordinator.refresh().await {
        RefreshOutcome::Failed { message } => assert!(message.contains("timed out")),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_pull_straddling_detach_is_discarded() {
    let h = online_harness().await;
    h.coordinator.attach().await.unwrap();

    h.service.set_latency(Duration::from_millis(500));
    let coordinator = h.coordinator.clone();
    let pull = tokio::spawn(async move { coordinator.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.coordinator.detach().await;

    assert_eq!(pull.await.unwrap(), RefreshOutcome::Stale);
    assert_eq!(h.service.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_older_pull_cannot_override_a_newer_write() {
    let h = online_harness().await;
    h.coordinator.refresh().await;

    h.service.set_latency(Duration::from_millis(500));
    let coordinator = h.coordinator.clone();
    let pull = tokio::spawn(async move { coordinator.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.service.set_latency(Duration::ZERO);
    let added = h.coordinator.add(&storage_draft("NVMe")).await.unwrap();

    assert_eq!(pull.await.unwrap(), RefreshOutcome::Stale);
    assert!(h.coordinator.product(&added.id).is_some());
}

// --- Change Subscription ---

#[tokio::test]
async fn test_attach_follows_remote_changes_until_detach() {
    setup_tracing();
    let h = online_harness().await;

    assert_eq!(
        h.coordinator.attach().await.unwrap(),
        RefreshOutcome::Applied { count: 3 }
    );
    assert!(h.coordinator.is_attached().await);
    assert_eq!(h.service.active_subscriptions(), 1);
    assert!(h.emitter.last_status().unwrap().attached);

    // Attaching again keeps a single channel.
    assert_eq!(h.coordinator.attach().await.unwrap(), RefreshOutcome::Skipped);
    assert_eq!(h.service.active_subscriptions(), 1);

    h.service
        .insert(
            PRODUCT_TABLE,
            json!({ "nama_produk": "Webcam", "harga": 300000, "jumlah_produk": 2, "id_kategori": 1 }),
        )
        .await
        .unwrap();
    let c = h.coordinator.clone();
    assert!(
        wait_until(Duration::from_secs(2), || {
            let c = c.clone();
            async move { c.products().len() == 4 }
        })
        .await
    );

    h.service
        .delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 1))
        .await
        .unwrap();
    let c = h.coordinator.clone();
    assert!(
        wait_until(Duration::from_secs(2), || {
            let c = c.clone();
            async move { c.product(&ProductId::Remote(1)).is_none() }
        })
        .await
    );

    h.coordinator.detach().await;
    assert_eq!(h.service.active_subscriptions(), 0);
    assert!(!h.coordinator.is_attached().await);

    h.service
        .insert(
            PRODUCT_TABLE,
            json!({ "nama_produk": "Late", "harga": 1000, "jumlah_produk": 1 }),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.coordinator.products().len(), 3);
}

#[tokio::test]
async fn test_dropping_coordinator_closes_channel() {
    let h = online_harness().await;
    h.coordinator.attach().await.unwrap();
    assert_eq!(h.service.active_subscriptions(), 1);

    let Harness {
        service,
        coordinator,
        ..
    } = h;
    drop(coordinator);

    let s = service.clone();
    assert!(
        wait_until(Duration::from_secs(2), || {
            let s = s.clone();
            async move { s.active_subscriptions() == 0 }
        })
        .await
    );
}

// --- Offline Mode ---

#[tokio::test]
async fn test_offline_writes_persist_and_hydrate() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let coordinator = offline_coordinator(kv.clone());
    assert_eq!(coordinator.start().await, RefreshOutcome::Applied { count: 0 });

    let draft = ProductDraft::new("Mouse", "50000", "3", "Peripherals");
    let mouse = coordinator.add(&draft).await.unwrap();
    let second = coordinator.add(&draft).await.unwrap();
    assert!(matches!(mouse.id, ProductId::Local(_)));
    assert_ne!(mouse.id, second.id);

    coordinator
        .update(
            &mouse.id,
            &ProductPatch {
                quantity: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    coordinator.toggle_purchased(&second.id).await.unwrap();
    assert!(!coordinator.remove(&ProductId::from("nope")).await.unwrap());

    let restored = offline_coordinator(kv.clone());
    assert_eq!(restored.start().await, RefreshOutcome::Applied { count: 2 });
    let products = restored.products();
    assert_eq!(products[0].id, mouse.id);
    assert_eq!(products[0].quantity, 10);
    assert!(products[1].purchased);

    assert_eq!(restored.refresh().await, RefreshOutcome::Skipped);
    assert!(restored.remove(&mouse.id).await.unwrap());
    assert_eq!(
        read_json::<Vec<Product>>(&*kv, keys::PRODUCTS).await.map(|p| p.len()),
        Some(1)
    );
}

#[tokio::test]
async fn test_offline_hydrate_drops_invalid_records() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    write_json(
        &*kv,
        keys::PRODUCTS,
        &json!([
            { "id": "a", "name": "Mouse", "price": 50000, "quantity": 3, "category": "Peripherals" },
            { "id": "b", "name": "", "price": 1, "quantity": 1, "category": "Peripherals" }
        ]),
    )
    .await
    .unwrap();

    let coordinator = offline_coordinator(kv);
    assert_eq!(coordinator.start().await, RefreshOutcome::Applied { count: 1 });
    assert!(coordinator.product(&ProductId::from("a")).is_some());
}

#[tokio::test]
async fn test_offline_storage_failure_is_not_fatal() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let coordinator = offline_coordinator(kv.clone());
    coordinator.start().await;

    kv.set_failing(true);
    let product = coordinator
        .add(&ProductDraft::new("Mouse", "50000", "3", "Peripherals"))
        .await
        .unwrap();

    assert!(coordinator.product(&product.id).is_some());
    assert!(coordinator.status().last_error.is_some());
}
