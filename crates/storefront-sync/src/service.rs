//! # Record Service
//!
//! The remote table store the coordinator syncs against, behind an async
//! trait so the hosted backend and the in-memory reference adapter are
//! interchangeable.
//!
//! ## Call Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RecordService (trait)                             │
//! │                                                                         │
//! │  select(query)                 → rows (JSON objects)                    │
//! │  insert(table, row)            → row with its assigned key             │
//! │  update(table, filter, changes)→ affected row count                    │
//! │  delete(table, filter)         → affected row count                    │
//! │  subscribe(table)              → ChangeSubscription                     │
//! │                                                                         │
//! │  ┌──────────────┐   select/insert/...   ┌───────────────────────────┐  │
//! │  │  Coordinator │ ────────────────────► │  MemoryRecordService      │  │
//! │  │              │ ◄──── ChangeEvent ─── │  (broadcast change feed)  │  │
//! │  └──────────────┘                       └───────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Adapter
//! `MemoryRecordService` keeps tables as JSON rows with auto-increment
//! keys, resolves one-level embedded joins through declared foreign keys,
//! and publishes a change event for every written row. Tests use its
//! failure and latency switches; the CLI persists it with
//! [`MemoryRecordService::export`] and [`MemoryRecordService::import`].

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    ChangeEvent, ChangeKind, CATEGORY_ID, CATEGORY_TABLE, PRODUCT_ID, PRODUCT_TABLE, USER_ID,
    USER_TABLE,
};

/// Buffered change events per subscriber before it counts as lagged.
const CHANGE_FEED_CAPACITY: usize = 256;

// =============================================================================
// Query Builder
// =============================================================================

/// A select request: columns, embedded joins, equality filters, order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Empty means every column.
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

/// A related table joined into each row under its own name.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: String,
    pub columns: Vec<String>,
}

/// `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter {
            column: column.to_string(),
            value: value.into(),
        }
    }

    fn matches(&self, row: &Map<String, Value>) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Query {
    /// Starts a query on a table.
    pub fn table(name: &str) -> Self {
        Query {
            table: name.to_string(),
            columns: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, table: &str, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }
}

// =============================================================================
// RecordService Trait
// =============================================================================

/// Remote table store.
///
/// Every method may fail with `Network`/`Service` errors. Callers bound
/// each call with [`with_timeout`].
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Returns the rows matching the query.
    async fn select(&self, query: &Query) -> SyncResult<Vec<Value>>;

    /// Inserts a row and returns it with its assigned key.
    async fn insert(&self, table: &str, row: Value) -> SyncResult<Value>;

    /// Applies `changes` to every row matching `filter`.
    async fn update(&self, table: &str, filter: &Filter, changes: Value) -> SyncResult<u64>;

    /// Deletes every row matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> SyncResult<u64>;

    /// Opens a change channel for one table.
    async fn subscribe(&self, table: &str) -> SyncResult<ChangeSubscription>;
}

/// Runs a remote call with an upper bound on its duration.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> SyncResult<T>
where
    F: Future<Output = SyncResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout(
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

// =============================================================================
// Change Subscription
// =============================================================================

/// An open change channel for one table.
///
/// The channel counts as open until this value is dropped or
/// [`close`](Self::close)d.
pub struct ChangeSubscription {
    table: String,
    receiver: broadcast::Receiver<ChangeEvent>,
    _guard: Option<ChannelGuard>,
}

/// Keeps an adapter's open-channel count in step with live subscriptions.
struct ChannelGuard(Arc<AtomicUsize>);

impl ChannelGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
        ChannelGuard(counter)
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}

impl ChangeSubscription {
    /// Wraps a broadcast receiver, keeping only events for `table`.
    pub fn new(table: &str, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        ChangeSubscription {
            table: table.to_string(),
            receiver,
            _guard: None,
        }
    }

    /// Like [`new`](Self::new), counting the channel in `open_channels`.
    pub fn counted(
        table: &str,
        receiver: broadcast::Receiver<ChangeEvent>,
        open_channels: Arc<AtomicUsize>,
    ) -> Self {
        ChangeSubscription {
            table: table.to_string(),
            receiver,
            _guard: Some(ChannelGuard::new(open_channels)),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Waits for the next event on this table. `None` once the feed closes.
    ///
    /// A lagged receiver has missed events; it reports one synthetic
    /// `UPDATE` with a null payload so the caller still re-pulls.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.table == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(table = %self.table, missed, "Change feed lagged");
                    return Some(ChangeEvent::new(ChangeKind::Update, &self.table, Value::Null));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drains events already queued without waiting. Returns how many were
    /// consumed.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.table == self.table => drained += 1,
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => drained += 1,
                Err(_) => return drained,
            }
        }
    }

    /// Closes the channel.
    pub fn close(self) {
        debug!(table = %self.table, "Change subscription closed");
    }
}

impl std::fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("table", &self.table)
            .finish()
    }
}

// =============================================================================
// Memory Adapter: Snapshot Types
// =============================================================================

/// One table's rows and key counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryTable {
    pub primary_key: String,
    #[serde(default)]
    pub next_id: i64,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

/// `from.foreign_key` references the primary key of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub foreign_key: String,
    pub to: String,
}

/// Everything a [`MemoryRecordService`] holds, as plain data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, MemoryTable>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

// =============================================================================
// Memory Adapter
// =============================================================================

/// In-process record service.
pub struct MemoryRecordService {
    state: RwLock<MemorySnapshot>,
    changes: broadcast::Sender<ChangeEvent>,
    open_channels: Arc<AtomicUsize>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryRecordService {
    /// Creates a service with no tables.
    pub fn new() -> Self {
        Self::import(MemorySnapshot::default())
    }

    /// Creates a service with the storefront schema: products, categories
    /// and users, with products joined to categories.
    pub fn storefront() -> Self {
        Self::new()
            .with_table(PRODUCT_TABLE, PRODUCT_ID)
            .with_table(CATEGORY_TABLE, CATEGORY_ID)
            .with_table(USER_TABLE, USER_ID)
            .with_relation(PRODUCT_TABLE, CATEGORY_ID, CATEGORY_TABLE)
    }

    /// Restores a service from a snapshot.
    pub fn import(snapshot: MemorySnapshot) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        MemoryRecordService {
            state: RwLock::new(snapshot),
            changes,
            open_channels: Arc::new(AtomicUsize::new(0)),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Copies out the current tables.
    pub fn export(&self) -> MemorySnapshot {
        self.state.read().clone()
    }

    /// Declares a table keyed by an auto-increment integer column.
    pub fn with_table(self, name: &str, primary_key: &str) -> Self {
        self.state
            .write()
            .tables
            .entry(name.to_string())
            .or_insert_with(|| MemoryTable {
                primary_key: primary_key.to_string(),
                next_id: 0,
                rows: Vec::new(),
            });
        self
    }

    /// Declares that `from.foreign_key` points at `to`'s primary key.
    pub fn with_relation(self, from: &str, foreign_key: &str, to: &str) -> Self {
        {
            let mut state = self.state.write();
            let relation = Relation {
                from: from.to_string(),
                foreign_key: foreign_key.to_string(),
                to: to.to_string(),
            };
            if !state.relations.contains(&relation) {
                state.relations.push(relation);
            }
        }
        self
    }

    // =========================================================================
    // Test Controls
    // =========================================================================

    /// When offline every call fails with `SyncError::Network`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Delay applied before every call.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, AtomicOrdering::SeqCst);
    }

    /// Number of change channels currently open.
    pub fn active_subscriptions(&self) -> usize {
        self.open_channels.load(AtomicOrdering::SeqCst)
    }

    /// Number of rows in a table (0 for unknown tables).
    pub fn row_count(&self, table: &str) -> usize {
        self.state
            .read()
            .tables
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn gate(&self, operation: &str, table: &str) -> SyncResult<()> {
        let latency = self.latency_ms.load(AtomicOrdering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(SyncError::Network(format!(
                "{} on '{}': record service unreachable",
                operation, table
            )));
        }

        trace!(operation, table, "Record service call");
        Ok(())
    }

    fn publish(&self, kind: ChangeKind, table: &str, row: &Map<String, Value>) {
        // No receivers is not an error.
        let _ = self
            .changes
            .send(ChangeEvent::new(kind, table, Value::Object(row.clone())));
    }
}

impl Default for MemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryRecordService")
            .field("tables", &state.tables.keys().collect::<Vec<_>>())
            .field("open_channels", &self.active_subscriptions())
            .finish()
    }
}

#[async_trait]
impl RecordService for MemoryRecordService {
    async fn select(&self, query: &Query) -> SyncResult<Vec<Value>> {
        self.gate("select", &query.table).await?;

        let state = self.state.read();
        let table = lookup_table(&state, &query.table)?;

        let mut rows: Vec<&Map<String, Value>> = table
            .rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(ref order) = query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        rows.into_iter()
            .map(|row| -> SyncResult<Value> {
                let mut out = project(row, &query.columns);
                for embed in &query.embeds {
                    let joined = join(&state, &query.table, row, embed)?;
                    out.insert(embed.table.clone(), joined);
                }
                Ok(Value::Object(out))
            })
            .collect()
    }

    async fn insert(&self, table: &str, row: Value) -> SyncResult<Value> {
        self.gate("insert", table).await?;

        let Value::Object(mut row) = row else {
            return Err(SyncError::Service(format!(
                "insert into '{}': row must be a JSON object",
                table
            )));
        };

        let inserted = {
            let mut state = self.state.write();
            check_foreign_keys(&state, table, &row)?;

            let target = lookup_table_mut(&mut state, table)?;
            target.next_id += 1;
            row.insert(target.primary_key.clone(), Value::from(target.next_id));
            target.rows.push(row.clone());
            row
        };

        debug!(table, "Row inserted");
        self.publish(ChangeKind::Insert, table, &inserted);
        Ok(Value::Object(inserted))
    }

    async fn update(&self, table: &str, filter: &Filter, changes: Value) -> SyncResult<u64> {
        self.gate("update", table).await?;

        let Value::Object(changes) = changes else {
            return Err(SyncError::Service(format!(
                "update '{}': changes must be a JSON object",
                table
            )));
        };

        let updated: Vec<Map<String, Value>> = {
            let mut state = self.state.write();
            check_foreign_keys(&state, table, &changes)?;

            let target = lookup_table_mut(&mut state, table)?;
            let primary_key = target.primary_key.clone();
            target
                .rows
                .iter_mut()
                .filter(|row| filter.matches(row))
                .map(|row| {
                    for (column, value) in &changes {
                        if *column != primary_key {
                            row.insert(column.clone(), value.clone());
                        }
                    }
                    row.clone()
                })
                .collect()
        };

        debug!(table, affected = updated.len(), "Rows updated");
        for row in &updated {
            self.publish(ChangeKind::Update, table, row);
        }
        Ok(updated.len() as u64)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> SyncResult<u64> {
        self.gate("delete", table).await?;

        let removed: Vec<Map<String, Value>> = {
            let mut state = self.state.write();
            let target = lookup_table_mut(&mut state, table)?;
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut target.rows)
                .into_iter()
                .partition(|row| filter.matches(row));
            target.rows = kept;
            removed
        };

        debug!(table, affected = removed.len(), "Rows deleted");
        for row in &removed {
            self.publish(ChangeKind::Delete, table, row);
        }
        Ok(removed.len() as u64)
    }

    async fn subscribe(&self, table: &str) -> SyncResult<ChangeSubscription> {
        self.gate("subscribe", table).await?;
        lookup_table(&self.state.read(), table)?;

        debug!(table, "Change subscription opened");
        Ok(ChangeSubscription::counted(
            table,
            self.changes.subscribe(),
            Arc::clone(&self.open_channels),
        ))
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn lookup_table<'a>(state: &'a MemorySnapshot, table: &str) -> SyncResult<&'a MemoryTable> {
    state
        .tables
        .get(table)
        .ok_or_else(|| SyncError::Service(format!("unknown table '{}'", table)))
}

fn lookup_table_mut<'a>(
    state: &'a mut MemorySnapshot,
    table: &str,
) -> SyncResult<&'a mut MemoryTable> {
    state
        .tables
        .get_mut(table)
        .ok_or_else(|| SyncError::Service(format!("unknown table '{}'", table)))
}

fn project(row: &Map<String, Value>, columns: &[String]) -> Map<String, Value> {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .map(|column| {
            (
                column.clone(),
                row.get(column).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

fn join(
    state: &MemorySnapshot,
    from: &str,
    row: &Map<String, Value>,
    embed: &Embed,
) -> SyncResult<Value> {
    let relation = state
        .relations
        .iter()
        .find(|r| r.from == from && r.to == embed.table)
        .ok_or_else(|| {
            SyncError::Service(format!("no relation from '{}' to '{}'", from, embed.table))
        })?;
    let target = lookup_table(state, &relation.to)?;

    let joined = row
        .get(&relation.foreign_key)
        .filter(|key| !key.is_null())
        .and_then(|key| {
            target
                .rows
                .iter()
                .find(|candidate| candidate.get(&target.primary_key) == Some(key))
        });

    Ok(joined
        .map(|related| Value::Object(project(related, &embed.columns)))
        .unwrap_or(Value::Null))
}

fn check_foreign_keys(
    state: &MemorySnapshot,
    table: &str,
    row: &Map<String, Value>,
) -> SyncResult<()> {
    for relation in state.relations.iter().filter(|r| r.from == table) {
        let Some(key) = row.get(&relation.foreign_key).filter(|k| !k.is_null()) else {
            continue;
        };
        let target = lookup_table(state, &relation.to)?;
        if !target
            .rows
            .iter()
            .any(|candidate| candidate.get(&target.primary_key) == Some(key))
        {
            return Err(SyncError::Service(format!(
                "foreign key violation: {}.{} = {} has no match in '{}'",
                table, relation.foreign_key, key, relation.to
            )));
        }
    }
    Ok(())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryRecordService {
        let service = MemoryRecordService::storefront();
        service
            .insert(CATEGORY_TABLE, json!({ "nama_kategori": "Peripherals" }))
            .await
            .unwrap();
        service
            .insert(
                PRODUCT_TABLE,
                json!({ "nama_produk": "Mouse", "harga": 50000, "jumlah_produk": 3, "id_kategori": 1 }),
            )
            .await
            .unwrap();
        service
            .insert(
                PRODUCT_TABLE,
                json!({ "nama_produk": "Orphan", "harga": 1000, "jumlah_produk": 1 }),
            )
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_keys() {
        let service = seeded().await;
        let row = service
            .insert(PRODUCT_TABLE, json!({ "nama_produk": "Pad", "harga": 1, "jumlah_produk": 1 }))
            .await
            .unwrap();
        assert_eq!(row["id_produk"], json!(3));
        assert_eq!(service.row_count(PRODUCT_TABLE), 3);
    }

    #[tokio::test]
    async fn test_select_embeds_category_and_orders() {
        let service = seeded().await;
        let rows = service
            .select(&crate::protocol::product_query())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["nama_produk"], json!("Mouse"));
        assert_eq!(
            rows[0]["kategori_produk"],
            json!({ "nama_kategori": "Peripherals" })
        );
        assert_eq!(rows[1]["kategori_produk"], Value::Null);
        assert!(rows[0].get("id_kategori").is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_by_filter() {
        let service = seeded().await;

        let affected = service
            .update(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 1), json!({ "harga": 75000, "id_produk": 99 }))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = service
            .select(&Query::table(PRODUCT_TABLE).eq(PRODUCT_ID, 1))
            .await
            .unwrap();
        assert_eq!(rows[0]["harga"], json!(75000));

        assert_eq!(
            service.delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 42)).await.unwrap(),
            0
        );
        assert_eq!(
            service.delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 1)).await.unwrap(),
            1
        );
        assert_eq!(service.row_count(PRODUCT_TABLE), 1);
    }

    #[tokio::test]
    async fn test_foreign_key_violation_is_rejected() {
        let service = seeded().await;
        let err = service
            .insert(
                PRODUCT_TABLE,
                json!({ "nama_produk": "Bad", "harga": 1, "jumlah_produk": 1, "id_kategori": 77 }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Service(_)));
        assert_eq!(service.row_count(PRODUCT_TABLE), 2);
    }

    #[tokio::test]
    async fn test_offline_calls_fail_with_network_error() {
        let service = seeded().await;
        service.set_offline(true);
        let err = service.select(&Query::table(PRODUCT_TABLE)).await.unwrap_err();
        assert!(err.is_retryable());

        service.set_offline(false);
        assert!(service.select(&Query::table(PRODUCT_TABLE)).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_receives_table_events_and_counts_channels() {
        let service = seeded().await;
        let mut subscription = service.subscribe(PRODUCT_TABLE).await.unwrap();
        assert_eq!(service.active_subscriptions(), 1);

        service
            .insert(CATEGORY_TABLE, json!({ "nama_kategori": "Storage" }))
            .await
            .unwrap();
        service
            .delete(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 2))
            .await
            .unwrap();

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.event_type, ChangeKind::Delete);
        assert_eq!(event.payload["nama_produk"], json!("Orphan"));

        subscription.close();
        assert_eq!(service.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_drain_consumes_queued_burst() {
        let service = seeded().await;
        let mut subscription = service.subscribe(PRODUCT_TABLE).await.unwrap();

        for price in [1, 2, 3] {
            service
                .update(PRODUCT_TABLE, &Filter::eq(PRODUCT_ID, 1), json!({ "harga": price }))
                .await
                .unwrap();
        }

        assert!(subscription.recv().await.is_some());
        assert_eq!(subscription.drain(), 2);
        assert_eq!(subscription.drain(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_surfaces_timeout() {
        let service = seeded().await;
        service.set_latency(Duration::from_secs(30));

        let err = with_timeout(
            Duration::from_millis(500),
            service.select(&Query::table(PRODUCT_TABLE)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::Timeout(500)));
    }

    #[tokio::test]
    async fn test_export_import_keeps_rows_and_counters() {
        let service = seeded().await;
        let snapshot = service.export();
        let json = serde_json::to_string(&snapshot).unwrap();

        let restored = MemoryRecordService::import(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.row_count(PRODUCT_TABLE), 2);

        let row = restored
            .insert(PRODUCT_TABLE, json!({ "nama_produk": "Next", "harga": 1, "jumlah_produk": 1 }))
            .await
            .unwrap();
        assert_eq!(row["id_produk"], json!(3));
    }
}
