//! Shared state for the item store and the ledger.
//!
//! Items and ledger entries are served by one store so that every write
//! to `item.quantity` goes through the same per-item lock and the same
//! transactional write path. The [`ItemRepository`] impl lives in
//! `item.rs`, the [`LedgerRepository`] impl in `ledger.rs`.
//!
//! [`ItemRepository`]: stockroom_core::repository::ItemRepository
//! [`LedgerRepository`]: stockroom_core::repository::LedgerRepository

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::item::InventoryItem;
use stockroom_core::models::transaction::{Transaction, TransactionKind};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
pub(super) struct ItemRow {
    code: String,
    name: String,
    quantity: i64,
    category: String,
    added_by: Option<String>,
    last_update: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.code,
            name: row.name,
            quantity: row.quantity,
            category: row.category,
            added_by: row.added_by,
            last_update: row.last_update,
        }
    }
}

#[derive(Debug, SurrealValue)]
pub(super) struct LedgerRow {
    seq: i64,
    kind: String,
    item_id: String,
    quantity: i64,
    user_username: String,
    notes: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl LedgerRow {
    pub(super) fn try_into_transaction(self) -> Result<Transaction, DbError> {
        let kind = self
            .kind
            .parse::<TransactionKind>()
            .map_err(|e| DbError::Decode(format!("ledger entry {}: {e}", self.seq)))?;
        Ok(Transaction {
            id: self.seq,
            kind,
            item_id: self.item_id,
            quantity: self.quantity,
            user_username: self.user_username,
            timestamp: self.recorded_at,
            notes: self.notes,
        })
    }
}

/// Applies a quantity delta and appends the matching ledger entry in one
/// transaction. Extra `SET` clauses for the item are spliced in by
/// [`movement_query`]. The `quantity >= 0` schema assertion aborts the
/// whole unit if stock would go negative.
const MOVEMENT_QUERY: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('item', $item_id) SET \
    quantity += $delta, last_update = $now{extra_sets};
CREATE type::record('ledger_entry', $seq) SET \
    seq = $seq, kind = $kind, item_id = $item_id, quantity = $quantity, \
    user_username = $actor, notes = $notes, recorded_at = $now;
COMMIT TRANSACTION;
";

pub(super) fn movement_query(extra_sets: &[&str]) -> String {
    let extra = extra_sets
        .iter()
        .map(|set| format!(", {set}"))
        .collect::<String>();
    MOVEMENT_QUERY.replace("{extra_sets}", &extra)
}

/// A ledger entry about to be written.
pub(super) struct PendingEntry {
    pub kind: TransactionKind,
    pub item_id: String,
    pub quantity: i64,
    pub actor: String,
    pub notes: Option<String>,
}

/// SurrealDB-backed item store and ledger.
#[derive(Clone)]
pub struct SurrealInventoryStore<C: Connection> {
    pub(super) db: Surreal<C>,
    item_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    next_seq: Arc<AtomicI64>,
}

impl<C: Connection> SurrealInventoryStore<C> {
    /// Open the store, resuming the ledger sequence after the highest
    /// recorded entry.
    pub async fn open(db: Surreal<C>) -> Result<Self, DbError> {
        let mut result = db
            .query("SELECT VALUE seq FROM ledger_entry ORDER BY seq DESC LIMIT 1")
            .await?;
        let last: Vec<i64> = result.take(0)?;
        let last_seq = last.first().copied().unwrap_or(0);
        debug!(last_seq, "Ledger sequence resumed");

        Ok(Self {
            db,
            item_locks: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicI64::new(last_seq + 1)),
        })
    }

    /// Serializes read-validate-write on one item. Different items do
    /// not contend.
    pub(super) async fn lock_item(&self, item_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .item_locks
            .entry(item_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Release `guard` and drop the map entry for `item_id` unless another
    /// task still holds or awaits the same mutex.
    pub(super) fn release_item_lock(&self, item_id: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.item_locks
            .remove_if(item_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Lock `item_id` and load the item under that lock. If the item is
    /// missing or cannot be loaded, the lock is released again so unknown
    /// ids leave no entry behind.
    pub(super) async fn lock_existing_item(
        &self,
        item_id: &str,
    ) -> StockroomResult<(OwnedMutexGuard<()>, InventoryItem)> {
        let guard = self.lock_item(item_id).await;
        match self.fetch_item(item_id).await {
            Ok(Some(item)) => Ok((guard, item)),
            Ok(None) => {
                self.release_item_lock(item_id, guard);
                Err(StockroomError::not_found("item", item_id))
            }
            Err(e) => {
                self.release_item_lock(item_id, guard);
                Err(e.into())
            }
        }
    }

    pub(super) async fn fetch_item(
        &self,
        item_id: &str,
    ) -> Result<Option<InventoryItem>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('item', $item_id)")
            .bind(("item_id", item_id.to_string()))
            .await?;

        let rows: Vec<ItemRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(InventoryItem::from))
    }

    /// Write `entry` and its quantity delta atomically, together with any
    /// extra item assignments already bound on the query by `bind_extra`.
    /// The caller must hold the item lock.
    pub(super) async fn apply_movement(
        &self,
        entry: PendingEntry,
        extra_sets: &[&str],
        bind_extra: Vec<(&'static str, String)>,
    ) -> Result<Transaction, DbError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let delta = entry.kind.signed(entry.quantity);

        let query = movement_query(extra_sets);
        let mut builder = self
            .db
            .query(&query)
            .bind(("item_id", entry.item_id.clone()))
            .bind(("delta", delta))
            .bind(("now", now))
            .bind(("seq", seq))
            .bind(("kind", entry.kind.as_str().to_string()))
            .bind(("quantity", entry.quantity))
            .bind(("actor", entry.actor.clone()))
            .bind(("notes", entry.notes.clone()));
        for (name, value) in bind_extra {
            builder = builder.bind((name, value));
        }

        builder
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(Transaction {
            id: seq,
            kind: entry.kind,
            item_id: entry.item_id,
            quantity: entry.quantity,
            user_username: entry.actor,
            timestamp: now,
            notes: entry.notes,
        })
    }

    pub(super) async fn query_entries(
        &self,
        filter: Option<(&'static str, String)>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, DbError> {
        let mut query = String::from("SELECT * FROM ledger_entry");
        if let Some((field, _)) = &filter {
            query.push_str(&format!(" WHERE {field} = $filter"));
        }
        query.push_str(" ORDER BY recorded_at DESC, seq DESC");
        if let Some(limit) = limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut builder = self.db.query(&query);
        if let Some((_, value)) = filter {
            builder = builder.bind(("filter", value));
        }
        let mut result = builder.await?;

        let rows: Vec<LedgerRow> = result.take(0)?;
        rows.into_iter()
            .map(LedgerRow::try_into_transaction)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use stockroom_core::models::item::{CreateItem, UpdateItem};
    use stockroom_core::models::transaction::RecordMovement;
    use stockroom_core::repository::{ItemRepository, LedgerRepository};
    use surrealdb::engine::local::{Db, Mem};

    use super::*;

    #[test]
    fn movement_query_without_extra_sets() {
        let query = movement_query(&[]);
        assert!(query.contains("quantity += $delta, last_update = $now;"));
        assert!(query.starts_with("BEGIN TRANSACTION;"));
        assert!(query.trim_end().ends_with("COMMIT TRANSACTION;"));
    }

    #[test]
    fn movement_query_splices_item_assignments() {
        let query = movement_query(&["name = $name", "category = $category"]);
        assert!(query.contains("last_update = $now, name = $name, category = $category;"));
    }

    async fn store() -> SurrealInventoryStore<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        crate::run_migrations(&db).await.unwrap();
        SurrealInventoryStore::open(db).await.unwrap()
    }

    #[tokio::test]
    async fn unknown_ids_leave_no_lock_entries() {
        let store = store().await;

        for i in 0..50 {
            let id = format!("GHOST{i}");
            let movement = RecordMovement {
                item_id: id.clone(),
                quantity: 1,
                actor: "op".into(),
                notes: None,
            };
            let err = store
                .record(TransactionKind::Incoming, movement)
                .await
                .unwrap_err();
            assert!(matches!(err, StockroomError::NotFound { .. }));

            let rename = UpdateItem {
                name: Some("Renamed".into()),
                ..Default::default()
            };
            let err = store.update("mgr", &id, rename).await.unwrap_err();
            assert!(matches!(err, StockroomError::NotFound { .. }));

            let err = store.delete(&id).await.unwrap_err();
            assert!(matches!(err, StockroomError::NotFound { .. }));
        }

        assert_eq!(store.item_locks.len(), 0);
    }

    #[tokio::test]
    async fn deleting_an_item_prunes_its_lock() {
        let store = store().await;
        store
            .create(CreateItem {
                id: "ITEM001".into(),
                name: "Laptop".into(),
                category: "Electronics".into(),
                quantity: 1,
                added_by: "admin".into(),
            })
            .await
            .unwrap();
        assert_eq!(store.item_locks.len(), 1);

        store.delete("ITEM001").await.unwrap();
        assert_eq!(store.item_locks.len(), 0);
    }

    #[tokio::test]
    async fn release_keeps_entry_while_mutex_is_shared() {
        let store = store().await;

        let guard = store.lock_item("ITEM001").await;
        let waiter = store
            .item_locks
            .get("ITEM001")
            .map(|entry| entry.value().clone())
            .unwrap();

        store.release_item_lock("ITEM001", guard);
        assert!(store.item_locks.contains_key("ITEM001"));

        // The other holder now gets the same mutex as a fresh locker.
        let held = waiter.clone().lock_owned().await;
        let fresh = store.item_locks.get("ITEM001").unwrap().value().clone();
        assert!(Arc::ptr_eq(&waiter, &fresh));
        drop(fresh);
        drop(waiter);

        store.release_item_lock("ITEM001", held);
        assert!(!store.item_locks.contains_key("ITEM001"));
    }

    #[tokio::test]
    async fn summary_reports_total_overflow() {
        let store = store().await;
        for code in ["BIG1", "BIG2"] {
            store
                .db
                .query(
                    "CREATE type::record('item', $code) SET code = $code, \
                     name = 'Bulk', quantity = 9223372036854775807, \
                     category = 'Bulk', added_by = NONE, last_update = time::now()",
                )
                .bind(("code", code.to_string()))
                .await
                .unwrap()
                .check()
                .unwrap();
        }

        let err = store.summary(5).await.unwrap_err();
        assert!(matches!(err, StockroomError::Internal(_)));
    }
}
