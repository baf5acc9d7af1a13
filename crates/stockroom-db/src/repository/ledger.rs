//! [`LedgerRepository`] for [`SurrealInventoryStore`].

use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::item::{MAX_QUANTITY, normalize_item_id};
use stockroom_core::models::summary::{InventorySummary, RECENT_ACTIVITY_LIMIT};
use stockroom_core::models::transaction::{RecordMovement, Transaction, TransactionKind};
use stockroom_core::models::user::normalize_username;
use stockroom_core::repository::LedgerRepository;
use surrealdb::Connection;
use tracing::{info, warn};

use super::inventory::{PendingEntry, SurrealInventoryStore};
use crate::error::DbError;
use crate::repository::CountRow;

impl<C: Connection> LedgerRepository for SurrealInventoryStore<C> {
    async fn record(
        &self,
        kind: TransactionKind,
        input: RecordMovement,
    ) -> StockroomResult<Transaction> {
        let input = input.normalized()?;

        let (_guard, item) = self.lock_existing_item(&input.item_id).await?;

        let new_quantity = item
            .quantity
            .checked_add(kind.signed(input.quantity))
            .filter(|q| *q <= MAX_QUANTITY)
            .ok_or_else(|| StockroomError::validation("quantity out of range"))?;
        if new_quantity < 0 {
            warn!(
                item_id = %item.id,
                available = item.quantity,
                requested = input.quantity,
                actor = %input.actor,
                "Outgoing movement rejected: insufficient stock"
            );
            return Err(StockroomError::InsufficientStock {
                item_id: item.id,
                available: item.quantity,
                requested: input.quantity,
            });
        }

        let entry = PendingEntry {
            kind,
            item_id: item.id,
            quantity: input.quantity,
            actor: input.actor,
            notes: input.notes,
        };
        let transaction = self.apply_movement(entry, &[], Vec::new()).await?;

        info!(
            entry = transaction.id,
            kind = %transaction.kind,
            item_id = %transaction.item_id,
            quantity = transaction.quantity,
            stock = new_quantity,
            actor = %transaction.user_username,
            "Movement recorded"
        );
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        kind: Option<TransactionKind>,
    ) -> StockroomResult<Vec<Transaction>> {
        let filter = kind.map(|kind| ("kind", kind.as_str().to_string()));
        Ok(self.query_entries(filter, None).await?)
    }

    async fn find_transactions_by_item(
        &self,
        item_id: &str,
    ) -> StockroomResult<Vec<Transaction>> {
        let filter = ("item_id", normalize_item_id(item_id));
        Ok(self.query_entries(Some(filter), None).await?)
    }

    async fn find_transactions_by_user(
        &self,
        username: &str,
    ) -> StockroomResult<Vec<Transaction>> {
        let filter = ("user_username", normalize_username(username));
        Ok(self.query_entries(Some(filter), None).await?)
    }

    async fn summary(&self, low_stock_threshold: i64) -> StockroomResult<InventorySummary> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE quantity FROM item; \
                 SELECT count() AS total FROM ledger_entry GROUP ALL;",
            )
            .await
            .map_err(DbError::from)?;

        let quantities: Vec<i64> = result.take(0).map_err(DbError::from)?;
        let counts: Vec<CountRow> = result.take(1).map_err(DbError::from)?;

        let total_stock_quantity = quantities
            .iter()
            .try_fold(0i64, |acc, q| acc.checked_add(*q))
            .ok_or_else(|| StockroomError::Internal("total stock quantity out of range".into()))?;

        let recent_activity = self
            .query_entries(None, Some(RECENT_ACTIVITY_LIMIT))
            .await?;

        Ok(InventorySummary {
            total_items: quantities.len() as u64,
            total_stock_quantity,
            low_stock_items: quantities
                .iter()
                .filter(|&&q| q < low_stock_threshold)
                .count() as u64,
            total_transactions: counts.first().map(|c| c.total).unwrap_or(0),
            recent_activity,
        })
    }
}
