//! [`ItemRepository`] for [`SurrealInventoryStore`].

use std::collections::HashMap;

use chrono::Utc;
use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::item::{CreateItem, InventoryItem, UpdateItem, normalize_item_id};
use stockroom_core::models::transaction::TransactionKind;
use stockroom_core::repository::ItemRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use tracing::info;

use super::inventory::{ItemRow, PendingEntry, SurrealInventoryStore};
use crate::error::DbError;
use crate::repository::CountRow;

#[derive(Debug, SurrealValue)]
struct NameRow {
    code: String,
    name: String,
}

impl<C: Connection> SurrealInventoryStore<C> {
    async fn ledger_references(&self, item_id: &str) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM ledger_entry \
                 WHERE item_id = $item_id GROUP ALL",
            )
            .bind(("item_id", item_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> ItemRepository for SurrealInventoryStore<C> {
    async fn create(&self, input: CreateItem) -> StockroomResult<InventoryItem> {
        let input = input.normalized()?;
        let _guard = self.lock_item(&input.id).await;

        if self.fetch_item(&input.id).await?.is_some() {
            return Err(StockroomError::duplicate("item", input.id));
        }

        let result = self
            .db
            .query(
                "CREATE type::record('item', $code) SET \
                 code = $code, name = $name, quantity = $quantity, \
                 category = $category, added_by = $added_by, \
                 last_update = $now",
            )
            .bind(("code", input.id.clone()))
            .bind(("name", input.name))
            .bind(("quantity", input.quantity))
            .bind(("category", input.category))
            .bind(("added_by", Some(input.added_by.clone())))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        let item = rows
            .into_iter()
            .next()
            .map(InventoryItem::from)
            .ok_or_else(|| DbError::NotFound {
                entity: "item".into(),
                id: input.id.clone(),
            })?;

        info!(
            item_id = %item.id,
            quantity = item.quantity,
            added_by = %input.added_by,
            "Inventory item created"
        );
        Ok(item)
    }

    async fn get_by_id(&self, id: &str) -> StockroomResult<InventoryItem> {
        let id = normalize_item_id(id);
        self.fetch_item(&id)
            .await?
            .ok_or_else(|| StockroomError::not_found("item", id))
    }

    async fn list(&self) -> StockroomResult<Vec<InventoryItem>> {
        let mut result = self
            .db
            .query("SELECT * FROM item ORDER BY code ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ItemRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    async fn names_of(&self, ids: &[String]) -> StockroomResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<String> = ids.iter().map(|id| normalize_item_id(id)).collect();
        let mut result = self
            .db
            .query("SELECT code, name FROM item WHERE code IN $ids")
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NameRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|row| (row.code, row.name)).collect())
    }

    async fn update(
        &self,
        actor: &str,
        id: &str,
        input: UpdateItem,
    ) -> StockroomResult<InventoryItem> {
        let input = input.normalized()?;
        if input.is_empty() {
            return Err(StockroomError::validation("no fields to update"));
        }
        let id = normalize_item_id(id);

        let (_guard, current) = self.lock_existing_item(&id).await?;

        let mut sets = Vec::new();
        let mut binds = Vec::new();
        if let Some(name) = input.name {
            sets.push("name = $name");
            binds.push(("name", name));
        }
        if let Some(category) = input.category {
            sets.push("category = $category");
            binds.push(("category", category));
        }

        // Both sides are within [0, MAX_QUANTITY], so the difference fits.
        let delta = input
            .quantity
            .map(|target| target - current.quantity)
            .unwrap_or(0);

        if delta != 0 {
            // Stock correction: routed through the ledger so the item's
            // quantity still equals seed + incoming - outgoing.
            let kind = if delta > 0 {
                TransactionKind::Incoming
            } else {
                TransactionKind::Outgoing
            };
            let target = current.quantity + delta;
            let entry = PendingEntry {
                kind,
                item_id: id.clone(),
                quantity: delta.abs(),
                actor: actor.to_string(),
                notes: Some(format!(
                    "stock correction: {} -> {}",
                    current.quantity, target
                )),
            };
            let correction = self.apply_movement(entry, &sets, binds).await?;
            info!(
                item_id = %id,
                from = current.quantity,
                to = target,
                entry = correction.id,
                actor = %actor,
                "Stock corrected"
            );
        } else {
            sets.push("last_update = $now");
            let query = format!(
                "UPDATE type::record('item', $item_id) SET {}",
                sets.join(", ")
            );
            let mut builder = self
                .db
                .query(&query)
                .bind(("item_id", id.clone()))
                .bind(("now", Utc::now()));
            for (name, value) in binds {
                builder = builder.bind((name, value));
            }
            builder
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| DbError::Query(e.to_string()))?;
        }

        self.fetch_item(&id)
            .await?
            .ok_or_else(|| StockroomError::not_found("item", id))
    }

    async fn delete(&self, id: &str) -> StockroomResult<()> {
        let id = normalize_item_id(id);
        let (guard, _) = self.lock_existing_item(&id).await?;

        if self.ledger_references(&id).await? > 0 {
            return Err(StockroomError::referenced("item", id));
        }

        self.db
            .query("DELETE type::record('item', $item_id)")
            .bind(("item_id", id.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.release_item_lock(&id, guard);
        info!(item_id = %id, "Inventory item deleted");
        Ok(())
    }
}
