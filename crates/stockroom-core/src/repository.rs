//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Role checks happen in the access
//! gate before any of these are called; the repositories enforce data
//! invariants only.

use std::collections::HashMap;

use crate::error::StockroomResult;
use crate::models::{
    item::{CreateItem, InventoryItem, UpdateItem},
    session::{CreateSession, Session},
    summary::InventorySummary,
    transaction::{RecordMovement, Transaction, TransactionKind},
    user::{CreateUser, UpdateUser, User},
};

// ---------------------------------------------------------------------------
// Identity store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` if the username is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = StockroomResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StockroomResult<User>> + Send;
    fn list(&self) -> impl Future<Output = StockroomResult<Vec<User>>> + Send;
    /// Partial update performed by `actor`. An actor may not move their
    /// own role away from admin.
    fn update(
        &self,
        actor: &str,
        username: &str,
        input: UpdateUser,
    ) -> impl Future<Output = StockroomResult<User>> + Send;
    /// Fails if `actor == username` or ledger entries reference the user.
    fn delete(&self, actor: &str, username: &str)
    -> impl Future<Output = StockroomResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Item store
// ---------------------------------------------------------------------------

pub trait ItemRepository: Send + Sync {
    fn create(&self, input: CreateItem)
    -> impl Future<Output = StockroomResult<InventoryItem>> + Send;
    fn get_by_id(&self, id: &str) -> impl Future<Output = StockroomResult<InventoryItem>> + Send;
    fn list(&self) -> impl Future<Output = StockroomResult<Vec<InventoryItem>>> + Send;
    /// Id → name for the given ids. Ids with no item are left out.
    fn names_of(
        &self,
        ids: &[String],
    ) -> impl Future<Output = StockroomResult<HashMap<String, String>>> + Send;
    /// Partial update. A quantity change is recorded as a correction
    /// ledger entry attributed to `actor`.
    fn update(
        &self,
        actor: &str,
        id: &str,
        input: UpdateItem,
    ) -> impl Future<Output = StockroomResult<InventoryItem>> + Send;
    /// Fails with `Conflict` if any ledger entry references the item.
    fn delete(&self, id: &str) -> impl Future<Output = StockroomResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub trait LedgerRepository: Send + Sync {
    /// Atomically append an entry and apply its quantity delta.
    fn record(
        &self,
        kind: TransactionKind,
        input: RecordMovement,
    ) -> impl Future<Output = StockroomResult<Transaction>> + Send;

    fn record_incoming(
        &self,
        input: RecordMovement,
    ) -> impl Future<Output = StockroomResult<Transaction>> + Send {
        self.record(TransactionKind::Incoming, input)
    }

    /// Fails with `InsufficientStock` if the item holds less than requested.
    fn record_outgoing(
        &self,
        input: RecordMovement,
    ) -> impl Future<Output = StockroomResult<Transaction>> + Send {
        self.record(TransactionKind::Outgoing, input)
    }

    /// Newest first; ties broken by insertion order.
    fn list_transactions(
        &self,
        kind: Option<TransactionKind>,
    ) -> impl Future<Output = StockroomResult<Vec<Transaction>>> + Send;
    fn find_transactions_by_item(
        &self,
        item_id: &str,
    ) -> impl Future<Output = StockroomResult<Vec<Transaction>>> + Send;
    fn find_transactions_by_user(
        &self,
        username: &str,
    ) -> impl Future<Output = StockroomResult<Vec<Transaction>>> + Send;
    fn summary(
        &self,
        low_stock_threshold: i64,
    ) -> impl Future<Output = StockroomResult<InventorySummary>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = StockroomResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = StockroomResult<Session>> + Send;
    fn invalidate(&self, token_hash: &str) -> impl Future<Output = StockroomResult<()>> + Send;
    /// Delete expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> impl Future<Output = StockroomResult<u64>> + Send;
}
