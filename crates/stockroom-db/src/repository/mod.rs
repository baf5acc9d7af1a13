//! SurrealDB repository implementations.

mod inventory;
mod item;
mod ledger;
mod session;
mod user;

use surrealdb_types::SurrealValue;

pub use inventory::SurrealInventoryStore;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;

/// Result row of a `SELECT count() AS total ... GROUP ALL`.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
