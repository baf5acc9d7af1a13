//! Stockroom Core: domain types shared by every other crate.
//!
//! - Models for users, inventory items, ledger entries and sessions
//! - The [`StockroomError`](error::StockroomError) taxonomy
//! - Repository traits implemented by `stockroom-db`
//! - The role matrix enforced by the access gate ([`access`])

pub mod access;
pub mod error;
pub mod models;
pub mod repository;

pub use access::{Identity, Operation};
pub use error::{StockroomError, StockroomResult};
