//! Domain models for Stockroom.

pub mod item;
pub mod session;
pub mod summary;
pub mod transaction;
pub mod user;
