//! Dashboard aggregation.

use serde::{Deserialize, Serialize};

use crate::models::transaction::Transaction;

/// Number of entries reported in [`InventorySummary::recent_activity`].
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: u64,
    pub total_stock_quantity: i64,
    /// Items whose quantity is strictly below the configured threshold.
    pub low_stock_items: u64,
    pub total_transactions: u64,
    /// Newest first.
    pub recent_activity: Vec<Transaction>,
}
