//! Request and response bodies of the JSON API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::access::Identity;
use stockroom_core::models::item::InventoryItem;
use stockroom_core::models::summary::InventorySummary;
use stockroom_core::models::transaction::Transaction;
use stockroom_core::models::user::User;

use crate::error::ApiError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A quantity sent either as a JSON integer or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityField {
    Number(i64),
    Text(String),
}

impl QuantityField {
    pub fn parse(&self, field: &str) -> Result<i64, ApiError> {
        match self {
            QuantityField::Number(n) => Ok(*n),
            QuantityField::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                ApiError::BadRequest(format!("{field} must be a whole number"))
            }),
        }
    }
}

/// Unwrap a field that the endpoint requires, rejecting blanks.
pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub username: String,
    pub name: String,
    pub role: String,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            name: identity.display_name.clone(),
            role: identity.role.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub identity: IdentityResponse,
    /// Raw session token for clients that use `Authorization: Bearer`.
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<QuantityField>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<QuantityField>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub category: String,
    pub added_by: Option<String>,
    pub last_update: String,
}

impl From<InventoryItem> for ItemResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            last_update: format_timestamp(&item.last_update),
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            category: item.category,
            added_by: item.added_by,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub name: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            name: user.display_name,
            role: user.role.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    pub item_id: Option<String>,
    pub quantity: Option<QuantityField>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub item_id: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TransactionResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub user: String,
    pub timestamp: String,
    pub notes: Option<String>,
}

impl TransactionResponse {
    /// `names` maps item ids to names; unknown ids fall back to the id.
    pub fn new(t: Transaction, names: &HashMap<String, String>) -> Self {
        let item_name = names
            .get(&t.item_id)
            .cloned()
            .unwrap_or_else(|| t.item_id.clone());
        Self {
            id: t.id,
            kind: t.kind.to_string(),
            item_name,
            item_id: t.item_id,
            quantity: t.quantity,
            user: t.user_username,
            timestamp: format_timestamp(&t.timestamp),
            notes: t.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_items: u64,
    pub total_stock_quantity: i64,
    pub low_stock_items: u64,
    pub total_transactions: u64,
    pub recent_activity: Vec<TransactionResponse>,
}

impl SummaryResponse {
    pub fn new(summary: InventorySummary, names: &HashMap<String, String>) -> Self {
        Self {
            total_items: summary.total_items,
            total_stock_quantity: summary.total_stock_quantity,
            low_stock_items: summary.low_stock_items,
            total_transactions: summary.total_transactions,
            recent_activity: summary
                .recent_activity
                .into_iter()
                .map(|t| TransactionResponse::new(t, names))
                .collect(),
        }
    }
}
