//! HTTP routes.

pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod pages;
pub mod transactions;
pub mod users;

use std::collections::{BTreeSet, HashMap};

use axum::{Json, Router};
use serde_json::{Value, json};
use stockroom_core::error::StockroomResult;
use stockroom_core::models::transaction::Transaction;
use stockroom_core::repository::ItemRepository;

use crate::state::AppState;

/// Everything mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(inventory::router())
        .merge(transactions::router())
        .merge(users::router())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Item id → name for the items `entries` touch.
pub(crate) async fn item_names(
    state: &AppState,
    entries: &[Transaction],
) -> StockroomResult<HashMap<String, String>> {
    let ids: BTreeSet<&str> = entries.iter().map(|t| t.item_id.as_str()).collect();
    let ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
    state.inventory.names_of(&ids).await
}
