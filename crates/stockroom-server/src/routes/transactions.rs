//! `/api/transactions`: the ledger.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use stockroom_core::models::transaction::{RecordMovement, TransactionKind};
use stockroom_core::repository::LedgerRepository;
use tracing::debug;

use crate::dto::{MovementRequest, TransactionQuery, TransactionResponse, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiUser, perm};
use crate::routes::item_names;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions/incoming", post(record_incoming))
        .route("/transactions/outgoing", post(record_outgoing))
}

/// `?type=` narrows by kind (an unrecognized value is ignored);
/// `?item_id=` and `?user=` narrow by item and actor.
async fn list_transactions(
    _user: ApiUser<perm::ViewTransactions>,
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let kind = query
        .kind
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .and_then(|k| match k.parse::<TransactionKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                debug!(kind = %k, "Ignoring unknown transaction type filter");
                None
            }
        });
    let item_id = query.item_id.filter(|v| !v.trim().is_empty());
    let user = query.user.filter(|v| !v.trim().is_empty());

    let mut entries = match (&item_id, &user) {
        (Some(item_id), _) => state.inventory.find_transactions_by_item(item_id).await?,
        (None, Some(user)) => state.inventory.find_transactions_by_user(user).await?,
        (None, None) => state.inventory.list_transactions(kind).await?,
    };
    if item_id.is_some() || user.is_some() {
        let user = user.map(|u| u.trim().to_lowercase());
        entries.retain(|t| {
            kind.is_none_or(|k| t.kind == k)
                && user.as_ref().is_none_or(|u| &t.user_username == u)
        });
    }

    let names = item_names(&state, &entries).await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|t| TransactionResponse::new(t, &names))
            .collect(),
    ))
}

async fn record(
    kind: TransactionKind,
    actor: String,
    state: &AppState,
    body: MovementRequest,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let quantity = body
        .quantity
        .ok_or_else(|| ApiError::BadRequest("quantity is required".into()))?
        .parse("quantity")?;

    let entry = state
        .inventory
        .record(
            kind,
            RecordMovement {
                item_id: required(body.item_id, "item_id")?,
                quantity,
                actor,
                notes: body.notes,
            },
        )
        .await?;

    let names = item_names(state, std::slice::from_ref(&entry)).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::new(entry, &names)),
    ))
}

async fn record_incoming(
    ApiUser(user, _): ApiUser<perm::RecordTransaction>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    record(TransactionKind::Incoming, user.username, &state, body).await
}

async fn record_outgoing(
    ApiUser(user, _): ApiUser<perm::RecordTransaction>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    record(TransactionKind::Outgoing, user.username, &state, body).await
}
