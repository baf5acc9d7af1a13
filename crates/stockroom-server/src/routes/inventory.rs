//! `/api/inventory`: the item store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use stockroom_core::models::item::{CreateItem, UpdateItem};
use stockroom_core::repository::ItemRepository;

use crate::dto::{
    CreateItemRequest, ItemResponse, MessageResponse, UpdateItemRequest, required,
};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiUser, perm};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route(
            "/inventory/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

async fn list_items(
    _user: ApiUser<perm::ViewInventory>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.inventory.list().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

async fn create_item(
    ApiUser(user, _): ApiUser<perm::CreateItem>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = body
        .quantity
        .ok_or_else(|| ApiError::BadRequest("quantity is required".into()))?
        .parse("quantity")?;

    let item = state
        .inventory
        .create(CreateItem {
            id: required(body.item_id, "item_id")?,
            name: required(body.name, "name")?,
            category: required(body.category, "category")?,
            quantity,
            added_by: user.username,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

async fn get_item(
    _user: ApiUser<perm::Authenticated>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state.inventory.get_by_id(&id).await?;
    Ok(Json(ItemResponse::from(item)))
}

async fn update_item(
    ApiUser(user, _): ApiUser<perm::ManageItems>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let quantity = body
        .quantity
        .map(|q| q.parse("quantity"))
        .transpose()?;

    let item = state
        .inventory
        .update(
            &user.username,
            &id,
            UpdateItem {
                name: body.name,
                category: body.category,
                quantity,
            },
        )
        .await?;
    Ok(Json(ItemResponse::from(item)))
}

async fn delete_item(
    _user: ApiUser<perm::ManageItems>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.inventory.delete(&id).await?;
    Ok(Json(MessageResponse::new(format!(
        "item '{}' deleted",
        id.trim().to_uppercase()
    ))))
}
