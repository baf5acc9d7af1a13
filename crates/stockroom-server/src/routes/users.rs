//! `/api/users`: account administration (admin only).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use stockroom_core::models::user::{CreateUser, Role, UpdateUser};
use stockroom_core::repository::UserRepository;

use crate::dto::{
    CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse, required,
};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiUser, perm};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{username}", put(update_user).delete(delete_user))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Ok(raw.parse::<Role>()?)
}

async fn list_users(
    _admin: ApiUser<perm::ManageUsers>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.auth.users().list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create_user(
    _admin: ApiUser<perm::ManageUsers>,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = parse_role(&required(body.role, "role")?)?;
    let user = state
        .auth
        .create_user(CreateUser {
            username: required(body.username, "username")?,
            password: required(body.password, "password")?,
            display_name: required(body.name, "name")?,
            role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn update_user(
    ApiUser(admin, _): ApiUser<perm::ManageUsers>,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Blank fields mean "leave unchanged", as the management form sends them.
    let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let role = blank_to_none(body.role).map(|r| parse_role(&r)).transpose()?;

    let user = state
        .auth
        .update_user(
            &admin,
            &username,
            UpdateUser {
                display_name: blank_to_none(body.name),
                role,
                password: blank_to_none(body.password),
            },
        )
        .await?;
    Ok(Json(UserResponse::from(user)))
}

async fn delete_user(
    ApiUser(admin, _): ApiUser<perm::ManageUsers>,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.delete_user(&admin, &username).await?;
    Ok(Json(MessageResponse::new(format!(
        "user '{}' deleted",
        username.trim().to_lowercase()
    ))))
}
