//! `/api/auth/*`: session endpoints.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use stockroom_auth::{LoginInput, RegisterInput};

use crate::cookies;
use crate::dto::{
    IdentityResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    UserResponse, format_timestamp, required,
};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiUser, perm, session_token};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let out = state
        .auth
        .login(LoginInput {
            username: required(body.username, "username")?,
            password: required(body.password, "password")?,
        })
        .await?;

    let cookie = cookies::session(&out.token, &state.settings);
    let body = LoginResponse {
        identity: IdentityResponse::from(&out.identity),
        token: out.token,
        expires_at: format_timestamp(&out.expires_at),
    };
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await?;
    }
    Ok((
        AppendHeaders([(SET_COOKIE, cookies::clear_session(&state.settings))]),
        Json(MessageResponse::new("logged out")),
    ))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.settings.allow_registration {
        return Err(ApiError::RegistrationClosed);
    }
    let user = state
        .auth
        .register(RegisterInput {
            username: required(body.username, "username")?,
            password: required(body.password, "password")?,
            display_name: required(body.name, "name")?,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn me(ApiUser(identity, _): ApiUser<perm::Authenticated>) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(&identity))
}
