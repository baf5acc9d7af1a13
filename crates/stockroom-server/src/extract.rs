//! Request extractors: session token lookup, role-gated identities and
//! JSON bodies with API-shaped rejections.
//!
//! Route guards are types. A handler taking `ApiUser<ManageUsers>` is only
//! entered once the caller has a live session and a role allowed to manage
//! users; otherwise the extractor answers 401 or 403 on its own.
//! `PageUser<P>` does the same for HTML pages but answers with a redirect.

use std::marker::PhantomData;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use stockroom_core::access::{Identity, Operation};
use stockroom_core::error::StockroomError;

use crate::cookies::SESSION_COOKIE;
use crate::error::ApiError;
use crate::routes::pages;
use crate::state::AppState;

/// Value of cookie `name`, if the request carries it.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// The raw session token: the session cookie, or a bearer token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
}

/// Marker naming the [`Operation`] a guard checks. `None` only requires a
/// live session.
pub trait Permission: Send + Sync + 'static {
    const OPERATION: Option<Operation>;
}

macro_rules! permission {
    ($($marker:ident => $operation:expr),* $(,)?) => {
        $(
            pub struct $marker;

            impl Permission for $marker {
                const OPERATION: Option<Operation> = $operation;
            }
        )*
    };
}

pub mod perm {
    use super::{Operation, Permission};

    permission! {
        Authenticated => None,
        ViewDashboard => Some(Operation::ViewDashboard),
        ViewInventory => Some(Operation::ViewInventory),
        CreateItem => Some(Operation::CreateItem),
        ManageItems => Some(Operation::ManageItems),
        RecordTransaction => Some(Operation::RecordTransaction),
        ViewTransactions => Some(Operation::ViewTransactions),
        ManageUsers => Some(Operation::ManageUsers),
    }
}

async fn resolve<P: Permission>(
    parts: &Parts,
    state: &AppState,
) -> Result<Identity, StockroomError> {
    let token = session_token(&parts.headers);
    match P::OPERATION {
        Some(operation) => state.auth.admit(token.as_deref(), operation).await,
        None => state.auth.authenticate(token.as_deref()).await,
    }
}

/// Caller of a JSON endpoint. Rejects with 401/403 JSON errors.
pub struct ApiUser<P: Permission>(pub Identity, pub PhantomData<P>);

impl<P: Permission> FromRequestParts<AppState> for ApiUser<P> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve::<P>(parts, state).await?;
        Ok(Self(identity, PhantomData))
    }
}

/// Caller of an HTML page. Rejects by redirecting to `/login` or
/// `/unauthorized` with a flash notice.
pub struct PageUser<P: Permission>(pub Identity, pub PhantomData<P>);

impl<P: Permission> FromRequestParts<AppState> for PageUser<P> {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve::<P>(parts, state).await {
            Ok(identity) => Ok(Self(identity, PhantomData)),
            Err(StockroomError::Unauthenticated) => Err(pages::redirect_with_notice(
                "/login",
                pages::Notice::warning("Please log in first."),
                state,
            )),
            Err(StockroomError::Forbidden { role, .. }) => Err(pages::redirect_with_notice(
                "/unauthorized",
                pages::Notice::danger(format!(
                    "Access denied. Role \"{role}\" may not open this page."
                )),
                state,
            )),
            Err(other) => Err(ApiError::from(other).into_response()),
        }
    }
}

/// JSON body whose rejection is a `{"error": ...}` 400.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(format!(
                "request body must be valid JSON: {}",
                rejection.body_text()
            ))),
        }
    }
}
