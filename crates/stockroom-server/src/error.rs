//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": "<message>"}`. Store and
//! internal failures are logged in full and reported with a generic
//! message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stockroom_core::error::{ConflictReason, StockroomError};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Domain(StockroomError),
    /// Malformed request body or parameters.
    BadRequest(String),
    RegistrationClosed,
}

impl From<StockroomError> for ApiError {
    fn from(err: StockroomError) -> Self {
        ApiError::Domain(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(err) => domain_status(err),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RegistrationClosed => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Never carries store details.
    pub fn message(&self) -> String {
        match self {
            ApiError::Domain(StockroomError::Store(_) | StockroomError::Internal(_)) => {
                "internal server error".to_string()
            }
            ApiError::Domain(err) => err.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::RegistrationClosed => "registration is disabled".to_string(),
        }
    }
}

fn domain_status(err: &StockroomError) -> StatusCode {
    match err {
        StockroomError::Validation { .. }
        | StockroomError::InsufficientStock { .. }
        | StockroomError::InvalidOperation { .. } => StatusCode::BAD_REQUEST,
        StockroomError::Conflict {
            reason: ConflictReason::Duplicate,
            ..
        } => StatusCode::CONFLICT,
        StockroomError::Conflict {
            reason: ConflictReason::Referenced,
            ..
        } => StatusCode::BAD_REQUEST,
        StockroomError::NotFound { .. } => StatusCode::NOT_FOUND,
        StockroomError::Unauthenticated | StockroomError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        StockroomError::Forbidden { .. } => StatusCode::FORBIDDEN,
        StockroomError::Store(_) | StockroomError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
