//! Error types for the Stockroom system.

use thiserror::Error;

/// Why a write was refused as conflicting with existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The natural key is already taken.
    Duplicate,
    /// Ledger entries still reference the entity.
    Referenced,
}

#[derive(Debug, Error)]
pub enum StockroomError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("{}", conflict_message(entity, id, *reason))]
    Conflict {
        entity: String,
        id: String,
        reason: ConflictReason,
    },

    #[error("insufficient stock for '{item_id}': available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("role '{role}' is not allowed to {action}")]
    Forbidden { role: String, action: String },

    #[error("{reason}")]
    InvalidOperation { reason: String },

    #[error("storage error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn conflict_message(entity: &str, id: &str, reason: ConflictReason) -> String {
    match reason {
        ConflictReason::Duplicate => format!("{entity} '{id}' already exists"),
        ConflictReason::Referenced => {
            format!("{entity} '{id}' is referenced by recorded transactions")
        }
    }
}

impl StockroomError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity: &str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            id: id.into(),
            reason: ConflictReason::Duplicate,
        }
    }

    pub fn referenced(entity: &str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            id: id.into(),
            reason: ConflictReason::Referenced,
        }
    }

    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }
}

pub type StockroomResult<T> = Result<T, StockroomError>;
