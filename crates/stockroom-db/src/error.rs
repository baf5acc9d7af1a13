//! Database-specific error types and conversions.

use stockroom_core::error::StockroomError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for StockroomError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StockroomError::NotFound { entity, id },
            DbError::Hash(msg) => StockroomError::Internal(msg),
            other => StockroomError::Store(other.to_string()),
        }
    }
}
