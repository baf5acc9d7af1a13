//! SurrealDB implementation of [`SessionRepository`].
//!
//! Sessions are keyed by the SHA-256 hash of their token, so lookup is a
//! direct record fetch.

use chrono::{DateTime, Utc};
use stockroom_core::error::StockroomResult;
use stockroom_core::models::session::{CreateSession, Session};
use stockroom_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use crate::error::DbError;
use crate::repository::CountRow;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    token_hash: String,
    username: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token_hash: row.token_hash,
            username: row.username,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> StockroomResult<Session> {
        let result = self
            .db
            .query(
                "CREATE type::record('session', $token_hash) SET \
                 token_hash = $token_hash, \
                 username = $username, \
                 expires_at = $expires_at",
            )
            .bind(("token_hash", input.token_hash.clone()))
            .bind(("username", input.username))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: input.token_hash,
        })?;

        Ok(row.into())
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> StockroomResult<Session> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $token_hash)")
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "<token>".into(),
        })?;

        Ok(row.into())
    }

    async fn invalidate(&self, token_hash: &str) -> StockroomResult<()> {
        self.db
            .query("DELETE type::record('session', $token_hash)")
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> StockroomResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE expires_at < time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE session WHERE expires_at < time::now()")
            .await
            .map_err(DbError::from)?;

        debug!(removed = total, "Expired sessions removed");
        Ok(total)
    }
}
