//! Integration tests for the Session repository.

use chrono::{Duration, Utc};
use stockroom_core::error::StockroomError;
use stockroom_core::models::session::CreateSession;
use stockroom_core::repository::SessionRepository;
use stockroom_db::repository::SurrealSessionRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealSessionRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stockroom_db::run_migrations(&db).await.unwrap();
    SurrealSessionRepository::new(db)
}

fn session(token_hash: &str, username: &str, ttl: Duration) -> CreateSession {
    CreateSession {
        token_hash: token_hash.into(),
        username: username.into(),
        expires_at: Utc::now() + ttl,
    }
}

#[tokio::test]
async fn create_and_lookup_by_hash() {
    let repo = setup().await;

    let created = repo
        .create(session("abc123", "alice", Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(created.username, "alice");

    let fetched = repo.get_by_token_hash("abc123").await.unwrap();
    assert_eq!(fetched.token_hash, "abc123");
    assert_eq!(fetched.username, "alice");
    assert!(fetched.expires_at > Utc::now());
}

#[tokio::test]
async fn unknown_hash_is_not_found() {
    let repo = setup().await;
    let err = repo.get_by_token_hash("nope").await.unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));
}

#[tokio::test]
async fn invalidate_single_session() {
    let repo = setup().await;
    repo.create(session("one", "alice", Duration::hours(1)))
        .await
        .unwrap();
    repo.create(session("two", "alice", Duration::hours(1)))
        .await
        .unwrap();

    repo.invalidate("one").await.unwrap();
    assert!(repo.get_by_token_hash("one").await.is_err());
    assert!(repo.get_by_token_hash("two").await.is_ok());

    // Invalidating twice is harmless.
    repo.invalidate("one").await.unwrap();
}

#[tokio::test]
async fn cleanup_removes_only_expired() {
    let repo = setup().await;
    repo.create(session("old1", "alice", Duration::hours(-2)))
        .await
        .unwrap();
    repo.create(session("old2", "bob", Duration::minutes(-1)))
        .await
        .unwrap();
    repo.create(session("live", "alice", Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(repo.cleanup_expired().await.unwrap(), 2);
    assert!(repo.get_by_token_hash("old1").await.is_err());
    assert!(repo.get_by_token_hash("live").await.is_ok());
    assert_eq!(repo.cleanup_expired().await.unwrap(), 0);
}
