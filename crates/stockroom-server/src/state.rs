//! Shared application state handed to every handler.

use std::sync::Arc;

use stockroom_auth::{AuthConfig, AuthService};
use stockroom_db::DbError;
use stockroom_db::repository::{
    SurrealInventoryStore, SurrealSessionRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Auth = AuthService<SurrealUserRepository<Any>, SurrealSessionRepository<Any>>;
pub type Inventory = SurrealInventoryStore<Any>;

/// Runtime knobs that are not owned by a lower layer.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub low_stock_threshold: i64,
    pub allow_registration: bool,
    pub secure_cookies: bool,
    /// Mirrors the auth config so cookies expire with their session.
    pub session_lifetime_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
            allow_registration: true,
            secure_cookies: false,
            session_lifetime_secs: 86_400,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub inventory: Inventory,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    /// Wire repositories onto an already-migrated database.
    pub async fn new(
        db: Surreal<Any>,
        auth_config: AuthConfig,
        settings: AppSettings,
    ) -> Result<Self, DbError> {
        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let sessions = SurrealSessionRepository::new(db.clone());
        let inventory = SurrealInventoryStore::open(db).await?;

        Ok(Self {
            auth: Arc::new(AuthService::new(users, sessions, auth_config)),
            inventory,
            settings: Arc::new(settings),
        })
    }
}
