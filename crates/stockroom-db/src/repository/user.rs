//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::user::{CreateUser, Role, UpdateUser, User, normalize_username};
use stockroom_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;
use crate::repository::CountRow;

#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    password_hash: String,
    display_name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| DbError::Decode(format!("user '{}': {e}", self.username)))?;
        Ok(User {
            username: self.username,
            password_hash: self.password_hash,
            display_name: self.display_name,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn fetch(&self, username: &str) -> Result<Option<User>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $username)")
            .bind(("username", username.to_string()))
            .await?;

        let rows: Vec<UserRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(UserRow::try_into_user)
            .transpose()
    }

    async fn ledger_references(&self, username: &str) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM ledger_entry \
                 WHERE user_username = $username GROUP ALL",
            )
            .bind(("username", username.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> StockroomResult<User> {
        let input = input.normalized()?;

        if self.fetch(&input.username).await?.is_some() {
            return Err(StockroomError::duplicate("user", input.username));
        }

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $username) SET \
                 username = $username, \
                 password_hash = $password_hash, \
                 display_name = $display_name, \
                 role = $role",
            )
            .bind(("username", input.username.clone()))
            .bind(("password_hash", password_hash))
            .bind(("display_name", input.display_name))
            .bind(("role", input.role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: input.username.clone(),
        })?;

        info!(username = %input.username, role = %input.role, "User created");
        Ok(row.try_into_user()?)
    }

    async fn get_by_username(&self, username: &str) -> StockroomResult<User> {
        let username = normalize_username(username);
        self.fetch(&username)
            .await?
            .ok_or_else(|| StockroomError::not_found("user", username))
    }

    async fn list(&self) -> StockroomResult<Vec<User>> {
        let mut result = self
            .db
            .query("SELECT * FROM user ORDER BY username ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(UserRow::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(users)
    }

    async fn update(
        &self,
        actor: &str,
        username: &str,
        input: UpdateUser,
    ) -> StockroomResult<User> {
        let actor = normalize_username(actor);
        let username = normalize_username(username);
        let existing = self.get_by_username(&username).await?;

        if actor == username
            && existing.role == Role::Admin
            && matches!(input.role, Some(role) if role != Role::Admin)
        {
            return Err(StockroomError::invalid_operation(
                "you cannot remove your own admin role",
            ));
        }

        let display_name = match input.display_name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(StockroomError::validation("name must not be empty"));
                }
                Some(name)
            }
            None => None,
        };
        let password_hash = match input.password {
            Some(password) if password.is_empty() => {
                return Err(StockroomError::validation("password must not be empty"));
            }
            Some(password) => Some(hash_password(&password, self.pepper.as_deref())?),
            None => None,
        };

        let mut sets = Vec::new();
        if display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        sets.push("updated_at = time::now()");

        // A password reset drops the user's sessions in the same
        // transaction as the new hash.
        let password_changed = password_hash.is_some();
        let update = format!(
            "UPDATE type::record('user', $username) SET {};",
            sets.join(", ")
        );
        let query = if password_changed {
            format!(
                "BEGIN TRANSACTION; {update} \
                 DELETE session WHERE username = $username; \
                 COMMIT TRANSACTION;"
            )
        } else {
            update
        };

        let mut builder = self
            .db
            .query(&query)
            .bind(("username", username.clone()));

        if let Some(display_name) = display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(password_hash) = password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        if password_changed {
            info!(username = %username, "Password reset, sessions revoked");
        }

        self.fetch(&username)
            .await?
            .ok_or_else(|| StockroomError::not_found("user", username))
    }

    async fn delete(&self, actor: &str, username: &str) -> StockroomResult<()> {
        let actor = normalize_username(actor);
        let username = normalize_username(username);

        if actor == username {
            return Err(StockroomError::invalid_operation(
                "you cannot delete your own account",
            ));
        }

        // Existence first so an unknown user reports NotFound.
        self.get_by_username(&username).await?;

        if self.ledger_references(&username).await? > 0 {
            return Err(StockroomError::referenced("user", username));
        }

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE type::record('user', $username); \
                 DELETE session WHERE username = $username; \
                 COMMIT TRANSACTION;",
            )
            .bind(("username", username.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(username = %username, actor = %actor, "User deleted");
        Ok(())
    }
}
