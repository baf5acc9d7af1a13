//! Authentication service: login, registration, logout and the password
//! policy around user management.

use chrono::{DateTime, Duration, Utc};
use stockroom_core::access::Identity;
use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::session::CreateSession;
use stockroom_core::models::user::{CreateUser, Role, UpdateUser, User, normalize_username};
use stockroom_core::repository::{SessionRepository, UserRepository};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque session token (return to client, not stored).
    pub token: String,
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Self-service sign-up. The account is always created as an operator.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    pub(crate) user_repo: U,
    pub(crate) session_repo: S,
    pub(crate) config: AuthConfig,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn users(&self) -> &U {
        &self.user_repo
    }

    /// Check a username/password pair. Unknown users and wrong passwords
    /// produce the same error.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> StockroomResult<User> {
        let user = match self.user_repo.get_by_username(username).await {
            Ok(user) => user,
            Err(StockroomError::NotFound { .. }) => {
                password::verify_dummy(password, self.config.pepper.as_deref());
                warn!(username = %normalize_username(username), "Login failed: unknown user");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(username = %user.username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user)
    }

    /// Authenticate with username + password and open a session.
    pub async fn login(&self, input: LoginInput) -> StockroomResult<LoginOutput> {
        if input.username.trim().is_empty() || input.password.is_empty() {
            return Err(StockroomError::validation(
                "username and password are required",
            ));
        }

        let user = self
            .verify_credentials(&input.username, &input.password)
            .await?;

        let raw = token::generate_session_token();
        let expires_at = Utc::now() + Duration::seconds(self.config.session_lifetime_secs as i64);
        self.session_repo
            .create(CreateSession {
                token_hash: token::hash_session_token(&raw),
                username: user.username.clone(),
                expires_at,
            })
            .await?;

        info!(username = %user.username, role = %user.role, "User logged in");
        Ok(LoginOutput {
            token: raw,
            identity: identity_of(&user),
            expires_at,
        })
    }

    /// Create an operator account for an anonymous caller.
    pub async fn register(&self, input: RegisterInput) -> StockroomResult<User> {
        self.create_user(CreateUser {
            username: input.username,
            password: input.password,
            display_name: input.display_name,
            role: Role::Operator,
        })
        .await
    }

    /// Create a user after applying the password policy.
    pub async fn create_user(&self, input: CreateUser) -> StockroomResult<User> {
        password::validate_password(&input.password, self.config.min_password_length)?;
        self.user_repo.create(input).await
    }

    /// Partial update by `actor`. A new password must satisfy the policy;
    /// the store revokes the target's sessions when it changes.
    pub async fn update_user(
        &self,
        actor: &Identity,
        username: &str,
        input: UpdateUser,
    ) -> StockroomResult<User> {
        if input.is_empty() {
            return Err(StockroomError::validation("no fields to update"));
        }
        if let Some(new_password) = &input.password {
            password::validate_password(new_password, self.config.min_password_length)?;
        }
        self.user_repo
            .update(&actor.username, username, input)
            .await
    }

    /// Delete a user on behalf of `actor`. The store removes the user's
    /// sessions in the same transaction.
    pub async fn delete_user(&self, actor: &Identity, username: &str) -> StockroomResult<()> {
        self.user_repo.delete(&actor.username, username).await
    }

    /// Invalidate the session behind a raw token (logout). Unknown tokens
    /// are ignored.
    pub async fn logout(&self, raw_token: &str) -> StockroomResult<()> {
        let token_hash = token::hash_session_token(raw_token);
        self.session_repo.invalidate(&token_hash).await
    }

    /// Delete expired sessions, returning how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> StockroomResult<u64> {
        self.session_repo.cleanup_expired().await
    }
}

pub(crate) fn identity_of(user: &User) -> Identity {
    Identity {
        username: user.username.clone(),
        role: user.role,
        display_name: user.display_name.clone(),
    }
}
