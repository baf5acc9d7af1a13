//! Access gate: session token → [`Identity`] → authorization.
//!
//! The identity is rebuilt from the user record on every call, so a
//! role change or account deletion takes effect on the caller's next
//! request.

use chrono::Utc;
use stockroom_core::access::{Identity, Operation, authorize};
use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::repository::{SessionRepository, UserRepository};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::service::{AuthService, identity_of};
use crate::token;

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    /// Resolve the caller behind an optional raw session token.
    pub async fn authenticate(&self, raw_token: Option<&str>) -> StockroomResult<Identity> {
        let raw = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(StockroomError::Unauthenticated)?;
        let token_hash = token::hash_session_token(raw);

        let session = match self.session_repo.get_by_token_hash(&token_hash).await {
            Ok(session) => session,
            Err(StockroomError::NotFound { .. }) => return Err(AuthError::SessionInvalid.into()),
            Err(e) => return Err(e),
        };

        if session.expires_at <= Utc::now() {
            self.session_repo.invalidate(&token_hash).await?;
            debug!(username = %session.username, "Expired session removed");
            return Err(AuthError::SessionExpired.into());
        }

        match self.user_repo.get_by_username(&session.username).await {
            Ok(user) => Ok(identity_of(&user)),
            Err(StockroomError::NotFound { .. }) => {
                // The account is gone; its session must not outlive it.
                self.session_repo.invalidate(&token_hash).await?;
                Err(AuthError::SessionInvalid.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Authenticate, then check the role matrix for `operation`.
    pub async fn admit(
        &self,
        raw_token: Option<&str>,
        operation: Operation,
    ) -> StockroomResult<Identity> {
        let identity = self.authenticate(raw_token).await?;
        if let Err(e) = authorize(&identity, operation) {
            warn!(
                username = %identity.username,
                role = %identity.role,
                operation = ?operation,
                "Access denied"
            );
            return Err(e);
        }
        Ok(identity)
    }
}
