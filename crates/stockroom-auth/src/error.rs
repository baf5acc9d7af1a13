//! Authentication error types.

use stockroom_core::error::StockroomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("session has expired")]
    SessionExpired,

    #[error("session is not valid")]
    SessionInvalid,

    #[error("password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for StockroomError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => StockroomError::InvalidCredentials,
            AuthError::SessionExpired | AuthError::SessionInvalid => {
                StockroomError::Unauthenticated
            }
            AuthError::WeakPassword { .. } => StockroomError::validation(err.to_string()),
            AuthError::Crypto(msg) => StockroomError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_are_unauthenticated() {
        for err in [AuthError::SessionExpired, AuthError::SessionInvalid] {
            assert!(matches!(
                StockroomError::from(err),
                StockroomError::Unauthenticated
            ));
        }
    }

    #[test]
    fn weak_password_is_a_validation_error() {
        let err = StockroomError::from(AuthError::WeakPassword { min_length: 8 });
        assert!(matches!(err, StockroomError::Validation { .. }));
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }
}
