//! Stockroom Auth: password verification, opaque session tokens and the
//! access gate that turns a session token into an authorized [`Identity`].
//!
//! [`Identity`]: stockroom_core::Identity

pub mod config;
pub mod error;
mod gate;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput};
