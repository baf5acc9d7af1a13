//! First-start provisioning.

use stockroom_core::error::{StockroomError, StockroomResult};
use stockroom_core::models::user::{CreateUser, Role};
use stockroom_core::repository::UserRepository;
use tracing::{info, warn};

use crate::config::DEFAULT_ADMIN_PASSWORD;
use crate::state::Auth;

pub const ADMIN_USERNAME: &str = "admin";

/// Create the `admin` account unless it already exists. Returns whether
/// an account was created. An existing admin is left untouched, password
/// included.
pub async fn ensure_admin(auth: &Auth, password: &str) -> StockroomResult<bool> {
    match auth.users().get_by_username(ADMIN_USERNAME).await {
        Ok(_) => return Ok(false),
        Err(StockroomError::NotFound { .. }) => {}
        Err(other) => return Err(other),
    }

    auth.users()
        .create(CreateUser {
            username: ADMIN_USERNAME.into(),
            password: password.into(),
            display_name: "Administrator".into(),
            role: Role::Admin,
        })
        .await?;
    info!(username = ADMIN_USERNAME, "Created bootstrap admin account");

    if password == DEFAULT_ADMIN_PASSWORD {
        warn!(
            username = ADMIN_USERNAME,
            "Admin account uses the default password; set STOCKROOM_ADMIN_PASSWORD"
        );
    }
    Ok(true)
}
