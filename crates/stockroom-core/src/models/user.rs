//! User domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockroomError;

/// Fixed three-tier privilege level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "manajer")]
    Manager,
    Operator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Operator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StockroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" | "manajer" => Ok(Role::Manager),
            "operator" => Ok(Role::Operator),
            other => Err(StockroomError::validation(format!(
                "invalid role '{other}', expected one of: admin, manager, operator"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

impl CreateUser {
    /// Trim and normalize the input, rejecting blank fields.
    pub fn normalized(self) -> Result<Self, StockroomError> {
        let username = normalize_username(&self.username);
        if username.is_empty() {
            return Err(StockroomError::validation("username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(StockroomError::validation("password must not be empty"));
        }
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(StockroomError::validation("name must not be empty"));
        }
        Ok(Self {
            username,
            password: self.password,
            display_name,
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    /// New raw password (password reset).
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.role.is_none() && self.password.is_none()
    }
}

/// Usernames are matched case-insensitively with surrounding whitespace
/// stripped. Applying this twice yields the same value.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}
