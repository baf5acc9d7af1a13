//! Role matrix and authorization check.
//!
//! Every sensitive operation is named by an [`Operation`]; the set of
//! roles allowed to perform it is fixed here and nowhere else.

use serde::{Deserialize, Serialize};

use crate::error::{StockroomError, StockroomResult};
use crate::models::user::Role;

/// The authenticated caller, attached to a request for its duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ViewDashboard,
    ViewInventory,
    CreateItem,
    /// Update or delete an inventory item.
    ManageItems,
    /// Record an incoming or outgoing movement.
    RecordTransaction,
    ViewTransactions,
    /// List, create, update or delete users.
    ManageUsers,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::ViewDashboard,
        Operation::ViewInventory,
        Operation::CreateItem,
        Operation::ManageItems,
        Operation::RecordTransaction,
        Operation::ViewTransactions,
        Operation::ManageUsers,
    ];

    pub const fn allowed_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Operation::ViewDashboard => &[Admin, Manager],
            Operation::ViewInventory => &[Admin, Manager, Operator],
            Operation::CreateItem => &[Admin, Operator],
            Operation::ManageItems => &[Admin],
            Operation::RecordTransaction => &[Admin, Operator],
            Operation::ViewTransactions => &[Admin, Manager, Operator],
            Operation::ManageUsers => &[Admin],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// Human-readable description used in `Forbidden` messages.
    pub fn describe(self) -> &'static str {
        match self {
            Operation::ViewDashboard => "view the dashboard summary",
            Operation::ViewInventory => "view inventory",
            Operation::CreateItem => "create inventory items",
            Operation::ManageItems => "update or delete inventory items",
            Operation::RecordTransaction => "record stock transactions",
            Operation::ViewTransactions => "view transactions",
            Operation::ManageUsers => "manage users",
        }
    }
}

/// Succeeds iff the identity's role is allowed to perform `operation`.
pub fn authorize(identity: &Identity, operation: Operation) -> StockroomResult<()> {
    if operation.permits(identity.role) {
        Ok(())
    } else {
        Err(StockroomError::Forbidden {
            role: identity.role.to_string(),
            action: operation.describe().to_string(),
        })
    }
}
