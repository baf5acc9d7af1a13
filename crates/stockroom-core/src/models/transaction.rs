//! Ledger entry domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockroomError;
use crate::models::item::{check_ceiling, normalize_item_id};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "masuk")]
    Incoming,
    #[serde(alias = "keluar")]
    Outgoing,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Incoming => "incoming",
            TransactionKind::Outgoing => "outgoing",
        }
    }

    /// Quantity delta this movement applies to an item.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            TransactionKind::Incoming => quantity,
            TransactionKind::Outgoing => -quantity,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = StockroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incoming" | "masuk" => Ok(TransactionKind::Incoming),
            "outgoing" | "keluar" => Ok(TransactionKind::Outgoing),
            other => Err(StockroomError::validation(format!(
                "invalid transaction type '{other}'"
            ))),
        }
    }
}

/// An immutable stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Monotonically increasing sequence number.
    pub id: i64,
    pub kind: TransactionKind,
    pub item_id: String,
    pub quantity: i64,
    pub user_username: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMovement {
    pub item_id: String,
    pub quantity: i64,
    /// Username of the authenticated actor.
    pub actor: String,
    pub notes: Option<String>,
}

impl RecordMovement {
    /// Validate quantity and actor, normalize the item id and drop empty notes.
    pub fn normalized(self) -> Result<Self, StockroomError> {
        if self.quantity <= 0 {
            return Err(StockroomError::validation(
                "quantity must be greater than 0",
            ));
        }
        check_ceiling(self.quantity, "quantity")?;
        let actor = self.actor.trim().to_string();
        if actor.is_empty() {
            return Err(StockroomError::Unauthenticated);
        }
        let item_id = normalize_item_id(&self.item_id);
        if item_id.is_empty() {
            return Err(StockroomError::validation("item id must not be empty"));
        }
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(Self {
            item_id,
            quantity: self.quantity,
            actor,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::MAX_QUANTITY;

    fn movement(quantity: i64, actor: &str) -> RecordMovement {
        RecordMovement {
            item_id: " item001".into(),
            quantity,
            actor: actor.into(),
            notes: Some("  ".into()),
        }
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert!(matches!(
            movement(0, "op").normalized(),
            Err(StockroomError::Validation { .. })
        ));
        assert!(matches!(
            movement(-4, "op").normalized(),
            Err(StockroomError::Validation { .. })
        ));
    }

    #[test]
    fn quantity_above_ceiling_is_rejected() {
        assert!(movement(MAX_QUANTITY, "op").normalized().is_ok());
        assert!(matches!(
            movement(i64::MAX, "op").normalized(),
            Err(StockroomError::Validation { .. })
        ));
    }

    #[test]
    fn missing_actor_is_unauthenticated() {
        assert!(matches!(
            movement(1, " ").normalized(),
            Err(StockroomError::Unauthenticated)
        ));
    }

    #[test]
    fn normalization_uppercases_item_and_drops_blank_notes() {
        let m = movement(2, "op").normalized().unwrap();
        assert_eq!(m.item_id, "ITEM001");
        assert_eq!(m.notes, None);
    }

    #[test]
    fn legacy_kind_names_parse() {
        assert_eq!("masuk".parse::<TransactionKind>().unwrap(), TransactionKind::Incoming);
        assert_eq!("KELUAR".parse::<TransactionKind>().unwrap(), TransactionKind::Outgoing);
        assert_eq!(TransactionKind::Outgoing.signed(7), -7);
    }
}
