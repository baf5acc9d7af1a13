//! Inventory item domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StockroomError;

/// Largest quantity a single item may hold. Keeps stock arithmetic and
/// dashboard totals far from `i64` overflow.
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    /// Caller-chosen key, trimmed and uppercased.
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub category: String,
    /// Username of the creator. Advisory only.
    pub added_by: Option<String>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Seed quantity. May be zero, never negative.
    pub quantity: i64,
    pub added_by: String,
}

impl CreateItem {
    /// Normalize the id, trim text fields and validate them.
    pub fn normalized(self) -> Result<Self, StockroomError> {
        let id = normalize_item_id(&self.id);
        if id.is_empty() {
            return Err(StockroomError::validation("item id must not be empty"));
        }
        let name = required(&self.name, "name")?;
        let category = required(&self.category, "category")?;
        if self.quantity < 0 {
            return Err(StockroomError::validation(
                "initial quantity must not be negative",
            ));
        }
        check_ceiling(self.quantity, "initial quantity")?;
        Ok(Self {
            id,
            name,
            category,
            quantity: self.quantity,
            added_by: self.added_by,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub category: Option<String>,
    /// Administrative stock correction. Applied through the ledger.
    pub quantity: Option<i64>,
}

impl UpdateItem {
    pub fn normalized(self) -> Result<Self, StockroomError> {
        let name = self.name.as_deref().map(|n| required(n, "name")).transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|c| required(c, "category"))
            .transpose()?;
        if let Some(q) = self.quantity {
            if q < 0 {
                return Err(StockroomError::validation("quantity must not be negative"));
            }
            check_ceiling(q, "quantity")?;
        }
        Ok(Self {
            name,
            category,
            quantity: self.quantity,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.quantity.is_none()
    }
}

/// Item ids are stored trimmed and uppercased. Idempotent.
pub fn normalize_item_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Rejects quantities above [`MAX_QUANTITY`].
pub fn check_ceiling(quantity: i64, field: &str) -> Result<(), StockroomError> {
    if quantity > MAX_QUANTITY {
        return Err(StockroomError::validation(format!(
            "{field} must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> Result<String, StockroomError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StockroomError::validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(id: &str, quantity: i64) -> CreateItem {
        CreateItem {
            id: id.into(),
            name: "Widget".into(),
            category: "Parts".into(),
            quantity,
            added_by: "admin".into(),
        }
    }

    #[test]
    fn item_id_is_trimmed_and_uppercased() {
        let normalized = normalize_item_id(" item001 ");
        assert_eq!(normalized, "ITEM001");
        assert_eq!(normalize_item_id(&normalized), normalized);
    }

    #[test]
    fn create_accepts_zero_seed_quantity() {
        let item = create("abc", 0).normalized().unwrap();
        assert_eq!(item.id, "ABC");
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn create_rejects_negative_quantity_and_blank_id() {
        assert!(create("abc", -1).normalized().is_err());
        assert!(create("   ", 3).normalized().is_err());
    }

    #[test]
    fn quantities_above_ceiling_are_rejected() {
        assert!(create("abc", MAX_QUANTITY).normalized().is_ok());
        assert!(matches!(
            create("abc", i64::MAX).normalized(),
            Err(StockroomError::Validation { .. })
        ));

        let update = UpdateItem {
            quantity: Some(MAX_QUANTITY + 1),
            ..Default::default()
        };
        assert!(matches!(
            update.normalized(),
            Err(StockroomError::Validation { .. })
        ));
    }

    #[test]
    fn update_rejects_blank_category() {
        let update = UpdateItem {
            category: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            update.normalized(),
            Err(StockroomError::Validation { .. })
        ));
    }
}
