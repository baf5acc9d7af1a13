//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. Natural keys double as record ids
//! (`user:⟨username⟩`, `item:⟨ITEM001⟩`, `session:⟨token hash⟩`) and are
//! also stored as plain fields so rows decode without record-id parsing.
//! Enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD display_name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['admin', 'manager', 'operator'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Inventory items
-- =======================================================================
DEFINE TABLE item SCHEMAFULL;
DEFINE FIELD code ON TABLE item TYPE string;
DEFINE FIELD name ON TABLE item TYPE string;
DEFINE FIELD quantity ON TABLE item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD category ON TABLE item TYPE string;
DEFINE FIELD added_by ON TABLE item TYPE option<string>;
DEFINE FIELD last_update ON TABLE item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_item_code ON TABLE item \
    COLUMNS code UNIQUE;

-- =======================================================================
-- Ledger (append-only)
-- =======================================================================
DEFINE TABLE ledger_entry SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD seq ON TABLE ledger_entry TYPE int;
DEFINE FIELD kind ON TABLE ledger_entry TYPE string \
    ASSERT $value IN ['incoming', 'outgoing'];
DEFINE FIELD item_id ON TABLE ledger_entry TYPE string;
DEFINE FIELD quantity ON TABLE ledger_entry TYPE int \
    ASSERT $value > 0;
DEFINE FIELD user_username ON TABLE ledger_entry TYPE string;
DEFINE FIELD notes ON TABLE ledger_entry TYPE option<string>;
DEFINE FIELD recorded_at ON TABLE ledger_entry TYPE datetime;
DEFINE INDEX idx_ledger_seq ON TABLE ledger_entry \
    COLUMNS seq UNIQUE;
DEFINE INDEX idx_ledger_item ON TABLE ledger_entry \
    COLUMNS item_id;
DEFINE INDEX idx_ledger_user ON TABLE ledger_entry \
    COLUMNS user_username;
DEFINE INDEX idx_ledger_time ON TABLE ledger_entry \
    COLUMNS recorded_at;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD username ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session \
    COLUMNS username;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_every_table() {
        for table in ["user", "item", "ledger_entry", "session"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn stock_is_asserted_non_negative() {
        assert!(SCHEMA_V1.contains("quantity ON TABLE item TYPE int ASSERT $value >= 0"));
        assert!(SCHEMA_V1.contains("quantity ON TABLE ledger_entry TYPE int ASSERT $value > 0"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
