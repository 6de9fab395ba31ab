//! Database schema initialization

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::core::error::{RecordError, Result};

/// Current schema version - databases from another version are refused
pub const SCHEMA_VERSION: i32 = 1;

const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

fn ddl() -> String {
    r#"
    -- Schema version tracking
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    );

    -- Inventory: brands
    CREATE TABLE IF NOT EXISTS brands (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );

    -- Inventory: location types and locations
    CREATE TABLE IF NOT EXISTS location_types (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );

    CREATE TABLE IF NOT EXISTS locations (
        id TEXT PRIMARY KEY,
        external_id TEXT UNIQUE,
        name TEXT NOT NULL UNIQUE,
        barcode TEXT UNIQUE,
        is_scrap INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        location_type_id TEXT NOT NULL REFERENCES location_types(id),
        parent_id TEXT REFERENCES locations(id),
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );
    CREATE INDEX IF NOT EXISTS idx_locations_type ON locations(location_type_id);
    CREATE INDEX IF NOT EXISTS idx_locations_parent ON locations(parent_id);

    -- Inventory: units of measure (mutually referencing)
    CREATE TABLE IF NOT EXISTS uom_categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        reference_unit_id TEXT REFERENCES uoms(id),
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );

    CREATE TABLE IF NOT EXISTS uoms (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        proportion TEXT NOT NULL CHECK (CAST(proportion AS REAL) > 0),
        is_active INTEGER NOT NULL DEFAULT 1,
        category_id TEXT NOT NULL REFERENCES uom_categories(id),
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );
    CREATE INDEX IF NOT EXISTS idx_uoms_category ON uoms(category_id);

    -- Inventory: product categories and products
    CREATE TABLE IF NOT EXISTS product_categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        costing_method TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        parent_id TEXT REFERENCES product_categories(id)
    );

    CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        external_id TEXT UNIQUE,
        name TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        uom_id TEXT NOT NULL REFERENCES uoms(id),
        category_id TEXT NOT NULL REFERENCES product_categories(id),
        brand_id TEXT REFERENCES brands(id)
    );
    CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);
    CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);

    -- Purchasing: suppliers
    CREATE TABLE IF NOT EXISTS suppliers (
        id TEXT PRIMARY KEY,
        external_id TEXT UNIQUE,
        name TEXT NOT NULL,
        tax_id TEXT UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );

    -- Production: work centers
    CREATE TABLE IF NOT EXISTS work_centers (
        id TEXT PRIMARY KEY,
        external_id TEXT UNIQUE,
        name TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        hourly_capacity TEXT,
        hourly_cost TEXT,
        created_at TEXT NOT NULL DEFAULT {now},
        updated_at TEXT NOT NULL DEFAULT {now}
    );

    -- Maintenance: manufacturers and work order activity log
    CREATE TABLE IF NOT EXISTS manufacturers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        contact_person TEXT,
        contact_phone TEXT,
        contact_email TEXT,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS work_order_logs (
        id TEXT PRIMARY KEY,
        work_order_id TEXT NOT NULL,
        log_type TEXT NOT NULL CHECK (log_type IN ('SYSTEM', 'COMMENT')),
        user_id TEXT,
        comment TEXT,
        created_at TEXT NOT NULL DEFAULT {now}
    );
    CREATE INDEX IF NOT EXISTS idx_work_order_logs_order ON work_order_logs(work_order_id);
    "#
    .replace("{now}", NOW)
}

/// Create the schema on a fresh database, or check the version of an
/// existing one
pub(crate) fn init(conn: &Connection) -> Result<()> {
    let has_version_table: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;

    if has_version_table {
        let found: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        return match found {
            Some(version) if version == SCHEMA_VERSION => Ok(()),
            Some(version) => Err(RecordError::SchemaMismatch {
                found: version,
                expected: SCHEMA_VERSION,
            }),
            None => create(conn),
        };
    }

    create(conn)
}

fn create(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&ddl())?;
    tx.execute(
        "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )?;
    tx.commit()?;
    info!(version = SCHEMA_VERSION, "initialized database schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_init_rejects_other_version() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        conn.execute("UPDATE schema_version SET version = 99", [])
            .unwrap();

        let err = init(&conn).unwrap_err();
        assert!(matches!(
            err,
            RecordError::SchemaMismatch {
                found: 99,
                expected: SCHEMA_VERSION
            }
        ));
    }

    #[test]
    fn test_default_timestamps_are_rfc3339() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        conn.execute("INSERT INTO brands (id, name) VALUES ('B1', 'Acme')", [])
            .unwrap();
        let created: String = conn
            .query_row("SELECT created_at FROM brands WHERE id = 'B1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&created).is_ok());
    }
}
