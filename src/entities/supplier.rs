//! Supplier entity (purchasing)

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{ColumnDef, EntityDescriptor, KeyStrategy, Record, SoftDeletable};
use crate::core::value::timestamp_column;

pub static SUPPLIER: EntityDescriptor = EntityDescriptor {
    name: "supplier",
    table: "suppliers",
    primary_key: "id",
    key: KeyStrategy::Generated,
    columns: &[
        ColumnDef::text("id").unsearchable(),
        ColumnDef::text("external_id").optional(),
        ColumnDef::text("name"),
        ColumnDef::text("tax_id").optional(),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &[],
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

/// Approved supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// ULID assigned on create
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    /// Company registration / tax number, unique when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Supplier {
    fn descriptor() -> &'static EntityDescriptor {
        &SUPPLIER
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            tax_id: row.get("tax_id")?,
            is_active: row.get("is_active")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Supplier {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
