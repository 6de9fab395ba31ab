//! Brand entity - product brand (inventory)

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{ColumnDef, EntityDescriptor, KeyStrategy, Record, SoftDeletable};
use crate::core::value::timestamp_column;

pub static BRAND: EntityDescriptor = EntityDescriptor {
    name: "brand",
    table: "brands",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("name"),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &[],
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    /// Brand code, e.g. "BRAND_ACME"
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Brand {
    fn descriptor() -> &'static EntityDescriptor {
        &BRAND
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            is_active: row.get("is_active")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Brand {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
