//! Work center entity (production)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{ColumnDef, EntityDescriptor, KeyStrategy, Record, SoftDeletable};
use crate::core::value::{optional_decimal_column, timestamp_column};

pub static WORK_CENTER: EntityDescriptor = EntityDescriptor {
    name: "work_center",
    table: "work_centers",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("external_id").optional(),
        ColumnDef::text("name"),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::decimal("hourly_capacity").optional(),
        ColumnDef::decimal("hourly_cost").optional(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &[],
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    pub is_active: bool,
    /// Units produced per hour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_capacity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for WorkCenter {
    fn descriptor() -> &'static EntityDescriptor {
        &WORK_CENTER
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            is_active: row.get("is_active")?,
            hourly_capacity: optional_decimal_column(row, "hourly_capacity")?,
            hourly_cost: optional_decimal_column(row, "hourly_cost")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for WorkCenter {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
