//! Location types and locations (inventory)
//!
//! Locations form a tree through `parent_id`; both relations of a location
//! are sort-traversable (`"parent.name"`, `"location_type.name"`).

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{
    ColumnDef, EntityDescriptor, KeyStrategy, Record, RelationDef, SoftDeletable,
};
use crate::core::value::timestamp_column;

pub static LOCATION_TYPE: EntityDescriptor = EntityDescriptor {
    name: "location_type",
    table: "location_types",
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

static LOCATION_RELATIONS: [RelationDef; 2] = [
    RelationDef {
        name: "location_type",
        column: "location_type_id",
        target: &LOCATION_TYPE,
    },
    RelationDef {
        name: "parent",
        column: "parent_id",
        target: &LOCATION,
    },
];

pub static LOCATION: EntityDescriptor = EntityDescriptor {
    name: "location",
    table: "locations",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("external_id").optional(),
        ColumnDef::text("name"),
        ColumnDef::text("barcode").optional(),
        ColumnDef::boolean("is_scrap").defaulted(),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::text("location_type_id").unsearchable(),
        ColumnDef::text("parent_id").optional().unsearchable(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &LOCATION_RELATIONS,
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationType {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for LocationType {
    fn descriptor() -> &'static EntityDescriptor {
        &LOCATION_TYPE
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

impl SoftDeletable for LocationType {
    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// A physical or logical stock location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// Stock moved here is written off
    pub is_scrap: bool,
    pub is_active: bool,
    pub location_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Location {
    fn descriptor() -> &'static EntityDescriptor {
        &LOCATION
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            barcode: row.get("barcode")?,
            is_scrap: row.get("is_scrap")?,
            is_active: row.get("is_active")?,
            location_type_id: row.get("location_type_id")?,
            parent_id: row.get("parent_id")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Location {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
