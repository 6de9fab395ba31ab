//! Equipment manufacturer (maintenance)

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{ColumnDef, EntityDescriptor, KeyStrategy, Record, SoftDeletable};

pub static MANUFACTURER: EntityDescriptor = EntityDescriptor {
    name: "manufacturer",
    table: "manufacturers",
    primary_key: "id",
    key: KeyStrategy::Generated,
    columns: &[
        ColumnDef::text("id").unsearchable(),
        ColumnDef::text("name"),
        ColumnDef::text("contact_person").optional(),
        ColumnDef::text("contact_phone").optional().unsearchable(),
        ColumnDef::text("contact_email").optional(),
        ColumnDef::boolean("is_active").defaulted(),
    ],
    relations: &[],
    active_column: Some("is_active"),
    created_column: None,
    updated_column: None,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub is_active: bool,
}

impl Record for Manufacturer {
    fn descriptor() -> &'static EntityDescriptor {
        &MANUFACTURER
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            contact_person: row.get("contact_person")?,
            contact_phone: row.get("contact_phone")?,
            contact_email: row.get("contact_email")?,
            is_active: row.get("is_active")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Manufacturer {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
