//! Units of measure and their categories (inventory)
//!
//! A category groups interchangeable units. Every unit stores its
//! proportion relative to the category's reference unit, whose own
//! proportion is exactly 1. The two tables reference each other; the
//! reference pointer is only empty inside the transaction that creates a
//! category. Use [`crate::core::uom::UomEngine`] for writes that touch the
//! reference relationship.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{
    ColumnDef, EntityDescriptor, KeyStrategy, Record, RelationDef, SoftDeletable,
};
use crate::core::value::{decimal_column, timestamp_column, Fields};

static UOM_CATEGORY_RELATIONS: [RelationDef; 1] = [RelationDef {
    name: "reference_unit",
    column: "reference_unit_id",
    target: &UOM,
}];

pub static UOM_CATEGORY: EntityDescriptor = EntityDescriptor {
    name: "uom_category",
    table: "uom_categories",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("name"),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::text("reference_unit_id").optional().unsearchable(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &UOM_CATEGORY_RELATIONS,
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

static UOM_RELATIONS: [RelationDef; 1] = [RelationDef {
    name: "category",
    column: "category_id",
    target: &UOM_CATEGORY,
}];

pub static UOM: EntityDescriptor = EntityDescriptor {
    name: "uom",
    table: "uoms",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("name"),
        ColumnDef::decimal("proportion"),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::text("category_id").unsearchable(),
        ColumnDef::timestamp("created_at").defaulted(),
        ColumnDef::timestamp("updated_at").defaulted(),
    ],
    relations: &UOM_RELATIONS,
    active_column: Some("is_active"),
    created_column: Some("created_at"),
    updated_column: Some("updated_at"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UomCategory {
    /// Category code, e.g. "UDM_MASS"
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub reference_unit_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UomCategory {
    pub fn is_reference(&self, unit_id: &str) -> bool {
        self.reference_unit_id.as_deref() == Some(unit_id)
    }
}

impl Record for UomCategory {
    fn descriptor() -> &'static EntityDescriptor {
        &UOM_CATEGORY
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            is_active: row.get("is_active")?,
            reference_unit_id: row.get("reference_unit_id")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for UomCategory {
    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uom {
    /// Unit code, e.g. "KG"
    pub id: String,
    pub name: String,
    /// Ratio to the category's reference unit, always positive
    pub proportion: Decimal,
    pub is_active: bool,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Uom {
    fn descriptor() -> &'static EntityDescriptor {
        &UOM
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            proportion: decimal_column(row, "proportion")?,
            is_active: row.get("is_active")?,
            category_id: row.get("category_id")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Uom {
    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// A new category together with its initial reference unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUomCategory {
    pub id: String,
    pub name: String,
    pub reference_unit_id: String,
    pub reference_unit_name: String,
}

/// A new non-reference unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUom {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub proportion: Decimal,
}

impl NewUom {
    pub(crate) fn fields(&self) -> Fields {
        Fields::new()
            .set("id", self.id.as_str())
            .set("name", self.name.as_str())
            .set("category_id", self.category_id.as_str())
            .set("proportion", self.proportion.normalize())
    }
}

/// Partial update of a unit; `None` leaves the field as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UomUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub proportion: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UomUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.proportion.is_none()
            && self.category_id.is_none()
            && self.is_active.is_none()
    }

    pub(crate) fn fields(&self) -> Fields {
        Fields::new()
            .set_some("name", self.name.clone())
            .set_some("proportion", self.proportion.map(|p| p.normalize()))
            .set_some("category_id", self.category_id.clone())
            .set_some("is_active", self.is_active)
    }
}

/// Partial update of a category
///
/// The reference unit is not part of it: reference changes go through
/// rebasing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UomCategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
}

/// A category with its reference unit and a filtered view of its units
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: UomCategory,
    pub reference_unit: Option<Uom>,
    pub units: Vec<Uom>,
}

/// Entry of the archived listing
///
/// For an inactive category `units` holds all of its units; for an active
/// one only the inactive units.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedCategory {
    pub category: UomCategory,
    pub units: Vec<Uom>,
}
