//! Product categories and products (inventory)

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{
    ColumnDef, EntityDescriptor, KeyStrategy, Record, RelationDef, SoftDeletable,
};
use crate::entities::brand::BRAND;
use crate::entities::uom::UOM;

static PRODUCT_CATEGORY_RELATIONS: [RelationDef; 1] = [RelationDef {
    name: "parent",
    column: "parent_id",
    target: &PRODUCT_CATEGORY,
}];

pub static PRODUCT_CATEGORY: EntityDescriptor = EntityDescriptor {
    name: "product_category",
    table: "product_categories",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("name"),
        ColumnDef::text("costing_method").unsearchable(),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::text("parent_id").optional().unsearchable(),
    ],
    relations: &PRODUCT_CATEGORY_RELATIONS,
    active_column: Some("is_active"),
    created_column: None,
    updated_column: None,
};

static PRODUCT_RELATIONS: [RelationDef; 3] = [
    RelationDef {
        name: "uom",
        column: "uom_id",
        target: &UOM,
    },
    RelationDef {
        name: "category",
        column: "category_id",
        target: &PRODUCT_CATEGORY,
    },
    RelationDef {
        name: "brand",
        column: "brand_id",
        target: &BRAND,
    },
];

pub static PRODUCT: EntityDescriptor = EntityDescriptor {
    name: "product",
    table: "products",
    primary_key: "id",
    key: KeyStrategy::Supplied,
    columns: &[
        ColumnDef::text("id"),
        ColumnDef::text("external_id").optional(),
        ColumnDef::text("name"),
        ColumnDef::boolean("is_active").defaulted(),
        ColumnDef::text("uom_id").unsearchable(),
        ColumnDef::text("category_id").unsearchable(),
        ColumnDef::text("brand_id").optional().unsearchable(),
    ],
    relations: &PRODUCT_RELATIONS,
    active_column: Some("is_active"),
    created_column: None,
    updated_column: None,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: String,
    pub name: String,
    /// Inventory valuation method, e.g. "AVERAGE" or "FIFO"
    pub costing_method: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Record for ProductCategory {
    fn descriptor() -> &'static EntityDescriptor {
        &PRODUCT_CATEGORY
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            costing_method: row.get("costing_method")?,
            is_active: row.get("is_active")?,
            parent_id: row.get("parent_id")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for ProductCategory {
    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    pub is_active: bool,
    /// Stock unit of the product
    pub uom_id: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
}

impl Record for Product {
    fn descriptor() -> &'static EntityDescriptor {
        &PRODUCT
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            is_active: row.get("is_active")?,
            uom_id: row.get("uom_id")?,
            category_id: row.get("category_id")?,
            brand_id: row.get("brand_id")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl SoftDeletable for Product {
    fn is_active(&self) -> bool {
        self.is_active
    }
}
