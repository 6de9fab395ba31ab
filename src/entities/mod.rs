//! Entity kinds
//!
//! Every kind is a typed record plus a static [`EntityDescriptor`]:
//!
//! **Inventory:**
//! - [`Brand`] - product brands
//! - [`LocationType`], [`Location`] - stock locations, nested through `parent`
//! - [`ProductCategory`], [`Product`] - catalogue
//! - [`UomCategory`], [`Uom`] - units of measure (see [`crate::core::uom`])
//!
//! **Purchasing:** [`Supplier`]
//!
//! **Production:** [`WorkCenter`]
//!
//! **Maintenance:** [`Manufacturer`], [`WorkOrderLog`] (hard delete)
//!
//! [`EntityKind`] names them at runtime and runs repository operations on
//! a kind chosen by name, with records exchanged as JSON.

pub mod brand;
pub mod location;
pub mod manufacturer;
pub mod product;
pub mod supplier;
pub mod uom;
pub mod work_center;
pub mod work_order_log;

pub use brand::Brand;
pub use location::{Location, LocationType};
pub use manufacturer::Manufacturer;
pub use product::{Product, ProductCategory};
pub use supplier::Supplier;
pub use uom::{Uom, UomCategory};
pub use work_center::WorkCenter;
pub use work_order_log::{LogType, WorkOrderLog};

use serde_json::Value as Json;

use crate::core::database::Database;
use crate::core::descriptor::{EntityDescriptor, Record};
use crate::core::error::Result;
use crate::core::filter::ListParams;
use crate::core::repository::{Deleted, Repository};
use crate::core::value::Fields;

/// Runtime name of an entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Brand,
    LocationType,
    Location,
    ProductCategory,
    Product,
    UomCategory,
    Uom,
    Supplier,
    WorkCenter,
    Manufacturer,
    WorkOrderLog,
}

/// Run `$body` with `$record` bound to the record type of `$kind`
macro_rules! with_record {
    ($kind:expr, $record:ident => $body:expr) => {
        match $kind {
            EntityKind::Brand => {
                type $record = Brand;
                $body
            }
            EntityKind::LocationType => {
                type $record = LocationType;
                $body
            }
            EntityKind::Location => {
                type $record = Location;
                $body
            }
            EntityKind::ProductCategory => {
                type $record = ProductCategory;
                $body
            }
            EntityKind::Product => {
                type $record = Product;
                $body
            }
            EntityKind::UomCategory => {
                type $record = UomCategory;
                $body
            }
            EntityKind::Uom => {
                type $record = Uom;
                $body
            }
            EntityKind::Supplier => {
                type $record = Supplier;
                $body
            }
            EntityKind::WorkCenter => {
                type $record = WorkCenter;
                $body
            }
            EntityKind::Manufacturer => {
                type $record = Manufacturer;
                $body
            }
            EntityKind::WorkOrderLog => {
                type $record = WorkOrderLog;
                $body
            }
        }
    };
}

impl EntityKind {
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Brand,
            EntityKind::LocationType,
            EntityKind::Location,
            EntityKind::ProductCategory,
            EntityKind::Product,
            EntityKind::UomCategory,
            EntityKind::Uom,
            EntityKind::Supplier,
            EntityKind::WorkCenter,
            EntityKind::Manufacturer,
            EntityKind::WorkOrderLog,
        ]
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        with_record!(self, R => R::descriptor())
    }

    pub fn as_str(&self) -> &'static str {
        self.descriptor().name
    }

    /// Kinds whose writes must go through the UoM engine
    pub fn is_engine_managed(&self) -> bool {
        matches!(self, EntityKind::Uom | EntityKind::UomCategory)
    }

    pub fn get(&self, db: &Database, id: &str) -> Result<Option<Json>> {
        with_record!(self, R => Repository::<R>::new()
            .get(db, id)?
            .map(|record| to_json(&record))
            .transpose())
    }

    pub fn list(&self, db: &Database, params: &ListParams) -> Result<Vec<Json>> {
        with_record!(self, R => Repository::<R>::new()
            .list(db, params)?
            .iter()
            .map(to_json)
            .collect())
    }

    pub fn create(&self, db: &Database, fields: Fields) -> Result<Json> {
        with_record!(self, R => to_json(&Repository::<R>::new().create(db, fields)?))
    }

    pub fn update(&self, db: &Database, id: &str, changes: Fields) -> Result<Json> {
        with_record!(self, R => {
            let repo = Repository::<R>::new();
            let current = repo.require(db, id)?;
            to_json(&repo.update(db, &current, changes)?)
        })
    }

    pub fn delete(&self, db: &Database, id: &str) -> Result<Option<Deleted<Json>>> {
        with_record!(self, R => match Repository::<R>::new().delete(db, id)? {
            Some(Deleted::Deactivated(record)) => Ok(Some(Deleted::Deactivated(to_json(&record)?))),
            Some(Deleted::Removed(record)) => Ok(Some(Deleted::Removed(to_json(&record)?))),
            None => Ok(None),
        })
    }
}

fn to_json<R: Record>(record: &R) -> Result<Json> {
    Ok(serde_json::to_value(record)?)
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    /// Accepts the singular name or the table name, `-` or `_` separated
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        EntityKind::all()
            .iter()
            .copied()
            .find(|kind| {
                let d = kind.descriptor();
                d.name == wanted || d.table == wanted
            })
            .ok_or_else(|| {
                let names: Vec<&str> = EntityKind::all().iter().map(|k| k.as_str()).collect();
                format!("Unknown entity kind: {}. Use one of: {}", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptors_are_consistent() {
        for kind in EntityKind::all() {
            let problems = kind.descriptor().problems();
            assert!(problems.is_empty(), "{}: {:?}", kind, problems);
        }
    }

    #[test]
    fn test_descriptors_match_schema() {
        let db = Database::open_in_memory().unwrap();
        for kind in EntityKind::all() {
            let d = kind.descriptor();
            let mut stmt = db
                .conn()
                .prepare(&format!("PRAGMA table_info({})", d.table))
                .unwrap();
            let stored: HashSet<String> = stmt
                .query_map([], |row| row.get::<_, String>("name"))
                .unwrap()
                .collect::<rusqlite::Result<_>>()
                .unwrap();
            let declared: HashSet<String> =
                d.columns.iter().map(|c| c.name.to_string()).collect();
            assert_eq!(stored, declared, "{} columns drifted from schema", d.table);
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("brand".parse::<EntityKind>().unwrap(), EntityKind::Brand);
        assert_eq!("work-center".parse::<EntityKind>().unwrap(), EntityKind::WorkCenter);
        assert_eq!("uom_categories".parse::<EntityKind>().unwrap(), EntityKind::UomCategory);
        assert!("widget".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = EntityKind::all().iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), EntityKind::all().len());
    }

    #[test]
    fn test_dynamic_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let created = EntityKind::Brand
            .create(&db, Fields::new().set("id", "ACME").set("name", "Acme"))
            .unwrap();
        assert_eq!(created["name"], "Acme");

        let fetched = EntityKind::Brand.get(&db, "ACME").unwrap().unwrap();
        assert_eq!(fetched["is_active"], true);
        assert!(EntityKind::Brand.get(&db, "NOPE").unwrap().is_none());
    }
}
