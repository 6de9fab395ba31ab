//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::str::FromStr;

use rust_decimal::Decimal;
use stockwise::core::{Database, Fields, Repository};
use stockwise::core::uom::UomEngine;
use stockwise::entities::uom::{NewUom, NewUomCategory};
use stockwise::entities::{Brand, Location, LocationType};

pub fn db() -> Database {
    Database::open_in_memory().unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn brand(db: &Database, id: &str, name: &str) -> Brand {
    Repository::<Brand>::new()
        .create(db, Fields::new().set("id", id).set("name", name))
        .unwrap()
}

pub fn location_type(db: &Database, id: &str, name: &str) -> LocationType {
    Repository::<LocationType>::new()
        .create(db, Fields::new().set("id", id).set("name", name))
        .unwrap()
}

pub fn location(db: &Database, id: &str, name: &str, parent: Option<&str>) -> Location {
    Repository::<Location>::new()
        .create(
            db,
            Fields::new()
                .set("id", id)
                .set("name", name)
                .set("location_type_id", "WAREHOUSE")
                .set("parent_id", parent),
        )
        .unwrap()
}

/// UDM_MASS with KG (reference), G = 0.001 and TON = 1000
pub fn mass_category(db: &Database) -> UomEngine {
    let engine = UomEngine::new();
    engine
        .create_category(
            db,
            NewUomCategory {
                id: "UDM_MASS".into(),
                name: "Mass".into(),
                reference_unit_id: "KG".into(),
                reference_unit_name: "Kilogram".into(),
            },
        )
        .unwrap();
    add_unit(db, &engine, "G", "Gram", "UDM_MASS", "0.001");
    add_unit(db, &engine, "TON", "Tonne", "UDM_MASS", "1000");
    engine
}

pub fn add_unit(db: &Database, engine: &UomEngine, id: &str, name: &str, category: &str, proportion: &str) {
    engine
        .add_unit(
            db,
            NewUom {
                id: id.into(),
                name: name.into(),
                category_id: category.into(),
                proportion: dec(proportion),
            },
        )
        .unwrap();
}
