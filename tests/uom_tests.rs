//! Unit-of-measure engine: category lifecycle, rebasing and invariants

mod common;

use std::collections::HashMap;

use common::{add_unit, db, dec, mass_category};
use rust_decimal::Decimal;
use stockwise::core::{ActiveFilter, Database, RecordError, Repository};
use stockwise::core::uom::UomEngine;
use stockwise::entities::uom::{NewUom, NewUomCategory, UomCategoryUpdate, UomUpdate};
use stockwise::entities::{Uom, UomCategory};

fn proportions(db: &Database, category: &str) -> HashMap<String, Decimal> {
    UomEngine::new()
        .category_detail(db, category, ActiveFilter::All)
        .unwrap()
        .units
        .into_iter()
        .map(|u| (u.id, u.proportion))
        .collect()
}

fn reference_of(db: &Database, category: &str) -> Option<String> {
    Repository::<UomCategory>::new()
        .require(db, category)
        .unwrap()
        .reference_unit_id
}

// ============================================================================
// Category creation
// ============================================================================

#[test]
fn test_create_category_links_reference_unit() {
    let db = db();
    let (category, unit) = UomEngine::new()
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_MASS".into(),
                name: "Mass".into(),
                reference_unit_id: "KG".into(),
                reference_unit_name: "Kilogram".into(),
            },
        )
        .unwrap();

    assert_eq!(category.reference_unit_id.as_deref(), Some("KG"));
    assert!(category.is_active);
    assert_eq!(unit.proportion, Decimal::ONE);
    assert_eq!(unit.category_id, "UDM_MASS");
}

#[test]
fn test_create_category_rejects_existing_ids() {
    let db = db();
    let engine = mass_category(&db);

    let err = engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_MASS".into(),
                name: "Mass 2".into(),
                reference_unit_id: "LB".into(),
                reference_unit_name: "Pound".into(),
            },
        )
        .unwrap_err();
    assert!(err.is_conflict());

    let err = engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_WEIGHT".into(),
                name: "Weight".into(),
                reference_unit_id: "KG".into(),
                reference_unit_name: "Kilo".into(),
            },
        )
        .unwrap_err();
    assert!(err.is_conflict());

    // Neither attempt left anything behind
    assert!(Repository::<UomCategory>::new()
        .get(&db, "UDM_WEIGHT")
        .unwrap()
        .is_none());
    assert!(Repository::<Uom>::new().get(&db, "LB").unwrap().is_none());
}

#[test]
fn test_create_category_rolls_back_on_unit_failure() {
    let db = db();
    let engine = mass_category(&db);

    // Unit name collides with "Kilogram" (unique) after the category insert
    let err = engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_OTHER".into(),
                name: "Other".into(),
                reference_unit_id: "KG2".into(),
                reference_unit_name: "Kilogram".into(),
            },
        )
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(Repository::<UomCategory>::new()
        .get(&db, "UDM_OTHER")
        .unwrap()
        .is_none());
}

// ============================================================================
// Adding units
// ============================================================================

#[test]
fn test_add_unit_requires_positive_proportion() {
    let db = db();
    let engine = mass_category(&db);
    for bad in ["0", "-1"] {
        let err = engine
            .add_unit(
                &db,
                NewUom {
                    id: "BAD".into(),
                    name: "Bad".into(),
                    category_id: "UDM_MASS".into(),
                    proportion: dec(bad),
                },
            )
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)), "{bad}");
    }
}

#[test]
fn test_add_unit_requires_existing_active_category() {
    let db = db();
    let engine = mass_category(&db);
    let new = |category: &str| NewUom {
        id: "LB".into(),
        name: "Pound".into(),
        category_id: category.into(),
        proportion: dec("0.45359237"),
    };

    assert!(engine.add_unit(&db, new("UDM_NONE")).unwrap_err().is_not_found());

    engine.set_category_active(&db, "UDM_MASS", false).unwrap();
    assert!(engine.add_unit(&db, new("UDM_MASS")).unwrap_err().is_conflict());

    engine.set_category_active(&db, "UDM_MASS", true).unwrap();
    let lb = engine.add_unit(&db, new("UDM_MASS")).unwrap();
    assert_eq!(lb.proportion, dec("0.45359237"));
}

// ============================================================================
// Rebasing
// ============================================================================

#[test]
fn test_change_reference_rebases_category() {
    let db = db();
    let engine = mass_category(&db);

    engine.change_reference(&db, "UDM_MASS", "TON").unwrap();

    let p = proportions(&db, "UDM_MASS");
    assert_eq!(p["TON"], Decimal::ONE);
    assert_eq!(p["KG"], dec("0.001"));
    assert_eq!(p["G"], dec("0.000001"));
    assert_eq!(reference_of(&db, "UDM_MASS").as_deref(), Some("TON"));
}

#[test]
fn test_change_reference_preserves_conversions() {
    let db = db();
    let engine = mass_category(&db);
    let before = engine.convert(&db, dec("3"), "TON", "G").unwrap();

    engine.change_reference(&db, "UDM_MASS", "G").unwrap();
    let after = engine.convert(&db, dec("3"), "TON", "G").unwrap();

    assert_eq!(before, dec("3000000"));
    assert_eq!(before, after);
}

#[test]
fn test_change_reference_rebases_inactive_units_too() {
    let db = db();
    let engine = mass_category(&db);
    engine.set_unit_active(&db, "G", false).unwrap();

    engine.change_reference(&db, "UDM_MASS", "TON").unwrap();
    assert_eq!(proportions(&db, "UDM_MASS")["G"], dec("0.000001"));
}

#[test]
fn test_inactive_unit_cannot_become_reference() {
    let db = db();
    let engine = mass_category(&db);
    engine.set_unit_active(&db, "TON", false).unwrap();
    let before = proportions(&db, "UDM_MASS");

    let err = engine.change_reference(&db, "UDM_MASS", "TON").unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(proportions(&db, "UDM_MASS"), before);
    assert_eq!(reference_of(&db, "UDM_MASS").as_deref(), Some("KG"));
}

#[test]
fn test_change_reference_rejects_current_and_foreign_units() {
    let db = db();
    let engine = mass_category(&db);
    engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_LENGTH".into(),
                name: "Length".into(),
                reference_unit_id: "M".into(),
                reference_unit_name: "Metre".into(),
            },
        )
        .unwrap();

    assert!(engine
        .change_reference(&db, "UDM_MASS", "KG")
        .unwrap_err()
        .is_conflict());
    assert!(engine
        .change_reference(&db, "UDM_MASS", "M")
        .unwrap_err()
        .is_conflict());
    assert!(engine
        .change_reference(&db, "UDM_MASS", "NOPE")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_failed_rebase_leaves_every_proportion() {
    let db = db();
    let engine = mass_category(&db);
    // Sorts after the others by name, so G, KG and TON are rewritten first
    add_unit(&db, &engine, "ZG", "Zeptogram", "UDM_MASS", "0.0000000000000000000000000001");
    let before = proportions(&db, "UDM_MASS");

    let err = engine.change_reference(&db, "UDM_MASS", "TON").unwrap_err();
    assert!(matches!(err, RecordError::Validation(_)));
    assert_eq!(proportions(&db, "UDM_MASS"), before);
    assert_eq!(reference_of(&db, "UDM_MASS").as_deref(), Some("KG"));
}

// ============================================================================
// Unit updates
// ============================================================================

#[test]
fn test_reference_unit_cannot_be_deactivated() {
    let db = db();
    let engine = mass_category(&db);
    let before = proportions(&db, "UDM_MASS");

    let err = engine.set_unit_active(&db, "KG", false).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(proportions(&db, "UDM_MASS"), before);
    assert!(Repository::<Uom>::new().require(&db, "KG").unwrap().is_active);
}

#[test]
fn test_non_reference_unit_toggles() {
    let db = db();
    let engine = mass_category(&db);
    assert!(!engine.set_unit_active(&db, "G", false).unwrap().is_active);
    assert!(engine.set_unit_active(&db, "G", true).unwrap().is_active);
}

#[test]
fn test_reference_unit_cannot_change_category() {
    let db = db();
    let engine = mass_category(&db);
    engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_OTHER".into(),
                name: "Other".into(),
                reference_unit_id: "U".into(),
                reference_unit_name: "Unit".into(),
            },
        )
        .unwrap();

    let to_other = || UomUpdate {
        category_id: Some("UDM_OTHER".into()),
        ..UomUpdate::default()
    };
    assert!(engine.update_unit(&db, "KG", to_other()).unwrap_err().is_conflict());

    let moved = engine.update_unit(&db, "G", to_other()).unwrap();
    assert_eq!(moved.category_id, "UDM_OTHER");

    let err = engine
        .update_unit(
            &db,
            "TON",
            UomUpdate {
                category_id: Some("UDM_MISSING".into()),
                ..UomUpdate::default()
            },
        )
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_reference_proportion_stays_one() {
    let db = db();
    let engine = mass_category(&db);

    let err = engine
        .update_unit(
            &db,
            "KG",
            UomUpdate {
                proportion: Some(dec("2")),
                ..UomUpdate::default()
            },
        )
        .unwrap_err();
    assert!(err.is_conflict());

    let renamed = engine
        .update_unit(
            &db,
            "KG",
            UomUpdate {
                name: Some("Kilo".into()),
                proportion: Some(dec("1.000")),
                ..UomUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Kilo");
    assert_eq!(renamed.proportion, Decimal::ONE);
}

#[test]
fn test_update_category_renames() {
    let db = db();
    let engine = mass_category(&db);
    let updated = engine
        .update_category(
            &db,
            "UDM_MASS",
            UomCategoryUpdate {
                name: Some("Weight".into()),
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Weight");
    assert_eq!(updated.reference_unit_id.as_deref(), Some("KG"));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_category_detail_filters_units() {
    let db = db();
    let engine = mass_category(&db);
    engine.set_unit_active(&db, "G", false).unwrap();

    let active = engine
        .category_detail(&db, "UDM_MASS", ActiveFilter::Active)
        .unwrap();
    let names: Vec<&str> = active.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Kilogram", "Tonne"]);
    assert_eq!(active.reference_unit.unwrap().id, "KG");

    let inactive = engine
        .category_detail(&db, "UDM_MASS", ActiveFilter::Inactive)
        .unwrap();
    assert_eq!(inactive.units.len(), 1);
    assert_eq!(inactive.units[0].id, "G");
}

#[test]
fn test_archived_categories() {
    let db = db();
    let engine = mass_category(&db);
    engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_TIME".into(),
                name: "Time".into(),
                reference_unit_id: "H".into(),
                reference_unit_name: "Hour".into(),
            },
        )
        .unwrap();
    engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_VOLUME".into(),
                name: "Volume".into(),
                reference_unit_id: "L".into(),
                reference_unit_name: "Litre".into(),
            },
        )
        .unwrap();

    assert!(engine.archived_categories(&db, 0, 10).unwrap().is_empty());

    engine.set_unit_active(&db, "G", false).unwrap();
    engine.set_category_active(&db, "UDM_VOLUME", false).unwrap();

    let archived = engine.archived_categories(&db, 0, 10).unwrap();
    let ids: Vec<&str> = archived.iter().map(|a| a.category.id.as_str()).collect();
    assert_eq!(ids, vec!["UDM_MASS", "UDM_VOLUME"]);

    let mass_units: Vec<&str> = archived[0].units.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(mass_units, vec!["G"]);
    let volume_units: Vec<&str> = archived[1].units.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(volume_units, vec!["L"]);

    let page = engine.archived_categories(&db, 1, 10).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].category.id, "UDM_VOLUME");

    assert!(engine.archived_categories(&db, u64::MAX, 10).unwrap().is_empty());
    assert_eq!(engine.archived_categories(&db, 0, u64::MAX).unwrap().len(), 2);
}

#[test]
fn test_category_units_sort_by_folded_name() {
    let db = db();
    let engine = mass_category(&db);
    add_unit(&db, &engine, "OZ", "Onça", "UDM_MASS", "0.0283495");
    add_unit(&db, &engine, "AR", "Arroba", "UDM_MASS", "14.6880");
    add_unit(&db, &engine, "LB", "libra", "UDM_MASS", "0.45359237");
    add_unit(&db, &engine, "EZ", "Ézimo", "UDM_MASS", "2");
    add_unit(&db, &engine, "ET", "étalon", "UDM_MASS", "3");

    let detail = engine
        .category_detail(&db, "UDM_MASS", ActiveFilter::All)
        .unwrap();
    let names: Vec<&str> = detail.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Arroba", "Gram", "Kilogram", "libra", "Onça", "Tonne", "étalon", "Ézimo"]
    );
}

#[test]
fn test_convert_across_categories_is_conflict() {
    let db = db();
    let engine = mass_category(&db);
    engine
        .create_category(
            &db,
            NewUomCategory {
                id: "UDM_LENGTH".into(),
                name: "Length".into(),
                reference_unit_id: "M".into(),
                reference_unit_name: "Metre".into(),
            },
        )
        .unwrap();

    assert!(engine.convert(&db, dec("1"), "KG", "M").unwrap_err().is_conflict());
    assert_eq!(engine.convert(&db, dec("250"), "G", "KG").unwrap(), dec("0.25"));
}
