//! Unit-of-measure conversion engine
//!
//! Owns the invariant the generic repository cannot enforce on its own:
//! every category has exactly one reference unit, that unit has proportion
//! exactly 1 and belongs to the category, and every other unit of the
//! category is expressed relative to it.
//!
//! Changing the reference unit rebases the whole category: each proportion
//! is divided by the new reference's old proportion, so the new reference
//! lands on 1 and ratios between units are preserved. Every operation runs
//! in a single transaction and either fully commits or leaves nothing
//! behind.

use rust_decimal::Decimal;
use rusqlite::{params, Connection};
use tracing::{info, warn};

use crate::core::database::Database;
use crate::core::descriptor::Record;
use crate::core::error::{RecordError, Result};
use crate::core::filter::ActiveFilter;
use crate::core::query::{clamp, BASE_ALIAS, CASEFOLD_FN};
use crate::core::repository::Repository;
use crate::core::value::Fields;
use crate::entities::uom::{
    ArchivedCategory, CategoryDetail, NewUom, NewUomCategory, Uom, UomCategory,
    UomCategoryUpdate, UomUpdate,
};

/// Maintains UoM categories and their units
#[derive(Debug, Clone, Copy, Default)]
pub struct UomEngine {
    categories: Repository<UomCategory>,
    units: Repository<Uom>,
}

impl UomEngine {
    pub const fn new() -> Self {
        Self {
            categories: Repository::new(),
            units: Repository::new(),
        }
    }

    /// Create a category together with its reference unit
    ///
    /// The category is inserted without a reference, the unit is inserted
    /// pointing at it with proportion 1, then the category is patched to
    /// point back at the unit.
    pub fn create_category(&self, db: &Database, new: NewUomCategory) -> Result<(UomCategory, Uom)> {
        self.atomic(db, "create_category", |conn| {
            if self.categories.fetch_in(conn, &new.id)?.is_some() {
                return Err(RecordError::conflict(format!(
                    "uom_category '{}' already exists",
                    new.id
                )));
            }
            if self.units.fetch_in(conn, &new.reference_unit_id)?.is_some() {
                return Err(RecordError::conflict(format!(
                    "uom '{}' already exists",
                    new.reference_unit_id
                )));
            }

            self.categories.insert_in(
                conn,
                Fields::new()
                    .set("id", new.id.as_str())
                    .set("name", new.name.as_str()),
            )?;
            self.units.insert_in(
                conn,
                Fields::new()
                    .set("id", new.reference_unit_id.as_str())
                    .set("name", new.reference_unit_name.as_str())
                    .set("proportion", Decimal::ONE)
                    .set("category_id", new.id.as_str()),
            )?;
            self.categories.apply_in(
                conn,
                &new.id,
                Fields::new().set("reference_unit_id", new.reference_unit_id.as_str()),
            )?;

            Ok((
                self.categories.require_in(conn, &new.id)?,
                self.units.require_in(conn, &new.reference_unit_id)?,
            ))
        })
    }

    /// Add a non-reference unit to an active category
    pub fn add_unit(&self, db: &Database, new: NewUom) -> Result<Uom> {
        require_positive(&new.id, new.proportion)?;

        self.atomic(db, "add_unit", |conn| {
            let category = self.categories.require_in(conn, &new.category_id)?;
            if !category.is_active {
                return Err(RecordError::conflict(format!(
                    "uom_category '{}' is inactive",
                    category.id
                )));
            }
            self.units.insert_in(conn, new.fields())?;
            self.units.require_in(conn, &new.id)
        })
    }

    /// Make `unit_id` the reference unit of `category_id` and rebase
    ///
    /// Returns the category with all of its units after the rebase.
    pub fn change_reference(
        &self,
        db: &Database,
        category_id: &str,
        unit_id: &str,
    ) -> Result<CategoryDetail> {
        self.atomic(db, "change_reference", |conn| {
            let category = self.categories.require_in(conn, category_id)?;
            let unit = self.units.require_in(conn, unit_id)?;

            if unit.category_id != category.id {
                return Err(rejected(format!(
                    "uom '{}' belongs to '{}', not '{}'",
                    unit.id, unit.category_id, category.id
                )));
            }
            if !unit.is_active {
                return Err(rejected(format!(
                    "uom '{}' is inactive and cannot become the reference unit",
                    unit.id
                )));
            }
            if category.is_reference(&unit.id) {
                return Err(rejected(format!(
                    "uom '{}' is already the reference unit of '{}'",
                    unit.id, category.id
                )));
            }

            let factor = unit.proportion;
            require_positive(&unit.id, factor)?;

            for member in self.units_of(conn, &category.id, ActiveFilter::All)? {
                let rebased = if member.id == unit.id {
                    Decimal::ONE
                } else {
                    rebase(&member, factor)?
                };
                if rebased != member.proportion {
                    self.units.apply_in(
                        conn,
                        &member.id,
                        Fields::new().set("proportion", rebased),
                    )?;
                }
            }

            self.categories.apply_in(
                conn,
                &category.id,
                Fields::new().set("reference_unit_id", unit.id.as_str()),
            )?;
            info!(category = %category.id, reference = %unit.id, %factor, "rebased category");

            self.detail_in(conn, &category.id, ActiveFilter::All)
        })
    }

    /// Activate or deactivate a unit; the reference unit cannot be deactivated
    pub fn set_unit_active(&self, db: &Database, unit_id: &str, active: bool) -> Result<Uom> {
        self.update_unit(
            db,
            unit_id,
            UomUpdate {
                is_active: Some(active),
                ..UomUpdate::default()
            },
        )
    }

    /// Rename, re-proportion, re-categorise or toggle a unit
    ///
    /// The reference unit cannot leave its category, be deactivated, or
    /// have its proportion moved away from 1.
    pub fn update_unit(&self, db: &Database, unit_id: &str, update: UomUpdate) -> Result<Uom> {
        if let Some(proportion) = update.proportion {
            require_positive(unit_id, proportion)?;
        }

        self.atomic(db, "update_unit", |conn| {
            let unit = self.units.require_in(conn, unit_id)?;
            let category = self.categories.require_in(conn, &unit.category_id)?;
            let is_reference = category.is_reference(&unit.id);

            if let Some(target) = update.category_id.as_deref() {
                if target != unit.category_id {
                    if is_reference {
                        return Err(rejected(format!(
                            "uom '{}' is the reference unit of '{}' and cannot change category",
                            unit.id, category.id
                        )));
                    }
                    self.categories.require_in(conn, target)?;
                }
            }
            if update.is_active == Some(false) && is_reference {
                return Err(rejected(format!(
                    "uom '{}' is the reference unit of '{}' and cannot be deactivated",
                    unit.id, category.id
                )));
            }
            if let Some(proportion) = update.proportion {
                if is_reference && proportion != Decimal::ONE {
                    return Err(rejected(format!(
                        "uom '{}' is the reference unit of '{}'; its proportion stays 1",
                        unit.id, category.id
                    )));
                }
            }

            self.units.apply_in(conn, &unit.id, update.fields())?;
            self.units.require_in(conn, &unit.id)
        })
    }

    /// Rename a category
    pub fn update_category(
        &self,
        db: &Database,
        category_id: &str,
        update: UomCategoryUpdate,
    ) -> Result<UomCategory> {
        self.atomic(db, "update_category", |conn| {
            self.categories.require_in(conn, category_id)?;
            self.categories.apply_in(
                conn,
                category_id,
                Fields::new().set_some("name", update.name.clone()),
            )?;
            self.categories.require_in(conn, category_id)
        })
    }

    /// Activate or deactivate a category; its units keep their own flags
    pub fn set_category_active(
        &self,
        db: &Database,
        category_id: &str,
        active: bool,
    ) -> Result<UomCategory> {
        self.atomic(db, "set_category_active", |conn| {
            self.categories.require_in(conn, category_id)?;
            self.categories
                .apply_in(conn, category_id, Fields::new().set("is_active", active))?;
            self.categories.require_in(conn, category_id)
        })
    }

    /// A category, its reference unit and its units admitted by `units`
    pub fn category_detail(
        &self,
        db: &Database,
        category_id: &str,
        units: ActiveFilter,
    ) -> Result<CategoryDetail> {
        self.detail_in(db.conn(), category_id, units)
    }

    /// Categories with something archived in them, ordered by id
    ///
    /// Inactive categories come with all their units; active categories
    /// appear only when they own inactive units, and list just those.
    pub fn archived_categories(
        &self,
        db: &Database,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<ArchivedCategory>> {
        let conn = db.conn();
        let sql = format!(
            "SELECT {select} FROM uom_categories AS {t} \
             WHERE {t}.is_active = 0 \
                OR EXISTS (SELECT 1 FROM uoms AS u WHERE u.category_id = {t}.id AND u.is_active = 0) \
             ORDER BY {t}.id ASC LIMIT ?1 OFFSET ?2",
            select = UomCategory::descriptor().select_list(BASE_ALIAS),
            t = BASE_ALIAS,
        );
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(params![clamp(limit), clamp(skip)], UomCategory::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        categories
            .into_iter()
            .map(|category| {
                let filter = if category.is_active {
                    ActiveFilter::Inactive
                } else {
                    ActiveFilter::All
                };
                let units = self.units_of(conn, &category.id, filter)?;
                Ok(ArchivedCategory { category, units })
            })
            .collect()
    }

    /// Convert `quantity` expressed in `from_unit` into `to_unit`
    pub fn convert(
        &self,
        db: &Database,
        quantity: Decimal,
        from_unit: &str,
        to_unit: &str,
    ) -> Result<Decimal> {
        let from = self.units.require(db, from_unit)?;
        let to = self.units.require(db, to_unit)?;

        if from.category_id != to.category_id {
            return Err(RecordError::conflict(format!(
                "cannot convert between '{}' ({}) and '{}' ({})",
                from.id, from.category_id, to.id, to.category_id
            )));
        }

        quantity
            .checked_mul(from.proportion)
            .and_then(|base| base.checked_div(to.proportion))
            .map(|q| q.normalize())
            .ok_or_else(|| {
                RecordError::validation(format!(
                    "converting {} {} to {} is out of decimal range",
                    quantity, from.id, to.id
                ))
            })
    }

    fn detail_in(
        &self,
        conn: &Connection,
        category_id: &str,
        units: ActiveFilter,
    ) -> Result<CategoryDetail> {
        let category = self.categories.require_in(conn, category_id)?;
        let reference_unit = match category.reference_unit_id.as_deref() {
            Some(id) => self.units.fetch_in(conn, id)?,
            None => None,
        };
        let units = self.units_of(conn, &category.id, units)?;
        Ok(CategoryDetail {
            category,
            reference_unit,
            units,
        })
    }

    /// Units of one category ordered by name
    fn units_of(&self, conn: &Connection, category_id: &str, filter: ActiveFilter) -> Result<Vec<Uom>> {
        let mut sql = format!(
            "SELECT {select} FROM uoms AS {t} WHERE {t}.category_id = ?1",
            select = Uom::descriptor().select_list(BASE_ALIAS),
            t = BASE_ALIAS,
        );
        if let Some(flag) = filter.flag() {
            sql.push_str(&format!(" AND {}.is_active = {}", BASE_ALIAS, flag as i64));
        }
        sql.push_str(&format!(
            " ORDER BY {f}({t}.name) ASC, {t}.id ASC",
            f = CASEFOLD_FN,
            t = BASE_ALIAS
        ));

        let mut stmt = conn.prepare(&sql)?;
        let units = stmt
            .query_map([category_id], Uom::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(units)
    }

    /// Run `work` in one transaction, labelling storage failures with `operation`
    fn atomic<T>(
        &self,
        db: &Database,
        operation: &'static str,
        work: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let tx = db.transaction().map_err(|e| e.during(operation))?;
        let conn: &Connection = &tx;
        let value = work(conn).map_err(|e| {
            warn!(operation, error = %e, "rolled back");
            e.during(operation)
        })?;
        tx.commit()
            .map_err(|e| RecordError::from(e).during(operation))?;
        info!(operation, "committed");
        Ok(value)
    }
}

fn require_positive(unit_id: &str, proportion: Decimal) -> Result<()> {
    if proportion <= Decimal::ZERO {
        return Err(RecordError::validation(format!(
            "uom '{}': proportion must be positive, got {}",
            unit_id, proportion
        )));
    }
    Ok(())
}

fn rebase(unit: &Uom, factor: Decimal) -> Result<Decimal> {
    let rebased = unit
        .proportion
        .checked_div(factor)
        .map(|p| p.normalize())
        .ok_or_else(|| {
            RecordError::validation(format!(
                "uom '{}': {} / {} is out of decimal range",
                unit.id, unit.proportion, factor
            ))
        })?;
    // Precision ran out; a zero proportion would break every conversion
    if rebased.is_zero() {
        return Err(RecordError::validation(format!(
            "uom '{}': {} / {} underflows decimal precision",
            unit.id, unit.proportion, factor
        )));
    }
    Ok(rebased)
}

fn rejected(message: String) -> RecordError {
    warn!(%message, "uom invariant");
    RecordError::Conflict(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn mass(db: &Database) -> UomEngine {
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
        for (id, name, p) in [("G", "Gram", "0.001"), ("TON", "Tonne", "1000")] {
            engine
                .add_unit(
                    db,
                    NewUom {
                        id: id.into(),
                        name: name.into(),
                        category_id: "UDM_MASS".into(),
                        proportion: dec(p),
                    },
                )
                .unwrap();
        }
        engine
    }

    #[test]
    fn test_rebase_divides_every_unit() {
        let db = Database::open_in_memory().unwrap();
        let engine = mass(&db);

        let detail = engine.change_reference(&db, "UDM_MASS", "TON").unwrap();
        assert_eq!(detail.category.reference_unit_id.as_deref(), Some("TON"));

        let by_id = |id: &str| detail.units.iter().find(|u| u.id == id).unwrap().proportion;
        assert_eq!(by_id("TON"), Decimal::ONE);
        assert_eq!(by_id("KG"), dec("0.001"));
        assert_eq!(by_id("G"), dec("0.000001"));
    }

    #[test]
    fn test_rebase_and_back_is_exact() {
        let db = Database::open_in_memory().unwrap();
        let engine = mass(&db);

        engine.change_reference(&db, "UDM_MASS", "G").unwrap();
        let detail = engine.change_reference(&db, "UDM_MASS", "KG").unwrap();
        let by_id = |id: &str| detail.units.iter().find(|u| u.id == id).unwrap().proportion;
        assert_eq!(by_id("KG"), Decimal::ONE);
        assert_eq!(by_id("G"), dec("0.001"));
        assert_eq!(by_id("TON"), dec("1000"));
    }

    #[test]
    fn test_convert_within_category() {
        let db = Database::open_in_memory().unwrap();
        let engine = mass(&db);
        assert_eq!(engine.convert(&db, dec("2.5"), "TON", "KG").unwrap(), dec("2500"));
        assert_eq!(engine.convert(&db, dec("1500"), "G", "KG").unwrap(), dec("1.5"));
    }

    #[test]
    fn test_rebase_rejects_underflow() {
        assert!(rebase(
            &Uom {
                id: "X".into(),
                name: "x".into(),
                proportion: dec("0.0000000000000000000000000001"),
                is_active: true,
                category_id: "C".into(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            dec("1000"),
        )
        .is_err());
    }
}
