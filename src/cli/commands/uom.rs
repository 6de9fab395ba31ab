//! `stockwise uom` command - unit-of-measure categories and units

use clap::Subcommand;
use console::style;
use miette::Result;
use rust_decimal::Decimal;

use crate::cli::helpers::{open_database, parse_decimal_arg};
use crate::cli::output::{print_records, print_value, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::filter::ActiveFilter;
use crate::core::uom::UomEngine;
use crate::entities::uom::{CategoryDetail, NewUom, NewUomCategory, UomCategoryUpdate, UomUpdate};

const UNIT_COLUMNS: &[&str] = &["id", "name", "proportion", "is_active", "category_id"];

#[derive(Subcommand, Debug)]
pub enum UomCommands {
    /// Create a category together with its reference unit
    NewCategory {
        /// Category code (e.g. UDM_MASS)
        #[arg(long)]
        id: String,

        /// Category name
        #[arg(long)]
        name: String,

        /// Code of the reference unit (e.g. KG)
        #[arg(long)]
        unit_id: String,

        /// Name of the reference unit
        #[arg(long)]
        unit_name: String,
    },

    /// Add a unit to an active category
    Add {
        /// Unit code
        #[arg(long)]
        id: String,

        /// Unit name
        #[arg(long)]
        name: String,

        /// Category code
        #[arg(long)]
        category: String,

        /// Ratio to the category's reference unit (e.g. 0.001 for grams in a kilogram category)
        #[arg(long, value_parser = parse_decimal_arg)]
        proportion: Decimal,
    },

    /// Make a unit the reference of its category and rebase the others
    SetReference {
        category: String,
        unit: String,
    },

    /// Reactivate a unit
    Activate { unit: String },

    /// Deactivate a unit (not allowed for a reference unit)
    Deactivate { unit: String },

    /// Move a unit to another category (not allowed for a reference unit)
    Move { unit: String, category: String },

    /// Rename a unit or change its proportion
    Edit {
        unit: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = parse_decimal_arg)]
        proportion: Option<Decimal>,
    },

    /// Rename, activate or deactivate a category
    Category {
        category: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        #[arg(long)]
        deactivate: bool,
    },

    /// Show a category, its reference unit and its units
    Show {
        category: String,

        /// Which units to show: active, inactive, or all
        #[arg(long, short = 's', default_value = "all")]
        status: ActiveFilter,
    },

    /// Categories with archived content
    Archived {
        #[arg(long, default_value_t = 0)]
        skip: u64,

        #[arg(long, short = 'n', default_value_t = crate::core::filter::DEFAULT_LIMIT)]
        limit: u64,
    },

    /// Convert a quantity between two units of the same category
    Convert {
        #[arg(value_parser = parse_decimal_arg, allow_hyphen_values = true)]
        quantity: Decimal,
        from: String,
        to: String,
    },
}

pub fn run(cmd: UomCommands, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_database(global)?;
    let engine = UomEngine::new();

    match cmd {
        UomCommands::NewCategory {
            id,
            name,
            unit_id,
            unit_name,
        } => {
            let (category, unit) = engine.create_category(
                &db,
                NewUomCategory {
                    id,
                    name,
                    reference_unit_id: unit_id,
                    reference_unit_name: unit_name,
                },
            )?;
            if global.format.is_auto() {
                success(
                    global.quiet,
                    format!(
                        "Created category {} with reference unit {}",
                        style(&category.id).cyan(),
                        style(&unit.id).cyan()
                    ),
                );
                return Ok(());
            }
            print_value(
                &serde_json::json!({ "category": category, "reference_unit": unit }),
                None,
                &category.id,
                global.format,
            )
        }

        UomCommands::Add {
            id,
            name,
            category,
            proportion,
        } => {
            let unit = engine.add_unit(
                &db,
                NewUom {
                    id,
                    name,
                    category_id: category,
                    proportion,
                },
            )?;
            report_unit(&unit, "Added", global)
        }

        UomCommands::SetReference { category, unit } => {
            let detail = engine.change_reference(&db, &category, &unit)?;
            if global.format.is_auto() {
                success(
                    global.quiet,
                    format!(
                        "{} is now the reference unit of {}",
                        style(&unit).cyan(),
                        style(&category).cyan()
                    ),
                );
            }
            print_detail(&detail, global)
        }

        UomCommands::Activate { unit } => {
            let unit = engine.set_unit_active(&db, &unit, true)?;
            report_unit(&unit, "Activated", global)
        }

        UomCommands::Deactivate { unit } => {
            let unit = engine.set_unit_active(&db, &unit, false)?;
            report_unit(&unit, "Deactivated", global)
        }

        UomCommands::Move { unit, category } => {
            let unit = engine.update_unit(
                &db,
                &unit,
                UomUpdate {
                    category_id: Some(category),
                    ..UomUpdate::default()
                },
            )?;
            report_unit(&unit, "Moved", global)
        }

        UomCommands::Edit {
            unit,
            name,
            proportion,
        } => {
            let unit = engine.update_unit(
                &db,
                &unit,
                UomUpdate {
                    name,
                    proportion,
                    ..UomUpdate::default()
                },
            )?;
            report_unit(&unit, "Updated", global)
        }

        UomCommands::Category {
            category,
            name,
            activate,
            deactivate,
        } => {
            let mut current = engine.update_category(&db, &category, UomCategoryUpdate { name })?;
            if activate || deactivate {
                current = engine.set_category_active(&db, &category, activate)?;
            }
            if global.format.is_auto() {
                let state = if current.is_active { "active" } else { "inactive" };
                success(
                    global.quiet,
                    format!(
                        "Category {} ({}) is {}",
                        style(&current.id).cyan(),
                        current.name,
                        state
                    ),
                );
                return Ok(());
            }
            print_value(&current, None, &current.id, global.format)
        }

        UomCommands::Show { category, status } => {
            let detail = engine.category_detail(&db, &category, status)?;
            print_detail(&detail, global)
        }

        UomCommands::Archived { skip, limit } => {
            let archived = engine.archived_categories(&db, skip, limit)?;
            if global.format.is_auto() {
                if archived.is_empty() && !global.quiet {
                    println!("{}", style("Nothing archived").dim());
                }
                for entry in &archived {
                    let state = if entry.category.is_active { "active" } else { "inactive" };
                    println!(
                        "{} {} ({})",
                        style(&entry.category.id).cyan().bold(),
                        entry.category.name,
                        state
                    );
                    let units = to_rows(&entry.units)?;
                    print_records(&units, UNIT_COLUMNS, "id", "uom", global.format, true)?;
                }
                return Ok(());
            }
            print_value(&archived, None, "", global.format)
        }

        UomCommands::Convert { quantity, from, to } => {
            let converted = engine.convert(&db, quantity, &from, &to)?;
            match global.format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(
                    &serde_json::json!({
                        "quantity": quantity,
                        "from": from,
                        "to": to,
                        "result": converted,
                    }),
                    None,
                    "",
                    global.format,
                ),
                OutputFormat::Auto if !global.quiet => {
                    println!("{} {} = {} {}", quantity.normalize(), from, converted, to);
                    Ok(())
                }
                _ => {
                    println!("{}", converted);
                    Ok(())
                }
            }
        }
    }
}

fn report_unit(unit: &crate::entities::Uom, verb: &str, global: &GlobalOpts) -> Result<()> {
    if global.format.is_auto() {
        success(
            global.quiet,
            format!(
                "{} unit {} ({} × reference, category {})",
                verb,
                style(&unit.id).cyan(),
                unit.proportion.normalize(),
                unit.category_id
            ),
        );
        return Ok(());
    }
    print_value(unit, Some(UNIT_COLUMNS), &unit.id, global.format)
}

fn print_detail(detail: &CategoryDetail, global: &GlobalOpts) -> Result<()> {
    if !global.format.is_auto() {
        return print_value(detail, None, &detail.category.id, global.format);
    }

    let reference = detail
        .reference_unit
        .as_ref()
        .map(|u| u.id.as_str())
        .unwrap_or("-");
    println!(
        "{} {} ({}), reference unit {}",
        style(&detail.category.id).cyan().bold(),
        detail.category.name,
        if detail.category.is_active { "active" } else { "inactive" },
        style(reference).cyan()
    );
    let units = to_rows(&detail.units)?;
    print_records(&units, UNIT_COLUMNS, "id", "uom", global.format, global.quiet)
}

fn to_rows<T: serde::Serialize>(items: &[T]) -> Result<Vec<serde_json::Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(|e| miette::miette!("{}", e)))
        .collect()
}
