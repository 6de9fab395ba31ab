//! Record output in every `--format`
//!
//! Records reach the CLI as JSON objects; table-like formats take their
//! columns from the entity descriptor so the column order is stable.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::Value as Json;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;

/// Widest cell shown in interactive tables before truncation
const MAX_CELL_WIDTH: usize = 40;

/// Render one JSON cell as plain text
pub fn cell(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn row(record: &Json, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .map(|c| record.get(*c).map(cell).unwrap_or_default())
        .collect()
}

/// Print a list of records
///
/// `noun` names the kind in the summary line ("3 brand(s) found").
pub fn print_records(
    records: &[Json],
    columns: &[&str],
    id_column: &str,
    noun: &str,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Yaml => print_yaml(&records)?,
        OutputFormat::Id => {
            for record in records {
                println!("{}", record.get(id_column).map(cell).unwrap_or_default());
            }
        }
        OutputFormat::Tsv => {
            println!("{}", columns.join("\t"));
            for record in records {
                println!("{}", row(record, columns).join("\t"));
            }
        }
        OutputFormat::Csv => {
            println!("{}", columns.join(","));
            for record in records {
                let cells: Vec<String> = row(record, columns).iter().map(|c| escape_csv(c)).collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().copied());
            for record in records {
                builder.push_record(row(record, columns).iter().map(|c| c.replace('|', "\\|")));
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Auto => {
            if records.is_empty() {
                if !quiet {
                    println!("{}", style(format!("No {} records found", noun)).dim());
                }
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| style(c).bold().to_string()));
            for record in records {
                builder.push_record(
                    row(record, columns)
                        .iter()
                        .map(|c| truncate_str(c, MAX_CELL_WIDTH)),
                );
            }
            println!("{}", builder.build().with(Style::sharp()));
            if !quiet {
                println!(
                    "{}",
                    style(format!("{} {}(s) found", records.len(), noun)).dim()
                );
            }
        }
    }
    Ok(())
}

/// Print a single value (record or engine result) in full fidelity
///
/// `Auto` prints YAML; table formats fall back to a single-row listing
/// when `columns` are given.
pub fn print_value<T: Serialize>(
    value: &T,
    columns: Option<&[&str]>,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    match (format, columns) {
        (OutputFormat::Json, _) => print_json(value),
        (OutputFormat::Id, _) => {
            println!("{}", id);
            Ok(())
        }
        (OutputFormat::Yaml | OutputFormat::Auto, _) | (_, None) => print_yaml(value),
        (_, Some(columns)) => {
            let json = serde_json::to_value(value).into_diagnostic()?;
            print_records(&[json], columns, "id", "record", format, true)
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

pub fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

/// Status line on stdout, suppressed by `--quiet`
pub fn success(quiet: bool, message: impl std::fmt::Display) {
    if !quiet {
        println!("{} {}", style("✓").green(), message);
    }
}
