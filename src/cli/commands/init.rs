//! `stockwise init` command - create or check the database

use console::style;
use miette::Result;

use crate::cli::helpers::open_database;
use crate::cli::output::{print_json, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::schema::SCHEMA_VERSION;
use crate::entities::EntityKind;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Also print the record count of every table
    #[arg(long)]
    pub counts: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let (config, db) = open_database(global)?;
    let path = config.database_path();

    let tables: Vec<&'static str> = EntityKind::all()
        .iter()
        .map(|k| k.descriptor().table)
        .collect();
    let counts = if args.counts {
        db.table_counts(&tables)?
    } else {
        Vec::new()
    };

    if global.format == OutputFormat::Json {
        let counts: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(table, n)| (table.to_string(), (*n).into()))
            .collect();
        return print_json(&serde_json::json!({
            "database": path.display().to_string(),
            "schema_version": SCHEMA_VERSION,
            "counts": counts,
        }));
    }

    success(
        global.quiet,
        format!(
            "Database ready at {} (schema version {})",
            style(path.display()).cyan(),
            SCHEMA_VERSION
        ),
    );
    for (table, n) in counts {
        println!("  {:<20} {}", table, n);
    }
    Ok(())
}
