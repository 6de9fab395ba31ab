//! `stockwise kinds` command - describe the declared entity kinds

use miette::Result;
use serde::Serialize;

use crate::cli::output::{print_records, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::descriptor::KeyStrategy;
use crate::entities::EntityKind;

#[derive(Debug, Serialize)]
struct KindSummary {
    kind: &'static str,
    table: &'static str,
    key: KeyStrategy,
    delete: &'static str,
    searchable: Vec<&'static str>,
    relations: Vec<String>,
}

impl KindSummary {
    fn of(kind: EntityKind) -> Self {
        let d = kind.descriptor();
        Self {
            kind: d.name,
            table: d.table,
            key: d.key,
            delete: if d.is_soft_deletable() { "soft" } else { "hard" },
            searchable: d.searchable_columns().map(|c| c.name).collect(),
            relations: d
                .relations
                .iter()
                .map(|r| format!("{} -> {}", r.name, r.target.name))
                .collect(),
        }
    }
}

const COLUMNS: &[&str] = &["kind", "table", "key", "delete", "searchable", "relations"];

pub fn run(global: &GlobalOpts) -> Result<()> {
    let summaries: Vec<KindSummary> = EntityKind::all().iter().map(|k| KindSummary::of(*k)).collect();

    if matches!(global.format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_value(&summaries, None, "", global.format);
    }

    // Flatten list columns so table formats show them in one cell
    let rows: Vec<serde_json::Value> = summaries
        .iter()
        .map(|s| {
            serde_json::json!({
                "kind": s.kind,
                "table": s.table,
                "key": s.key,
                "delete": s.delete,
                "searchable": s.searchable.join(", "),
                "relations": s.relations.join(", "),
            })
        })
        .collect();
    print_records(&rows, COLUMNS, "kind", "kind", global.format, global.quiet)
}
