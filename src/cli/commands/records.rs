//! Generic record commands: list, get, create, update, delete
//!
//! Each takes the entity kind by name and goes through the generic
//! repository. Writes to unit-of-measure kinds are refused here because
//! they must go through `stockwise uom`, which keeps the reference unit
//! consistent.

use console::style;
use miette::{miette, Result};

use crate::cli::helpers::{open_database, read_fields};
use crate::cli::output::{print_records, print_value, success};
use crate::cli::GlobalOpts;
use crate::core::error::RecordError;
use crate::core::filter::{ActiveFilter, ListParams, SortDirection};
use crate::core::repository::Deleted;
use crate::entities::EntityKind;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Entity kind (see `stockwise kinds`)
    pub kind: EntityKind,

    /// Filter by active flag: active, inactive, or all
    #[arg(long, short = 's', default_value = "active")]
    pub status: ActiveFilter,

    /// Case-insensitive text matched against every searchable column
    #[arg(long)]
    pub search: Option<String>,

    /// Sort key: a column ("name") or relation.column ("parent.name")
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort order; "desc" reverses, anything else is ascending
    #[arg(long)]
    pub order: Option<String>,

    /// Records to skip
    #[arg(long, default_value_t = 0)]
    pub skip: u64,

    /// Page size (default: config page_size)
    #[arg(long, short = 'n')]
    pub limit: Option<u64>,

    /// Fail on a sort key that does not resolve instead of ignoring it
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    pub kind: EntityKind,
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    pub kind: EntityKind,

    /// Fields as a JSON object, or "-" to read it from stdin
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    pub kind: EntityKind,
    pub id: String,

    /// Changed fields as a JSON object ("-" for stdin); null clears a field
    #[arg(long, short = 'd')]
    pub data: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub kind: EntityKind,
    pub id: String,
}

fn columns(kind: EntityKind) -> Vec<&'static str> {
    kind.descriptor().columns.iter().map(|c| c.name).collect()
}

fn refuse_engine_managed(kind: EntityKind) -> Result<()> {
    if kind.is_engine_managed() {
        return Err(miette!(
            help = "use `stockwise uom` to change units and categories",
            "{} records are maintained by the unit-of-measure engine",
            kind
        ));
    }
    Ok(())
}

pub fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (config, db) = open_database(global)?;

    let mut params = ListParams::new()
        .skip(args.skip)
        .limit(args.limit.unwrap_or_else(|| config.page_size()))
        .active(args.status)
        .direction(SortDirection::parse(args.order.as_deref()))
        .strict_sort(args.strict || config.strict_sort_keys());
    if let Some(search) = args.search {
        params = params.search(search);
    }
    if let Some(sort) = args.sort {
        params = params.sort_by(sort);
    }

    let records = args.kind.list(&db, &params)?;
    let d = args.kind.descriptor();
    print_records(
        &records,
        &columns(args.kind),
        d.primary_key,
        d.name,
        global.format,
        global.quiet,
    )
}

pub fn run_get(args: GetArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_database(global)?;
    let d = args.kind.descriptor();
    let record = args
        .kind
        .get(&db, &args.id)?
        .ok_or_else(|| RecordError::not_found(d.name, &args.id))?;
    print_value(&record, Some(&columns(args.kind)), &args.id, global.format)
}

pub fn run_create(args: CreateArgs, global: &GlobalOpts) -> Result<()> {
    refuse_engine_managed(args.kind)?;
    let (_, db) = open_database(global)?;
    let d = args.kind.descriptor();

    let fields = read_fields(d, &args.data)?;
    let record = args.kind.create(&db, fields)?;
    let id = record
        .get(d.primary_key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    if global.format.is_auto() {
        success(
            global.quiet,
            format!("Created {} {}", d.name, style(&id).cyan()),
        );
        return Ok(());
    }
    print_value(&record, Some(&columns(args.kind)), &id, global.format)
}

pub fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    refuse_engine_managed(args.kind)?;
    let (_, db) = open_database(global)?;
    let d = args.kind.descriptor();

    let changes = read_fields(d, &args.data)?;
    let record = args.kind.update(&db, &args.id, changes)?;

    if global.format.is_auto() {
        success(
            global.quiet,
            format!("Updated {} {}", d.name, style(&args.id).cyan()),
        );
        return Ok(());
    }
    print_value(&record, Some(&columns(args.kind)), &args.id, global.format)
}

pub fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    refuse_engine_managed(args.kind)?;
    let (_, db) = open_database(global)?;
    let d = args.kind.descriptor();

    let outcome = args
        .kind
        .delete(&db, &args.id)?
        .ok_or_else(|| RecordError::not_found(d.name, &args.id))?;

    if global.format.is_auto() {
        let verb = match outcome {
            Deleted::Deactivated(_) => "Deactivated",
            Deleted::Removed(_) => "Removed",
        };
        success(
            global.quiet,
            format!("{} {} {}", verb, d.name, style(&args.id).cyan()),
        );
        return Ok(());
    }
    print_value(
        outcome.record(),
        Some(&columns(args.kind)),
        &args.id,
        global.format,
    )
}
