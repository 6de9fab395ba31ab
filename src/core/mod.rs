//! Core module - storage, the generic repository and the UoM engine

pub mod config;
pub mod database;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod logging;
pub mod query;
pub mod repository;
pub mod schema;
pub mod uom;
pub mod value;

pub use config::Config;
pub use database::Database;
pub use descriptor::{
    ColumnDef, ColumnKind, EntityDescriptor, KeyStrategy, Record, RelationDef, SoftDeletable,
};
pub use error::{RecordError, Result};
pub use filter::{ActiveFilter, ListParams, SortDirection, DEFAULT_LIMIT};
pub use query::{resolve_sort_key, SortResolution, UnresolvedSort};
pub use repository::{Deleted, Repository};
pub use uom::UomEngine;
pub use value::{Fields, Value};
