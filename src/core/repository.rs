//! Generic entity repository
//!
//! One implementation serves every entity kind; the kind's
//! [`EntityDescriptor`] supplies everything that differs. Public operations
//! each run in their own transaction and commit before returning. The `*_in`
//! variants run on a caller-provided connection or transaction so that
//! multi-step engine operations can compose them atomically.

use std::marker::PhantomData;

use chrono::Utc;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use crate::core::database::Database;
use crate::core::descriptor::{EntityDescriptor, KeyStrategy, Record, SoftDeletable};
use crate::core::error::{RecordError, Result};
use crate::core::filter::ListParams;
use crate::core::query::{build_list, select_by_id};
use crate::core::value::{Fields, Value};

/// Outcome of a delete
///
/// The variant tells the caller which of the two delete semantics applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Deleted<E> {
    /// Active flag set to false; the row is still there
    Deactivated(E),
    /// Row removed; the record is the last persisted state
    Removed(E),
}

impl<E> Deleted<E> {
    pub fn record(&self) -> &E {
        match self {
            Deleted::Deactivated(record) | Deleted::Removed(record) => record,
        }
    }

    pub fn into_record(self) -> E {
        match self {
            Deleted::Deactivated(record) | Deleted::Removed(record) => record,
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, Deleted::Deactivated(_))
    }
}

/// Data access for one entity kind
pub struct Repository<E> {
    _record: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Repository<E> {}

impl<E: Record> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Record> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &E::descriptor().name)
            .finish()
    }
}

impl<E: Record> Repository<E> {
    pub const fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        E::descriptor()
    }

    /// Fetch a record by id, active or not
    pub fn get(&self, db: &Database, id: &str) -> Result<Option<E>> {
        self.fetch_in(db.conn(), id)
    }

    /// Fetch a record by id, mapping absence to `NotFound`
    pub fn require(&self, db: &Database, id: &str) -> Result<E> {
        self.require_in(db.conn(), id)
    }

    /// One page of records, filtered, searched and sorted
    pub fn list(&self, db: &Database, params: &ListParams) -> Result<Vec<E>> {
        self.list_in(db.conn(), params)
    }

    /// Insert a record and return it as persisted
    pub fn create(&self, db: &Database, fields: Fields) -> Result<E> {
        let tx = db.transaction()?;
        let id = self.insert_in(&tx, fields)?;
        let record = self.require_in(&tx, &id)?;
        tx.commit()?;
        info!(entity = self.descriptor().name, %id, "created record");
        Ok(record)
    }

    /// Apply the assignments in `changes` and return the refreshed record
    ///
    /// Columns absent from `changes` are left as stored. An empty set
    /// writes nothing and returns the record as currently stored.
    pub fn update(&self, db: &Database, record: &E, changes: Fields) -> Result<E> {
        if changes.is_empty() {
            return self.require(db, record.id());
        }

        let tx = db.transaction()?;
        self.apply_in(&tx, record.id(), changes)?;
        let refreshed = self.require_in(&tx, record.id())?;
        tx.commit()?;
        info!(entity = self.descriptor().name, id = record.id(), "updated record");
        Ok(refreshed)
    }

    /// Soft delete (flag off) or hard delete, depending on the entity kind
    ///
    /// Returns `None` when no record has this id.
    pub fn delete(&self, db: &Database, id: &str) -> Result<Option<Deleted<E>>> {
        let descriptor = self.descriptor();
        let tx = db.transaction()?;

        let Some(existing) = self.fetch_in(&tx, id)? else {
            return Ok(None);
        };

        let outcome = match descriptor.active_column {
            Some(active) => {
                self.apply_in(&tx, id, Fields::new().set(active, false))?;
                Deleted::Deactivated(self.require_in(&tx, id)?)
            }
            None => {
                tx.execute(
                    &format!(
                        "DELETE FROM {} WHERE {} = ?1",
                        descriptor.table, descriptor.primary_key
                    ),
                    [id],
                )
                .map_err(|e| RecordError::from_write(descriptor.name, e))?;
                Deleted::Removed(existing)
            }
        };

        tx.commit()?;
        info!(
            entity = descriptor.name,
            %id,
            soft = outcome.is_soft(),
            "deleted record"
        );
        Ok(Some(outcome))
    }

    /// Activate or deactivate a soft-deletable record
    pub fn set_active(&self, db: &Database, id: &str, active: bool) -> Result<E>
    where
        E: SoftDeletable,
    {
        let descriptor = self.descriptor();
        let column = descriptor.active_column.ok_or_else(|| {
            RecordError::validation(format!("{} has no active flag", descriptor.name))
        })?;

        let tx = db.transaction()?;
        self.require_in(&tx, id)?;
        self.apply_in(&tx, id, Fields::new().set(column, active))?;
        let record = self.require_in(&tx, id)?;
        tx.commit()?;
        info!(entity = descriptor.name, %id, active, "changed active flag");
        Ok(record)
    }

    pub(crate) fn fetch_in(&self, conn: &Connection, id: &str) -> Result<Option<E>> {
        let sql = select_by_id(self.descriptor());
        Ok(conn.query_row(&sql, [id], E::from_row).optional()?)
    }

    pub(crate) fn require_in(&self, conn: &Connection, id: &str) -> Result<E> {
        self.fetch_in(conn, id)?
            .ok_or_else(|| RecordError::not_found(self.descriptor().name, id))
    }

    pub(crate) fn list_in(&self, conn: &Connection, params: &ListParams) -> Result<Vec<E>> {
        let query = build_list(self.descriptor(), params)?;
        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt.query_map(params_from_iter(query.params.iter()), E::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Insert without committing; returns the primary key used
    pub(crate) fn insert_in(&self, conn: &Connection, fields: Fields) -> Result<String> {
        let descriptor = self.descriptor();
        let mut fields = fields.validated(descriptor)?;

        let id = match fields.get(descriptor.primary_key) {
            Some(Value::Text(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Text(_)) | Some(Value::Null) | None => match descriptor.key {
                KeyStrategy::Generated => {
                    let id = Ulid::new().to_string();
                    fields.insert(descriptor.primary_key, id.clone());
                    id
                }
                KeyStrategy::Supplied => {
                    return Err(RecordError::validation(format!(
                        "{} requires an explicit '{}'",
                        descriptor.name, descriptor.primary_key
                    )))
                }
            },
            Some(other) => {
                return Err(RecordError::validation(format!(
                    "{}.{} must be text, got {:?}",
                    descriptor.name, descriptor.primary_key, other
                )))
            }
        };

        let missing: Vec<&str> = descriptor
            .columns
            .iter()
            .filter(|c| c.is_required() && !descriptor.is_managed(c.name))
            .filter(|c| !fields.contains(c.name))
            .map(|c| c.name)
            .collect();
        if !missing.is_empty() {
            return Err(RecordError::validation(format!(
                "{} is missing required field(s): {}",
                descriptor.name,
                missing.join(", ")
            )));
        }

        let now = Utc::now();
        for managed in [descriptor.created_column, descriptor.updated_column]
            .into_iter()
            .flatten()
        {
            fields.insert(managed, now);
        }

        let columns: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("?{}", n)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            descriptor.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!(entity = descriptor.name, %sql, "insert");

        conn.execute(&sql, params_from_iter(fields.iter().map(|(_, v)| v)))
            .map_err(|e| RecordError::from_write(descriptor.name, e))?;
        Ok(id)
    }

    /// Update the given columns without committing
    ///
    /// Bumps the modification timestamp when anything is written. The
    /// primary key cannot be reassigned.
    pub(crate) fn apply_in(&self, conn: &Connection, id: &str, changes: Fields) -> Result<()> {
        let descriptor = self.descriptor();
        let mut changes = changes.validated(descriptor)?;

        match changes.remove(descriptor.primary_key) {
            None => {}
            Some(Value::Text(new_id)) if new_id == id => {}
            Some(_) => {
                return Err(RecordError::validation(format!(
                    "{}.{} cannot be changed",
                    descriptor.name, descriptor.primary_key
                )))
            }
        }

        if changes.is_empty() {
            return Ok(());
        }

        if let Some(updated) = descriptor.updated_column {
            changes.insert(updated, Utc::now());
        }

        let assignments: Vec<String> = changes
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            descriptor.table,
            assignments.join(", "),
            descriptor.primary_key,
            assignments.len() + 1
        );
        debug!(entity = descriptor.name, %sql, "update");

        let id_value = Value::Text(id.to_string());
        let affected = conn
            .execute(
                &sql,
                params_from_iter(changes.iter().map(|(_, v)| v).chain(std::iter::once(&id_value))),
            )
            .map_err(|e| RecordError::from_write(descriptor.name, e))?;

        if affected == 0 {
            return Err(RecordError::not_found(descriptor.name, id));
        }
        Ok(())
    }
}
