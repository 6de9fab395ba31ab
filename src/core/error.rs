//! Error taxonomy shared by the repository and the UoM engine

use miette::Diagnostic;
use rusqlite::ffi;
use thiserror::Error;

/// Result alias used across the core
pub type Result<T, E = RecordError> = std::result::Result<T, E>;

/// Errors returned by repository and engine operations
#[derive(Debug, Error, Diagnostic)]
pub enum RecordError {
    #[error("{entity} '{id}' not found")]
    #[diagnostic(code(stockwise::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    #[diagnostic(code(stockwise::conflict))]
    Conflict(String),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(stockwise::validation))]
    Validation(String),

    #[error("Transaction '{operation}' failed and was rolled back: {source}")]
    #[diagnostic(
        code(stockwise::transaction),
        help("No changes from this operation were persisted")
    )]
    Transaction {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database was created with schema version {found}, this build expects {expected}")]
    #[diagnostic(
        code(stockwise::schema_mismatch),
        help("Point --database at a database created by this version")
    )]
    SchemaMismatch { found: i32, expected: i32 },

    #[error("Database error: {0}")]
    #[diagnostic(code(stockwise::database))]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(stockwise::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(stockwise::serialization))]
    Serialization(#[from] serde_json::Error),
}

impl RecordError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RecordError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RecordError::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RecordError::Validation(message.into())
    }

    /// Classify a storage error raised while writing `entity`
    ///
    /// Constraint violations become Conflict or Validation so callers see
    /// the typed taxonomy; everything else stays a database error.
    pub fn from_write(entity: &'static str, err: rusqlite::Error) -> Self {
        match constraint_kind(&err) {
            Some(ConstraintKind::Duplicate) => {
                RecordError::Conflict(format!("{} already exists ({})", entity, err))
            }
            Some(ConstraintKind::Invalid) => {
                RecordError::Validation(format!("{} rejected by storage: {}", entity, err))
            }
            None => RecordError::Database(err),
        }
    }

    /// Re-label a failure raised inside the multi-step `operation`
    ///
    /// Typed failures (not found, conflict, validation) pass through; raw
    /// storage failures are reported as a rolled-back transaction.
    pub fn during(self, operation: &'static str) -> Self {
        match self {
            RecordError::Database(source) => RecordError::Transaction { operation, source },
            other => other,
        }
    }

    /// Whether this error is the "not found" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound { .. })
    }

    /// Whether this error is a conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, RecordError::Conflict(_))
    }
}

enum ConstraintKind {
    Duplicate,
    Invalid,
}

fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Some(ConstraintKind::Duplicate)
        }
        _ => Some(ConstraintKind::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id TEXT PRIMARY KEY, name TEXT NOT NULL UNIQUE);
             INSERT INTO t (id, name) VALUES ('A', 'alpha');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_duplicate_key_is_conflict() {
        let conn = table();
        let err = conn
            .execute("INSERT INTO t (id, name) VALUES ('A', 'other')", [])
            .unwrap_err();
        assert!(RecordError::from_write("thing", err).is_conflict());
    }

    #[test]
    fn test_unique_column_is_conflict() {
        let conn = table();
        let err = conn
            .execute("INSERT INTO t (id, name) VALUES ('B', 'alpha')", [])
            .unwrap_err();
        assert!(RecordError::from_write("thing", err).is_conflict());
    }

    #[test]
    fn test_not_null_is_validation() {
        let conn = table();
        let err = conn
            .execute("INSERT INTO t (id, name) VALUES ('B', NULL)", [])
            .unwrap_err();
        assert!(matches!(
            RecordError::from_write("thing", err),
            RecordError::Validation(_)
        ));
    }

    #[test]
    fn test_other_failures_become_transaction_errors() {
        let conn = table();
        let err = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert!(matches!(
            RecordError::from(err).during("rebase"),
            RecordError::Transaction { operation: "rebase", .. }
        ));
    }

    #[test]
    fn test_typed_failures_pass_through_during() {
        let err = RecordError::conflict("already the reference").during("rebase");
        assert!(err.is_conflict());
    }
}
