//! Entity descriptors - static metadata for every persisted entity kind
//!
//! A descriptor declares, once and at compile time, what the repository and
//! the query builder need to know about an entity kind:
//! - the table and its primary key (supplied code or generated ULID)
//! - the columns, their value kinds and which ones are free-text searchable
//! - the one-hop relations that dotted sort keys may traverse
//! - whether the kind carries an active flag (soft delete) or not (hard delete)

use rusqlite::Row;
use serde::Serialize;

/// Value kind of a column, drives search eligibility and sort expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Integer,
    /// Exact decimal, stored as TEXT
    Decimal,
    Boolean,
    /// RFC 3339 timestamp, stored as TEXT
    Timestamp,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Decimal => write!(f, "decimal"),
            ColumnKind::Boolean => write!(f, "boolean"),
            ColumnKind::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// How the primary key of a new record is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Caller provides a readable code ("KG", "BRAND_ACME")
    Supplied,
    /// A ULID is generated when the caller omits the id
    Generated,
}

/// One column of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Storage provides a value when the column is omitted on insert
    pub has_default: bool,
    /// Included in free-text search (text columns only)
    pub searchable: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            has_default: false,
            searchable: false,
        }
    }

    /// Required text column, searchable
    pub const fn text(name: &'static str) -> Self {
        let mut col = Self::new(name, ColumnKind::Text);
        col.searchable = true;
        col
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    pub const fn decimal(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Decimal)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Timestamp)
    }

    /// Column accepts NULL (and may be omitted on insert)
    pub const fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Column has a storage default
    pub const fn defaulted(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Exclude a text column from free-text search
    pub const fn unsearchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// Whether an insert must provide this column
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default
    }
}

/// A one-hop relation usable in dotted sort keys (`"parent.name"`)
pub struct RelationDef {
    /// Name used in sort keys
    pub name: &'static str,
    /// Foreign key column on the owning entity
    pub column: &'static str,
    /// Descriptor of the related entity (joined on its primary key)
    pub target: &'static EntityDescriptor,
}

// Relations may point back at their owner, so print the target by name only
impl std::fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationDef")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("target", &self.target.name)
            .finish()
    }
}

/// Static metadata for one entity kind
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Singular name used in messages and the CLI ("brand", "uom")
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub key: KeyStrategy,
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
    /// Active flag column; `Some` means deletes are soft
    pub active_column: Option<&'static str>,
    /// Managed creation timestamp
    pub created_column: Option<&'static str>,
    /// Managed modification timestamp
    pub updated_column: Option<&'static str>,
}

impl EntityDescriptor {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a sort-traversable relation by name
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Text columns that take part in free-text search
    pub fn searchable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|c| c.searchable && c.kind == ColumnKind::Text)
    }

    /// Soft-deletable kinds carry an active flag
    pub fn is_soft_deletable(&self) -> bool {
        self.active_column.is_some()
    }

    /// Timestamp columns maintained by the repository, never by callers
    pub fn is_managed(&self, column: &str) -> bool {
        self.created_column == Some(column) || self.updated_column == Some(column)
    }

    /// `alias.col AS col, ...` for every column, in declaration order
    pub fn select_list(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{alias}.{name} AS {name}", name = c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check internal consistency of the declaration
    ///
    /// Returns the list of problems found; an empty list means the
    /// descriptor is usable by the repository.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        match self.column(self.primary_key) {
            Some(pk) if pk.kind != ColumnKind::Text => {
                problems.push(format!("{}: primary key must be a text column", self.name))
            }
            Some(_) => {}
            None => problems.push(format!(
                "{}: primary key '{}' is not a declared column",
                self.name, self.primary_key
            )),
        }

        if let Some(active) = self.active_column {
            match self.column(active) {
                Some(col) if col.kind == ColumnKind::Boolean && col.has_default => {}
                Some(_) => problems.push(format!(
                    "{}: active column '{}' must be a defaulted boolean",
                    self.name, active
                )),
                None => problems.push(format!(
                    "{}: active column '{}' is not declared",
                    self.name, active
                )),
            }
        }

        for managed in [self.created_column, self.updated_column].into_iter().flatten() {
            if !matches!(self.column(managed), Some(col) if col.kind == ColumnKind::Timestamp) {
                problems.push(format!(
                    "{}: managed column '{}' must be a declared timestamp",
                    self.name, managed
                ));
            }
        }

        for relation in self.relations {
            if self.column(relation.column).is_none() {
                problems.push(format!(
                    "{}: relation '{}' uses undeclared column '{}'",
                    self.name, relation.name, relation.column
                ));
            }
            if relation.name.contains('.') {
                problems.push(format!(
                    "{}: relation name '{}' must not contain '.'",
                    self.name, relation.name
                ));
            }
        }

        problems
    }
}

/// A typed record backed by a descriptor
///
/// Rows are always selected with [`EntityDescriptor::select_list`], so
/// implementations read columns by name.
pub trait Record: Serialize + Sized {
    fn descriptor() -> &'static EntityDescriptor;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Primary key value
    fn id(&self) -> &str;
}

/// Capability marker for kinds whose delete is a deactivation
pub trait SoftDeletable: Record {
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    static PARENT: EntityDescriptor = EntityDescriptor {
        name: "parent",
        table: "parents",
        primary_key: "id",
        key: KeyStrategy::Supplied,
        columns: &[ColumnDef::text("id"), ColumnDef::text("name")],
        relations: &[],
        active_column: None,
        created_column: None,
        updated_column: None,
    };

    static CHILD_RELATIONS: [RelationDef; 1] = [RelationDef {
        name: "parent",
        column: "parent_id",
        target: &PARENT,
    }];

    static CHILD: EntityDescriptor = EntityDescriptor {
        name: "child",
        table: "children",
        primary_key: "id",
        key: KeyStrategy::Generated,
        columns: &[
            ColumnDef::text("id"),
            ColumnDef::text("name"),
            ColumnDef::text("parent_id").optional().unsearchable(),
            ColumnDef::integer("rank").optional(),
            ColumnDef::boolean("is_active").defaulted(),
        ],
        relations: &CHILD_RELATIONS,
        active_column: Some("is_active"),
        created_column: None,
        updated_column: None,
    };

    #[test]
    fn test_column_builders() {
        let col = ColumnDef::text("name");
        assert!(col.searchable);
        assert!(col.is_required());

        let col = ColumnDef::text("code").optional().unsearchable();
        assert!(!col.searchable);
        assert!(!col.is_required());

        assert!(!ColumnDef::boolean("is_active").defaulted().is_required());
    }

    #[test]
    fn test_searchable_columns_are_text_only() {
        let names: Vec<_> = CHILD.searchable_columns().map(|c| c.name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_lookup() {
        assert!(CHILD.column("rank").is_some());
        assert!(CHILD.column("missing").is_none());
        assert_eq!(CHILD.relation("parent").unwrap().target.table, "parents");
        assert!(CHILD.is_soft_deletable());
        assert!(!PARENT.is_soft_deletable());
    }

    #[test]
    fn test_select_list() {
        assert_eq!(PARENT.select_list("t"), "t.id AS id, t.name AS name");
    }

    #[test]
    fn test_problems_on_valid_descriptor() {
        assert!(CHILD.problems().is_empty());
        assert!(PARENT.problems().is_empty());
    }

    #[test]
    fn test_problems_detects_bad_active_column() {
        static BROKEN: EntityDescriptor = EntityDescriptor {
            name: "broken",
            table: "broken",
            primary_key: "code",
            key: KeyStrategy::Supplied,
            columns: &[ColumnDef::text("id"), ColumnDef::text("is_active")],
            relations: &[],
            active_column: Some("is_active"),
            created_column: Some("created_at"),
            updated_column: None,
        };
        let problems = BROKEN.problems();
        assert_eq!(problems.len(), 3);
    }
}
