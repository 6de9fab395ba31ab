//! Search/sort query builder
//!
//! Turns [`ListParams`] into a parameterised SELECT over one entity table:
//! active-flag filter, OR-combined case-insensitive search over the
//! searchable text columns, an optional relation-aware ORDER BY, and
//! pagination applied last.
//!
//! Sort keys are resolved in an explicit step. A key that cannot be
//! resolved yields [`SortResolution::Unresolved`]; the list query then falls
//! back to primary-key order (or fails, in strict mode).

use tracing::{debug, warn};

use crate::core::descriptor::{ColumnDef, ColumnKind, EntityDescriptor, RelationDef};
use crate::core::error::{RecordError, Result};
use crate::core::filter::ListParams;
use crate::core::value::Value;

/// Alias of the entity table in generated SQL
pub const BASE_ALIAS: &str = "t";
/// Alias of the joined relation in generated SQL
pub const RELATION_ALIAS: &str = "r";

/// SQL function folding text to Unicode lowercase (registered by `Database`)
pub const CASEFOLD_FN: &str = "casefold";
/// SQL function mapping a stored decimal to a key that sorts numerically
pub const DECIMAL_KEY_FN: &str = "decimal_key";

/// Outcome of resolving a sort key against a descriptor
#[derive(Debug)]
pub enum SortResolution<'d> {
    Resolved(ResolvedSort<'d>),
    Unresolved(UnresolvedSort),
}

/// A sort key bound to a concrete column, possibly through one relation
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSort<'d> {
    pub relation: Option<&'d RelationDef>,
    pub column: &'d ColumnDef,
}

/// Why a sort key could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedSort {
    /// Empty key or empty segment around the dot
    Malformed(String),
    /// More than one relation hop (`"a.b.c"`)
    TooDeep(String),
    UnknownColumn(String),
    UnknownRelation(String),
    UnknownRelatedColumn { relation: String, column: String },
}

impl std::fmt::Display for UnresolvedSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedSort::Malformed(key) => write!(f, "malformed sort key '{}'", key),
            UnresolvedSort::TooDeep(key) => {
                write!(f, "sort key '{}' traverses more than one relation", key)
            }
            UnresolvedSort::UnknownColumn(column) => write!(f, "unknown column '{}'", column),
            UnresolvedSort::UnknownRelation(relation) => {
                write!(f, "unknown relation '{}'", relation)
            }
            UnresolvedSort::UnknownRelatedColumn { relation, column } => {
                write!(f, "relation '{}' has no column '{}'", relation, column)
            }
        }
    }
}

impl ResolvedSort<'_> {
    /// Table alias the sort column lives on
    pub fn alias(&self) -> &'static str {
        if self.relation.is_some() {
            RELATION_ALIAS
        } else {
            BASE_ALIAS
        }
    }

    /// ORDER BY expression: text is case-folded, decimals compare exactly
    pub fn order_expression(&self) -> String {
        let qualified = format!("{}.{}", self.alias(), self.column.name);
        match self.column.kind {
            ColumnKind::Text => format!("{}({})", CASEFOLD_FN, qualified),
            ColumnKind::Decimal => format!("{}({})", DECIMAL_KEY_FN, qualified),
            ColumnKind::Integer | ColumnKind::Boolean | ColumnKind::Timestamp => qualified,
        }
    }
}

/// Resolve a plain (`"name"`) or dotted (`"parent.name"`) sort key
pub fn resolve_sort_key<'d>(descriptor: &'d EntityDescriptor, key: &str) -> SortResolution<'d> {
    let key = key.trim();
    if key.is_empty() {
        return SortResolution::Unresolved(UnresolvedSort::Malformed(key.to_string()));
    }

    let Some((relation_name, column_name)) = key.split_once('.') else {
        return match descriptor.column(key) {
            Some(column) => SortResolution::Resolved(ResolvedSort {
                relation: None,
                column,
            }),
            None => SortResolution::Unresolved(UnresolvedSort::UnknownColumn(key.to_string())),
        };
    };

    if column_name.contains('.') {
        return SortResolution::Unresolved(UnresolvedSort::TooDeep(key.to_string()));
    }
    if relation_name.is_empty() || column_name.is_empty() {
        return SortResolution::Unresolved(UnresolvedSort::Malformed(key.to_string()));
    }

    let Some(relation) = descriptor.relation(relation_name) else {
        return SortResolution::Unresolved(UnresolvedSort::UnknownRelation(
            relation_name.to_string(),
        ));
    };

    match relation.target.column(column_name) {
        Some(column) => SortResolution::Resolved(ResolvedSort {
            relation: Some(relation),
            column,
        }),
        None => SortResolution::Unresolved(UnresolvedSort::UnknownRelatedColumn {
            relation: relation_name.to_string(),
            column: column_name.to_string(),
        }),
    }
}

/// A SQL statement with its positional parameters
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SelectQuery {
    /// Register a parameter and return its numbered placeholder
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }
}

/// Escape LIKE wildcards so search text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Saturating conversion for LIMIT and OFFSET values
pub(crate) fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// SELECT of a single record by primary key (parameter `?1`)
pub fn select_by_id(descriptor: &EntityDescriptor) -> String {
    format!(
        "SELECT {} FROM {} AS {a} WHERE {a}.{} = ?1",
        descriptor.select_list(BASE_ALIAS),
        descriptor.table,
        descriptor.primary_key,
        a = BASE_ALIAS,
    )
}

/// Build the filtered, ordered, paginated list query
///
/// Only fails when `strict_sort` is set and the sort key does not resolve.
pub fn build_list(descriptor: &EntityDescriptor, params: &ListParams) -> Result<SelectQuery> {
    let sort = match params.sort_by.as_deref() {
        None => None,
        Some(key) => match resolve_sort_key(descriptor, key) {
            SortResolution::Resolved(resolved) => Some(resolved),
            SortResolution::Unresolved(reason) if params.strict_sort => {
                return Err(RecordError::validation(format!(
                    "cannot sort {} by '{}': {}",
                    descriptor.name, key, reason
                )));
            }
            SortResolution::Unresolved(reason) => {
                warn!(
                    entity = descriptor.name,
                    sort_key = key,
                    %reason,
                    "ignoring unresolvable sort key"
                );
                None
            }
        },
    };

    let mut query = SelectQuery::default();
    let mut sql = format!(
        "SELECT {} FROM {} AS {}",
        descriptor.select_list(BASE_ALIAS),
        descriptor.table,
        BASE_ALIAS
    );

    if let Some(ResolvedSort {
        relation: Some(relation),
        ..
    }) = sort
    {
        sql.push_str(&format!(
            " LEFT JOIN {table} AS {r} ON {r}.{pk} = {t}.{fk}",
            table = relation.target.table,
            r = RELATION_ALIAS,
            pk = relation.target.primary_key,
            t = BASE_ALIAS,
            fk = relation.column,
        ));
    }

    let mut conditions = Vec::new();

    if let (Some(active), Some(flag)) = (descriptor.active_column, params.active.flag()) {
        let placeholder = query.bind(Value::Bool(flag));
        conditions.push(format!("{}.{} = {}", BASE_ALIAS, active, placeholder));
    }

    if let Some(text) = params.search_text() {
        let columns: Vec<&ColumnDef> = descriptor.searchable_columns().collect();
        if !columns.is_empty() {
            let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
            let placeholder = query.bind(Value::Text(pattern));
            let ors = columns
                .iter()
                .map(|c| {
                    format!(
                        "{}({}.{}) LIKE {} ESCAPE '\\'",
                        CASEFOLD_FN, BASE_ALIAS, c.name, placeholder
                    )
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({})", ors));
        }
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    // Primary key keeps pages stable, both as default order and tie-breaker
    match sort {
        Some(resolved) => sql.push_str(&format!(
            " ORDER BY {} {}, {}.{} ASC",
            resolved.order_expression(),
            params.direction.as_sql(),
            BASE_ALIAS,
            descriptor.primary_key
        )),
        None => sql.push_str(&format!(
            " ORDER BY {}.{} ASC",
            BASE_ALIAS, descriptor.primary_key
        )),
    }

    let limit = query.bind(Value::Integer(clamp(params.limit)));
    let offset = query.bind(Value::Integer(clamp(params.skip)));
    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

    debug!(entity = descriptor.name, %sql, "built list query");
    query.sql = sql;
    Ok(query)
}
