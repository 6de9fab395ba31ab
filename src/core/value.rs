//! Column values and field sets
//!
//! A [`Fields`] set is the write payload of `create` and `update`: a column
//! that is absent from the set is left untouched, a column present with
//! [`Value::Null`] is explicitly cleared.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rusqlite::types::{ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::core::descriptor::{ColumnDef, ColumnKind, EntityDescriptor};
use crate::core::error::{RecordError, Result};

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Kind of the value, `None` for NULL
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(ColumnKind::Text),
            Value::Integer(_) => Some(ColumnKind::Integer),
            Value::Decimal(_) => Some(ColumnKind::Decimal),
            Value::Bool(_) => Some(ColumnKind::Boolean),
            Value::Timestamp(_) => Some(ColumnKind::Timestamp),
        }
    }

    /// Convert to the representation stored for `column`
    ///
    /// Integers widen to decimals and RFC 3339 text parses into timestamps;
    /// any other mismatch is a validation failure.
    fn coerce(self, entity: &str, column: &ColumnDef) -> Result<Value> {
        let coerced = match (column.kind, self) {
            (_, Value::Null) => {
                if !column.nullable {
                    return Err(RecordError::validation(format!(
                        "{}.{} cannot be null",
                        entity, column.name
                    )));
                }
                Value::Null
            }
            (ColumnKind::Text, v @ Value::Text(_)) => v,
            (ColumnKind::Integer, v @ Value::Integer(_)) => v,
            (ColumnKind::Decimal, v @ Value::Decimal(_)) => v,
            (ColumnKind::Decimal, Value::Integer(i)) => Value::Decimal(Decimal::from(i)),
            (ColumnKind::Boolean, v @ Value::Bool(_)) => v,
            (ColumnKind::Timestamp, v @ Value::Timestamp(_)) => v,
            (ColumnKind::Timestamp, Value::Text(s)) => Value::Timestamp(
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| {
                        RecordError::validation(format!(
                            "{}.{}: '{}' is not an RFC 3339 timestamp ({})",
                            entity, column.name, s, e
                        ))
                    })?
                    .with_timezone(&Utc),
            ),
            (kind, other) => {
                return Err(RecordError::validation(format!(
                    "{}.{} expects {} but got {}",
                    entity,
                    column.name,
                    kind,
                    other.kind().map(|k| k.to_string()).unwrap_or_default()
                )))
            }
        };
        Ok(coerced)
    }

    /// Rendering used by CLI tables
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Timestamp(t) => format_timestamp(t),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Decimal(d) => ToSqlOutput::Owned(rusqlite::types::Value::Text(d.to_string())),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*b as i64)),
            Value::Timestamp(t) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(format_timestamp(t)))
            }
        })
    }
}

/// Canonical stored form of a timestamp (sorts lexicographically)
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// An ordered set of column assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<String, Value>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style assignment
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Assign a column, replacing any previous value
    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.to_string(), value.into());
    }

    /// Assign only when the option holds a value (absent stays absent)
    pub fn set_some<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a field set from a JSON object
    ///
    /// A missing key stays absent and `null` becomes an explicit
    /// [`Value::Null`]. Values are converted according to the column kind:
    /// decimals accept numbers or numeric strings, timestamps accept
    /// RFC 3339 strings.
    pub fn from_json(descriptor: &EntityDescriptor, json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            RecordError::validation(format!("{} fields must be a JSON object", descriptor.name))
        })?;

        let mut fields = Fields::new();
        for (key, raw) in object {
            let column = descriptor.column(key).ok_or_else(|| {
                RecordError::validation(format!("{} has no column '{}'", descriptor.name, key))
            })?;
            let value = json_to_value(descriptor.name, column, raw)?;
            fields.values.insert(key.clone(), value);
        }
        Ok(fields)
    }

    /// Check every assignment against the descriptor and coerce the values
    ///
    /// Unknown columns, managed timestamp columns and type mismatches are
    /// validation failures.
    pub(crate) fn validated(self, descriptor: &EntityDescriptor) -> Result<Self> {
        let mut out = Fields::new();
        for (name, value) in self.values {
            let column = descriptor.column(&name).ok_or_else(|| {
                RecordError::validation(format!("{} has no column '{}'", descriptor.name, name))
            })?;
            if descriptor.is_managed(&name) {
                return Err(RecordError::validation(format!(
                    "{}.{} is maintained automatically",
                    descriptor.name, name
                )));
            }
            let value = value.coerce(descriptor.name, column)?;
            out.values.insert(name, value);
        }
        Ok(out)
    }
}

fn json_to_value(entity: &str, column: &ColumnDef, raw: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    let mismatch = || {
        RecordError::validation(format!(
            "{}.{} expects {} but got {}",
            entity, column.name, column.kind, raw
        ))
    };

    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match column.kind {
        ColumnKind::Text => Value::Text(raw.as_str().ok_or_else(mismatch)?.to_string()),
        ColumnKind::Integer => Value::Integer(raw.as_i64().ok_or_else(mismatch)?),
        ColumnKind::Boolean => Value::Bool(raw.as_bool().ok_or_else(mismatch)?),
        ColumnKind::Timestamp => Value::Text(raw.as_str().ok_or_else(mismatch)?.to_string()),
        ColumnKind::Decimal => {
            let text = match raw {
                Json::Number(n) => n.to_string(),
                Json::String(s) => s.trim().to_string(),
                _ => return Err(mismatch()),
            };
            Value::Decimal(parse_decimal(&text).ok_or_else(mismatch)?)
        }
    };
    Ok(value)
}

/// Parse plain or scientific decimal notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Text key that orders decimals numerically under plain string comparison
///
/// A sign digit, then the magnitude as 29 integer and 28 fraction digits.
/// Negative magnitudes are digit-complemented so larger ones sort first.
pub fn decimal_sort_key(d: Decimal) -> String {
    let magnitude = d.abs().normalize().to_string();
    let (int, frac) = magnitude
        .split_once('.')
        .unwrap_or((magnitude.as_str(), ""));
    let digits = format!("{:0>29}{:0<28}", int, frac);
    if d.is_sign_negative() && !d.is_zero() {
        let complement: String = digits
            .bytes()
            .map(|b| char::from(b'9' - (b - b'0')))
            .collect();
        format!("0{}", complement)
    } else {
        format!("1{}", digits)
    }
}

/// Read a decimal column stored as TEXT
pub fn decimal_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Decimal> {
    optional_decimal_column(row, column)?.ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(0, column.to_string(), Type::Null)
    })
}

/// Read a nullable decimal column stored as TEXT
pub fn optional_decimal_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Decimal>> {
    let idx = row.as_ref().column_index(column)?;
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
            Decimal::from_str(text).map(Some).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        }
        ValueRef::Integer(i) => Ok(Some(Decimal::from(i))),
        ValueRef::Real(f) => Decimal::try_from(f).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, Box::new(e))
        }),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            column.to_string(),
            Type::Blob,
        )),
    }
}

/// Read a timestamp column stored as RFC 3339 TEXT
pub fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::KeyStrategy;
    use serde_json::json;

    static ITEM: EntityDescriptor = EntityDescriptor {
        name: "item",
        table: "items",
        primary_key: "id",
        key: KeyStrategy::Supplied,
        columns: &[
            ColumnDef::text("id"),
            ColumnDef::text("name"),
            ColumnDef::text("note").optional(),
            ColumnDef::decimal("ratio"),
            ColumnDef::integer("rank").optional(),
            ColumnDef::boolean("is_active").defaulted(),
            ColumnDef::timestamp("due").optional(),
            ColumnDef::timestamp("updated_at").defaulted(),
        ],
        relations: &[],
        active_column: Some("is_active"),
        created_column: None,
        updated_column: Some("updated_at"),
    };

    #[test]
    fn test_from_json_distinguishes_absent_and_null() {
        let fields = Fields::from_json(&ITEM, &json!({"name": "Widget", "note": null})).unwrap();
        assert_eq!(fields.get("name"), Some(&Value::Text("Widget".into())));
        assert_eq!(fields.get("note"), Some(&Value::Null));
        assert!(!fields.contains("rank"));
    }

    #[test]
    fn test_from_json_decimal_accepts_numbers_and_strings() {
        let fields = Fields::from_json(&ITEM, &json!({"ratio": 0.001})).unwrap();
        assert_eq!(fields.get("ratio"), Some(&Value::Decimal(Decimal::new(1, 3))));

        let fields = Fields::from_json(&ITEM, &json!({"ratio": "1000"})).unwrap();
        assert_eq!(fields.get("ratio"), Some(&Value::Decimal(Decimal::from(1000))));

        let fields = Fields::from_json(&ITEM, &json!({"ratio": "1e-6"})).unwrap();
        assert_eq!(fields.get("ratio"), Some(&Value::Decimal(Decimal::new(1, 6))));
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        let err = Fields::from_json(&ITEM, &json!({"rank": "high"})).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));

        let err = Fields::from_json(&ITEM, &json!({"unknown": 1})).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));

        let err = Fields::from_json(&ITEM, &json!(["name"])).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn test_validated_coerces_values() {
        let fields = Fields::new()
            .set("ratio", 3i64)
            .set("due", "2024-01-15T10:30:00Z")
            .validated(&ITEM)
            .unwrap();
        assert_eq!(fields.get("ratio"), Some(&Value::Decimal(Decimal::from(3))));
        assert!(matches!(fields.get("due"), Some(Value::Timestamp(_))));
    }

    #[test]
    fn test_validated_rejects_null_in_required_column() {
        let err = Fields::new().set("name", Value::Null).validated(&ITEM).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn test_validated_rejects_managed_columns() {
        let err = Fields::new()
            .set("updated_at", Utc::now())
            .validated(&ITEM)
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn test_set_some_skips_none() {
        let fields = Fields::new()
            .set_some("note", None::<String>)
            .set_some("name", Some("x"));
        assert_eq!(fields.len(), 1);
        assert!(fields.contains("name"));
    }

    #[test]
    fn test_decimal_sort_key_orders_numerically() {
        let ordered = [
            "-1000",
            "-1.5",
            "-0.0000000000000000000000000001",
            "0",
            "0.000001",
            "1",
            "1.0000000000000001",
            "9.5",
            "10",
            "79228162514264337593543950335",
        ];
        let keys: Vec<String> = ordered
            .iter()
            .map(|s| decimal_sort_key(Decimal::from_str(s).unwrap()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(
            decimal_sort_key(Decimal::from_str("1.000").unwrap()),
            decimal_sort_key(Decimal::ONE)
        );
    }

    #[test]
    fn test_decimal_display_is_normalized() {
        assert_eq!(Value::Decimal(Decimal::new(10000, 4)).display(), "1");
    }
}
