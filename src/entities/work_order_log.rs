//! Work order activity log (maintenance)
//!
//! Log entries carry no active flag, so deleting one removes it.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::{ColumnDef, EntityDescriptor, KeyStrategy, Record};
use crate::core::value::timestamp_column;

pub static WORK_ORDER_LOG: EntityDescriptor = EntityDescriptor {
    name: "work_order_log",
    table: "work_order_logs",
    primary_key: "id",
    key: KeyStrategy::Generated,
    columns: &[
        ColumnDef::text("id").unsearchable(),
        ColumnDef::text("work_order_id").unsearchable(),
        ColumnDef::text("log_type").unsearchable(),
        ColumnDef::text("user_id").optional().unsearchable(),
        ColumnDef::text("comment").optional(),
        ColumnDef::timestamp("created_at").defaulted(),
    ],
    relations: &[],
    active_column: None,
    created_column: Some("created_at"),
    updated_column: None,
};

/// Origin of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    /// Written by the system on state changes
    System,
    /// Free-text note from a user
    Comment,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::System => "SYSTEM",
            LogType::Comment => "COMMENT",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SYSTEM" => Ok(LogType::System),
            "COMMENT" => Ok(LogType::Comment),
            _ => Err(format!("Invalid log type: {}. Use SYSTEM or COMMENT", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderLog {
    pub id: String,
    pub work_order_id: String,
    pub log_type: LogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for WorkOrderLog {
    fn descriptor() -> &'static EntityDescriptor {
        &WORK_ORDER_LOG
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let idx = row.as_ref().column_index("log_type")?;
        let raw: String = row.get(idx)?;
        let log_type = raw.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
        })?;

        Ok(Self {
            id: row.get("id")?,
            work_order_id: row.get("work_order_id")?,
            log_type,
            user_id: row.get("user_id")?,
            comment: row.get("comment")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_parse() {
        assert_eq!("comment".parse::<LogType>().unwrap(), LogType::Comment);
        assert_eq!("SYSTEM".parse::<LogType>().unwrap(), LogType::System);
        assert!("note".parse::<LogType>().is_err());
    }

    #[test]
    fn test_log_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&LogType::System).unwrap(),
            "\"SYSTEM\""
        );
    }
}
