//! Canonical catalog records
//!
//! Every dialect's introspector maps its own catalog rows onto these
//! structures, so callers see one shape regardless of the engine.

use serde::{Deserialize, Serialize};

/// Kind of a table-like object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    #[default]
    Table,
    View,
}

/// Table or view in a structure snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub kind: TableKind,
    /// Estimated row count
    pub rows: Option<u64>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub engine: Option<String>,
    pub comment: Option<String>,
    /// Data plus index size in bytes
    pub size: Option<u64>,
    pub auto_increment: Option<u64>,
    pub collation: Option<String>,
}

/// Stored procedure or function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutineEntry {
    pub name: String,
    /// `PROCEDURE` or `FUNCTION`
    pub kind: String,
    pub definer: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub security: Option<String>,
    pub language: Option<String>,
    pub return_type: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEntry {
    pub name: String,
    pub table: String,
    /// `BEFORE`, `AFTER` or `INSTEAD OF`
    pub timing: String,
    /// Events, joined with ` OR ` when the dialect allows several
    pub event: String,
    pub statement: Option<String>,
    pub definer: Option<String>,
    pub sql_mode: Option<String>,
    pub created: Option<String>,
    pub charset: Option<String>,
    pub enabled: bool,
}

/// Scheduled event (MySQL event scheduler)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEventEntry {
    pub name: String,
    pub definition: Option<String>,
    /// `ONE TIME` or `RECURRING`
    pub kind: Option<String>,
    pub definer: Option<String>,
    pub body: Option<String>,
    pub starts: Option<String>,
    pub ends: Option<String>,
    pub status: Option<String>,
    pub execute_at: Option<String>,
    pub interval_field: Option<String>,
    pub interval_value: Option<String>,
    pub on_completion: Option<String>,
    pub originator: Option<String>,
    pub sql_mode: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub last_executed: Option<String>,
    pub comment: Option<String>,
    pub charset: Option<String>,
    pub timezone: Option<String>,
}

/// All schema objects of one database, rebuilt on every call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub name: String,
    pub tables: Vec<TableEntry>,
    pub functions: Vec<RoutineEntry>,
    pub procedures: Vec<RoutineEntry>,
    pub trigger_functions: Vec<RoutineEntry>,
    pub triggers: Vec<TriggerEntry>,
    pub schedulers: Vec<ScheduledEventEntry>,
}

impl StructureSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn views(&self) -> impl Iterator<Item = &TableEntry> {
        self.tables.iter().filter(|t| t.kind == TableKind::View)
    }
}

/// Column definition read from the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Key marker, lowercase: `pri`, `uni`, `mul` or empty
    pub key: String,
    /// Base type, uppercase
    #[serde(rename = "type")]
    pub type_name: String,
    pub schema: String,
    pub table: String,
    pub num_precision: Option<u64>,
    /// Display width parsed from `int(N)`
    pub num_length: Option<u32>,
    pub num_scale: Option<u64>,
    pub date_precision: Option<u64>,
    pub char_length: Option<u64>,
    pub nullable: bool,
    pub unsigned: bool,
    pub zerofill: bool,
    /// 1-based ordinal position
    pub order: u32,
    pub default: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub auto_increment: bool,
    /// Expression of an `ON UPDATE` clause, empty when absent
    pub on_update: String,
    pub comment: String,
}

/// Kind of an index as rendered in DDL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Primary,
    Unique,
    Fulltext,
    #[default]
    Index,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "PRIMARY",
            IndexKind::Unique => "UNIQUE",
            IndexKind::Fulltext => "FULLTEXT",
            IndexKind::Index => "INDEX",
        }
    }

    /// Classify an index the way the designer shows it
    pub fn classify(name: &str, unique: bool, index_type: &str) -> Self {
        if name == "PRIMARY" {
            IndexKind::Primary
        } else if unique {
            IndexKind::Unique
        } else if index_type.eq_ignore_ascii_case("FULLTEXT") {
            IndexKind::Fulltext
        } else {
            IndexKind::Index
        }
    }
}

/// One column of one index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub name: String,
    pub column: String,
    pub unique: bool,
    /// Access method as reported by the engine (`BTREE`, `HASH`, ...)
    pub index_type: String,
    pub kind: IndexKind,
    pub cardinality: Option<u64>,
    pub comment: Option<String>,
    pub index_comment: Option<String>,
}

/// Foreign key column usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyMeta {
    pub schema: String,
    pub table: String,
    pub field: String,
    pub position: Option<u64>,
    pub constraint_position: Option<u64>,
    pub constraint_name: String,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_field: String,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,
    pub host: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollationEntry {
    pub charset: String,
    pub collation: String,
    pub compiled: bool,
    pub is_default: bool,
    pub id: Option<u64>,
    pub sort_len: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    pub value: String,
}

/// Storage engine (MySQL)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineEntry {
    pub name: String,
    pub support: String,
    pub comment: Option<String>,
    pub transactions: Option<String>,
    pub xa: Option<String>,
    pub savepoints: Option<String>,
    pub is_default: bool,
}

/// Definition of an existing view, shaped for the view editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub name: String,
    pub algorithm: String,
    pub definer: String,
    pub security: String,
    /// `CASCADED` / `LOCAL`, empty without a check option
    pub update_option: String,
    pub sql: String,
}
