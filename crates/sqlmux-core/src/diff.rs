//! Structural descriptions consumed by the DDL compilers

use crate::IndexKind;
use serde::{Deserialize, Serialize};

/// Schema-qualified object name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn in_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

/// Column definition used for additions and as the target of a change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub num_length: Option<u32>,
    pub char_length: Option<u64>,
    pub date_precision: Option<u64>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub nullable: bool,
    pub auto_increment: bool,
    /// Default expression, inserted verbatim
    pub default: Option<String>,
    pub comment: Option<String>,
    pub collation: Option<String>,
    pub on_update: Option<String>,
    /// Column to place this one after; `None` places it first
    pub after: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Length or precision shown in parentheses after the type
    pub fn length(&self) -> Option<u64> {
        self.num_length
            .filter(|n| *n > 0)
            .map(u64::from)
            .or(self.char_length.filter(|n| *n > 0))
            .or(self.date_precision.filter(|n| *n > 0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    /// Current name of the column
    pub org_name: String,
    /// Desired definition, including the new name
    pub column: ColumnSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDrop {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub kind: IndexKind,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexChange {
    pub old_name: String,
    pub old_kind: IndexKind,
    pub index: IndexSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDrop {
    pub name: String,
    pub kind: IndexKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub constraint_name: String,
    pub field: String,
    #[serde(default)]
    pub ref_schema: Option<String>,
    pub ref_table: String,
    pub ref_field: String,
    pub on_update: String,
    pub on_delete: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyChange {
    pub old_name: String,
    pub key: ForeignKeySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDrop {
    pub constraint_name: String,
}

/// Additions, changes and deletions of one item category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSet<A, C, D> {
    pub additions: Vec<A>,
    pub changes: Vec<C>,
    pub deletions: Vec<D>,
}

impl<A, C, D> Default for ChangeSet<A, C, D> {
    fn default() -> Self {
        Self {
            additions: Vec::new(),
            changes: Vec::new(),
            deletions: Vec::new(),
        }
    }
}

impl<A, C, D> ChangeSet<A, C, D> {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.changes.is_empty() && self.deletions.is_empty()
    }
}

/// Table-level attribute changes; `None` leaves an attribute untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub comment: Option<String>,
    pub engine: Option<String>,
    pub auto_increment: Option<u64>,
    pub collation: Option<String>,
    /// New table name
    pub name: Option<String>,
}

impl TableOptions {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none()
            && self.engine.is_none()
            && self.auto_increment.is_none()
            && self.collation.is_none()
            && self.name.is_none()
    }
}

/// Alter-table payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDiff {
    pub table: TableRef,
    pub columns: ChangeSet<ColumnSpec, ColumnChange, ColumnDrop>,
    pub indexes: ChangeSet<IndexSpec, IndexChange, IndexDrop>,
    pub foreign_keys: ChangeSet<ForeignKeySpec, ForeignKeyChange, ForeignKeyDrop>,
    pub options: TableOptions,
}

impl SchemaDiff {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    /// Table name after the diff is applied
    pub fn final_name(&self) -> &str {
        self.options.name.as_deref().unwrap_or(&self.table.name)
    }
}

/// New table with a single placeholder column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
}

/// View definition for create and alter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSpec {
    pub schema: Option<String>,
    pub name: String,
    /// Current name when altering; a differing value triggers a rename
    pub old_name: Option<String>,
    pub algorithm: String,
    pub definer: Option<String>,
    pub security: String,
    pub sql: String,
    /// `CASCADED` or `LOCAL` check option
    pub update_option: Option<String>,
}

impl ViewSpec {
    /// Name the view has before the statement runs
    pub fn current_name(&self) -> &str {
        self.old_name.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered statements produced by a DDL compiler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledDdl {
    pub statements: Vec<String>,
}

impl CompiledDdl {
    pub fn single(statement: impl Into<String>) -> Self {
        Self {
            statements: vec![statement.into()],
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}
