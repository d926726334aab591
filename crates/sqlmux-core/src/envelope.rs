//! Normalized statement results

use crate::{ColumnMeta, ForeignKeyMeta, Row};
use serde::Serialize;

/// Summary of a statement that changed data or schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
    /// Free-form server message (`Rows matched: 1  Changed: 1 ...`)
    pub info: Option<String>,
    pub warnings: u16,
}

/// Either the rows of a read or the report of a write, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Rows(Vec<Row>),
    Report(WriteReport),
}

/// Provenance of one result column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMeta {
    /// Name as it appears in the result (alias if any)
    pub name: String,
    /// Name of the underlying column
    pub org_name: String,
    pub schema: String,
    /// Table name as written in the query (alias if any)
    pub table: String,
    pub org_table: String,
    /// Type name reported by the driver
    pub type_name: String,
    /// Set once the field went through enrichment
    pub alias: Option<String>,
    pub table_alias: Option<String>,
    /// Catalog definition, when enrichment found one
    pub column: Option<ColumnMeta>,
}

impl FieldMeta {
    /// Column name to look up in the catalog
    pub fn lookup_name(&self) -> &str {
        if self.org_name.is_empty() {
            &self.name
        } else {
            &self.org_name
        }
    }

    /// Table name to look up in the catalog
    pub fn lookup_table(&self) -> &str {
        if self.org_table.is_empty() {
            &self.table
        } else {
            &self.org_table
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.column.is_some()
    }
}

/// Result of one statement as the driver produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcome {
    pub payload: Payload,
    pub fields: Vec<FieldMeta>,
}

/// Result of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub payload: Payload,
    pub fields: Vec<FieldMeta>,
    pub keys: Vec<ForeignKeyMeta>,
}

impl ResultEnvelope {
    pub fn rows(&self) -> Option<&[Row]> {
        match &self.payload {
            Payload::Rows(rows) => Some(rows),
            Payload::Report(_) => None,
        }
    }

    pub fn report(&self) -> Option<&WriteReport> {
        match &self.payload {
            Payload::Report(report) => Some(report),
            Payload::Rows(_) => None,
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self.payload {
            Payload::Rows(rows) => rows,
            Payload::Report(_) => Vec::new(),
        }
    }
}

impl From<RawOutcome> for ResultEnvelope {
    fn from(raw: RawOutcome) -> Self {
        Self {
            payload: raw.payload,
            fields: raw.fields,
            keys: Vec::new(),
        }
    }
}

/// One envelope when one statement ran, otherwise the ordered sequence
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    Single(ResultEnvelope),
    Batch(Vec<ResultEnvelope>),
}

impl ExecuteOutcome {
    pub fn from_envelopes(mut envelopes: Vec<ResultEnvelope>) -> Self {
        if envelopes.len() == 1 {
            if let Some(envelope) = envelopes.pop() {
                return ExecuteOutcome::Single(envelope);
            }
        }
        ExecuteOutcome::Batch(envelopes)
    }

    pub fn len(&self) -> usize {
        match self {
            ExecuteOutcome::Single(_) => 1,
            ExecuteOutcome::Batch(envelopes) => envelopes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&ResultEnvelope> {
        match self {
            ExecuteOutcome::Single(envelope) => Some(envelope),
            ExecuteOutcome::Batch(_) => None,
        }
    }

    /// Flatten both shapes into a sequence
    pub fn into_vec(self) -> Vec<ResultEnvelope> {
        match self {
            ExecuteOutcome::Single(envelope) => vec![envelope],
            ExecuteOutcome::Batch(envelopes) => envelopes,
        }
    }

    /// Last envelope, for callers that only care about the final statement
    pub fn last(&self) -> Option<&ResultEnvelope> {
        match self {
            ExecuteOutcome::Single(envelope) => Some(envelope),
            ExecuteOutcome::Batch(envelopes) => envelopes.last(),
        }
    }
}
