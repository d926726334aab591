//! Error types for sqlmux

use thiserror::Error;

/// Core error type for sqlmux operations
#[derive(Error, Debug)]
pub enum SqlmuxError {
    /// Refused, unauthenticated or timed out while connecting
    #[error("Connection error: {0}")]
    Connection(String),

    /// Engine-reported failure for one statement of a batch
    #[error("Statement {index} failed: {message}")]
    Execution {
        index: usize,
        statement: String,
        message: String,
    },

    /// Engine-reported failure not yet attributed to a batch position
    #[error("Query error: {0}")]
    Query(String),

    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// An introspection sub-query failed
    #[error("Catalog lookup failed for {schema}.{table}: {message}")]
    CatalogLookup {
        schema: String,
        table: String,
        message: String,
    },

    /// A catalog row did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SqlmuxError {
    /// Attach batch position and statement text to an engine failure.
    ///
    /// Errors that are not engine failures (lost connection, decode errors)
    /// are returned unchanged.
    pub fn at_statement(self, index: usize, statement: &str) -> Self {
        match self {
            SqlmuxError::Query(message) => SqlmuxError::Execution {
                index,
                statement: statement.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Wrap any failure raised while introspecting `schema.table`.
    pub fn catalog(schema: &str, table: &str, error: SqlmuxError) -> Self {
        match error {
            already @ SqlmuxError::CatalogLookup { .. } => already,
            SqlmuxError::Query(message) | SqlmuxError::Decode(message) => {
                SqlmuxError::CatalogLookup {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    message,
                }
            }
            other => SqlmuxError::CatalogLookup {
                schema: schema.to_string(),
                table: table.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for sqlmux operations
pub type Result<T> = std::result::Result<T, SqlmuxError>;
