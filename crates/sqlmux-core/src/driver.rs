//! Traits every dialect driver implements
//!
//! - [`Session`]: one live connection that runs single statements
//! - [`Adapter`]: owns the connection or pool and hands out sessions
//! - [`Catalog`]: per-dialect introspection queries, run through a session
//! - [`DdlCompiler`]: pure rendering of structural changes into statements
//! - [`DialectDriver`]: ties the above to a [`CapabilityProfile`]

use crate::{
    CapabilityProfile, CollationEntry, ColumnMeta, CompiledDdl, ConnectionParams, CreateTable,
    EngineEntry, ForeignKeyMeta, IndexMeta, Payload, RawOutcome, Result, Row, SchemaDiff,
    SqlmuxError, StructureSnapshot, TableRef, UserEntry, VariableEntry, ViewInfo, ViewSpec,
};
use async_trait::async_trait;
use std::sync::Arc;

/// A single connection, held for the duration of one logical operation
#[async_trait]
pub trait Session: Send {
    /// Execute exactly one statement.
    ///
    /// With `nest`, row columns are named `table.column` whenever the
    /// driver reports a table for them. Engine failures are returned as
    /// [`SqlmuxError::Query`].
    async fn run(&mut self, sql: &str, nest: bool) -> Result<RawOutcome>;
}

/// Run a statement that is expected to return rows
pub async fn fetch_rows(session: &mut dyn Session, sql: &str) -> Result<Vec<Row>> {
    tracing::trace!(sql_preview = %sql.chars().take(100).collect::<String>(), "catalog query");
    match session.run(sql, false).await?.payload {
        Payload::Rows(rows) => Ok(rows),
        Payload::Report(_) => Err(SqlmuxError::Decode(format!(
            "expected rows from catalog query: {}",
            sql
        ))),
    }
}

/// Owner of the underlying connection or pool
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Check out one session; pooled sessions return to the pool on drop
    async fn acquire(&self) -> Result<Box<dyn Session>>;

    /// Release every held connection
    async fn destroy(&self) -> Result<()>;
}

/// Per-dialect catalog queries producing canonical records
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Every database with its tables, views, routines, triggers and events
    async fn structure(&self, session: &mut dyn Session) -> Result<Vec<StructureSnapshot>>;

    async fn table_columns(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnMeta>>;

    async fn table_indexes(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<IndexMeta>>;

    /// Foreign keys declared on `schema.table`
    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKeyMeta>>;

    async fn users(&self, session: &mut dyn Session) -> Result<Vec<UserEntry>>;

    async fn collations(&self, session: &mut dyn Session) -> Result<Vec<CollationEntry>>;

    async fn variables(&self, session: &mut dyn Session) -> Result<Vec<VariableEntry>>;

    async fn engines(&self, session: &mut dyn Session) -> Result<Vec<EngineEntry>>;

    async fn view_information(
        &self,
        session: &mut dyn Session,
        schema: &str,
        view: &str,
    ) -> Result<Option<ViewInfo>>;
}

/// Per-dialect rendering of structural changes
pub trait DdlCompiler: Send + Sync {
    fn create_table(&self, spec: &CreateTable) -> CompiledDdl;

    fn alter_table(&self, diff: &SchemaDiff) -> CompiledDdl;

    fn truncate_table(&self, table: &TableRef) -> CompiledDdl;

    fn drop_table(&self, table: &TableRef) -> CompiledDdl;

    fn create_view(&self, view: &ViewSpec) -> CompiledDdl;

    fn alter_view(&self, view: &ViewSpec) -> CompiledDdl;

    fn drop_view(&self, view: &TableRef) -> CompiledDdl;

    /// Session-scoped default schema switch
    fn use_schema(&self, schema: &str) -> String;
}

/// A dialect: profile, connection factory, introspector and DDL compiler
#[async_trait]
pub trait DialectDriver: Send + Sync {
    fn profile(&self) -> &'static CapabilityProfile;

    async fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn Adapter>>;

    fn catalog(&self) -> &dyn Catalog;

    fn ddl(&self) -> &dyn DdlCompiler;
}
