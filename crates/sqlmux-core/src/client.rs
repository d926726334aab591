//! Caller-facing client
//!
//! `Client` binds a [`DialectDriver`] to connection parameters. Every
//! operation checks out one session for its whole duration, re-applies the
//! schema selected with [`Client::use_schema`], and releases the session
//! when done.

use crate::executor::{self, ExecuteOptions};
use crate::{
    Adapter, CapabilityProfile, CollationEntry, ColumnMeta, CompiledDdl, ConnectionParams,
    CreateTable, DialectDriver, EngineEntry, ExecuteOutcome, ForeignKeyMeta, IndexMeta,
    QueryBuilder, Result, SchemaDiff, Session, SqlmuxError, StructureSnapshot, TableRef,
    UserEntry, VariableEntry, ViewInfo, ViewSpec,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection to one server through one dialect
pub struct Client {
    driver: Arc<dyn DialectDriver>,
    profile: &'static CapabilityProfile,
    params: ConnectionParams,
    adapter: RwLock<Option<Arc<dyn Adapter>>>,
    schema: RwLock<Option<String>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("dialect", &self.profile.key)
            .field("host", &self.params.host)
            .field("database", &self.params.database)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create an unconnected client; missing parameters take the dialect defaults
    pub fn new(driver: Arc<dyn DialectDriver>, params: ConnectionParams) -> Self {
        let profile = driver.profile();
        let params = params.with_defaults(profile);
        let schema = params.schema.clone();
        Self {
            driver,
            profile,
            params,
            adapter: RwLock::new(None),
            schema: RwLock::new(schema),
        }
    }

    pub fn profile(&self) -> &'static CapabilityProfile {
        self.profile
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Schema re-applied to every session, if one was selected
    pub async fn current_schema(&self) -> Option<String> {
        self.schema.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.adapter.read().await.is_some()
    }

    /// Open the connection or pool
    #[tracing::instrument(skip(self), fields(dialect = %self.profile.key, host = %self.params.host))]
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.adapter.write().await;
        if slot.is_some() {
            tracing::debug!("already connected");
            return Ok(());
        }

        let adapter = self.driver.connect(&self.params).await?;

        if let Some(schema) = self.current_schema().await {
            // Fail fast on a schema that does not exist.
            if let Err(err) = self.apply_schema(adapter.as_ref(), &schema).await {
                if let Err(destroy_err) = adapter.destroy().await {
                    tracing::error!(error = %destroy_err, "failed to release adapter after connect error");
                }
                return Err(err);
            }
            tracing::debug!(schema = %schema, "default schema applied");
        }

        *slot = Some(adapter);
        Ok(())
    }

    async fn apply_schema(&self, adapter: &dyn Adapter, schema: &str) -> Result<()> {
        let mut session = adapter.acquire().await?;
        session
            .run(&self.driver.ddl().use_schema(schema), false)
            .await?;
        Ok(())
    }

    /// Release every held connection. A second call is a no-op.
    #[tracing::instrument(skip(self), fields(dialect = %self.profile.key))]
    pub async fn destroy(&self) -> Result<()> {
        let adapter = self.adapter.write().await.take();
        match adapter {
            Some(adapter) => {
                adapter.destroy().await?;
                tracing::info!(host = %self.params.host, "connection released");
            }
            None => tracing::debug!("destroy called without an open connection"),
        }
        Ok(())
    }

    /// Switch the default schema for this and every later session
    #[tracing::instrument(skip(self))]
    pub async fn use_schema(&self, schema: &str) -> Result<()> {
        let mut session = self.raw_session().await?;
        session.run(&self.driver.ddl().use_schema(schema), false).await?;
        *self.schema.write().await = Some(schema.to_string());
        Ok(())
    }

    async fn raw_session(&self) -> Result<Box<dyn Session>> {
        let adapter = self
            .adapter
            .read()
            .await
            .clone()
            .ok_or(SqlmuxError::NotConnected)?;
        adapter.acquire().await
    }

    /// Check out a session with the selected schema applied
    pub async fn session(&self) -> Result<Box<dyn Session>> {
        let mut session = self.raw_session().await?;
        if let Some(schema) = self.current_schema().await {
            session
                .run(&self.driver.ddl().use_schema(&schema), false)
                .await?;
        }
        Ok(session)
    }

    /// Execute one or more `;`-separated statements
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub async fn execute(&self, sql: &str, options: ExecuteOptions) -> Result<ExecuteOutcome> {
        let mut session = self.session().await?;
        executor::execute(
            session.as_mut(),
            self.driver.catalog(),
            self.profile,
            sql,
            options,
        )
        .await
    }

    /// Start a builder; render and run it with [`Client::run`]
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    pub async fn run(&self, query: &QueryBuilder) -> Result<ExecuteOutcome> {
        self.execute(&query.render(self.profile), ExecuteOptions::default())
            .await
    }

    pub async fn get_structure(&self) -> Result<Vec<StructureSnapshot>> {
        let mut session = self.session().await?;
        self.driver.catalog().structure(session.as_mut()).await
    }

    pub async fn get_table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMeta>> {
        let mut session = self.session().await?;
        self.driver
            .catalog()
            .table_columns(session.as_mut(), schema, table)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, table, e))
    }

    pub async fn get_table_indexes(&self, schema: &str, table: &str) -> Result<Vec<IndexMeta>> {
        let mut session = self.session().await?;
        self.driver
            .catalog()
            .table_indexes(session.as_mut(), schema, table)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, table, e))
    }

    pub async fn get_key_usage(&self, schema: &str, table: &str) -> Result<Vec<ForeignKeyMeta>> {
        let mut session = self.session().await?;
        self.driver
            .catalog()
            .key_usage(session.as_mut(), schema, table)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, table, e))
    }

    pub async fn get_users(&self) -> Result<Vec<UserEntry>> {
        let mut session = self.session().await?;
        self.driver.catalog().users(session.as_mut()).await
    }

    pub async fn get_collations(&self) -> Result<Vec<CollationEntry>> {
        let mut session = self.session().await?;
        self.driver.catalog().collations(session.as_mut()).await
    }

    pub async fn get_variables(&self) -> Result<Vec<VariableEntry>> {
        let mut session = self.session().await?;
        self.driver.catalog().variables(session.as_mut()).await
    }

    pub async fn get_engines(&self) -> Result<Vec<EngineEntry>> {
        let mut session = self.session().await?;
        self.driver.catalog().engines(session.as_mut()).await
    }

    pub async fn get_view_information(&self, schema: &str, view: &str) -> Result<Option<ViewInfo>> {
        let mut session = self.session().await?;
        self.driver
            .catalog()
            .view_information(session.as_mut(), schema, view)
            .await
            .map_err(|e| SqlmuxError::catalog(schema, view, e))
    }

    pub async fn create_table(&self, spec: &CreateTable) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().create_table(spec)).await
    }

    pub async fn alter_table(&self, diff: &SchemaDiff) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().alter_table(diff)).await
    }

    pub async fn truncate_table(&self, table: &TableRef) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().truncate_table(table)).await
    }

    pub async fn drop_table(&self, table: &TableRef) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().drop_table(table)).await
    }

    pub async fn create_view(&self, view: &ViewSpec) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().create_view(view)).await
    }

    pub async fn alter_view(&self, view: &ViewSpec) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().alter_view(view)).await
    }

    pub async fn drop_view(&self, view: &TableRef) -> Result<ExecuteOutcome> {
        self.run_ddl(self.driver.ddl().drop_view(view)).await
    }

    /// Run compiled DDL in order, inside a transaction where the dialect
    /// can roll DDL back
    #[tracing::instrument(skip(self, ddl), fields(statements = ddl.len()))]
    async fn run_ddl(&self, ddl: CompiledDdl) -> Result<ExecuteOutcome> {
        let mut session = self.session().await?;
        let catalog = self.driver.catalog();
        let options = ExecuteOptions::default();

        let envelopes = if self.profile.transactional_ddl && ddl.len() > 1 {
            executor::execute_atomic(session.as_mut(), catalog, self.profile, &ddl.statements, options)
                .await?
        } else {
            executor::execute_statements(session.as_mut(), catalog, self.profile, &ddl.statements, options)
                .await?
        };
        Ok(ExecuteOutcome::from_envelopes(envelopes))
    }
}
