//! In-memory driver used by the unit tests

use crate::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared record of everything the mock server saw
#[derive(Debug, Default)]
pub(crate) struct ServerLog {
    pub statements: Mutex<Vec<String>>,
    pub lookups: Mutex<Vec<(String, String)>>,
    pub acquired: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl ServerLog {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

/// Scripted behavior of the mock server
#[derive(Debug, Default, Clone)]
pub(crate) struct Script {
    /// Fields returned for a statement, keyed by exact SQL
    pub fields: HashMap<String, Vec<FieldMeta>>,
    /// Statements containing this text fail
    pub fail_on: Option<String>,
    pub columns: Vec<ColumnMeta>,
    pub keys: Vec<ForeignKeyMeta>,
}

pub(crate) struct MockSession {
    pub log: Arc<ServerLog>,
    pub script: Arc<Script>,
}

impl MockSession {
    pub fn new(log: Arc<ServerLog>, script: Script) -> Self {
        Self {
            log,
            script: Arc::new(script),
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn run(&mut self, sql: &str, nest: bool) -> Result<RawOutcome> {
        self.log.statements.lock().unwrap().push(sql.to_string());

        if let Some(marker) = &self.script.fail_on {
            if sql.contains(marker.as_str()) {
                return Err(SqlmuxError::Query(format!("syntax error near '{}'", marker)));
            }
        }

        let fields = self.script.fields.get(sql).cloned().unwrap_or_default();
        if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            let columns: Vec<String> = fields
                .iter()
                .map(|f| {
                    if nest && !f.table.is_empty() {
                        format!("{}.{}", f.table, f.name)
                    } else {
                        f.name.clone()
                    }
                })
                .collect();
            let values = columns.iter().map(|_| Value::Int64(1)).collect();
            Ok(RawOutcome {
                payload: Payload::Rows(vec![Row::new(columns, values)]),
                fields,
            })
        } else {
            Ok(RawOutcome {
                payload: Payload::Report(WriteReport {
                    affected_rows: 1,
                    ..Default::default()
                }),
                fields: Vec::new(),
            })
        }
    }
}

pub(crate) struct MockCatalog {
    pub log: Arc<ServerLog>,
    pub script: Script,
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn structure(&self, _session: &mut dyn Session) -> Result<Vec<StructureSnapshot>> {
        Ok(vec![StructureSnapshot::new("shop")])
    }

    async fn table_columns(
        &self,
        _session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnMeta>> {
        self.log
            .lookups
            .lock()
            .unwrap()
            .push((schema.to_string(), table.to_string()));
        if table == "missing" {
            return Err(SqlmuxError::Query("table does not exist".into()));
        }
        Ok(self
            .script
            .columns
            .iter()
            .filter(|c| c.schema == schema && c.table == table)
            .cloned()
            .collect())
    }

    async fn table_indexes(
        &self,
        _session: &mut dyn Session,
        _schema: &str,
        _table: &str,
    ) -> Result<Vec<IndexMeta>> {
        Ok(Vec::new())
    }

    async fn key_usage(
        &self,
        _session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKeyMeta>> {
        Ok(self
            .script
            .keys
            .iter()
            .filter(|k| k.schema == schema && k.table == table)
            .cloned()
            .collect())
    }

    async fn users(&self, _session: &mut dyn Session) -> Result<Vec<UserEntry>> {
        Ok(Vec::new())
    }

    async fn collations(&self, _session: &mut dyn Session) -> Result<Vec<CollationEntry>> {
        Ok(Vec::new())
    }

    async fn variables(&self, _session: &mut dyn Session) -> Result<Vec<VariableEntry>> {
        Ok(Vec::new())
    }

    async fn engines(&self, _session: &mut dyn Session) -> Result<Vec<EngineEntry>> {
        Ok(Vec::new())
    }

    async fn view_information(
        &self,
        _session: &mut dyn Session,
        _schema: &str,
        _view: &str,
    ) -> Result<Option<ViewInfo>> {
        Ok(None)
    }
}

pub(crate) struct MockDdl;

impl DdlCompiler for MockDdl {
    fn create_table(&self, spec: &CreateTable) -> CompiledDdl {
        let mut ddl = CompiledDdl::single(format!("CREATE TABLE {} (id INT)", spec.name));
        if let Some(comment) = &spec.comment {
            ddl.push(format!("COMMENT ON TABLE {} IS '{}'", spec.name, comment));
        }
        ddl
    }

    fn alter_table(&self, diff: &SchemaDiff) -> CompiledDdl {
        CompiledDdl::single(format!("ALTER TABLE {}", diff.table.name))
    }

    fn truncate_table(&self, table: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!("TRUNCATE TABLE {}", table.name))
    }

    fn drop_table(&self, table: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!("DROP TABLE {}", table.name))
    }

    fn create_view(&self, view: &ViewSpec) -> CompiledDdl {
        CompiledDdl::single(format!("CREATE VIEW {} AS {}", view.name, view.sql))
    }

    fn alter_view(&self, view: &ViewSpec) -> CompiledDdl {
        CompiledDdl::single(format!("ALTER VIEW {} AS {}", view.name, view.sql))
    }

    fn drop_view(&self, view: &TableRef) -> CompiledDdl {
        CompiledDdl::single(format!("DROP VIEW {}", view.name))
    }

    fn use_schema(&self, schema: &str) -> String {
        format!("USE {}", schema)
    }
}

pub(crate) struct MockAdapter {
    log: Arc<ServerLog>,
    script: Script,
}

#[async_trait]
impl Adapter for MockAdapter {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        self.log.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession::new(self.log.clone(), self.script.clone())))
    }

    async fn destroy(&self) -> Result<()> {
        self.log.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct MockDriver {
    pub profile: &'static CapabilityProfile,
    pub log: Arc<ServerLog>,
    pub catalog: MockCatalog,
    pub script: Script,
}

impl MockDriver {
    pub fn new(profile: &'static CapabilityProfile, script: Script) -> Self {
        let log = Arc::new(ServerLog::default());
        Self {
            profile,
            log: log.clone(),
            catalog: MockCatalog {
                log,
                script: script.clone(),
            },
            script,
        }
    }
}

#[async_trait]
impl DialectDriver for MockDriver {
    fn profile(&self) -> &'static CapabilityProfile {
        self.profile
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Arc<dyn Adapter>> {
        if params.host == "unreachable" {
            return Err(SqlmuxError::Connection("connection refused".into()));
        }
        Ok(Arc::new(MockAdapter {
            log: self.log.clone(),
            script: self.script.clone(),
        }))
    }

    fn catalog(&self) -> &dyn Catalog {
        &self.catalog
    }

    fn ddl(&self) -> &dyn DdlCompiler {
        &MockDdl
    }
}

pub(crate) fn field(schema: &str, table: &str, name: &str) -> FieldMeta {
    FieldMeta {
        name: name.to_string(),
        org_name: name.to_string(),
        schema: schema.to_string(),
        table: table.to_string(),
        org_table: table.to_string(),
        type_name: "LONG".to_string(),
        ..Default::default()
    }
}

pub(crate) fn column(schema: &str, table: &str, name: &str, type_name: &str) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        type_name: type_name.to_string(),
        schema: schema.to_string(),
        table: table.to_string(),
        ..Default::default()
    }
}
