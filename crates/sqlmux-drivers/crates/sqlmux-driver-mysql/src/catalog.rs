//! MySQL catalog introspection
//!
//! Catalog rows are decoded into the `Raw*` structs below, keyed by the
//! column names MySQL reports, and mapped onto the canonical records by the
//! `map_*` functions. The mapping functions are pure so they can be tested
//! against captured rows.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use sqlmux_core::decode::{from_rows, lenient};
use sqlmux_core::profile::MYSQL;
use sqlmux_core::{
    Catalog, CollationEntry, ColumnMeta, EngineEntry, ForeignKeyMeta, IndexKind, IndexMeta,
    QueryBuilder, Result, RoutineEntry, ScheduledEventEntry, Session, StructureSnapshot,
    TableEntry, TableKind, TriggerEntry, UserEntry, VariableEntry, ViewInfo, fetch_rows,
};
use std::sync::LazyLock;

static INT_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"int\(([^)]+)\)").expect("valid regex"));
static ON_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on update\s*(.*)$").expect("valid regex"));
static VIEW_ALGORITHM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CREATE ALGORITHM=(\S+)").expect("valid regex"));
static VIEW_DEFINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DEFINER=(\S+)").expect("valid regex"));
static VIEW_SECURITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SQL SECURITY (\S+)").expect("valid regex"));
static VIEW_CHECK_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\s+WITH (CASCADED|LOCAL) CHECK OPTION\s*$").expect("valid regex")
});
static VIEW_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\sVIEW\s+\S+\s+AS\s+(.*)$").expect("valid regex"));

#[derive(Debug, Deserialize)]
pub(crate) struct RawDatabase {
    #[serde(rename = "Database", deserialize_with = "lenient::text")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTableStatus {
    #[serde(rename = "Name", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Engine", default, deserialize_with = "lenient::opt_text")]
    pub engine: Option<String>,
    #[serde(rename = "Rows", default, deserialize_with = "lenient::opt_u64")]
    pub rows: Option<u64>,
    #[serde(rename = "Data_length", default, deserialize_with = "lenient::opt_u64")]
    pub data_length: Option<u64>,
    #[serde(rename = "Index_length", default, deserialize_with = "lenient::opt_u64")]
    pub index_length: Option<u64>,
    #[serde(rename = "Auto_increment", default, deserialize_with = "lenient::opt_u64")]
    pub auto_increment: Option<u64>,
    #[serde(rename = "Create_time", default, deserialize_with = "lenient::opt_text")]
    pub create_time: Option<String>,
    #[serde(rename = "Update_time", default, deserialize_with = "lenient::opt_text")]
    pub update_time: Option<String>,
    #[serde(rename = "Collation", default, deserialize_with = "lenient::opt_text")]
    pub collation: Option<String>,
    #[serde(rename = "Comment", default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
}

/// Row of `SHOW FUNCTION STATUS` / `SHOW PROCEDURE STATUS`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRoutine {
    #[serde(rename = "Db", deserialize_with = "lenient::text")]
    pub db: String,
    #[serde(rename = "Name", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(rename = "Definer", default, deserialize_with = "lenient::opt_text")]
    pub definer: Option<String>,
    #[serde(rename = "Created", default, deserialize_with = "lenient::opt_text")]
    pub created: Option<String>,
    #[serde(rename = "Modified", default, deserialize_with = "lenient::opt_text")]
    pub modified: Option<String>,
    #[serde(rename = "Comment", default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
    #[serde(rename = "character_set_client", default, deserialize_with = "lenient::opt_text")]
    pub charset: Option<String>,
    #[serde(rename = "Security_type", default, deserialize_with = "lenient::opt_text")]
    pub security: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrigger {
    #[serde(rename = "Trigger", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Table", default, deserialize_with = "lenient::text")]
    pub table: String,
    #[serde(rename = "Timing", default, deserialize_with = "lenient::text")]
    pub timing: String,
    #[serde(rename = "Event", default, deserialize_with = "lenient::text")]
    pub event: String,
    #[serde(rename = "Statement", default, deserialize_with = "lenient::opt_text")]
    pub statement: Option<String>,
    #[serde(rename = "Definer", default, deserialize_with = "lenient::opt_text")]
    pub definer: Option<String>,
    #[serde(rename = "sql_mode", default, deserialize_with = "lenient::opt_text")]
    pub sql_mode: Option<String>,
    #[serde(rename = "Created", default, deserialize_with = "lenient::opt_text")]
    pub created: Option<String>,
    #[serde(rename = "character_set_client", default, deserialize_with = "lenient::opt_text")]
    pub charset: Option<String>,
}

/// Row of `information_schema.EVENTS` with the `Db` alias added
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(rename = "Db", deserialize_with = "lenient::text")]
    pub db: String,
    #[serde(rename = "EVENT_NAME", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "EVENT_DEFINITION", default, deserialize_with = "lenient::opt_text")]
    pub definition: Option<String>,
    #[serde(rename = "EVENT_TYPE", default, deserialize_with = "lenient::opt_text")]
    pub kind: Option<String>,
    #[serde(rename = "DEFINER", default, deserialize_with = "lenient::opt_text")]
    pub definer: Option<String>,
    #[serde(rename = "EVENT_BODY", default, deserialize_with = "lenient::opt_text")]
    pub body: Option<String>,
    #[serde(rename = "STARTS", default, deserialize_with = "lenient::opt_text")]
    pub starts: Option<String>,
    #[serde(rename = "ENDS", default, deserialize_with = "lenient::opt_text")]
    pub ends: Option<String>,
    #[serde(rename = "STATUS", default, deserialize_with = "lenient::opt_text")]
    pub status: Option<String>,
    #[serde(rename = "EXECUTE_AT", default, deserialize_with = "lenient::opt_text")]
    pub execute_at: Option<String>,
    #[serde(rename = "INTERVAL_FIELD", default, deserialize_with = "lenient::opt_text")]
    pub interval_field: Option<String>,
    #[serde(rename = "INTERVAL_VALUE", default, deserialize_with = "lenient::opt_text")]
    pub interval_value: Option<String>,
    #[serde(rename = "ON_COMPLETION", default, deserialize_with = "lenient::opt_text")]
    pub on_completion: Option<String>,
    #[serde(rename = "ORIGINATOR", default, deserialize_with = "lenient::opt_text")]
    pub originator: Option<String>,
    #[serde(rename = "SQL_MODE", default, deserialize_with = "lenient::opt_text")]
    pub sql_mode: Option<String>,
    #[serde(rename = "CREATED", default, deserialize_with = "lenient::opt_text")]
    pub created: Option<String>,
    #[serde(rename = "LAST_ALTERED", default, deserialize_with = "lenient::opt_text")]
    pub last_altered: Option<String>,
    #[serde(rename = "LAST_EXECUTED", default, deserialize_with = "lenient::opt_text")]
    pub last_executed: Option<String>,
    #[serde(rename = "EVENT_COMMENT", default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
    #[serde(rename = "CHARACTER_SET_CLIENT", default, deserialize_with = "lenient::opt_text")]
    pub charset: Option<String>,
    #[serde(rename = "TIME_ZONE", default, deserialize_with = "lenient::opt_text")]
    pub timezone: Option<String>,
}

/// Row of `information_schema.COLUMNS`
#[derive(Debug, Deserialize)]
pub(crate) struct RawColumn {
    #[serde(rename = "COLUMN_NAME", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "COLUMN_KEY", default, deserialize_with = "lenient::text")]
    pub key: String,
    #[serde(rename = "DATA_TYPE", default, deserialize_with = "lenient::text")]
    pub data_type: String,
    #[serde(rename = "COLUMN_TYPE", default, deserialize_with = "lenient::text")]
    pub column_type: String,
    #[serde(rename = "TABLE_SCHEMA", default, deserialize_with = "lenient::text")]
    pub schema: String,
    #[serde(rename = "TABLE_NAME", default, deserialize_with = "lenient::text")]
    pub table: String,
    #[serde(rename = "NUMERIC_PRECISION", default, deserialize_with = "lenient::opt_u64")]
    pub num_precision: Option<u64>,
    #[serde(rename = "NUMERIC_SCALE", default, deserialize_with = "lenient::opt_u64")]
    pub num_scale: Option<u64>,
    #[serde(rename = "DATETIME_PRECISION", default, deserialize_with = "lenient::opt_u64")]
    pub date_precision: Option<u64>,
    #[serde(rename = "CHARACTER_MAXIMUM_LENGTH", default, deserialize_with = "lenient::opt_u64")]
    pub char_length: Option<u64>,
    #[serde(rename = "IS_NULLABLE", default, deserialize_with = "lenient::text")]
    pub is_nullable: String,
    #[serde(rename = "ORDINAL_POSITION", default, deserialize_with = "lenient::opt_u64")]
    pub ordinal_position: Option<u64>,
    #[serde(rename = "COLUMN_DEFAULT", default, deserialize_with = "lenient::opt_text")]
    pub default: Option<String>,
    #[serde(rename = "CHARACTER_SET_NAME", default, deserialize_with = "lenient::opt_text")]
    pub charset: Option<String>,
    #[serde(rename = "COLLATION_NAME", default, deserialize_with = "lenient::opt_text")]
    pub collation: Option<String>,
    #[serde(rename = "EXTRA", default, deserialize_with = "lenient::text")]
    pub extra: String,
    #[serde(rename = "COLUMN_COMMENT", default, deserialize_with = "lenient::text")]
    pub comment: String,
}

/// Row of `SHOW INDEXES`
#[derive(Debug, Deserialize)]
pub(crate) struct RawIndex {
    #[serde(rename = "Non_unique", default, deserialize_with = "lenient::flag")]
    pub non_unique: bool,
    #[serde(rename = "Key_name", deserialize_with = "lenient::text")]
    pub key_name: String,
    #[serde(rename = "Column_name", default, deserialize_with = "lenient::text")]
    pub column_name: String,
    #[serde(rename = "Index_type", default, deserialize_with = "lenient::text")]
    pub index_type: String,
    #[serde(rename = "Cardinality", default, deserialize_with = "lenient::opt_u64")]
    pub cardinality: Option<u64>,
    #[serde(rename = "Comment", default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
    #[serde(rename = "Index_comment", default, deserialize_with = "lenient::opt_text")]
    pub index_comment: Option<String>,
}

/// Row of `information_schema.KEY_COLUMN_USAGE`
#[derive(Debug, Deserialize)]
pub(crate) struct RawKeyUsage {
    #[serde(rename = "TABLE_SCHEMA", deserialize_with = "lenient::text")]
    pub schema: String,
    #[serde(rename = "TABLE_NAME", deserialize_with = "lenient::text")]
    pub table: String,
    #[serde(rename = "COLUMN_NAME", deserialize_with = "lenient::text")]
    pub column: String,
    #[serde(rename = "ORDINAL_POSITION", default, deserialize_with = "lenient::opt_u64")]
    pub position: Option<u64>,
    #[serde(rename = "POSITION_IN_UNIQUE_CONSTRAINT", default, deserialize_with = "lenient::opt_u64")]
    pub constraint_position: Option<u64>,
    #[serde(rename = "CONSTRAINT_NAME", deserialize_with = "lenient::text")]
    pub constraint_name: String,
    #[serde(rename = "REFERENCED_TABLE_SCHEMA", default, deserialize_with = "lenient::text")]
    pub ref_schema: String,
    #[serde(rename = "REFERENCED_TABLE_NAME", default, deserialize_with = "lenient::text")]
    pub ref_table: String,
    #[serde(rename = "REFERENCED_COLUMN_NAME", default, deserialize_with = "lenient::text")]
    pub ref_column: String,
}

/// Row of `information_schema.REFERENTIAL_CONSTRAINTS`
#[derive(Debug, Deserialize)]
pub(crate) struct RawReferentialRule {
    #[serde(rename = "CONSTRAINT_NAME", deserialize_with = "lenient::text")]
    pub constraint_name: String,
    #[serde(rename = "UPDATE_RULE", default, deserialize_with = "lenient::opt_text")]
    pub update_rule: Option<String>,
    #[serde(rename = "DELETE_RULE", default, deserialize_with = "lenient::opt_text")]
    pub delete_rule: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    #[serde(rename = "user", deserialize_with = "lenient::text")]
    pub user: String,
    #[serde(rename = "host", default, deserialize_with = "lenient::opt_text")]
    pub host: Option<String>,
    #[serde(rename = "password", default, deserialize_with = "lenient::opt_text")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCollation {
    #[serde(rename = "Charset", default, deserialize_with = "lenient::text")]
    pub charset: String,
    #[serde(rename = "Collation", deserialize_with = "lenient::text")]
    pub collation: String,
    #[serde(rename = "Compiled", default, deserialize_with = "lenient::text")]
    pub compiled: String,
    #[serde(rename = "Default", default, deserialize_with = "lenient::text")]
    pub default: String,
    #[serde(rename = "Id", default, deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    #[serde(rename = "Sortlen", default, deserialize_with = "lenient::opt_u64")]
    pub sort_len: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVariable {
    #[serde(rename = "Variable_name", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Value", default, deserialize_with = "lenient::text")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEngine {
    #[serde(rename = "Engine", deserialize_with = "lenient::text")]
    pub engine: String,
    #[serde(rename = "Support", default, deserialize_with = "lenient::text")]
    pub support: String,
    #[serde(rename = "Comment", default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
    #[serde(rename = "Transactions", default, deserialize_with = "lenient::opt_text")]
    pub transactions: Option<String>,
    #[serde(rename = "XA", default, deserialize_with = "lenient::opt_text")]
    pub xa: Option<String>,
    #[serde(rename = "Savepoints", default, deserialize_with = "lenient::opt_text")]
    pub savepoints: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCreateView {
    #[serde(rename = "View", deserialize_with = "lenient::text")]
    pub view: String,
    #[serde(rename = "Create View", deserialize_with = "lenient::text")]
    pub create_view: String,
}

pub(crate) fn map_table(raw: RawTableStatus) -> TableEntry {
    let kind = if raw.comment.as_deref() == Some("VIEW") {
        TableKind::View
    } else {
        TableKind::Table
    };
    let size = match (raw.data_length, raw.index_length) {
        (None, None) => None,
        (data, index) => Some(data.unwrap_or(0) + index.unwrap_or(0)),
    };

    TableEntry {
        name: raw.name,
        kind,
        rows: raw.rows,
        created: raw.create_time,
        updated: raw.update_time,
        engine: raw.engine,
        comment: raw.comment,
        size,
        auto_increment: raw.auto_increment,
        collation: raw.collation,
    }
}

pub(crate) fn map_routine(raw: RawRoutine) -> RoutineEntry {
    RoutineEntry {
        name: raw.name,
        kind: raw.kind,
        definer: raw.definer,
        created: raw.created,
        updated: raw.modified,
        comment: raw.comment,
        charset: raw.charset,
        security: raw.security,
        language: Some("sql".to_string()),
        ..Default::default()
    }
}

pub(crate) fn map_trigger(raw: RawTrigger) -> TriggerEntry {
    TriggerEntry {
        name: raw.name,
        table: raw.table,
        timing: raw.timing,
        event: raw.event,
        statement: raw.statement,
        definer: raw.definer,
        sql_mode: raw.sql_mode,
        created: raw.created,
        charset: raw.charset,
        enabled: true,
    }
}

pub(crate) fn map_event(raw: RawEvent) -> ScheduledEventEntry {
    ScheduledEventEntry {
        name: raw.name,
        definition: raw.definition,
        kind: raw.kind,
        definer: raw.definer,
        body: raw.body,
        starts: raw.starts,
        ends: raw.ends,
        status: raw.status,
        execute_at: raw.execute_at,
        interval_field: raw.interval_field,
        interval_value: raw.interval_value,
        on_completion: raw.on_completion,
        originator: raw.originator,
        sql_mode: raw.sql_mode,
        created: raw.created,
        updated: raw.last_altered,
        last_executed: raw.last_executed,
        comment: raw.comment,
        charset: raw.charset,
        timezone: raw.timezone,
    }
}

pub(crate) fn map_column(raw: RawColumn) -> ColumnMeta {
    let num_length = INT_LENGTH
        .captures(&raw.column_type)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().trim().parse::<u32>().ok());
    let on_update = ON_UPDATE
        .captures(&raw.extra)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    ColumnMeta {
        name: raw.name,
        key: raw.key.to_lowercase(),
        type_name: raw.data_type.to_uppercase(),
        schema: raw.schema,
        table: raw.table,
        num_precision: raw.num_precision,
        num_length,
        num_scale: raw.num_scale,
        date_precision: raw.date_precision,
        char_length: raw.char_length,
        nullable: raw.is_nullable.contains("YES"),
        unsigned: raw.column_type.contains("unsigned"),
        zerofill: raw.column_type.contains("zerofill"),
        order: raw
            .ordinal_position
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        default: raw.default,
        charset: raw.charset,
        collation: raw.collation,
        auto_increment: raw.extra.contains("auto_increment"),
        on_update,
        comment: raw.comment,
    }
}

pub(crate) fn map_index(raw: RawIndex) -> IndexMeta {
    let unique = !raw.non_unique;
    IndexMeta {
        kind: IndexKind::classify(&raw.key_name, unique, &raw.index_type),
        name: raw.key_name,
        column: raw.column_name,
        unique,
        index_type: raw.index_type,
        cardinality: raw.cardinality,
        comment: raw.comment,
        index_comment: raw.index_comment,
    }
}

/// Join key usage with the referential rules of the same constraint
pub(crate) fn map_key_usage(
    usage: Vec<RawKeyUsage>,
    rules: &[RawReferentialRule],
) -> Vec<ForeignKeyMeta> {
    usage
        .into_iter()
        .map(|raw| {
            let rule = rules
                .iter()
                .find(|r| r.constraint_name == raw.constraint_name);
            ForeignKeyMeta {
                schema: raw.schema,
                table: raw.table,
                field: raw.column,
                position: raw.position,
                constraint_position: raw.constraint_position,
                constraint_name: raw.constraint_name,
                ref_schema: raw.ref_schema,
                ref_table: raw.ref_table,
                ref_field: raw.ref_column,
                on_update: rule.and_then(|r| r.update_rule.clone()),
                on_delete: rule.and_then(|r| r.delete_rule.clone()),
            }
        })
        .collect()
}

pub(crate) fn map_collation(raw: RawCollation) -> CollationEntry {
    CollationEntry {
        charset: raw.charset,
        collation: raw.collation,
        compiled: raw.compiled.contains("Yes"),
        is_default: raw.default.contains("Yes"),
        id: raw.id,
        sort_len: raw.sort_len,
    }
}

pub(crate) fn map_engine(raw: RawEngine) -> EngineEntry {
    EngineEntry {
        is_default: raw.support.contains("DEFAULT"),
        name: raw.engine,
        support: raw.support,
        comment: raw.comment,
        transactions: raw.transactions,
        xa: raw.xa,
        savepoints: raw.savepoints,
    }
}

/// Split the `SHOW CREATE VIEW` text into the parts the view editor edits
pub(crate) fn parse_create_view(raw: RawCreateView) -> ViewInfo {
    let text = raw.create_view.as_str();
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    let update_option = capture(&VIEW_CHECK_OPTION);
    let body = capture(&VIEW_BODY);
    let sql = VIEW_CHECK_OPTION.replace(&body, "").trim().to_string();

    ViewInfo {
        algorithm: capture(&VIEW_ALGORITHM),
        definer: capture(&VIEW_DEFINER),
        security: capture(&VIEW_SECURITY),
        update_option,
        sql,
        name: raw.view,
    }
}

fn quoted_literal(value: &str) -> String {
    format!("= {}", MYSQL.quote_str(value))
}

pub(crate) fn columns_query(schema: &str, table: &str) -> String {
    QueryBuilder::new()
        .select(["*"])
        .schema("information_schema")
        .from("COLUMNS")
        .where_([
            ("TABLE_SCHEMA", quoted_literal(schema)),
            ("TABLE_NAME", quoted_literal(table)),
        ])
        .order_by([("ORDINAL_POSITION", "ASC")])
        .render(&MYSQL)
}

pub(crate) fn key_usage_queries(schema: &str, table: &str) -> (String, String) {
    let usage = QueryBuilder::new()
        .select(["*"])
        .schema("information_schema")
        .from("KEY_COLUMN_USAGE")
        .where_([
            ("TABLE_SCHEMA", quoted_literal(schema)),
            ("TABLE_NAME", quoted_literal(table)),
            ("REFERENCED_TABLE_NAME", "IS NOT NULL".to_string()),
        ])
        .render(&MYSQL);
    let rules = QueryBuilder::new()
        .select(["*"])
        .schema("information_schema")
        .from("REFERENTIAL_CONSTRAINTS")
        .where_([
            ("CONSTRAINT_SCHEMA", quoted_literal(schema)),
            ("TABLE_NAME", quoted_literal(table)),
            ("REFERENCED_TABLE_NAME", "IS NOT NULL".to_string()),
        ])
        .render(&MYSQL);
    (usage, rules)
}

/// Catalog queries against `information_schema` and `SHOW` statements
#[derive(Debug, Default)]
pub struct MySqlCatalog;

#[async_trait]
impl Catalog for MySqlCatalog {
    #[tracing::instrument(skip_all)]
    async fn structure(&self, session: &mut dyn Session) -> Result<Vec<StructureSnapshot>> {
        let databases: Vec<RawDatabase> = from_rows(&fetch_rows(session, "SHOW DATABASES").await?)?;
        let functions: Vec<RawRoutine> =
            from_rows(&fetch_rows(session, "SHOW FUNCTION STATUS").await?)?;
        let procedures: Vec<RawRoutine> =
            from_rows(&fetch_rows(session, "SHOW PROCEDURE STATUS").await?)?;
        let events: Vec<RawEvent> = from_rows(
            &fetch_rows(
                session,
                "SELECT *, EVENT_SCHEMA AS `Db`, EVENT_NAME AS `Name` FROM information_schema.`EVENTS`",
            )
            .await?,
        )?;

        let mut snapshots = Vec::with_capacity(databases.len());
        for database in databases {
            let quoted = MYSQL.quote_ident(&database.name);
            let tables: Vec<RawTableStatus> =
                from_rows(&fetch_rows(session, &format!("SHOW TABLE STATUS FROM {}", quoted)).await?)?;
            let triggers: Vec<RawTrigger> =
                from_rows(&fetch_rows(session, &format!("SHOW TRIGGERS FROM {}", quoted)).await?)?;

            let mut snapshot = StructureSnapshot::new(database.name.as_str());
            snapshot.tables = tables.into_iter().map(map_table).collect();
            snapshot.triggers = triggers.into_iter().map(map_trigger).collect();
            snapshot.functions = functions
                .iter()
                .filter(|f| f.db == database.name)
                .map(|f| map_routine(f.clone()))
                .collect();
            snapshot.procedures = procedures
                .iter()
                .filter(|p| p.db == database.name)
                .map(|p| map_routine(p.clone()))
                .collect();
            snapshot.schedulers = events
                .iter()
                .filter(|e| e.db == database.name)
                .map(|e| map_event(e.clone()))
                .collect();
            snapshots.push(snapshot);
        }

        tracing::debug!(databases = snapshots.len(), "structure loaded");
        Ok(snapshots)
    }

    async fn table_columns(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnMeta>> {
        let raw: Vec<RawColumn> = from_rows(&fetch_rows(session, &columns_query(schema, table)).await?)?;
        Ok(raw.into_iter().map(map_column).collect())
    }

    async fn table_indexes(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<IndexMeta>> {
        let sql = format!(
            "SHOW INDEXES FROM {} FROM {}",
            MYSQL.quote_ident(table),
            MYSQL.quote_ident(schema)
        );
        let raw: Vec<RawIndex> = from_rows(&fetch_rows(session, &sql).await?)?;
        Ok(raw.into_iter().map(map_index).collect())
    }

    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKeyMeta>> {
        let (usage_sql, rules_sql) = key_usage_queries(schema, table);
        let usage: Vec<RawKeyUsage> = from_rows(&fetch_rows(session, &usage_sql).await?)?;
        let rules: Vec<RawReferentialRule> = from_rows(&fetch_rows(session, &rules_sql).await?)?;
        Ok(map_key_usage(usage, &rules))
    }

    async fn users(&self, session: &mut dyn Session) -> Result<Vec<UserEntry>> {
        let sql = "SELECT `user`, `host`, IF(LENGTH(password)>0, password, authentication_string) AS `password` FROM `mysql`.`user`";
        let raw: Vec<RawUser> = from_rows(&fetch_rows(session, sql).await?)?;
        Ok(raw
            .into_iter()
            .map(|u| UserEntry {
                name: u.user,
                host: u.host,
                password: u.password,
            })
            .collect())
    }

    async fn collations(&self, session: &mut dyn Session) -> Result<Vec<CollationEntry>> {
        let raw: Vec<RawCollation> = from_rows(&fetch_rows(session, "SHOW COLLATION").await?)?;
        Ok(raw.into_iter().map(map_collation).collect())
    }

    async fn variables(&self, session: &mut dyn Session) -> Result<Vec<VariableEntry>> {
        let raw: Vec<RawVariable> = from_rows(&fetch_rows(session, "SHOW VARIABLES").await?)?;
        Ok(raw
            .into_iter()
            .map(|v| VariableEntry {
                name: v.name,
                value: v.value,
            })
            .collect())
    }

    async fn engines(&self, session: &mut dyn Session) -> Result<Vec<EngineEntry>> {
        let raw: Vec<RawEngine> = from_rows(&fetch_rows(session, "SHOW ENGINES").await?)?;
        Ok(raw.into_iter().map(map_engine).collect())
    }

    async fn view_information(
        &self,
        session: &mut dyn Session,
        schema: &str,
        view: &str,
    ) -> Result<Option<ViewInfo>> {
        let sql = format!("SHOW CREATE VIEW {}", MYSQL.qualify(Some(schema), view));
        let raw: Vec<RawCreateView> = from_rows(&fetch_rows(session, &sql).await?)?;
        Ok(raw.into_iter().next().map(parse_create_view))
    }
}
