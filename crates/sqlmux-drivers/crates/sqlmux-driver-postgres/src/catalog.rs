//! PostgreSQL catalog introspection
//!
//! The "databases" of a PostgreSQL structure snapshot are the schemas of the
//! connected database. Catalog views report many columns through domains
//! such as `sql_identifier`, so every query casts to plain types first.

use async_trait::async_trait;
use serde::Deserialize;
use sqlmux_core::decode::{from_rows, lenient};
use sqlmux_core::profile::POSTGRESQL;
use sqlmux_core::{
    Catalog, CollationEntry, ColumnMeta, EngineEntry, ForeignKeyMeta, IndexKind, IndexMeta,
    QueryBuilder, Result, RoutineEntry, Session, StructureSnapshot, TableEntry, TableKind,
    TriggerEntry, UserEntry, VariableEntry, ViewInfo, fetch_rows,
};
use std::collections::BTreeMap;

const TRIGGER_ROW: u64 = 1 << 0;
const TRIGGER_BEFORE: u64 = 1 << 1;
const TRIGGER_INSERT: u64 = 1 << 2;
const TRIGGER_DELETE: u64 = 1 << 3;
const TRIGGER_UPDATE: u64 = 1 << 4;
const TRIGGER_TRUNCATE: u64 = 1 << 5;
const TRIGGER_INSTEAD: u64 = 1 << 6;

/// Predicate excluding system schemas
fn user_schemas(column: &str) -> String {
    format!("{column} NOT LIKE 'pg\\_%' AND {column} <> 'information_schema'")
}

fn literal(value: &str) -> String {
    POSTGRESQL.quote_str(value)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSchema {
    #[serde(deserialize_with = "lenient::text")]
    pub schema_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTable {
    #[serde(deserialize_with = "lenient::text")]
    pub table_schema: String,
    #[serde(deserialize_with = "lenient::text")]
    pub table_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub table_type: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub rows: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrigger {
    #[serde(deserialize_with = "lenient::text")]
    pub schema_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub trigger_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub table_name: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub tgtype: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub definition: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub definer: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enabled: bool,
}

/// Row of `pg_proc` joined with its language
#[derive(Debug, Deserialize)]
pub(crate) struct RawRoutine {
    #[serde(deserialize_with = "lenient::text")]
    pub schema_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub routine_name: String,
    /// `f` function, `p` procedure
    #[serde(default, deserialize_with = "lenient::text")]
    pub prokind: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub return_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub arguments: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub definer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub security: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawColumn {
    #[serde(deserialize_with = "lenient::text")]
    pub column_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub table_schema: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub table_name: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub ordinal_position: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub column_default: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub is_nullable: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub udt_name: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub character_maximum_length: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub numeric_precision: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub numeric_scale: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub datetime_precision: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub character_set_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub collation_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub is_identity: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub column_key: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub column_comment: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawIndex {
    #[serde(deserialize_with = "lenient::text")]
    pub index_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub column_name: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_unique: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_primary: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub index_type: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub index_comment: Option<String>,
}

/// One foreign key column with its target and referential rules
#[derive(Debug, Deserialize)]
pub(crate) struct RawKeyUsage {
    #[serde(deserialize_with = "lenient::text")]
    pub table_schema: String,
    #[serde(deserialize_with = "lenient::text")]
    pub table_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub column_name: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub ordinal_position: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub position_in_unique_constraint: Option<u64>,
    #[serde(deserialize_with = "lenient::text")]
    pub constraint_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub referenced_table_schema: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub referenced_table_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub referenced_column_name: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub update_rule: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub delete_rule: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRole {
    #[serde(deserialize_with = "lenient::text")]
    pub rolname: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCollation {
    #[serde(deserialize_with = "lenient::text")]
    pub collname: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub charset: String,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSetting {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub setting: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawView {
    #[serde(deserialize_with = "lenient::text")]
    pub viewname: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub viewowner: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub definition: String,
}

/// Timing and events encoded in `pg_trigger.tgtype`
pub(crate) fn decode_tgtype(tgtype: u64) -> (String, String) {
    let timing = if tgtype & TRIGGER_BEFORE != 0 {
        "BEFORE"
    } else if tgtype & TRIGGER_INSTEAD != 0 {
        "INSTEAD OF"
    } else {
        "AFTER"
    };
    let events: Vec<&str> = [
        (TRIGGER_INSERT, "INSERT"),
        (TRIGGER_DELETE, "DELETE"),
        (TRIGGER_UPDATE, "UPDATE"),
        (TRIGGER_TRUNCATE, "TRUNCATE"),
    ]
    .into_iter()
    .filter(|(bit, _)| tgtype & bit != 0)
    .map(|(_, name)| name)
    .collect();
    (timing.to_string(), events.join(" OR "))
}

pub(crate) fn map_table(raw: RawTable) -> TableEntry {
    let kind = if raw.table_type == "VIEW" {
        TableKind::View
    } else {
        TableKind::Table
    };
    TableEntry {
        name: raw.table_name,
        kind,
        rows: raw.rows,
        size: raw.size,
        comment: raw.comment,
        ..Default::default()
    }
}

pub(crate) fn map_trigger(raw: RawTrigger) -> TriggerEntry {
    let (timing, event) = decode_tgtype(raw.tgtype.unwrap_or(0));
    tracing::trace!(
        trigger = %raw.trigger_name,
        row_level = raw.tgtype.is_some_and(|t| t & TRIGGER_ROW != 0),
        "decoded trigger type"
    );
    TriggerEntry {
        name: raw.trigger_name,
        table: raw.table_name,
        timing,
        event,
        statement: raw.definition,
        definer: raw.definer,
        enabled: raw.enabled,
        ..Default::default()
    }
}

/// Where a routine lands in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoutineSlot {
    Function,
    Procedure,
    TriggerFunction,
}

pub(crate) fn map_routine(raw: RawRoutine) -> (RoutineSlot, RoutineEntry) {
    let slot = if raw.prokind == "p" {
        RoutineSlot::Procedure
    } else if raw.return_type.as_deref() == Some("trigger") {
        RoutineSlot::TriggerFunction
    } else {
        RoutineSlot::Function
    };
    let kind = match slot {
        RoutineSlot::Procedure => "PROCEDURE",
        RoutineSlot::Function | RoutineSlot::TriggerFunction => "FUNCTION",
    };
    let entry = RoutineEntry {
        name: raw.routine_name,
        kind: kind.to_string(),
        definer: raw.definer,
        comment: raw.comment,
        security: raw.security,
        language: raw.language,
        return_type: raw.return_type.filter(|_| slot != RoutineSlot::Procedure),
        arguments: raw.arguments,
        ..Default::default()
    };
    (slot, entry)
}

pub(crate) fn map_column(raw: RawColumn) -> ColumnMeta {
    let auto_increment = raw.is_identity.eq_ignore_ascii_case("YES")
        || raw
            .column_default
            .as_deref()
            .is_some_and(|d| d.starts_with("nextval("));

    ColumnMeta {
        name: raw.column_name,
        key: raw.column_key.to_lowercase(),
        type_name: raw.udt_name.to_uppercase(),
        schema: raw.table_schema,
        table: raw.table_name,
        num_precision: raw.numeric_precision,
        num_length: None,
        num_scale: raw.numeric_scale,
        date_precision: raw.datetime_precision,
        char_length: raw.character_maximum_length,
        nullable: raw.is_nullable.contains("YES"),
        unsigned: false,
        zerofill: false,
        order: raw
            .ordinal_position
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        default: raw.column_default,
        charset: raw.character_set_name,
        collation: raw.collation_name,
        auto_increment,
        on_update: String::new(),
        comment: raw.column_comment,
    }
}

pub(crate) fn map_index(raw: RawIndex) -> IndexMeta {
    let kind = if raw.is_primary {
        IndexKind::Primary
    } else {
        IndexKind::classify(&raw.index_name, raw.is_unique, &raw.index_type)
    };
    IndexMeta {
        name: raw.index_name,
        column: raw.column_name,
        unique: raw.is_unique,
        index_type: raw.index_type.to_uppercase(),
        kind,
        cardinality: None,
        comment: None,
        index_comment: raw.index_comment,
    }
}

pub(crate) fn map_key_usage(raw: RawKeyUsage) -> ForeignKeyMeta {
    ForeignKeyMeta {
        schema: raw.table_schema,
        table: raw.table_name,
        field: raw.column_name,
        position: raw.ordinal_position,
        constraint_position: raw.position_in_unique_constraint,
        constraint_name: raw.constraint_name,
        ref_schema: raw.referenced_table_schema,
        ref_table: raw.referenced_table_name,
        ref_field: raw.referenced_column_name,
        on_update: raw.update_rule,
        on_delete: raw.delete_rule,
    }
}

pub(crate) fn map_view(raw: RawView) -> ViewInfo {
    let sql = raw.definition.trim().trim_end_matches(';').trim_end().to_string();
    ViewInfo {
        name: raw.viewname,
        definer: raw.viewowner,
        sql,
        ..Default::default()
    }
}

pub(crate) fn schemas_query() -> String {
    format!(
        "SELECT schema_name::text AS schema_name FROM information_schema.schemata \
         WHERE {} ORDER BY schema_name",
        user_schemas("schema_name")
    )
}

pub(crate) fn tables_query() -> String {
    format!(
        "SELECT t.table_schema::text AS table_schema, t.table_name::text AS table_name, \
         t.table_type::text AS table_type, pg_total_relation_size(c.oid) AS size, \
         c.reltuples::bigint AS rows, obj_description(c.oid, 'pg_class') AS comment \
         FROM information_schema.tables t \
         JOIN pg_namespace n ON n.nspname = t.table_schema \
         JOIN pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name \
         WHERE {} ORDER BY t.table_name",
        user_schemas("t.table_schema")
    )
}

pub(crate) fn triggers_query() -> String {
    format!(
        "SELECT n.nspname::text AS schema_name, t.tgname::text AS trigger_name, \
         c.relname::text AS table_name, t.tgtype::int AS tgtype, \
         pg_get_triggerdef(t.oid) AS definition, pg_get_userbyid(c.relowner) AS definer, \
         (t.tgenabled <> 'D') AS enabled \
         FROM pg_trigger t \
         JOIN pg_class c ON c.oid = t.tgrelid \
         JOIN pg_namespace n ON n.oid = c.relnamespace \
         WHERE NOT t.tgisinternal AND {} ORDER BY t.tgname",
        user_schemas("n.nspname")
    )
}

pub(crate) fn routines_query() -> String {
    format!(
        "SELECT n.nspname::text AS schema_name, p.proname::text AS routine_name, \
         p.prokind::text AS prokind, l.lanname::text AS language, \
         pg_get_function_result(p.oid) AS return_type, \
         pg_get_function_identity_arguments(p.oid) AS arguments, \
         pg_get_userbyid(p.proowner) AS definer, \
         CASE WHEN p.prosecdef THEN 'DEFINER' ELSE 'INVOKER' END AS security, \
         obj_description(p.oid, 'pg_proc') AS comment \
         FROM pg_proc p \
         JOIN pg_namespace n ON n.oid = p.pronamespace \
         JOIN pg_language l ON l.oid = p.prolang \
         WHERE p.prokind IN ('f', 'p') AND {} ORDER BY p.proname",
        user_schemas("n.nspname")
    )
}

pub(crate) fn columns_query(schema: &str, table: &str) -> String {
    let (schema, table) = (literal(schema), literal(table));
    format!(
        "SELECT c.table_schema::text AS table_schema, c.table_name::text AS table_name, \
         c.column_name::text AS column_name, c.ordinal_position::int AS ordinal_position, \
         c.column_default::text AS column_default, c.is_nullable::text AS is_nullable, \
         c.udt_name::text AS udt_name, \
         c.character_maximum_length::int AS character_maximum_length, \
         c.numeric_precision::int AS numeric_precision, c.numeric_scale::int AS numeric_scale, \
         c.datetime_precision::int AS datetime_precision, \
         c.character_set_name::text AS character_set_name, \
         c.collation_name::text AS collation_name, c.is_identity::text AS is_identity, \
         COALESCE(k.column_key, '') AS column_key, \
         COALESCE(col_description(a.attrelid, a.attnum), '') AS column_comment \
         FROM information_schema.columns c \
         LEFT JOIN pg_attribute a \
           ON a.attrelid = (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass \
          AND a.attname = c.column_name \
         LEFT JOIN ( \
           SELECT kcu.column_name::text AS column_name, \
                  MIN(CASE tc.constraint_type WHEN 'PRIMARY KEY' THEN 'pri' ELSE 'uni' END) AS column_key \
           FROM information_schema.table_constraints tc \
           JOIN information_schema.key_column_usage kcu \
             ON kcu.constraint_name = tc.constraint_name \
            AND kcu.constraint_schema = tc.constraint_schema \
            AND kcu.table_name = tc.table_name \
           WHERE tc.table_schema = {schema} AND tc.table_name = {table} \
             AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE') \
           GROUP BY kcu.column_name \
         ) k ON k.column_name = c.column_name::text \
         WHERE c.table_schema = {schema} AND c.table_name = {table} \
         ORDER BY c.ordinal_position"
    )
}

pub(crate) fn indexes_query(schema: &str, table: &str) -> String {
    format!(
        "SELECT i.relname::text AS index_name, a.attname::text AS column_name, \
         ix.indisunique AS is_unique, ix.indisprimary AS is_primary, \
         am.amname::text AS index_type, obj_description(i.oid, 'pg_class') AS index_comment \
         FROM pg_index ix \
         JOIN pg_class t ON t.oid = ix.indrelid \
         JOIN pg_class i ON i.oid = ix.indexrelid \
         JOIN pg_namespace n ON n.oid = t.relnamespace \
         JOIN pg_am am ON am.oid = i.relam \
         JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
         WHERE n.nspname = {} AND t.relname = {} \
         ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)",
        literal(schema),
        literal(table)
    )
}

/// Foreign key columns of a table, each paired with the referenced column
/// at the same position of the referenced unique constraint
pub(crate) fn key_usage_query(schema: &str, table: &str) -> String {
    format!(
        "SELECT kcu.table_schema::text AS table_schema, kcu.table_name::text AS table_name, \
         kcu.column_name::text AS column_name, kcu.ordinal_position::int AS ordinal_position, \
         kcu.position_in_unique_constraint::int AS position_in_unique_constraint, \
         tc.constraint_name::text AS constraint_name, \
         rku.table_schema::text AS referenced_table_schema, \
         rku.table_name::text AS referenced_table_name, \
         rku.column_name::text AS referenced_column_name, \
         rc.update_rule::text AS update_rule, rc.delete_rule::text AS delete_rule \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON kcu.constraint_name = tc.constraint_name AND kcu.constraint_schema = tc.constraint_schema \
         JOIN information_schema.referential_constraints rc \
           ON rc.constraint_name = tc.constraint_name AND rc.constraint_schema = tc.constraint_schema \
         JOIN information_schema.key_column_usage rku \
           ON rku.constraint_name = rc.unique_constraint_name \
          AND rku.constraint_schema = rc.unique_constraint_schema \
          AND rku.ordinal_position = kcu.position_in_unique_constraint \
         WHERE tc.constraint_type = 'FOREIGN KEY' \
           AND tc.table_schema = {} AND tc.table_name = {} \
         ORDER BY tc.constraint_name, kcu.ordinal_position",
        literal(schema),
        literal(table)
    )
}

pub(crate) fn view_query(schema: &str, view: &str) -> String {
    QueryBuilder::new()
        .select(["viewname::text AS viewname", "viewowner::text AS viewowner", "definition"])
        .schema("pg_catalog")
        .from("pg_views")
        .where_([
            ("schemaname", format!("= {}", literal(schema))),
            ("viewname", format!("= {}", literal(view))),
        ])
        .render(&POSTGRESQL)
}

/// Group per-schema rows into snapshots, keeping schema order
fn assemble(
    schemas: Vec<RawSchema>,
    tables: Vec<RawTable>,
    triggers: Vec<RawTrigger>,
    routines: Vec<RawRoutine>,
) -> Vec<StructureSnapshot> {
    let mut snapshots: BTreeMap<String, StructureSnapshot> = schemas
        .into_iter()
        .map(|s| (s.schema_name.clone(), StructureSnapshot::new(s.schema_name)))
        .collect();

    for table in tables {
        if let Some(snapshot) = snapshots.get_mut(&table.table_schema) {
            snapshot.tables.push(map_table(table));
        }
    }
    for trigger in triggers {
        if let Some(snapshot) = snapshots.get_mut(&trigger.schema_name) {
            snapshot.triggers.push(map_trigger(trigger));
        }
    }
    for routine in routines {
        let Some(snapshot) = snapshots.get_mut(&routine.schema_name) else {
            continue;
        };
        match map_routine(routine) {
            (RoutineSlot::Function, entry) => snapshot.functions.push(entry),
            (RoutineSlot::Procedure, entry) => snapshot.procedures.push(entry),
            (RoutineSlot::TriggerFunction, entry) => snapshot.trigger_functions.push(entry),
        }
    }

    snapshots.into_values().collect()
}

/// Catalog queries against `information_schema` and `pg_catalog`
#[derive(Debug, Default)]
pub struct PostgresCatalog;

#[async_trait]
impl Catalog for PostgresCatalog {
    #[tracing::instrument(skip_all)]
    async fn structure(&self, session: &mut dyn Session) -> Result<Vec<StructureSnapshot>> {
        let schemas: Vec<RawSchema> = from_rows(&fetch_rows(session, &schemas_query()).await?)?;
        let tables: Vec<RawTable> = from_rows(&fetch_rows(session, &tables_query()).await?)?;
        let triggers: Vec<RawTrigger> = from_rows(&fetch_rows(session, &triggers_query()).await?)?;
        let routines: Vec<RawRoutine> = from_rows(&fetch_rows(session, &routines_query()).await?)?;

        let snapshots = assemble(schemas, tables, triggers, routines);
        tracing::debug!(schemas = snapshots.len(), "structure loaded");
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
        let raw: Vec<RawIndex> = from_rows(&fetch_rows(session, &indexes_query(schema, table)).await?)?;
        Ok(raw.into_iter().map(map_index).collect())
    }

    async fn key_usage(
        &self,
        session: &mut dyn Session,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKeyMeta>> {
        let raw: Vec<RawKeyUsage> =
            from_rows(&fetch_rows(session, &key_usage_query(schema, table)).await?)?;
        Ok(raw.into_iter().map(map_key_usage).collect())
    }

    async fn users(&self, session: &mut dyn Session) -> Result<Vec<UserEntry>> {
        let sql = "SELECT rolname::text AS rolname FROM pg_catalog.pg_roles ORDER BY rolname";
        let raw: Vec<RawRole> = from_rows(&fetch_rows(session, sql).await?)?;
        Ok(raw
            .into_iter()
            .map(|r| UserEntry {
                name: r.rolname,
                host: None,
                password: None,
            })
            .collect())
    }

    async fn collations(&self, session: &mut dyn Session) -> Result<Vec<CollationEntry>> {
        let sql = "SELECT collname::text AS collname, pg_encoding_to_char(collencoding)::text AS charset, \
                   oid::bigint AS id, (collname = 'default') AS is_default \
                   FROM pg_catalog.pg_collation ORDER BY collname";
        let raw: Vec<RawCollation> = from_rows(&fetch_rows(session, sql).await?)?;
        Ok(raw
            .into_iter()
            .map(|c| CollationEntry {
                charset: c.charset,
                collation: c.collname,
                compiled: true,
                is_default: c.is_default,
                id: c.id,
                sort_len: None,
            })
            .collect())
    }

    async fn variables(&self, session: &mut dyn Session) -> Result<Vec<VariableEntry>> {
        let sql = QueryBuilder::new()
            .select(["name", "setting"])
            .schema("pg_catalog")
            .from("pg_settings")
            .order_by([("name", "ASC")])
            .render(&POSTGRESQL);
        let raw: Vec<RawSetting> = from_rows(&fetch_rows(session, &sql).await?)?;
        Ok(raw
            .into_iter()
            .map(|s| VariableEntry {
                name: s.name,
                value: s.setting,
            })
            .collect())
    }

    async fn engines(&self, _session: &mut dyn Session) -> Result<Vec<EngineEntry>> {
        Ok(Vec::new())
    }

    async fn view_information(
        &self,
        session: &mut dyn Session,
        schema: &str,
        view: &str,
    ) -> Result<Option<ViewInfo>> {
        let raw: Vec<RawView> = from_rows(&fetch_rows(session, &view_query(schema, view)).await?)?;
        Ok(raw.into_iter().next().map(map_view))
    }
}
