//! PostgreSQL connection pool and sessions

use async_trait::async_trait;
use deadpool::unmanaged::{Object, Pool};
use postgres_types::{FromSql, Kind, Type};
use sqlmux_core::profile::POSTGRESQL;
use sqlmux_core::{
    Adapter, ConnectionParams, FieldMeta, Payload, RawOutcome, Result, Row, Session, SqlmuxError,
    Value, WriteReport,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio_postgres::{Client, Column, NoTls, Row as PgRow};

use crate::tls::{build_tls_connector, pg_ssl_mode};

/// Render a server error with its SQLSTATE, detail and hint
pub(crate) fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = format!("{} (SQLSTATE {})", db_error.message(), db_error.code().code());
    if let Some(detail) = db_error.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" detail: {}", detail));
    }
    if let Some(hint) = db_error.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" hint: {}", hint));
    }
    message
}

fn query_error(error: tokio_postgres::Error) -> SqlmuxError {
    if error.is_closed() {
        SqlmuxError::Connection(format_postgres_error(&error))
    } else {
        SqlmuxError::Query(format_postgres_error(&error))
    }
}

/// Fixed-size pool of tokio-postgres clients
pub struct PostgresAdapter {
    pool: Mutex<Option<Pool<Client>>>,
}

impl PostgresAdapter {
    /// Open `pool_size` connections; any failure aborts the whole connect
    #[tracing::instrument(skip(params), fields(host = %params.host, database = ?params.database))]
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let port = params.port.unwrap_or(POSTGRESQL.default_port);
        let database = params
            .database
            .as_deref()
            .or(POSTGRESQL.default_database)
            .unwrap_or("postgres");
        tracing::info!(port = %port, ssl_mode = ?params.ssl_mode, "connecting to PostgreSQL database");

        let mut config = tokio_postgres::Config::new();
        config
            .host(&params.host)
            .port(port)
            .dbname(database)
            .ssl_mode(pg_ssl_mode(params.ssl_mode));
        if let Some(user) = &params.user {
            config.user(user);
        }
        if let Some(password) = &params.password {
            config.password(password);
        }

        let tls = build_tls_connector(params)?;
        let size = params.effective_pool_size();
        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            clients.push(open_client(&config, tls.clone()).await?);
        }

        tracing::info!(pool_size = size, "PostgreSQL connection established");
        Ok(Self {
            pool: Mutex::new(Some(Pool::from(clients))),
        })
    }
}

async fn open_client(
    config: &tokio_postgres::Config,
    tls: Option<postgres_native_tls::MakeTlsConnector>,
) -> Result<Client> {
    let connect_error = |e: tokio_postgres::Error| {
        tracing::error!(error = %e, "failed to connect to PostgreSQL database");
        SqlmuxError::Connection(format!(
            "Failed to connect to PostgreSQL: {}",
            format_postgres_error(&e)
        ))
    };

    let client = match tls {
        Some(tls) => {
            let (client, connection) = config.connect(tls).await.map_err(connect_error)?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            client
        }
        None => {
            let (client, connection) = config.connect(NoTls).await.map_err(connect_error)?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            client
        }
    };
    Ok(client)
}

#[async_trait]
impl Adapter for PostgresAdapter {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let pool = self
            .pool
            .lock()
            .await
            .clone()
            .ok_or(SqlmuxError::NotConnected)?;
        let client = pool.get().await.map_err(|e| {
            SqlmuxError::Connection(format!("Failed to get PostgreSQL connection: {}", e))
        })?;
        Ok(Box::new(PostgresSession::new(client)))
    }

    async fn destroy(&self) -> Result<()> {
        let Some(pool) = self.pool.lock().await.take() else {
            return Ok(());
        };
        tracing::info!("closing PostgreSQL connection pool");
        pool.close();
        Ok(())
    }
}

/// Schema, table and column names behind one relation oid
#[derive(Debug, Clone, Default)]
struct Relation {
    schema: String,
    table: String,
    columns: HashMap<i16, String>,
}

/// One pooled client plus the relation names it has resolved so far
pub struct PostgresSession {
    client: Object<Client>,
    relations: HashMap<u32, Relation>,
}

impl PostgresSession {
    fn new(client: Object<Client>) -> Self {
        Self {
            client,
            relations: HashMap::new(),
        }
    }

    /// Resolve the oids in `columns` that are not cached yet
    async fn resolve_relations(&mut self, columns: &[Column]) {
        let mut missing: Vec<u32> = columns
            .iter()
            .filter_map(Column::table_oid)
            .filter(|oid| *oid != 0 && !self.relations.contains_key(oid))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if missing.is_empty() {
            return;
        }

        let oids = missing
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT c.oid, n.nspname, c.relname, a.attnum, a.attname \
             FROM pg_class c \
             JOIN pg_namespace n ON n.oid = c.relnamespace \
             JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum > 0 \
             WHERE c.oid IN ({})",
            oids
        );

        let rows = match self.client.query(sql.as_str(), &[]).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %format_postgres_error(&e), "failed to resolve result column origins");
                return;
            }
        };

        for row in rows {
            let (Ok(oid), Ok(schema), Ok(table), Ok(attnum), Ok(attname)) = (
                row.try_get::<_, u32>(0),
                row.try_get::<_, String>(1),
                row.try_get::<_, String>(2),
                row.try_get::<_, i16>(3),
                row.try_get::<_, String>(4),
            ) else {
                continue;
            };
            let relation = self.relations.entry(oid).or_insert_with(|| Relation {
                schema,
                table,
                columns: HashMap::new(),
            });
            relation.columns.insert(attnum, attname);
        }
    }

    fn field_meta(&self, column: &Column) -> FieldMeta {
        let mut field = FieldMeta {
            name: column.name().to_string(),
            type_name: column.type_().name().to_uppercase(),
            ..Default::default()
        };
        let relation = column.table_oid().and_then(|oid| self.relations.get(&oid));
        if let Some(relation) = relation {
            field.schema = relation.schema.clone();
            field.table = relation.table.clone();
            field.org_table = relation.table.clone();
            field.org_name = column
                .column_id()
                .and_then(|id| relation.columns.get(&id).cloned())
                .unwrap_or_default();
        }
        field
    }
}

#[async_trait]
impl Session for PostgresSession {
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run(&mut self, sql: &str, nest: bool) -> Result<RawOutcome> {
        let statement = self.client.prepare(sql).await.map_err(query_error)?;

        if statement.columns().is_empty() {
            let affected_rows = self
                .client
                .execute(&statement, &[])
                .await
                .map_err(query_error)?;
            tracing::debug!(affected_rows, "statement executed");
            return Ok(RawOutcome {
                payload: Payload::Report(WriteReport {
                    affected_rows,
                    ..Default::default()
                }),
                fields: Vec::new(),
            });
        }

        let pg_rows = self
            .client
            .query(&statement, &[])
            .await
            .map_err(query_error)?;

        self.resolve_relations(statement.columns()).await;
        let fields: Vec<FieldMeta> = statement
            .columns()
            .iter()
            .map(|c| self.field_meta(c))
            .collect();
        let column_names: Vec<String> = fields
            .iter()
            .map(|f| {
                if nest && !f.table.is_empty() {
                    format!("{}.{}", f.table, f.name)
                } else {
                    f.name.clone()
                }
            })
            .collect();

        let rows: Vec<Row> = pg_rows
            .iter()
            .map(|pg_row| {
                let values = (0..column_names.len())
                    .map(|idx| postgres_to_value(pg_row, idx))
                    .collect();
                Row::new(column_names.clone(), values)
            })
            .collect();

        tracing::debug!(row_count = rows.len(), "query executed successfully");
        Ok(RawOutcome {
            payload: Payload::Rows(rows),
            fields,
        })
    }
}

/// NUMERIC rendered as exact decimal text
#[derive(Debug)]
struct PgNumeric(String);

impl PgNumeric {
    /// Decode the binary NUMERIC wire format: digit count, weight, sign,
    /// display scale, then base-10000 digit groups.
    fn decode(raw: &[u8]) -> std::result::Result<String, Box<dyn std::error::Error + Sync + Send>> {
        if raw.len() < 8 {
            return Err("NUMERIC payload too short".into());
        }
        let word = |at: usize| u16::from_be_bytes([raw[at], raw[at + 1]]);
        let ndigits = usize::from(word(0));
        let weight = i16::from_be_bytes([raw[2], raw[3]]);
        let sign = word(4);
        let scale = usize::from(word(6));

        if sign == 0xC000 {
            return Ok("NaN".to_string());
        }
        if raw.len() < 8 + ndigits * 2 {
            return Err("NUMERIC payload truncated".into());
        }
        let groups: Vec<u16> = (0..ndigits).map(|i| word(8 + i * 2)).collect();

        let int_groups = if weight >= 0 { weight as usize + 1 } else { 0 };
        let mut integer = String::new();
        for i in 0..int_groups {
            let group = groups.get(i).copied().unwrap_or(0);
            if integer.is_empty() {
                integer.push_str(&group.to_string());
            } else {
                integer.push_str(&format!("{group:04}"));
            }
        }
        if integer.is_empty() {
            integer.push('0');
        }

        let mut fraction = String::new();
        if weight < -1 {
            fraction.push_str(&"0000".repeat((-1 - weight) as usize));
        }
        for group in groups.iter().skip(int_groups) {
            fraction.push_str(&format!("{group:04}"));
        }
        if fraction.len() < scale {
            fraction.push_str(&"0".repeat(scale - fraction.len()));
        }
        fraction.truncate(scale);

        let negative = sign == 0x4000;
        Ok(match (negative, fraction.is_empty()) {
            (true, true) => format!("-{}", integer),
            (true, false) => format!("-{}.{}", integer, fraction),
            (false, true) => integer,
            (false, false) => format!("{}.{}", integer, fraction),
        })
    }
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(Self::decode(raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Whether the binary wire form of `ty` is its UTF-8 text
fn is_textual(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Enum(_) => true,
        Kind::Domain(inner) => is_textual(inner),
        _ => matches!(ty.name(), "citext" | "xml" | "unknown"),
    }
}

/// Cell of a type without a dedicated mapping
#[derive(Debug)]
struct PgFallback(Value);

impl PgFallback {
    fn decode(ty: &Type, raw: &[u8]) -> Value {
        if is_textual(ty) {
            if let Ok(text) = std::str::from_utf8(raw) {
                return Value::String(text.to_string());
            }
        }
        Value::Bytes(raw.to_vec())
    }
}

impl<'a> FromSql<'a> for PgFallback {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Self(Self::decode(ty, raw)))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Option<T> {
    row.try_get::<_, Option<T>>(idx).ok().flatten()
}

/// Convert one cell, falling back to NULL when the type cannot be decoded
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Value {
    let value = match row.columns()[idx].type_().name() {
        "bool" => get(row, idx).map(Value::Bool),
        "int2" => get(row, idx).map(Value::Int16),
        "int4" => get(row, idx).map(Value::Int32),
        "int8" => get(row, idx).map(Value::Int64),
        "oid" => get::<u32>(row, idx).map(|v| Value::Int64(i64::from(v))),
        "float4" => get(row, idx).map(Value::Float32),
        "float8" => get(row, idx).map(Value::Float64),
        "numeric" => get::<PgNumeric>(row, idx).map(|n| Value::Decimal(n.0)),
        "text" | "varchar" | "bpchar" | "name" | "char" => get(row, idx).map(Value::String),
        "bytea" => get(row, idx).map(Value::Bytes),
        "uuid" => get(row, idx).map(Value::Uuid),
        "json" | "jsonb" => get(row, idx).map(Value::Json),
        "date" => get(row, idx).map(Value::Date),
        "time" => get(row, idx).map(Value::Time),
        "timestamp" => get(row, idx).map(Value::DateTime),
        "timestamptz" => get(row, idx).map(Value::DateTimeUtc),
        "_text" | "_varchar" | "_name" => get::<Vec<String>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        "_int2" => get::<Vec<i16>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::Int16).collect())),
        "_int4" => get::<Vec<i32>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::Int32).collect())),
        "_int8" => get::<Vec<i64>>(row, idx)
            .map(|items| Value::Array(items.into_iter().map(Value::Int64).collect())),
        _ => get::<PgFallback>(row, idx).map(|v| v.0),
    };
    value.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: u16, weight: i16, sign: u16, scale: u16, groups: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&scale.to_be_bytes());
        for group in groups {
            raw.extend_from_slice(&group.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_numeric_with_fraction() {
        // 12345.678 = [1, 2345, 6780] with weight 1
        let raw = numeric(3, 1, 0x0000, 3, &[1, 2345, 6780]);
        assert_eq!(PgNumeric::decode(&raw).unwrap(), "12345.678");
    }

    #[test]
    fn test_negative_small_numeric() {
        // -0.00012 = [1, 2000] with weight -1
        let raw = numeric(2, -1, 0x4000, 5, &[1, 2000]);
        assert_eq!(PgNumeric::decode(&raw).unwrap(), "-0.00012");
    }

    #[test]
    fn test_numeric_leading_fraction_zeros() {
        // 0.00005 = [5000] with weight -2
        let raw = numeric(1, -2, 0x0000, 5, &[5000]);
        assert_eq!(PgNumeric::decode(&raw).unwrap(), "0.00005");
    }

    #[test]
    fn test_numeric_zero_and_nan() {
        assert_eq!(PgNumeric::decode(&numeric(0, 0, 0, 0, &[])).unwrap(), "0");
        assert_eq!(PgNumeric::decode(&numeric(0, 0, 0xC000, 0, &[])).unwrap(), "NaN");
        assert!(PgNumeric::decode(&[0, 1]).is_err());
    }

    #[test]
    fn test_integer_numeric_keeps_trailing_group_zeros() {
        // 10000 = [1, 0] with weight 1
        let raw = numeric(2, 1, 0, 0, &[1, 0]);
        assert_eq!(PgNumeric::decode(&raw).unwrap(), "10000");
        // 20000000 = [2000] stored with weight 1 and trailing group omitted
        let raw = numeric(1, 1, 0, 0, &[2000]);
        assert_eq!(PgNumeric::decode(&raw).unwrap(), "20000000");
    }

    #[test]
    fn test_unmapped_binary_type_stays_bytes() {
        // interval '1 day': microseconds, days, months
        let mut raw = Vec::new();
        raw.extend_from_slice(&0i64.to_be_bytes());
        raw.extend_from_slice(&1i32.to_be_bytes());
        raw.extend_from_slice(&0i32.to_be_bytes());

        assert_eq!(PgFallback::decode(&Type::INTERVAL, &raw), Value::Bytes(raw.clone()));
    }

    #[test]
    fn test_textual_fallbacks_decode_as_text() {
        let mood = Type::new(
            "mood".into(),
            90_001,
            Kind::Enum(vec!["happy".into(), "sad".into()]),
            "public".into(),
        );
        assert_eq!(PgFallback::decode(&mood, b"happy"), Value::String("happy".into()));

        let email = Type::new(
            "email".into(),
            90_002,
            Kind::Domain(Type::new("citext".into(), 90_003, Kind::Simple, "public".into())),
            "public".into(),
        );
        assert_eq!(PgFallback::decode(&email, b"a@b.c"), Value::String("a@b.c".into()));
    }
}
