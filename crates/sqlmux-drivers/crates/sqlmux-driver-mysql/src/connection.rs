//! MySQL connection pool and sessions

use async_trait::async_trait;
use mysql_async::{
    Column, Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row as MySqlRow,
    consts::ColumnType, prelude::*,
};
use sqlmux_core::{
    Adapter, ConnectionParams, FieldMeta, Payload, RawOutcome, Result, Row, Session, SqlmuxError,
    Value, WriteReport, profile::MYSQL,
};
use tokio::sync::Mutex;

/// Pool of MySQL connections sized by `pool_size`
pub struct MySqlAdapter {
    pool: Mutex<Option<Pool>>,
}

impl MySqlAdapter {
    /// Open the pool and verify that one connection can be established
    #[tracing::instrument(skip(params), fields(host = %params.host, database = ?params.database))]
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let port = params.port.unwrap_or(MYSQL.default_port);
        tracing::info!(port = %port, "connecting to MySQL database");

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(params.host.as_str())
            .tcp_port(port);

        if let Some(db) = &params.database {
            opts_builder = opts_builder.db_name(Some(db.as_str()));
        }
        if let Some(user) = &params.user {
            opts_builder = opts_builder.user(Some(user.as_str()));
        }
        if let Some(password) = &params.password {
            opts_builder = opts_builder.pass(Some(password.as_str()));
        }
        if let Some(ssl_opts) = crate::build_ssl_opts(params)? {
            opts_builder = opts_builder.ssl_opts(Some(ssl_opts));
        }

        let size = params.effective_pool_size();
        let constraints = PoolConstraints::new(1, size).ok_or_else(|| {
            SqlmuxError::Configuration(format!(
                "Failed to configure MySQL pool constraints (min=1, max={})",
                size
            ))
        })?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        opts_builder = opts_builder.pool_opts(pool_opts);

        let pool = Pool::new(Opts::from(opts_builder));
        let conn = pool.get_conn().await.map_err(|e| {
            tracing::error!(error = %e, "failed to connect to MySQL database");
            SqlmuxError::Connection(format!(
                "Failed to connect to MySQL: {}",
                format_mysql_error(&e)
            ))
        })?;
        drop(conn);

        tracing::info!(pool_size = size, "MySQL connection established");
        Ok(Self {
            pool: Mutex::new(Some(pool)),
        })
    }
}

#[async_trait]
impl Adapter for MySqlAdapter {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let pool = self
            .pool
            .lock()
            .await
            .clone()
            .ok_or(SqlmuxError::NotConnected)?;
        let conn = pool.get_conn().await.map_err(|e| {
            SqlmuxError::Connection(format!(
                "Failed to get MySQL connection: {}",
                format_mysql_error(&e)
            ))
        })?;
        Ok(Box::new(MySqlSession { conn }))
    }

    async fn destroy(&self) -> Result<()> {
        let Some(pool) = self.pool.lock().await.take() else {
            return Ok(());
        };
        tracing::info!("closing MySQL connection pool");
        pool.disconnect().await.map_err(|e| {
            SqlmuxError::Connection(format!(
                "Failed to close MySQL connection: {}",
                format_mysql_error(&e)
            ))
        })
    }
}

/// One pooled connection; returned to the pool on drop
pub struct MySqlSession {
    conn: Conn,
}

#[async_trait]
impl Session for MySqlSession {
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run(&mut self, sql: &str, nest: bool) -> Result<RawOutcome> {
        let mut result = self.conn.query_iter(sql).await.map_err(query_error)?;
        let columns: Vec<Column> = result.columns_ref().to_vec();

        if columns.is_empty() {
            let info = result.info().into_owned();
            let report = WriteReport {
                affected_rows: result.affected_rows(),
                last_insert_id: result.last_insert_id(),
                info: Some(info).filter(|s| !s.is_empty()),
                warnings: result.warnings(),
            };
            result.drop_result().await.map_err(query_error)?;
            tracing::debug!(affected_rows = report.affected_rows, "statement executed");
            return Ok(RawOutcome {
                payload: Payload::Report(report),
                fields: Vec::new(),
            });
        }

        let mysql_rows: Vec<MySqlRow> = result.collect().await.map_err(query_error)?;
        result.drop_result().await.map_err(query_error)?;

        let fields: Vec<FieldMeta> = columns.iter().map(field_meta).collect();
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
        let column_types: Vec<ColumnType> = columns.iter().map(Column::column_type).collect();

        let rows: Vec<Row> = mysql_rows
            .into_iter()
            .map(|mysql_row| {
                let values = column_types
                    .iter()
                    .enumerate()
                    .map(|(idx, col_type)| {
                        let mysql_val: mysql_async::Value =
                            mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                        mysql_value_to_value(mysql_val, *col_type)
                    })
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

fn field_meta(col: &Column) -> FieldMeta {
    FieldMeta {
        name: col.name_str().into_owned(),
        org_name: col.org_name_str().into_owned(),
        schema: col.schema_str().into_owned(),
        table: col.table_str().into_owned(),
        org_table: col.org_table_str().into_owned(),
        type_name: format!("{:?}", col.column_type()),
        ..Default::default()
    }
}

/// Server errors carry a code and SQLSTATE worth showing to the user
pub(crate) fn format_mysql_error(err: &mysql_async::Error) -> String {
    match err {
        mysql_async::Error::Server(server) => {
            format!("{} ({}): {}", server.code, server.state, server.message)
        }
        other => other.to_string(),
    }
}

/// Engine rejections become `Query`; a broken transport is a `Connection` failure
fn query_error(err: mysql_async::Error) -> SqlmuxError {
    match err {
        mysql_async::Error::Io(_) => SqlmuxError::Connection(format_mysql_error(&err)),
        other => SqlmuxError::Query(format_mysql_error(&other)),
    }
}

/// Convert mysql_async Value to our Value type, using column type metadata
/// to interpret byte strings from the text protocol.
pub(crate) fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_LONGLONG => match s.parse::<i64>() {
                    Ok(v) => Value::Int64(v),
                    Err(_) => s.parse::<u64>().map(Value::UInt64).unwrap_or(Value::String(s)),
                },
                ColumnType::MYSQL_TYPE_FLOAT => {
                    s.parse::<f32>().map(Value::Float32).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => Value::UInt64(u),
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                date.map(Value::Date).unwrap_or_else(|| {
                    Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
                })
            } else {
                date.and_then(|d| d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro))
                    .map(Value::DateTime)
                    .unwrap_or_else(|| {
                        Value::String(format!(
                            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                            year, month, day, hour, min, sec
                        ))
                    })
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}
