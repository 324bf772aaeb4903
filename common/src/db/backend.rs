use crate::db::result::QueryResult;
use crate::error::{Nl2SqlError, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue};
use sqlx::{Column, ColumnIndex, Decode, Executor, Row, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// a database that can run one sql statement and materialize its rows
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn fetch(&self, sql: &str) -> std::result::Result<QueryResult, sqlx::Error>;

    fn name(&self) -> &str;
}

pub struct MySqlBackend {
    pool: MySqlPool,
}

impl MySqlBackend {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryBackend for MySqlBackend {
    async fn fetch(&self, sql: &str) -> std::result::Result<QueryResult, sqlx::Error> {
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        let columns = match rows.first() {
            Some(row) => column_names(row),
            None => prepared_columns(&self.pool, sql).await,
        };

        let rows = rows
            .iter()
            .map(|row| (0..row.len()).map(|idx| mysql_value(row, idx)).collect())
            .collect();

        Ok(QueryResult::new(columns, rows))
    }

    fn name(&self) -> &str {
        "mysql"
    }
}

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryBackend for SqliteBackend {
    async fn fetch(&self, sql: &str) -> std::result::Result<QueryResult, sqlx::Error> {
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        let columns = match rows.first() {
            Some(row) => column_names(row),
            None => prepared_columns(&self.pool, sql).await,
        };

        let rows = rows
            .iter()
            .map(|row| (0..row.len()).map(|idx| sqlite_value(row, idx)).collect())
            .collect();

        Ok(QueryResult::new(columns, rows))
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// open a pool for `url` (`mysql://`, `mariadb://` or `sqlite:`)
#[tracing::instrument(skip(url))]
pub async fn connect(url: &str, max_connections: Option<u32>) -> Result<Arc<dyn QueryBackend>> {
    let max_connections = max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);

    if url.starts_with("mysql:") || url.starts_with("mariadb:") {
        let options = MySqlConnectOptions::from_str(url)?;
        return connect_mysql(options, Some(max_connections)).await;
    }

    if url.starts_with("sqlite:") {
        let options = SqlitePoolOptions::new();
        // every in-memory connection is its own database
        let options = if url.contains(":memory:") || url.contains("mode=memory") {
            options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(max_connections)
        };
        let pool = options.connect(url).await?;
        tracing::info!("connected to sqlite");
        return Ok(Arc::new(SqliteBackend::new(pool)));
    }

    Err(Nl2SqlError::Config(format!(
        "unsupported database url scheme in '{}'",
        redact_url(url)
    )))
}

pub async fn connect_mysql(
    options: MySqlConnectOptions,
    max_connections: Option<u32>,
) -> Result<Arc<dyn QueryBackend>> {
    let max_connections = max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!(max_connections, "connected to mysql");
    Ok(Arc::new(MySqlBackend::new(pool)))
}

/// strip credentials before a url reaches logs or errors
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// column metadata for statements that returned no rows
async fn prepared_columns<'e, E>(executor: E, sql: &'e str) -> Vec<String>
where
    E: Executor<'e>,
{
    match executor.prepare(sql).await {
        Ok(statement) => statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            tracing::debug!("no column metadata: {}", e);
            Vec::new()
        }
    }
}

fn decode<'r, R, T>(row: &'r R, idx: usize, into: impl FnOnce(T) -> Value) -> std::result::Result<Value, sqlx::Error>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database>,
{
    Ok(row
        .try_get_unchecked::<Option<T>, _>(idx)?
        .map_or(Value::Null, into))
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::String(String::from_utf8_lossy(&bytes).into_owned())
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}

fn mysql_value(row: &MySqlRow, idx: usize) -> Value {
    let type_name = row.column(idx).type_info().name().to_ascii_uppercase();

    let decoded = match type_name.as_str() {
        "NULL" => Ok(Value::Null),
        "BOOLEAN" => decode(row, idx, |b: bool| Value::Bool(b)),
        t if t.contains("INT") && t.ends_with("UNSIGNED") => decode(row, idx, |n: u64| Value::from(n)),
        t if t.contains("INT") => decode(row, idx, |n: i64| Value::from(n)),
        "FLOAT" | "DOUBLE" => decode(row, idx, float_value),
        "DECIMAL" => decode(row, idx, |d: Decimal| Value::String(d.to_string())),
        "DATE" => decode(row, idx, |d: NaiveDate| Value::String(d.to_string())),
        "DATETIME" => decode(row, idx, |d: NaiveDateTime| Value::String(d.to_string())),
        "TIMESTAMP" => decode(row, idx, |d: DateTime<Utc>| Value::String(d.to_rfc3339())),
        "TIME" => decode(row, idx, |t: NaiveTime| Value::String(t.to_string())),
        "JSON" => decode(row, idx, |v: JsonValue| v),
        t if t.contains("BLOB") || t.contains("BINARY") || t == "BIT" || t == "GEOMETRY" => {
            decode(row, idx, bytes_value)
        }
        _ => decode(row, idx, Value::String),
    };

    decoded
        .or_else(|_| decode(row, idx, Value::String))
        .unwrap_or_else(|e| {
            tracing::debug!(column = idx, type_name = %type_name, "undecodable value: {}", e);
            Value::String(format!("<{}>", type_name))
        })
}

fn sqlite_value(row: &SqliteRow, idx: usize) -> Value {
    // storage class of the value itself, declared types are only hints in sqlite
    let type_name = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(e) => {
            tracing::debug!(column = idx, "undecodable value: {}", e);
            return Value::Null;
        }
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => decode(row, idx, |n: i64| Value::from(n)),
        "REAL" | "NUMERIC" => decode(row, idx, float_value),
        "BLOB" => decode(row, idx, bytes_value),
        _ => decode(row, idx, Value::String),
    };

    decoded.unwrap_or_else(|_| Value::String(format!("<{}>", type_name)))
}
