//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient`
//! trait for MySQL/MariaDB using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value,
    SAMPLE_ROWS,
};
use crate::error::{DbChatError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Decode, Row as SqlxRow, Type, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Time allowed for the initial connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

const MAX_CONNECTIONS: u32 = 5;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Opens a pool for the given settings. One attempt, no retry.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string();
        debug!("Connecting to MySQL at {}", config.display_string());

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            DbChatError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| DbChatError::query(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = rows
            .first()
            .map(|first| {
                first
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        if rows.len() > crate::db::MAX_ROWS {
            warn!(
                "Query returned {} rows, truncating to {}",
                rows.len(),
                crate::db::MAX_ROWS
            );
        }

        let converted: Vec<Row> = rows.iter().map(convert_row).collect();
        Ok(QueryResult::with_data(columns, converted).with_execution_time(start.elapsed()))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl MySqlClient {
    /// Fetches all base tables of the current database.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(table_name AS CHAR)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbChatError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let (columns, primary_key) = self.fetch_columns(&table_name).await?;
            let sample_rows = self.fetch_sample_rows(&table_name).await;

            tables.push(Table {
                name: table_name,
                columns,
                primary_key,
                sample_rows,
            });
        }

        Ok(tables)
    }

    /// Fetches columns and primary key columns for a table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(column_name AS CHAR),
                CAST(column_type AS CHAR),
                CAST(is_nullable AS CHAR),
                CAST(column_default AS CHAR),
                CAST(column_key AS CHAR)
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DbChatError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let primary_key = rows
            .iter()
            .filter(|(_, _, _, _, key)| key == "PRI")
            .map(|(name, ..)| name.clone())
            .collect();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default, _)| Column {
                name,
                data_type: data_type.to_uppercase(),
                is_nullable: is_nullable == "YES",
                default,
            })
            .collect();

        Ok((columns, primary_key))
    }

    /// Fetches up to SAMPLE_ROWS rows. Failures only cost the samples.
    async fn fetch_sample_rows(&self, table_name: &str) -> Vec<Row> {
        let sql = format!(
            "SELECT * FROM `{}` LIMIT {SAMPLE_ROWS}",
            table_name.replace('`', "``")
        );
        match sqlx::query(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows.iter().map(convert_row).collect(),
            Err(e) => {
                warn!("Failed to fetch sample rows for {}: {}", table_name, e);
                Vec::new()
            }
        }
    }

    /// Fetches all foreign keys of the current database, grouped by constraint.
    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(constraint_name AS CHAR),
                CAST(table_name AS CHAR),
                CAST(column_name AS CHAR),
                CAST(referenced_table_name AS CHAR),
                CAST(referenced_column_name AS CHAR)
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE() AND referenced_table_name IS NOT NULL
            ORDER BY table_name, constraint_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbChatError::query(format!("Failed to fetch foreign keys: {e}")))?;

        let mut fk_map: BTreeMap<(String, String), ForeignKey> = BTreeMap::new();

        for (constraint, from_table, from_column, to_table, to_column) in rows {
            let fk = fk_map
                .entry((from_table.clone(), constraint))
                .or_insert_with(|| ForeignKey::new(from_table, vec![], to_table, vec![]));
            fk.from_columns.push(from_column);
            fk.to_columns.push(to_column);
        }

        Ok(fk_map.into_values().collect())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

fn decode<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

/// Reads the raw bytes as text. Used for DECIMAL, JSON, ENUM and anything
/// the typed decoders reject.
fn text(row: &MySqlRow, index: usize) -> Option<Value> {
    row.try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .flatten()
        .map(Value::String)
}

fn unsigned(v: u64) -> Value {
    i64::try_from(v)
        .map(Value::Int)
        .unwrap_or_else(|_| Value::String(v.to_string()))
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let value = match type_name.as_str() {
        "BOOLEAN" => decode::<bool>(row, index).map(Value::Bool),
        "TINYINT" => decode::<i8>(row, index).map(|v| Value::Int(v.into())),
        "SMALLINT" => decode::<i16>(row, index).map(|v| Value::Int(v.into())),
        "INT" | "MEDIUMINT" => decode::<i32>(row, index).map(|v| Value::Int(v.into())),
        "BIGINT" => decode::<i64>(row, index).map(Value::Int),
        "TINYINT UNSIGNED" => decode::<u8>(row, index).map(|v| unsigned(v.into())),
        "SMALLINT UNSIGNED" | "YEAR" => row
            .try_get_unchecked::<Option<u16>, _>(index)
            .ok()
            .flatten()
            .map(|v| unsigned(v.into())),
        "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => {
            decode::<u32>(row, index).map(|v| unsigned(v.into()))
        }
        "BIGINT UNSIGNED" => decode::<u64>(row, index).map(unsigned),
        "FLOAT" => decode::<f32>(row, index).map(|v| Value::Float(v.into())),
        "DOUBLE" => decode::<f64>(row, index).map(Value::Float),
        "DATE" => decode::<chrono::NaiveDate>(row, index).map(|v| Value::String(v.to_string())),
        "TIME" => decode::<chrono::NaiveTime>(row, index).map(|v| Value::String(v.to_string())),
        "DATETIME" => {
            decode::<chrono::NaiveDateTime>(row, index).map(|v| Value::String(v.to_string()))
        }
        "TIMESTAMP" => decode::<chrono::DateTime<chrono::Utc>>(row, index)
            .map(|v| Value::String(v.naive_utc().to_string())),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => decode::<Vec<u8>>(row, index).map(Value::Bytes),
        _ => None,
    };

    value.or_else(|| text(row, index)).unwrap_or(Value::Null)
}

/// Maps sqlx connection errors to user-facing messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> DbChatError {
    let host = &config.host;
    let port = &config.port;

    if matches!(error, sqlx::Error::PoolTimedOut) {
        return DbChatError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ));
    }

    if let sqlx::Error::Configuration(e) = &error {
        return DbChatError::connection(format!("Invalid connection settings: {e}"));
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused")
        || error_str.contains("error communicating")
        || error_str.contains("failed to lookup address")
    {
        DbChatError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        DbChatError::connection(format!(
            "Access denied for user '{}'. Check your credentials.",
            config.user
        ))
    } else if error_str.contains("unknown database") {
        DbChatError::connection(format!("Database '{}' does not exist.", config.database))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        DbChatError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        DbChatError::connection(error.to_string())
    }
}

/// Formats a query error, keeping the server's SQLSTATE when present.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.code() {
            Some(code) => format!("ERROR {}: {}", code, db_error.message()),
            None => format!("ERROR: {}", db_error.message()),
        },
        None => error.to_string(),
    }
}
