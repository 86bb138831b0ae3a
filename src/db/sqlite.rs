//! SQLite database client implementation.

use crate::config::ConnectionConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value,
    SAMPLE_ROWS,
};
use crate::error::{DbChatError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the database file named by `config.database`. The file must exist.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string();
        debug!("Opening SQLite database {}", config.database);

        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| DbChatError::connection(format!("Invalid SQLite path: {e}")))?;

        // In-memory databases live per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                DbChatError::connection(format!(
                    "Cannot open SQLite database '{}': {}",
                    config.database, e
                ))
            })?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let table_names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbChatError::query(format!("Failed to fetch tables: {e}")))?;

        let mut schema = Schema::new();

        for name in table_names {
            let (columns, primary_key) = self.fetch_columns(&name).await?;
            schema
                .foreign_keys
                .extend(self.fetch_foreign_keys(&name).await?);
            let sample_rows = self.fetch_sample_rows(&name).await;

            schema.tables.push(Table {
                name,
                columns,
                primary_key,
                sample_rows,
            });
        }

        Ok(schema)
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
        .map_err(|e| match e.as_database_error() {
            Some(db_error) => DbChatError::query(db_error.message().to_string()),
            None => DbChatError::query(e.to_string()),
        })?;

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

        let converted: Vec<Row> = rows.iter().map(convert_row).collect();
        Ok(QueryResult::with_data(columns, converted).with_execution_time(start.elapsed()))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteClient {
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DbChatError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut pk: Vec<(i64, String)> = rows
            .iter()
            .filter(|(.., pk)| *pk > 0)
            .map(|(name, .., pk)| (*pk, name.clone()))
            .collect();
        pk.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| Column {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok((columns, pk.into_iter().map(|(_, name)| name).collect()))
    }

    async fn fetch_foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT id, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DbChatError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
        })?;

        let mut keys: Vec<(i64, ForeignKey)> = Vec::new();
        for (id, to_table, from_column, to_column) in rows {
            let index = match keys.iter().position(|(key_id, _)| *key_id == id) {
                Some(index) => index,
                None => {
                    keys.push((id, ForeignKey::new(table_name, vec![], to_table, vec![])));
                    keys.len() - 1
                }
            };
            let fk = &mut keys[index].1;
            fk.from_columns.push(from_column);
            fk.to_columns.extend(to_column);
        }

        Ok(keys.into_iter().map(|(_, fk)| fk).collect())
    }

    async fn fetch_sample_rows(&self, table_name: &str) -> Vec<Row> {
        let sql = format!(
            "SELECT * FROM \"{}\" LIMIT {SAMPLE_ROWS}",
            table_name.replace('"', "\"\"")
        );
        match sqlx::query(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows.iter().map(convert_row).collect(),
            Err(e) => {
                warn!("Failed to fetch sample rows for {}: {}", table_name, e);
                Vec::new()
            }
        }
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts by the value's storage class, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(Value::Int).ok(),
        "REAL" => row.try_get::<f64, _>(index).map(Value::Float).ok(),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes).ok(),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .ok(),
    }
    .unwrap_or(Value::Null)
}
