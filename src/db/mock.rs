//! Mock database clients for testing.
//!
//! Provides an in-memory music catalogue for headless runs and a failing
//! client for exercising error paths.

use super::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Schema, Table, Value,
};
use crate::error::{DbChatError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A mock database client backed by a fixed schema.
///
/// Each table's sample rows double as its full contents, so
/// `SELECT * FROM t` and `SELECT COUNT(*) FROM t` answer from them.
pub struct MockDatabaseClient {
    schema: Schema,
    results: Vec<(String, QueryResult)>,
}

impl MockDatabaseClient {
    /// Creates a mock client with the demo music schema.
    pub fn new() -> Self {
        Self::with_schema(demo_schema())
    }

    /// Creates a mock client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            results: Vec::new(),
        }
    }

    /// Returns `result` for any statement containing `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.results.push((pattern.into().to_lowercase(), result));
        self
    }

    fn canned(&self, sql: &str) -> Option<QueryResult> {
        let sql_lower = sql.to_lowercase();
        self.results
            .iter()
            .find(|(pattern, _)| sql_lower.contains(pattern))
            .map(|(_, result)| result.clone())
    }

    /// Answers `SELECT * FROM t` and `SELECT COUNT(*) FROM t` from sample rows.
    fn from_table(&self, sql: &str) -> Option<QueryResult> {
        let tokens: Vec<&str> = sql.split_whitespace().collect();
        let from = tokens.iter().position(|t| t.eq_ignore_ascii_case("FROM"))?;
        let name = tokens
            .get(from + 1)?
            .trim_matches(|c: char| c == '`' || c == '"' || c == ';');
        let table = self.schema.table(name)?;
        let projection = tokens[1..from].join(" ").to_uppercase();

        if projection == "COUNT(*)" {
            return Some(QueryResult::with_data(
                vec![ColumnInfo::new("COUNT(*)", "BIGINT")],
                vec![vec![Value::Int(table.sample_rows.len() as i64)]],
            ));
        }

        if projection == "*" {
            let columns = table
                .columns
                .iter()
                .map(|c| ColumnInfo::new(&c.name, &c.data_type))
                .collect();
            return Some(QueryResult::with_data(columns, table.sample_rows.clone()));
        }

        None
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Some(result) = self.canned(sql) {
            return Ok(result);
        }

        let sql_upper = sql.trim().to_uppercase();

        let result = if sql_upper.starts_with("SELECT") {
            self.from_table(sql).unwrap_or_else(|| {
                QueryResult::with_data(
                    vec![ColumnInfo::new("result", "TEXT")],
                    vec![vec![Value::String(format!("Mock result for: {sql}"))]],
                )
            })
        } else {
            QueryResult::with_data(vec![], vec![])
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose operations fail.
pub struct FailingDatabaseClient {
    inner: MockDatabaseClient,
    fail_schema: bool,
}

impl FailingDatabaseClient {
    /// Schema introspection works; every statement fails.
    pub fn on_query() -> Self {
        Self {
            inner: MockDatabaseClient::new(),
            fail_schema: false,
        }
    }

    /// Schema introspection fails.
    pub fn on_schema() -> Self {
        Self {
            inner: MockDatabaseClient::new(),
            fail_schema: true,
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        if self.fail_schema {
            return Err(DbChatError::query("Lost connection to server during query"));
        }
        self.inner.introspect_schema().await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        Err(DbChatError::query(format!(
            "ERROR 42S02: Table referenced in '{sql}' doesn't exist"
        )))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A small slice of the Chinook music catalogue.
fn demo_schema() -> Schema {
    let mut artist = Table::new("Artist")
        .column(Column::new("ArtistId", "INT").nullable(false))
        .column(Column::new("Name", "VARCHAR(120)"))
        .primary_key(&["ArtistId"]);
    artist.sample_rows = vec![
        vec![Value::Int(1), Value::from("AC/DC")],
        vec![Value::Int(2), Value::from("Accept")],
        vec![Value::Int(3), Value::from("Aerosmith")],
    ];

    let mut album = Table::new("Album")
        .column(Column::new("AlbumId", "INT").nullable(false))
        .column(Column::new("Title", "VARCHAR(160)").nullable(false))
        .column(Column::new("ArtistId", "INT").nullable(false))
        .primary_key(&["AlbumId"]);
    album.sample_rows = vec![
        vec![
            Value::Int(1),
            Value::from("For Those About To Rock We Salute You"),
            Value::Int(1),
        ],
        vec![Value::Int(2), Value::from("Balls to the Wall"), Value::Int(2)],
        vec![Value::Int(3), Value::from("Restless and Wild"), Value::Int(2)],
    ];

    Schema {
        tables: vec![artist, album],
        foreign_keys: vec![ForeignKey::new(
            "Album",
            vec!["ArtistId".to_string()],
            "Artist",
            vec!["ArtistId".to_string()],
        )],
    }
}
