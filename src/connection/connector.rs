//! Connector and database handle.

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseBackend, DatabaseClient};
use crate::error::Result;
use std::time::Instant;
use tracing::{debug, info};

/// Opens database handles. Holds no state; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connector;

impl Connector {
    pub fn new() -> Self {
        Self
    }

    /// Makes one connection attempt with the given settings.
    ///
    /// Nothing is validated up front. Malformed fields surface as the
    /// driver's connection error.
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<DatabaseHandle> {
        let start = Instant::now();
        let client = db::connect(config).await?;
        info!(
            "Connected to {} in {:?}",
            config.display_string(),
            start.elapsed()
        );

        Ok(DatabaseHandle {
            client,
            backend: config.backend,
            display: config.display_string(),
        })
    }
}

/// A live database connection.
pub struct DatabaseHandle {
    client: Box<dyn DatabaseClient>,
    backend: DatabaseBackend,
    display: String,
}

impl DatabaseHandle {
    /// Wraps an existing client.
    pub fn new(
        client: Box<dyn DatabaseClient>,
        backend: DatabaseBackend,
        display: impl Into<String>,
    ) -> Self {
        Self {
            client,
            backend,
            display: display.into(),
        }
    }

    /// Fetches a fresh schema snapshot: one `CREATE TABLE` block per table
    /// with a few sample rows.
    pub async fn table_info(&self) -> Result<String> {
        let schema = self.client.introspect_schema().await?;
        let text = schema.format_for_llm();
        debug!(
            "Schema snapshot: {} tables, {} chars",
            schema.tables.len(),
            text.len()
        );
        Ok(text)
    }

    /// Runs raw SQL and renders the result as text.
    pub async fn run(&self, sql: &str) -> Result<String> {
        let result = self.client.execute_query(sql).await?;
        debug!(
            "Query returned {} rows in {:?}",
            result.row_count, result.execution_time
        );
        Ok(result.to_text())
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Password-free description for the UI.
    pub fn display_string(&self) -> &str {
        &self.display
    }

    /// Closes the underlying pool.
    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}

impl std::fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("backend", &self.backend)
            .field("display", &self.display)
            .finish()
    }
}
