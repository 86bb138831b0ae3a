//! Query result types.
//!
//! Defines the structures used to represent query results from the database
//! and their plain-text rendering for model prompts.

use std::time::Duration;

/// Maximum rows kept from a single query.
pub const MAX_ROWS: usize = 1000;

/// Represents the result of executing a SQL statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    pub execution_time: Duration,

    /// Number of rows in the result (after truncation).
    pub row_count: usize,

    /// Total number of rows before truncation.
    pub total_rows: Option<usize>,

    /// Whether the result was truncated to MAX_ROWS.
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows, applying the
    /// MAX_ROWS cap.
    pub fn with_data(columns: Vec<ColumnInfo>, mut rows: Vec<Row>) -> Self {
        let total_rows = rows.len();
        let was_truncated = total_rows > MAX_ROWS;
        rows.truncate(MAX_ROWS);
        Self {
            columns,
            row_count: rows.len(),
            rows,
            execution_time: Duration::ZERO,
            total_rows: Some(total_rows),
            was_truncated,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Renders the result as text for the narration prompt.
    ///
    /// A result without rows renders as the empty string. Otherwise the first
    /// line holds the tab-separated column names and each following line one
    /// row.
    pub fn to_text(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(
            self.columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("\t"),
        );
        lines.extend(self.rows.iter().map(|row| format_row(row, None)));
        if self.was_truncated {
            let total = self.total_rows.unwrap_or(self.row_count);
            lines.push(format!("({} of {} rows shown)", self.row_count, total));
        }
        lines.join("\n")
    }
}

/// Formats a row as tab-separated cells, optionally truncating each cell.
pub(crate) fn format_row(row: &Row, max_cell: Option<usize>) -> String {
    row.iter()
        .map(|v| {
            let text = v.to_display_string();
            match max_cell {
                Some(limit) if text.chars().count() > limit => {
                    text.chars().take(limit).collect()
                }
                _ => text,
            }
        })
        .collect::<Vec<_>>()
        .join("\t")
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value (also used for decimals and temporal types).
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Converts the value to its display representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
