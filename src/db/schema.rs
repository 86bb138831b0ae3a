//! Database schema types.
//!
//! Represents the structure of a database (tables, columns, foreign keys)
//! together with a few sample rows per table, and renders it as the schema
//! snapshot handed to the model.

use super::types::{format_row, Row};

/// Number of sample rows fetched per table during introspection.
pub const SAMPLE_ROWS: usize = 3;

/// Sample cells longer than this are cut.
const MAX_SAMPLE_CELL_CHARS: usize = 100;

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Formats the schema for inclusion in a model prompt.
    ///
    /// Each table is rendered as a `CREATE TABLE` statement followed by a
    /// comment block with its sample rows. An empty schema renders as "".
    pub fn format_for_llm(&self) -> String {
        self.tables
            .iter()
            .map(|table| self.format_table(table))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_table(&self, table: &Table) -> String {
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("\t`{}` {}", column.name, column.data_type);
                if !column.is_nullable {
                    line.push_str(" NOT NULL");
                }
                if let Some(default) = &column.default {
                    line.push_str(" DEFAULT ");
                    line.push_str(default);
                }
                line
            })
            .collect();

        if !table.primary_key.is_empty() {
            definitions.push(format!(
                "\tPRIMARY KEY ({})",
                quote_list(&table.primary_key)
            ));
        }

        definitions.extend(
            self.foreign_keys
                .iter()
                .filter(|fk| fk.from_table == table.name)
                .map(|fk| {
                    let mut line = format!(
                        "\tFOREIGN KEY({}) REFERENCES `{}`",
                        quote_list(&fk.from_columns),
                        fk.to_table
                    );
                    // SQLite leaves the target columns out when they are the
                    // referenced table's primary key.
                    if !fk.to_columns.is_empty() {
                        line.push_str(&format!(" ({})", quote_list(&fk.to_columns)));
                    }
                    line
                }),
        );

        let mut text = format!(
            "CREATE TABLE `{}` (\n{}\n)",
            table.name,
            definitions.join(",\n")
        );

        if !table.sample_rows.is_empty() {
            let header = table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("\t");
            let rows = table
                .sample_rows
                .iter()
                .map(|row| format_row(row, Some(MAX_SAMPLE_CELL_CHARS)))
                .collect::<Vec<_>>()
                .join("\n");
            text.push_str(&format!(
                "\n\n/*\n{} rows from {} table:\n{}\n{}\n*/",
                table.sample_rows.len(),
                table.name,
                header,
                rows
            ));
        }

        text
    }
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,

    /// Up to SAMPLE_ROWS rows, in column order.
    pub sample_rows: Vec<Row>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared data type.
    pub data_type: String,

    /// Whether the column accepts NULL.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a nullable column without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    /// Sets the default expression.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A foreign key relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}
