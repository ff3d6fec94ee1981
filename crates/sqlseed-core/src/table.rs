use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

/// Column names that can never be real columns; they only show up when a key
/// clause slips through the column matcher.
const RESERVED_COLUMN_NAMES: &[&str] = &["primary", "foreign"];

/// Returns true when `name` is a plain SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Validate a user supplied table or column name.
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Column declaration: name plus declared type label.
///
/// The type label starts out as the declared SQL type and is later replaced
/// by a field-type label before rows are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub type_label: String,
}

/// Foreign key relationship recorded on the referring table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// One generated row: column name to formatted literal, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, literal: impl Into<String>) {
        self.values.push((column.into(), literal.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, literal)| literal.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, literal)| (name.as_str(), literal.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Structural model of one schema table plus the rows generated for it.
///
/// `generated_rows` is append-only: rows are added through [`Table::push_row`]
/// and never edited or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_keys: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    unique_columns: Vec<String>,
    generated_rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            unique_columns: Vec::new(),
            generated_rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a column, or overwrite the type of an existing one in place.
    pub fn add_column(&mut self, name: impl Into<String>, type_label: impl Into<String>) {
        let name = name.into();
        let type_label = type_label.into();
        if RESERVED_COLUMN_NAMES
            .iter()
            .any(|reserved| name.eq_ignore_ascii_case(reserved))
        {
            debug!(table = %self.name, column = %name, "ignoring reserved column name");
            return;
        }

        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(existing) => existing.type_label = type_label,
            None => self.columns.push(Column { name, type_label }),
        }
    }

    /// Replace the type label of an existing column. Returns false when the
    /// column is unknown.
    pub fn set_column_type(&mut self, name: &str, type_label: impl Into<String>) -> bool {
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => {
                column.type_label = type_label.into();
                true
            }
            None => false,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.type_label.as_str())
    }

    pub fn set_primary_keys(&mut self, columns: Vec<String>) {
        self.primary_keys = columns;
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn add_foreign_key(
        &mut self,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        });
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// First foreign key declared on `column`, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    pub fn add_unique_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.unique_columns.contains(&column) {
            self.unique_columns.push(column);
        }
    }

    pub fn unique_columns(&self) -> &[String] {
        &self.unique_columns
    }

    /// Primary-key columns are unique implicitly.
    pub fn requires_unique(&self, column: &str) -> bool {
        self.unique_columns.iter().any(|name| name == column)
            || self.primary_keys.iter().any(|name| name == column)
    }

    pub fn push_row(&mut self, row: Row) {
        self.generated_rows.push(row);
    }

    pub fn generated_rows(&self) -> &[Row] {
        &self.generated_rows
    }

    /// Every literal stored under `column` across the generated rows.
    pub fn column_values(&self, column: &str) -> Vec<String> {
        self.generated_rows
            .iter()
            .filter_map(|row| row.get(column))
            .map(str::to_string)
            .collect()
    }
}
