use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlseed_core::{SkippedLine, UnresolvedTable};

use crate::assign::ColumnAssignment;
use crate::errors::GenerationError;

/// How uniqueness pools are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueScope {
    /// One pool per column name, shared by every table with that column.
    #[default]
    ColumnName,
    /// One pool per `table.column`.
    TableColumn,
}

impl fmt::Display for UniqueScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniqueScope::ColumnName => "column_name",
            UniqueScope::TableColumn => "table_column",
        })
    }
}

impl FromStr for UniqueScope {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "column_name" | "column" => Ok(UniqueScope::ColumnName),
            "table_column" | "table" => Ok(UniqueScope::TableColumn),
            other => Err(GenerationError::InvalidConfig(format!(
                "unknown unique scope '{other}' (expected column_name or table_column)"
            ))),
        }
    }
}

/// Options for the row generator and the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Redraws allowed per unique column before the row fails.
    pub max_unique_attempts: u32,
    pub unique_scope: UniqueScope,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_unique_attempts: 1000,
            unique_scope: UniqueScope::ColumnName,
        }
    }
}

/// Summary of one generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub unique_retries: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured generation issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            table: None,
            column: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "error".to_string(),
            ..Self::warning(code, message)
        }
    }

    pub fn in_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn in_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub tables: Vec<TableReport>,
    pub rows_total: u64,
    pub unique_retries_total: u64,
    pub dropped_tables: Vec<UnresolvedTable>,
    pub skipped_lines: Vec<SkippedLine>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub issues: Vec<GenerationIssue>,
    /// Field-type decisions per table, keyed by table name.
    #[serde(default)]
    pub assignments: BTreeMap<String, Vec<ColumnAssignment>>,
}

impl GenerationReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            tables: Vec::new(),
            rows_total: 0,
            unique_retries_total: 0,
            dropped_tables: Vec::new(),
            skipped_lines: Vec::new(),
            warnings_by_code: BTreeMap::new(),
            issues: Vec::new(),
            assignments: BTreeMap::new(),
        }
    }

    pub fn record_table(&mut self, table: TableReport) {
        self.rows_total += table.rows_generated;
        self.unique_retries_total += table.unique_retries;
        self.tables.push(table);
    }

    pub fn record_issue(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.issues.push(issue);
    }

    /// Attach parser degradation so one report covers the whole run.
    pub fn record_skipped_lines(&mut self, skipped: &[SkippedLine]) {
        for line in skipped {
            self.record_issue(
                GenerationIssue::warning(
                    "parser.line_skipped",
                    format!("line {} not recognized: {}", line.line, line.text),
                )
                .in_table(&line.table),
            );
        }
        self.skipped_lines.extend_from_slice(skipped);
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|table| table.table == name)
    }

    pub fn has_errors(&self) -> bool {
        self.tables.iter().any(|table| table.error.is_some())
    }
}
