//! Line-oriented schema parser.
//!
//! Each trimmed line is offered to an ordered list of matchers; the first one
//! that returns a structured capture consumes the line:
//!
//! 1. `CREATE TABLE <name>` (also accepted while another table is open)
//! 2. `PRIMARY KEY (<cols>)`
//! 3. `FOREIGN KEY (<col>) REFERENCES <table>(<col>)`
//! 4. `<name> <type> [UNIQUE | NOT NULL | AUTO_INCREMENT | PRIMARY KEY]`
//! 5. `UNIQUE (<cols>)`
//! 6. a line ending with `);` or starting with `)`
//!
//! A key or column line that ends with the unbalanced `)` of its table, with
//! or without a trailing `;`, closes the table as well.
//!
//! Lines inside an open table that match nothing are dropped and reported in
//! [`ParsedSchema::skipped`]. A `CREATE TABLE` line that carries its whole
//! body, such as `CREATE TABLE dept (id INT, PRIMARY KEY(id));`, is split on
//! top-level commas and every piece goes through the same matchers.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::table::Table;

static TABLE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(\w+)")
        .expect("table start regex is valid")
});

static PRIMARY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^PRIMARY\s+KEY\s*\(([\w, ]+)\)").expect("primary key regex is valid")
});

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^FOREIGN\s+KEY\s*\((\w+)\)\s*REFERENCES\s+(\w+)\s*\((\w+)\)")
        .expect("foreign key regex is valid")
});

/// The type may carry a parenthesized argument list (`VARCHAR(255)`,
/// `DECIMAL(10, 2)`); the constraint has to follow the type directly.
static COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\w+)\s+(\w+(?:\s*\([^)]*\))?)(?:\s+(UNIQUE|NOT\s+NULL|AUTO_INCREMENT|PRIMARY\s+KEY)\b)?",
    )
    .expect("column regex is valid")
});

static UNIQUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^UNIQUE\s*\(([\w, ]+)\)").expect("unique regex is valid")
});

/// Result of parsing schema text.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    /// Tables in declaration order.
    pub tables: Vec<Table>,
    /// Lines inside a table declaration that no matcher recognized.
    pub skipped: Vec<SkippedLine>,
}

/// A dropped line, kept so the degradation can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line: usize,
    pub table: String,
    pub text: String,
}

/// Parse schema text into tables.
pub fn parse_schema(text: &str) -> ParsedSchema {
    let mut parser = SchemaParser::default();
    for (index, line) in text.lines().enumerate() {
        parser.feed_line(index + 1, line);
    }
    parser.finish()
}

/// Read and parse a schema file. Failing to read the file is the only error.
pub fn parse_schema_file(path: &Path) -> Result<ParsedSchema> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_schema(&text);
    info!(
        path = %path.display(),
        tables = parsed.tables.len(),
        skipped_lines = parsed.skipped.len(),
        "schema parsed"
    );
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnConstraint {
    Unique,
    NotNull,
    AutoIncrement,
    PrimaryKey,
}

impl ColumnConstraint {
    fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match normalized.as_str() {
            "UNIQUE" => Some(Self::Unique),
            "NOT NULL" => Some(Self::NotNull),
            "AUTO_INCREMENT" => Some(Self::AutoIncrement),
            "PRIMARY KEY" => Some(Self::PrimaryKey),
            _ => None,
        }
    }
}

/// Structured capture produced by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Construct<'a> {
    TableStart {
        name: &'a str,
        rest: &'a str,
    },
    PrimaryKey(Vec<&'a str>),
    ForeignKey {
        column: &'a str,
        referenced_table: &'a str,
        referenced_column: &'a str,
    },
    Column {
        name: &'a str,
        type_label: &'a str,
        constraint: Option<ColumnConstraint>,
    },
    Unique(Vec<&'a str>),
    TableEnd,
}

type Matcher = for<'a> fn(&'a str) -> Option<Construct<'a>>;

/// Matchers in priority order.
const MATCHERS: &[Matcher] = &[
    match_table_start,
    match_primary_key,
    match_foreign_key,
    match_column,
    match_unique,
    match_table_end,
];

fn classify(line: &str) -> Option<Construct<'_>> {
    MATCHERS.iter().find_map(|matcher| matcher(line))
}

fn match_table_start(line: &str) -> Option<Construct<'_>> {
    let caps = TABLE_START_RE.captures(line)?;
    let name = caps.get(1)?;
    Some(Construct::TableStart {
        name: name.as_str(),
        rest: &line[name.end()..],
    })
}

fn match_primary_key(line: &str) -> Option<Construct<'_>> {
    let caps = PRIMARY_KEY_RE.captures(line)?;
    Some(Construct::PrimaryKey(split_column_list(caps.get(1)?.as_str())))
}

fn match_foreign_key(line: &str) -> Option<Construct<'_>> {
    let caps = FOREIGN_KEY_RE.captures(line)?;
    Some(Construct::ForeignKey {
        column: caps.get(1)?.as_str(),
        referenced_table: caps.get(2)?.as_str(),
        referenced_column: caps.get(3)?.as_str(),
    })
}

fn match_column(line: &str) -> Option<Construct<'_>> {
    let caps = COLUMN_RE.captures(line)?;
    Some(Construct::Column {
        name: caps.get(1)?.as_str(),
        type_label: caps.get(2)?.as_str(),
        constraint: caps
            .get(3)
            .and_then(|raw| ColumnConstraint::parse(raw.as_str())),
    })
}

fn match_unique(line: &str) -> Option<Construct<'_>> {
    let caps = UNIQUE_RE.captures(line)?;
    Some(Construct::Unique(split_column_list(caps.get(1)?.as_str())))
}

fn match_table_end(line: &str) -> Option<Construct<'_>> {
    (line.ends_with(");") || line.starts_with(')')).then_some(Construct::TableEnd)
}

fn split_column_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (index, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn paren_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Text before the parenthesis that closes the enclosing declaration, when
/// `text` ends with one. A trailing `;` and surrounding whitespace are
/// optional: `a INT) ;`, `a INT);` and `a INT)` all close.
fn strip_declaration_close(text: &str) -> Option<&str> {
    let text = text.trim_end();
    let text = text.strip_suffix(';').unwrap_or(text).trim_end();
    let inner = text.strip_suffix(')')?;
    (paren_balance(text) < 0).then_some(inner)
}

/// A key or column line such as `FOREIGN KEY (a) REFERENCES b(id));` also
/// closes the enclosing declaration.
fn closes_declaration(line: &str) -> bool {
    strip_declaration_close(line).is_some()
}

#[derive(Debug, Default)]
struct SchemaParser {
    tables: Vec<Table>,
    current: Option<usize>,
    skipped: Vec<SkippedLine>,
}

impl SchemaParser {
    fn feed_line(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        let Some(construct) = classify(line) else {
            self.skip(line_no, line);
            return;
        };

        if self.current.is_none() && !matches!(construct, Construct::TableStart { .. }) {
            debug!(line = line_no, "ignoring line outside a table declaration");
            return;
        }

        let closes = !matches!(
            construct,
            Construct::TableStart { .. } | Construct::TableEnd
        ) && closes_declaration(line);

        self.apply(line_no, construct);

        if closes {
            self.close_table();
        }
    }

    fn apply(&mut self, line_no: usize, construct: Construct<'_>) {
        if let Construct::TableStart { name, rest } = construct {
            self.open_table(line_no, name, rest);
            return;
        }
        if construct == Construct::TableEnd {
            self.close_table();
            return;
        }

        let Some(table) = self.current.and_then(|index| self.tables.get_mut(index)) else {
            return;
        };

        match construct {
            Construct::PrimaryKey(columns) => {
                let columns: Vec<String> = columns.into_iter().map(str::to_string).collect();
                debug!(table = %table.name(), primary_keys = ?columns, "primary key set");
                table.set_primary_keys(columns);
            }
            Construct::ForeignKey {
                column,
                referenced_table,
                referenced_column,
            } => {
                debug!(
                    table = %table.name(),
                    column,
                    referenced_table,
                    referenced_column,
                    "foreign key added"
                );
                table.add_foreign_key(column, referenced_table, referenced_column);
            }
            Construct::Column {
                name,
                type_label,
                constraint,
            } => {
                debug!(table = %table.name(), column = name, type_label, "column added");
                table.add_column(name, type_label);
                match constraint {
                    Some(ColumnConstraint::Unique) => table.add_unique_column(name),
                    Some(ColumnConstraint::PrimaryKey) => {
                        table.set_primary_keys(vec![name.to_string()])
                    }
                    Some(ColumnConstraint::NotNull | ColumnConstraint::AutoIncrement) | None => {}
                }
            }
            Construct::Unique(columns) => {
                for column in columns {
                    debug!(table = %table.name(), column, "column marked unique");
                    table.add_unique_column(column);
                }
            }
            Construct::TableStart { .. } | Construct::TableEnd => {}
        }
    }

    fn open_table(&mut self, line_no: usize, name: &str, rest: &str) {
        if self.tables.iter().any(|table| table.name() == name) {
            warn!(table = name, line = line_no, "table declared more than once");
        }
        self.tables.push(Table::new(name));
        self.current = Some(self.tables.len() - 1);
        debug!(table = name, line = line_no, "table declaration started");

        let Some(body) = rest.trim().strip_prefix('(') else {
            return;
        };
        let (body, closed) = match strip_declaration_close(body) {
            Some(inner) => (inner, true),
            None => (body, false),
        };

        for segment in split_top_level(body) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match classify(segment) {
                Some(Construct::TableStart { .. }) | None => self.skip(line_no, segment),
                Some(construct) => self.apply(line_no, construct),
            }
        }

        if closed {
            self.close_table();
        }
    }

    fn close_table(&mut self) {
        if let Some(table) = self.current.take().and_then(|index| self.tables.get(index)) {
            debug!(table = %table.name(), columns = table.columns().len(), "table declaration closed");
        }
    }

    fn skip(&mut self, line_no: usize, text: &str) {
        let Some(table) = self.current.and_then(|index| self.tables.get(index)) else {
            debug!(line = line_no, "ignoring line outside a table declaration");
            return;
        };
        warn!(table = %table.name(), line = line_no, text, "unrecognized line dropped");
        self.skipped.push(SkippedLine {
            line: line_no,
            table: table.name().to_string(),
            text: text.to_string(),
        });
    }

    fn finish(self) -> ParsedSchema {
        ParsedSchema {
            tables: self.tables,
            skipped: self.skipped,
        }
    }
}
