//! SQL literal rendering for generated values.
//!
//! The kind is decided from the column's type label by keyword substring,
//! numeric first, then temporal, then textual. Formatting is idempotent: a
//! literal copied from a referenced row renders to itself again.

const NUMERIC_KEYWORDS: &[&str] = &[
    "INT", "LONG", "NUMBER", "DECIMAL", "FLOAT", "DOUBLE", "SMALLINT", "BIGINT",
];
const TEMPORAL_KEYWORDS: &[&str] = &["DATE", "DATETIME", "TIMESTAMP", "TIME", "YEAR"];

const DATE_PREFIX: &str = "to_date(";
const DATE_SUFFIX: &str = ", 'YYYY-MM-DD')";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Numeric,
    Temporal,
    Textual,
}

impl LiteralKind {
    pub fn classify(type_label: &str) -> Self {
        let upper = type_label.to_uppercase();
        if NUMERIC_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            LiteralKind::Numeric
        } else if TEMPORAL_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            LiteralKind::Temporal
        } else {
            LiteralKind::Textual
        }
    }
}

/// Render `raw` as a SQL literal for a column of type `type_label`.
pub fn format_literal(type_label: &str, raw: &str) -> String {
    let value = unquote(raw);
    match LiteralKind::classify(type_label) {
        LiteralKind::Numeric => value,
        LiteralKind::Temporal => format!("{DATE_PREFIX}'{}'{DATE_SUFFIX}", escape(&value)),
        LiteralKind::Textual => format!("'{}'", escape(&value)),
    }
}

fn unquote(raw: &str) -> String {
    if let Some(inner) = raw
        .strip_prefix(DATE_PREFIX)
        .and_then(|rest| rest.strip_suffix(DATE_SUFFIX))
    {
        return unquote(inner);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        raw[1..raw.len() - 1].replace("''", "'")
    } else {
        raw.trim_matches('\'').to_string()
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
