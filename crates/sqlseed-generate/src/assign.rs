//! Field-type assignment: turns declared SQL types into field-type labels
//! before a table's rows are generated.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlseed_core::Table;
use tracing::{debug, warn};

use crate::errors::{GenerationError, Result};
use crate::field_type::FieldType;
use crate::literal::LiteralKind;

/// How a column ended up with its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOrigin {
    ForeignKey,
    Explicit,
    Inferred,
    Declared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    pub column: String,
    pub label: String,
    pub origin: AssignmentOrigin,
}

/// Explicit `table.column` to field-type choices.
#[derive(Debug, Clone, Default)]
pub struct TypeOverrides {
    by_table: BTreeMap<String, BTreeMap<String, FieldType>>,
}

impl TypeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &str, column: &str, field_type: FieldType) {
        self.by_table
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), field_type);
    }

    pub fn get(&self, table: &str, column: &str) -> Option<FieldType> {
        self.by_table.get(table)?.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }

    /// Parse and record a `table.column=Label` assignment.
    pub fn insert_assignment(&mut self, spec: &str) -> Result<()> {
        let invalid = || {
            GenerationError::InvalidConfig(format!(
                "invalid type assignment '{spec}' (expected table.column=Label)"
            ))
        };
        let (target, label) = spec.split_once('=').ok_or_else(invalid)?;
        let (table, column) = target.trim().split_once('.').ok_or_else(invalid)?;
        sqlseed_core::validate_identifier(table)?;
        sqlseed_core::validate_identifier(column)?;
        self.insert(table, column, label.parse()?);
        Ok(())
    }
}

/// Resolve a label for every column of `table`, in declaration order.
///
/// A foreign-key column copies the label of the referenced column when the
/// referenced table was already processed and falls back to
/// `Number [0,10000]`. Other columns take an explicit override, then a label
/// inferred from the column name and declared type. A column nothing applies
/// to keeps its declared type and the value source will answer it with a
/// placeholder.
pub fn assign_field_types(
    table: &mut Table,
    processed: &HashMap<String, Table>,
    overrides: &TypeOverrides,
) -> Vec<ColumnAssignment> {
    let mut assignments = Vec::with_capacity(table.columns().len());

    for column in table.columns() {
        let (label, origin) = if let Some(fk) = table.foreign_key_for(&column.name) {
            let inherited = processed
                .get(&fk.referenced_table)
                .and_then(|referenced| referenced.column_type(&fk.referenced_column));
            match inherited {
                Some(label) => (label.to_string(), AssignmentOrigin::ForeignKey),
                None => {
                    warn!(
                        table = %table.name(),
                        column = %column.name,
                        referenced_table = %fk.referenced_table,
                        referenced_column = %fk.referenced_column,
                        "referenced column not processed; defaulting foreign key type"
                    );
                    (
                        FieldType::Number.label().to_string(),
                        AssignmentOrigin::ForeignKey,
                    )
                }
            }
        } else if let Some(field_type) = overrides.get(table.name(), &column.name) {
            (field_type.label().to_string(), AssignmentOrigin::Explicit)
        } else if let Some(field_type) = infer_field_type(&column.name, &column.type_label) {
            (field_type.label().to_string(), AssignmentOrigin::Inferred)
        } else {
            warn!(
                table = %table.name(),
                column = %column.name,
                declared = %column.type_label,
                "no field type for column; values will be placeholders"
            );
            (column.type_label.clone(), AssignmentOrigin::Declared)
        };

        debug!(
            table = %table.name(),
            column = %column.name,
            label = %label,
            ?origin,
            "field type assigned"
        );
        assignments.push(ColumnAssignment {
            column: column.name.clone(),
            label,
            origin,
        });
    }

    for assignment in &assignments {
        table.set_column_type(&assignment.column, assignment.label.clone());
    }
    assignments
}

/// Guess a field type from a column name and its declared SQL type.
///
/// Numeric and temporal declarations decide on their own so the literal kind
/// never contradicts the column definition; name hints only apply to the
/// remaining textual columns.
pub fn infer_field_type(column: &str, declared: &str) -> Option<FieldType> {
    if let Some(field_type) = FieldType::from_label(declared) {
        return Some(field_type);
    }

    let name = column.to_ascii_lowercase();
    match LiteralKind::classify(declared) {
        LiteralKind::Numeric => Some(FieldType::Number),
        LiteralKind::Temporal => {
            let recent = ["created", "updated", "modified", "recent", "last_"]
                .iter()
                .any(|hint| name.contains(hint));
            Some(if recent {
                FieldType::RecentDate
            } else {
                FieldType::Date
            })
        }
        LiteralKind::Textual => infer_from_name(&name),
    }
}

fn infer_from_name(name: &str) -> Option<FieldType> {
    let has = |hints: &[&str]| hints.iter().any(|hint| name.contains(hint));

    if has(&["email", "mail"]) {
        Some(FieldType::Email)
    } else if has(&["phone", "mobile", "fax"]) {
        Some(FieldType::Phone)
    } else if has(&["postal", "postcode", "zip"]) {
        Some(FieldType::PostalCode)
    } else if has(&["address", "street"]) {
        Some(FieldType::Address)
    } else if has(&["city", "town"]) {
        Some(FieldType::City)
    } else if has(&["country", "nation"]) {
        Some(FieldType::Country)
    } else if (has(&["first", "given"]) && name.contains("name")) || name == "fname" {
        Some(FieldType::FirstName)
    } else if has(&["last", "surname", "family"]) || name.contains("name") {
        Some(FieldType::LastName)
    } else if has(&["job", "title", "position", "occupation", "role"]) {
        Some(FieldType::Job)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_decide_before_names() {
        assert_eq!(infer_field_type("zip", "INT"), Some(FieldType::Number));
        assert_eq!(infer_field_type("hired_on", "DATE"), Some(FieldType::Date));
        assert_eq!(
            infer_field_type("created_at", "TIMESTAMP"),
            Some(FieldType::RecentDate)
        );
        assert_eq!(
            infer_field_type("rating", "Number [0,10]"),
            Some(FieldType::SmallNumber)
        );
    }

    #[test]
    fn textual_columns_use_name_hints() {
        let cases = [
            ("email", "VARCHAR(120)", Some(FieldType::Email)),
            ("first_name", "TEXT", Some(FieldType::FirstName)),
            ("last_name", "TEXT", Some(FieldType::LastName)),
            ("name", "TEXT", Some(FieldType::LastName)),
            ("postal_code", "CHAR(5)", Some(FieldType::PostalCode)),
            ("job_title", "TEXT", Some(FieldType::Job)),
            ("notes", "TEXT", None),
        ];
        for (column, declared, expected) in cases {
            assert_eq!(infer_field_type(column, declared), expected, "{column}");
        }
    }

    #[test]
    fn foreign_keys_inherit_the_referenced_label() {
        let mut dept = Table::new("dept");
        dept.add_column("code", "Postal code");
        let processed = HashMap::from([("dept".to_string(), dept)]);

        let mut emp = Table::new("emp");
        emp.add_column("dept_code", "CHAR(5)");
        emp.add_column("boss_id", "INT");
        emp.add_foreign_key("dept_code", "dept", "code");
        emp.add_foreign_key("boss_id", "boss", "id");

        let assignments = assign_field_types(&mut emp, &processed, &TypeOverrides::new());
        assert_eq!(emp.column_type("dept_code"), Some("Postal code"));
        assert_eq!(emp.column_type("boss_id"), Some("Number [0,10000]"));
        assert!(
            assignments
                .iter()
                .all(|assignment| assignment.origin == AssignmentOrigin::ForeignKey)
        );
    }

    #[test]
    fn overrides_beat_inference_and_unknowns_keep_declared_type() {
        let mut overrides = TypeOverrides::new();
        overrides
            .insert_assignment("users.nickname=first name")
            .expect("valid assignment");

        let mut users = Table::new("users");
        users.add_column("nickname", "TEXT");
        users.add_column("payload", "BLOB");

        let assignments = assign_field_types(&mut users, &HashMap::new(), &overrides);
        assert_eq!(users.column_type("nickname"), Some("First name"));
        assert_eq!(users.column_type("payload"), Some("BLOB"));
        assert_eq!(assignments[0].origin, AssignmentOrigin::Explicit);
        assert_eq!(assignments[1].origin, AssignmentOrigin::Declared);
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        let mut overrides = TypeOverrides::new();
        assert!(overrides.insert_assignment("users.email").is_err());
        assert!(overrides.insert_assignment("email=Email").is_err());
        assert!(overrides.insert_assignment("users.e-mail=Email").is_err());
        assert!(overrides.insert_assignment("users.email=Surname").is_err());
        assert!(overrides.is_empty());
    }
}
