use sqlseed_core::{Table, validate_identifier};

use crate::errors::{GenerationError, Result};
use crate::field_type::FieldType;

/// Parse a `name:Label` column definition.
pub fn parse_column_spec(spec: &str) -> Result<(String, FieldType)> {
    let (name, label) = spec.split_once(':').ok_or_else(|| {
        GenerationError::InvalidConfig(format!(
            "invalid column '{spec}' (expected name:Field type)"
        ))
    })?;
    let name = name.trim();
    validate_identifier(name)?;
    Ok((name.to_string(), label.parse()?))
}

/// Build a single table from direct input. Unique columns must be among the
/// declared columns.
pub fn build_manual_table(
    name: &str,
    columns: &[(String, FieldType)],
    unique: &[String],
) -> Result<Table> {
    validate_identifier(name)?;
    if columns.is_empty() {
        return Err(GenerationError::InvalidConfig(format!(
            "table '{name}' needs at least one column"
        )));
    }

    let mut table = Table::new(name);
    for (column, field_type) in columns {
        validate_identifier(column)?;
        if table.column_type(column).is_some() {
            return Err(GenerationError::InvalidConfig(format!(
                "column '{column}' declared twice in table '{name}'"
            )));
        }
        table.add_column(column.as_str(), field_type.label());
    }
    for column in unique {
        if table.column_type(column).is_none() {
            return Err(GenerationError::InvalidConfig(format!(
                "unique column '{column}' is not a column of table '{name}'"
            )));
        }
        table.add_unique_column(column.as_str());
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_specs_need_identifier_and_label() {
        assert_eq!(
            parse_column_spec("email:email").expect("valid"),
            ("email".to_string(), FieldType::Email)
        );
        assert!(parse_column_spec("email").is_err());
        assert!(parse_column_spec("2email:Email").is_err());
        assert!(parse_column_spec("email:Mailbox").is_err());
    }

    #[test]
    fn builds_table_with_unique_columns() {
        let columns = vec![
            ("id".to_string(), FieldType::Number),
            ("city".to_string(), FieldType::City),
        ];
        let table = build_manual_table("places", &columns, &["id".to_string()])
            .expect("valid table");
        assert_eq!(table.column_type("city"), Some("City"));
        assert!(table.requires_unique("id"));
        assert!(table.foreign_keys().is_empty());
    }

    #[test]
    fn rejects_invalid_input() {
        let columns = vec![("id".to_string(), FieldType::Number)];
        assert!(build_manual_table("bad-name", &columns, &[]).is_err());
        assert!(build_manual_table("t", &[], &[]).is_err());
        assert!(build_manual_table("t", &columns, &["missing".to_string()]).is_err());
        let twice = vec![
            ("id".to_string(), FieldType::Number),
            ("id".to_string(), FieldType::City),
        ];
        assert!(build_manual_table("t", &twice, &[]).is_err());
    }
}
