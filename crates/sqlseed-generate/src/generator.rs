use std::collections::HashMap;
use std::fmt;

use sqlseed_core::{ForeignKey, Row, Table};
use tracing::{debug, error};

use crate::errors::{GenerationError, Result};
use crate::literal::format_literal;
use crate::model::GenerateOptions;
use crate::source::ValueSource;
use crate::unique::UniquenessPool;

/// One `INSERT` statement, columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            self.columns.join(", "),
            self.values.join(", ")
        )
    }
}

/// Produces rows one at a time against a value source.
///
/// The uniqueness pool lives here, so it spans every table generated through
/// the same generator.
pub struct RowGenerator<'s> {
    source: &'s mut dyn ValueSource,
    pool: UniquenessPool,
    max_unique_attempts: u32,
    unique_retries: u64,
}

impl<'s> RowGenerator<'s> {
    pub fn new(source: &'s mut dyn ValueSource, options: &GenerateOptions) -> Self {
        Self {
            source,
            pool: UniquenessPool::new(options.unique_scope),
            max_unique_attempts: options.max_unique_attempts,
            unique_retries: 0,
        }
    }

    /// Redraws spent on uniqueness so far.
    pub fn unique_retries(&self) -> u64 {
        self.unique_retries
    }

    pub fn pool(&self) -> &UniquenessPool {
        &self.pool
    }

    /// Generate one row for `table`, append it to the table's rows and return
    /// its statement.
    ///
    /// `processed` holds tables whose generation already finished; foreign-key
    /// values are drawn from their rows. On error nothing is appended and the
    /// uniqueness pool is left untouched.
    pub fn generate_row(
        &mut self,
        table: &mut Table,
        processed: &HashMap<String, Table>,
    ) -> Result<InsertStatement> {
        let mut row = Row::new();
        let mut staged: Vec<(String, String)> = Vec::new();

        for column in table.columns() {
            let constraint = match table.foreign_key_for(&column.name) {
                Some(fk) => Some(referenced_values(table.name(), fk, processed)?),
                None => None,
            };
            let constraint = constraint.as_deref();

            let raw = self.source.random_value(&column.type_label, constraint)?;
            let mut literal = format_literal(&column.type_label, &raw);

            if table.requires_unique(&column.name) {
                let key = self.pool.key(table.name(), &column.name);
                let mut attempts = 0_u32;
                while self.pool.contains(&key, &literal)
                    || staged.iter().any(|(k, v)| *k == key && *v == literal)
                {
                    if attempts >= self.max_unique_attempts {
                        error!(
                            table = %table.name(),
                            column = %column.name,
                            attempts,
                            "cannot generate unique value"
                        );
                        return Err(GenerationError::UniqueExhausted {
                            column: column.name.clone(),
                            attempts,
                        });
                    }
                    attempts += 1;
                    let raw = self.source.random_value(&column.type_label, constraint)?;
                    literal = format_literal(&column.type_label, &raw);
                }
                if attempts > 0 {
                    debug!(
                        column = %column.name,
                        attempts,
                        literal = %literal,
                        "unique value found after redraws"
                    );
                }
                self.unique_retries += u64::from(attempts);
                staged.push((key, literal.clone()));
            }

            row.push(column.name.clone(), literal);
        }

        for (key, literal) in staged {
            self.pool.insert(key, literal);
        }

        let (columns, values): (Vec<String>, Vec<String>) = row
            .iter()
            .map(|(column, literal)| (column.to_string(), literal.to_string()))
            .unzip();
        let statement = InsertStatement {
            table: table.name().to_string(),
            columns,
            values,
        };
        debug!(table = %statement.table, statement = %statement, "row generated");
        table.push_row(row);
        Ok(statement)
    }
}

fn referenced_values(
    table: &str,
    fk: &ForeignKey,
    processed: &HashMap<String, Table>,
) -> Result<Vec<String>> {
    let values = processed
        .get(&fk.referenced_table)
        .map(|referenced| referenced.column_values(&fk.referenced_column))
        .unwrap_or_default();
    if values.is_empty() {
        error!(
            table,
            column = %fk.column,
            referenced_table = %fk.referenced_table,
            "no generated values for foreign key"
        );
        return Err(GenerationError::MissingReferencedData {
            table: table.to_string(),
            column: fk.column.clone(),
            referenced_table: fk.referenced_table.clone(),
        });
    }
    Ok(values)
}
