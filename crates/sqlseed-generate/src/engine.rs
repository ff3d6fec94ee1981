use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::time::Instant;

use sqlseed_core::{DependencyOrder, ForeignKey, Table};
use tracing::{error, info, warn};

use crate::assign::{AssignmentOrigin, TypeOverrides, assign_field_types};
use crate::errors::{GenerationError, Result};
use crate::generator::RowGenerator;
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
use crate::source::ValueSource;
use crate::unique::UniquenessPool;

/// Rows per table when neither the plan nor the caller says otherwise.
pub const DEFAULT_ROWS: u64 = 10;

/// Rows requested per table.
#[derive(Debug, Clone)]
pub struct RowPlan {
    default_rows: u64,
    per_table: BTreeMap<String, u64>,
}

impl RowPlan {
    pub fn new(default_rows: u64) -> Self {
        Self {
            default_rows,
            per_table: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, table: &str, rows: u64) -> Self {
        self.set(table, rows);
        self
    }

    pub fn set(&mut self, table: &str, rows: u64) {
        self.per_table.insert(table.to_string(), rows);
    }

    pub fn rows_for(&self, table: &str) -> u64 {
        self.per_table
            .get(table)
            .copied()
            .unwrap_or(self.default_rows)
    }
}

impl Default for RowPlan {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS)
    }
}

/// Outcome of a generation run.
#[derive(Debug)]
pub struct GenerationResult {
    pub report: GenerationReport,
    /// Every table that went through generation, with its rows.
    pub tables: HashMap<String, Table>,
}

/// Drives row generation over a dependency-ordered schema.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Generate rows for every ordered table and write one statement per line
    /// to `sink`.
    ///
    /// A row failure ends its table: the remaining rows of that table are
    /// skipped, the failure is reported and later tables still run. Only sink
    /// and source I/O failures abort the run.
    pub fn run<W: Write + ?Sized>(
        &self,
        order: DependencyOrder,
        plan: &RowPlan,
        overrides: &TypeOverrides,
        source: &mut dyn ValueSource,
        sink: &mut W,
    ) -> Result<GenerationResult> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = GenerationReport::new(run_id.clone());

        for unresolved in &order.unresolved {
            report.record_issue(
                GenerationIssue::error(
                    "order.unresolved",
                    format!(
                        "table dropped; unresolved references to {}",
                        unresolved.missing.join(", ")
                    ),
                )
                .in_table(&unresolved.name),
            );
        }
        report.dropped_tables = order.unresolved.clone();

        info!(
            run_id = %run_id,
            tables = order.ordered.len(),
            dropped = order.unresolved.len(),
            unique_scope = %self.options.unique_scope,
            "generation started"
        );

        let mut generator = RowGenerator::new(source, &self.options);
        let mut processed: HashMap<String, Table> = HashMap::new();

        for mut table in order.ordered {
            let table_start = Instant::now();
            let decided = assign_field_types(&mut table, &processed, overrides);
            for assignment in &decided {
                if assignment.origin == AssignmentOrigin::Declared {
                    report.record_issue(
                        GenerationIssue::warning(
                            "field_type.unknown",
                            format!(
                                "no field type for declared type '{}'; placeholder values used",
                                assignment.label
                            ),
                        )
                        .in_table(table.name())
                        .in_column(&assignment.column),
                    );
                }
            }

            for fk in table.foreign_keys() {
                if !shares_unique_pool(generator.pool(), &table, fk, &processed) {
                    continue;
                }
                warn!(
                    table = %table.name(),
                    column = %fk.column,
                    referenced_table = %fk.referenced_table,
                    "unique foreign key shares its pool with the referenced column; \
                     try --unique-scope table_column"
                );
                report.record_issue(
                    GenerationIssue::warning(
                        "unique.shared_pool",
                        format!(
                            "unique column '{}' references {}.{} through the same uniqueness \
                             pool, so it can only take values the referenced rows have not \
                             claimed; use --unique-scope table_column to separate them",
                            fk.column, fk.referenced_table, fk.referenced_column
                        ),
                    )
                    .in_table(table.name())
                    .in_column(&fk.column),
                );
            }

            let rows = plan.rows_for(table.name());
            info!(table = %table.name(), rows, "generating table");

            let retries_before = generator.unique_retries();
            let failure = generate_table(&mut generator, &mut table, &processed, rows, sink)?;
            if let Some(err) = &failure {
                error!(
                    table = %table.name(),
                    generated = table.generated_rows().len(),
                    error = %err,
                    "row generation failed; skipping remaining rows of table"
                );
                report.record_issue(
                    GenerationIssue::error(issue_code(err), err.to_string())
                        .in_table(table.name()),
                );
            }

            let table_report = TableReport {
                table: table.name().to_string(),
                rows_requested: rows,
                rows_generated: table.generated_rows().len() as u64,
                unique_retries: generator.unique_retries() - retries_before,
                error: failure.map(|err| err.to_string()),
            };
            info!(
                table = %table_report.table,
                rows_generated = table_report.rows_generated,
                unique_retries = table_report.unique_retries,
                duration_ms = table_start.elapsed().as_millis() as u64,
                "table generated"
            );
            report.record_table(table_report);

            report
                .assignments
                .insert(table.name().to_string(), decided);
            processed.insert(table.name().to_string(), table);
        }

        sink.flush()?;
        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            rows = report.rows_total,
            unique_retries = report.unique_retries_total,
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );

        Ok(GenerationResult {
            report,
            tables: processed,
        })
    }

    /// Generate rows for a single table built from direct input.
    ///
    /// Columns already carry field-type labels and there are no foreign keys.
    /// A failed row is reported and the next row is still attempted.
    pub fn run_manual<W: Write + ?Sized>(
        &self,
        mut table: Table,
        rows: u64,
        source: &mut dyn ValueSource,
        sink: &mut W,
    ) -> Result<GenerationResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = GenerationReport::new(run_id.clone());
        info!(run_id = %run_id, table = %table.name(), rows, "manual generation started");

        let mut generator = RowGenerator::new(source, &self.options);
        let processed = HashMap::new();
        let mut last_error = None;
        for index in 0..rows {
            match generator.generate_row(&mut table, &processed) {
                Ok(statement) => writeln!(sink, "{statement}")?,
                Err(err) if err.is_row_error() => {
                    warn!(
                        table = %table.name(),
                        row = index + 1,
                        error = %err,
                        "row generation failed"
                    );
                    report.record_issue(
                        GenerationIssue::error(issue_code(&err), err.to_string())
                            .in_table(table.name()),
                    );
                    last_error = Some(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }
        sink.flush()?;

        report.record_table(TableReport {
            table: table.name().to_string(),
            rows_requested: rows,
            rows_generated: table.generated_rows().len() as u64,
            unique_retries: generator.unique_retries(),
            error: last_error,
        });
        info!(
            run_id = %run_id,
            table = %table.name(),
            rows_generated = table.generated_rows().len(),
            "manual generation completed"
        );

        let mut tables = HashMap::new();
        tables.insert(table.name().to_string(), table);
        Ok(GenerationResult { report, tables })
    }
}

/// True when a unique foreign-key column and the unique column it references
/// draw from one uniqueness pool, so every referenced value is already taken.
fn shares_unique_pool(
    pool: &UniquenessPool,
    table: &Table,
    fk: &ForeignKey,
    processed: &HashMap<String, Table>,
) -> bool {
    table.requires_unique(&fk.column)
        && processed
            .get(&fk.referenced_table)
            .is_some_and(|parent| parent.requires_unique(&fk.referenced_column))
        && pool.key(table.name(), &fk.column)
            == pool.key(&fk.referenced_table, &fk.referenced_column)
}

/// Generate up to `rows` rows, stopping at the first row error, which is
/// returned rather than raised.
fn generate_table<W: Write + ?Sized>(
    generator: &mut RowGenerator<'_>,
    table: &mut Table,
    processed: &HashMap<String, Table>,
    rows: u64,
    sink: &mut W,
) -> Result<Option<GenerationError>> {
    for _ in 0..rows {
        match generator.generate_row(table, processed) {
            Ok(statement) => writeln!(sink, "{statement}")?,
            Err(err) if err.is_row_error() => return Ok(Some(err)),
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}

fn issue_code(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::MissingReferencedData { .. } => "row.missing_referenced_data",
        GenerationError::UniqueExhausted { .. } => "row.unique_exhausted",
        _ => "row.failed",
    }
}
