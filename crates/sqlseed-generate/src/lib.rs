//! Row generation for sqlseed.
//!
//! Consumes dependency-ordered tables from `sqlseed-core`, assigns field types
//! to their columns and emits one `INSERT` statement per generated row, with
//! foreign-key values drawn from rows already generated for referenced tables.

pub mod assets;
pub mod assign;
pub mod engine;
pub mod errors;
pub mod field_type;
pub mod generator;
pub mod literal;
pub mod manual;
pub mod model;
pub mod source;
pub mod unique;

pub use assign::{
    AssignmentOrigin, ColumnAssignment, TypeOverrides, assign_field_types, infer_field_type,
};
pub use engine::{DEFAULT_ROWS, GenerationEngine, GenerationResult, RowPlan};
pub use errors::{GenerationError, Result};
pub use field_type::FieldType;
pub use generator::{InsertStatement, RowGenerator};
pub use literal::{LiteralKind, format_literal};
pub use manual::{build_manual_table, parse_column_spec};
pub use model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport, UniqueScope};
pub use source::{
    CorpusSource, FakerSource, SourceKind, UNKNOWN_VALUE, ValueSource, build_source,
};
pub use unique::UniquenessPool;
