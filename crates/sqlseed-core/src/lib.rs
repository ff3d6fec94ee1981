//! Core contracts for sqlseed.
//!
//! This crate defines the table model, the line-oriented schema parser and
//! the foreign-key dependency orderer shared by the generator and the CLI.

pub mod error;
pub mod order;
pub mod parser;
pub mod table;

pub use error::{Error, Result};
pub use order::{DependencyOrder, OrderReport, UnresolvedTable, order_tables};
pub use parser::{ParsedSchema, SkippedLine, parse_schema, parse_schema_file};
pub use table::{Column, ForeignKey, Row, Table, is_valid_identifier, validate_identifier};
