use thiserror::Error;

/// Errors emitted while generating rows.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(
        "no generated rows in '{referenced_table}' for foreign key column '{column}' of table '{table}'"
    )]
    MissingReferencedData {
        table: String,
        column: String,
        referenced_table: String,
    },
    #[error("cannot generate a unique value for column '{column}' after {attempts} attempts")]
    UniqueExhausted { column: String, attempts: u32 },
    #[error("asset error: {0}")]
    Asset(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] sqlseed_core::Error),
}

impl GenerationError {
    /// Row-level failures end the current table; everything else ends the run.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Self::MissingReferencedData { .. } | Self::UniqueExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
