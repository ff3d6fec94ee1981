use std::path::PathBuf;

use thiserror::Error;

/// Core error type shared across sqlseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema source could not be opened or read.
    #[error("failed to read schema source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A table or column name is not a plain SQL identifier.
    #[error("invalid identifier '{0}': must start with a letter or underscore and contain only letters, digits and underscores")]
    InvalidIdentifier(String),
}

/// Convenience alias for results returned by sqlseed crates.
pub type Result<T> = std::result::Result<T, Error>;
