//! Error types for CoFi export

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Export errors
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot or capacity error
    #[error("Core error: {0}")]
    Core(#[from] capacity_core::Error),

    /// Malformed pathfinder2 row (column count, hex capacity)
    #[error("Format error: {0}")]
    Format(String),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
