//! Error types for snapshot decoding and capacity derivation

use thiserror::Error;

/// Result type for capacity-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or truncated input (binary snapshot, address text)
    #[error("Format error: {0}")]
    Format(String),

    /// An index in the snapshot points outside the address table
    #[error("Reference error: {section} index {index} out of bounds ({address_count} addresses)")]
    Reference {
        /// Snapshot section the index was read from
        section: &'static str,
        /// Offending index
        index: u32,
        /// Size of the address table
        address_count: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::Format(format!("invalid hex address: {}", err))
    }
}
