//! Error types for gridcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridcalc-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: '{0}'")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: '{0}'")]
    InvalidRange(String),
}
