//! Error types for the spreadsheet API

use thiserror::Error;

/// Result type for spreadsheet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Spreadsheet`](crate::Spreadsheet) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A cell reference that does not name a cell
    #[error(transparent)]
    Address(#[from] gridcalc_core::Error),

    /// A formula that could not be parsed or evaluated
    #[error(transparent)]
    Formula(#[from] gridcalc_formula::FormulaError),
}
