//! # gridcalc
//!
//! An incremental formula engine over a grid of text cells.
//!
//! Cells hold plain text or a formula starting with `=`. Formulas support arithmetic,
//! comparisons, ranges, built-in functions and first-class `LAMBDA` values. Editing a
//! cell recomputes exactly the formulas that read it, directly or transitively, each
//! once and after every cell it reads.
//!
//! ## Features
//!
//! - Formula parsing with precise error positions
//! - Lexically scoped lambdas, including higher-order calls
//! - Dependency tracking with cycle detection (`#CIRCULAR!`)
//! - Error values that flow through dependents instead of aborting recalculation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut sheet = Spreadsheet::new();
//! sheet.set("A1", "5").unwrap();
//! sheet.set("B1", "=A1*2").unwrap();
//! sheet.set("C1", "=SUM(A1:B1)").unwrap();
//! assert_eq!(sheet.display("C1").unwrap(), "15");
//!
//! sheet.set("A1", "7").unwrap();
//! assert_eq!(sheet.display("B1").unwrap(), "14");
//! assert_eq!(sheet.display("C1").unwrap(), "21");
//! ```

pub mod calculation;
pub mod error;
pub mod prelude;
pub mod spreadsheet;

// Re-export engine types
pub use calculation::{CalculationOptions, Formula, RecalcStats, Recalculator};
pub use error::{Error, Result};
pub use spreadsheet::Spreadsheet;

// Re-export core types
pub use gridcalc_core::{CellAddress, CellRange, ErrorKind, Grid, GridProvider, GridStore};

// Re-export formula types
pub use gridcalc_formula::{
    dependencies_of, evaluate, evaluate_formula, function_registry, parse, parse_formula,
    Closure, DependencyGraph, Environment, EvaluationContext, Expr, FormulaError, Value,
};
