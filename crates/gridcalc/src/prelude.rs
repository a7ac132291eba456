//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CellAddress,
    CellRange,
    // Error types
    Error,
    ErrorKind,
    // Formula types
    EvaluationContext,
    Expr,
    Formula,
    // Grid types
    Grid,
    GridProvider,
    GridStore,
    RecalcStats,
    Recalculator,
    Result,
    // Main type
    Spreadsheet,
    Value,
};
