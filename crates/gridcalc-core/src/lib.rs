//! # gridcalc-core
//!
//! Core data structures for the gridcalc formula engine.
//!
//! This crate provides the fundamental types used throughout gridcalc:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`ErrorKind`] - The error codes a cell can hold as its computed value
//! - [`GridProvider`] / [`GridStore`] - The narrow interface the engine reads and
//!   writes cell text through, with [`Grid`] as the in-memory implementation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{format_address, parse_address, CellAddress};
//!
//! let addr = parse_address("AC12").unwrap();
//! assert_eq!(addr, CellAddress::new(11, 28));
//! assert_eq!(format_address(11, 28), "AC12");
//! ```

pub mod cell;
pub mod error;
pub mod grid;

// Re-exports for convenience
pub use cell::{expand_range, format_address, parse_address, CellAddress, CellRange, ErrorKind};
pub use error::{Error, Result};
pub use grid::{Grid, GridProvider, GridStore};
