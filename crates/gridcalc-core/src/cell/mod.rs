//! Cell addressing and cell error codes

mod address;
mod error_kind;

pub use address::{expand_range, format_address, parse_address, CellAddress, CellRange, Cells};
pub use error_kind::ErrorKind;
