//! A1-style cell addresses and rectangular ranges

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Zero-based (row, column) coordinates of a cell
///
/// In text the column is written as letters and the row as a 1-based number, so
/// `CellAddress::new(11, 28)` is `AC12`. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse A1-style text, reporting the rejected text on failure
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// assert!(CellAddress::parse("B").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        parse_address(text).ok_or_else(|| Error::InvalidAddress(text.to_string()))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_column(f, self.col)?;
        write!(f, "{}", u64::from(self.row) + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

/// Bijective base-26 letters for a zero-based column: A..Z, then AA, AB, ...
fn write_column(f: &mut fmt::Formatter<'_>, col: u32) -> fmt::Result {
    // u32::MAX needs 7 letters
    let mut buf = [0u8; 7];
    let mut len = 0;
    let mut n = u64::from(col) + 1;
    while n > 0 {
        n -= 1;
        buf[len] = b'A' + (n % 26) as u8;
        len += 1;
        n /= 26;
    }
    buf[..len].reverse();
    f.write_str(std::str::from_utf8(&buf[..len]).map_err(|_| fmt::Error)?)
}

/// Zero-based column for case-insensitive letters, `None` past `u32::MAX`
fn column_index(letters: &str) -> Option<u32> {
    let value = letters.bytes().try_fold(0u64, |acc, b| {
        let digit = u64::from(b.to_ascii_uppercase().checked_sub(b'A')?) + 1;
        let next = acc * 26 + digit;
        (digit <= 26 && next <= u64::from(u32::MAX) + 1).then_some(next)
    })?;
    u32::try_from(value.checked_sub(1)?).ok()
}

/// Parse a textual reference such as "AC12" into a zero-based address
///
/// Accepts one or more ASCII letters (case-insensitive) followed by one or more digits
/// and nothing else. Row "0" and coordinates that do not fit in `u32` are rejected.
pub fn parse_address(text: &str) -> Option<CellAddress> {
    let split = text
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (letters, digits) = text.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let col = column_index(letters)?;
    let row = digits
        .parse::<u64>()
        .ok()?
        .checked_sub(1)
        .and_then(|row| u32::try_from(row).ok())?;
    Some(CellAddress::new(row, col))
}

/// Format a zero-based (row, col) pair as a textual reference
pub fn format_address(row: u32, col: u32) -> String {
    CellAddress::new(row, col).to_string()
}

/// Every address in the rectangle spanned by two references, row by row
///
/// Corners may be given in any order. Returns an empty list if either does not parse.
pub fn expand_range(start: &str, end: &str) -> Vec<CellAddress> {
    parse_address(start)
        .zip(parse_address(end))
        .map(|(start, end)| CellRange::new(start, end).cells().collect())
        .unwrap_or_default()
}

/// A rectangle of cells with `start` top-left and `end` bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// The rectangle with `a` and `b` as opposite corners
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `A1:B10`, or a lone `C3` as a one-cell range
    pub fn parse(text: &str) -> Result<Self> {
        let Some((a, b)) = text.split_once(':') else {
            let addr = CellAddress::parse(text)?;
            return Ok(Self::new(addr, addr));
        };
        parse_address(a)
            .zip(parse_address(b))
            .map(|(a, b)| Self::new(a, b))
            .ok_or_else(|| Error::InvalidRange(text.to_string()))
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn cell_count(&self) -> u64 {
        let rows = u64::from(self.end.row - self.start.row) + 1;
        let cols = u64::from(self.end.col - self.start.col) + 1;
        rows * cols
    }

    /// Addresses in row-major order
    pub fn cells(&self) -> Cells {
        Cells {
            range: *self,
            next: Some(self.start),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

/// Row-major iterator over a [`CellRange`]
#[derive(Debug, Clone)]
pub struct Cells {
    range: CellRange,
    next: Option<CellAddress>,
}

impl Iterator for Cells {
    type Item = CellAddress;

    fn next(&mut self) -> Option<CellAddress> {
        let current = self.next?;
        let CellRange { start, end } = self.range;

        // Compare before stepping; a range may end at u32::MAX
        self.next = if current.col < end.col {
            Some(CellAddress::new(current.row, current.col + 1))
        } else if current.row < end.row {
            Some(CellAddress::new(current.row + 1, start.col))
        } else {
            None
        };
        Some(current)
    }
}
