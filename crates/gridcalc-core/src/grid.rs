//! The grid value provider interface and an in-memory grid

use crate::cell::CellAddress;
use ahash::AHashMap;

/// Read access to the current raw text of grid cells
///
/// This is the only capability the evaluator consumes. Lookups are in-memory and
/// non-blocking; `None` means the cell was never set.
pub trait GridProvider {
    /// Current raw text of a cell
    fn text_of(&self, address: CellAddress) -> Option<&str>;
}

/// A grid the recalculation scheduler can write computed values back into
pub trait GridStore: GridProvider {
    /// Replace a cell's text
    fn set_text(&mut self, address: CellAddress, text: String);

    /// Remove a cell's text entirely
    fn remove(&mut self, address: CellAddress);
}

/// Sparse in-memory grid of cell text
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: AHashMap<CellAddress, String>,
}

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells holding text
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell holds text
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All populated cells, sorted row-major
    pub fn cells(&self) -> Vec<(CellAddress, &str)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(addr, text)| (*addr, text.as_str()))
            .collect();
        cells.sort_by_key(|(addr, _)| *addr);
        cells
    }
}

impl GridProvider for Grid {
    fn text_of(&self, address: CellAddress) -> Option<&str> {
        self.cells.get(&address).map(String::as_str)
    }
}

impl GridStore for Grid {
    fn set_text(&mut self, address: CellAddress, text: String) {
        self.cells.insert(address, text);
    }

    fn remove(&mut self, address: CellAddress) {
        self.cells.remove(&address);
    }
}

impl<'a> FromIterator<(CellAddress, &'a str)> for Grid {
    fn from_iter<I: IntoIterator<Item = (CellAddress, &'a str)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(addr, text)| (addr, text.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_text() {
        let mut grid = Grid::new();
        let a1 = CellAddress::new(0, 0);

        assert_eq!(grid.text_of(a1), None);

        grid.set_text(a1, "5".into());
        assert_eq!(grid.text_of(a1), Some("5"));

        grid.set_text(a1, "hello".into());
        assert_eq!(grid.text_of(a1), Some("hello"));
        assert_eq!(grid.len(), 1);

        grid.remove(a1);
        assert_eq!(grid.text_of(a1), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_cells_sorted_row_major() {
        let grid: Grid = [
            (CellAddress::new(1, 0), "a2"),
            (CellAddress::new(0, 1), "b1"),
            (CellAddress::new(0, 0), "a1"),
        ]
        .into_iter()
        .collect();

        let order: Vec<_> = grid.cells().into_iter().map(|(_, text)| text).collect();
        assert_eq!(order, vec!["a1", "b1", "a2"]);
    }
}
