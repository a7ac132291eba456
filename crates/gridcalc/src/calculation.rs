//! Incremental recalculation engine
//!
//! Owns the formulas attached to grid cells and the dependency graph between them. Every
//! edit re-installs the edited cell's edges, then recomputes the cell and all of its
//! transitive dependents exactly once, in an order where each cell follows every cell
//! it reads.
//!
//! # Example
//!
//! ```rust
//! use gridcalc::{CellAddress, Grid, GridProvider, Recalculator};
//!
//! let mut grid = Grid::new();
//! let mut engine = Recalculator::new();
//! let a1 = CellAddress::new(0, 0);
//! let b1 = CellAddress::new(0, 1);
//!
//! engine.set_cell(&mut grid, a1, "5");
//! engine.set_cell(&mut grid, b1, "=A1*2");
//! assert_eq!(grid.text_of(b1), Some("10"));
//!
//! let stats = engine.set_cell(&mut grid, a1, "7");
//! assert_eq!(stats.recalculated, vec![b1]);
//! assert_eq!(grid.text_of(b1), Some("14"));
//! ```

use ahash::AHashMap;
use gridcalc_core::{CellAddress, ErrorKind, GridProvider, GridStore};
use gridcalc_formula::{
    dependencies_of, evaluate, parse, DependencyGraph, Environment, EvaluationContext, Expr,
    Value, DEFAULT_MAX_CALL_DEPTH,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Options for recalculation
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Recompute the edited cell and its dependents on every edit (default: true)
    ///
    /// When disabled, edits only install formulas and edges; call
    /// [`Recalculator::recalculate_all`] to bring values up to date.
    pub auto_recalculate: bool,
    /// Maximum depth of nested lambda calls (default: 128)
    pub max_call_depth: usize,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            auto_recalculate: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Statistics from a recalculation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcStats {
    /// Formula cells recomputed, in evaluation order
    pub recalculated: Vec<CellAddress>,
    /// Number of recomputed cells whose value is an error
    pub errors: usize,
    /// Number of formula cells left unevaluated because of a dependency cycle
    pub circular_references: usize,
}

/// A formula attached to a cell
#[derive(Debug, Clone)]
pub struct Formula {
    /// Expression text, without the leading `=`
    pub text: String,
    /// Parsed AST, absent when the text failed to parse
    pub ast: Option<Expr>,
    /// Last computed value, absent until the first recalculation
    pub value: Option<Value>,
}

impl Formula {
    fn parse(text: &str) -> Self {
        let ast = match parse(text) {
            Ok(ast) => Some(ast),
            Err(e) => {
                debug!(formula = text, error = %e, "formula failed to parse");
                None
            }
        };

        Self {
            text: text.to_string(),
            ast,
            value: None,
        }
    }
}

/// The recalculation scheduler
#[derive(Debug, Default)]
pub struct Recalculator {
    options: CalculationOptions,
    /// Dependency graph built from formulas
    graph: DependencyGraph,
    /// Formulas, keyed by the cell holding them
    formulas: AHashMap<CellAddress, Formula>,
}

impl Recalculator {
    /// Create a scheduler with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with custom options
    pub fn with_options(options: CalculationOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current options
    pub fn options(&self) -> &CalculationOptions {
        &self.options
    }

    /// The dependency graph between cells
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The formula attached to a cell
    pub fn formula(&self, addr: CellAddress) -> Option<&Formula> {
        self.formulas.get(&addr)
    }

    /// Last computed value of a formula cell
    pub fn value(&self, addr: CellAddress) -> Option<&Value> {
        self.formulas.get(&addr).and_then(|f| f.value.as_ref())
    }

    /// All formula cells, sorted row-major
    pub fn formula_cells(&self) -> Vec<CellAddress> {
        let mut cells: Vec<_> = self.formulas.keys().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Set a cell's text
    ///
    /// Text starting with `=` attaches a formula and replaces the cell's dependency edges
    /// with the references it reads. Any other text is a plain value and drops the
    /// cell's formula and edges; empty text clears the cell. Cells that read this one
    /// keep their edges either way.
    pub fn set_cell<G: GridStore>(
        &mut self,
        grid: &mut G,
        addr: CellAddress,
        text: &str,
    ) -> RecalcStats {
        debug!(cell = %addr, text, "cell edited");

        match text.strip_prefix('=') {
            Some(expression) => {
                let formula = Formula::parse(expression);
                let deps = formula.ast.as_ref().map(dependencies_of).unwrap_or_default();
                self.graph.set_dependencies(addr, deps);
                self.formulas.insert(addr, formula);
                grid.remove(addr);
            }
            None => {
                self.formulas.remove(&addr);
                self.graph.set_dependencies(addr, []);
                if text.is_empty() {
                    grid.remove(addr);
                } else {
                    grid.set_text(addr, text.to_string());
                }
            }
        }

        if self.options.auto_recalculate {
            self.recalculate_dependents(grid, addr)
        } else {
            RecalcStats::default()
        }
    }

    /// Remove a cell's text and formula
    pub fn clear_cell<G: GridStore>(&mut self, grid: &mut G, addr: CellAddress) -> RecalcStats {
        self.set_cell(grid, addr, "")
    }

    /// Recompute `addr` (when it holds a formula) and every cell that transitively reads it
    pub fn recalculate_dependents<G: GridStore>(
        &mut self,
        grid: &mut G,
        addr: CellAddress,
    ) -> RecalcStats {
        let seeds: HashSet<CellAddress> = [addr].into_iter().collect();
        self.recalculate_from(grid, &seeds)
    }

    /// Recompute every formula cell
    pub fn recalculate_all<G: GridStore>(&mut self, grid: &mut G) -> RecalcStats {
        let seeds: HashSet<CellAddress> = self.formulas.keys().copied().collect();
        self.recalculate_from(grid, &seeds)
    }

    fn recalculate_from<G: GridStore>(
        &mut self,
        grid: &mut G,
        seeds: &HashSet<CellAddress>,
    ) -> RecalcStats {
        let mut stats = RecalcStats::default();

        let order = match self.graph.topological_order(Some(seeds)) {
            Ok(order) => order,
            Err(e) => {
                warn!(cells = ?e.cells, "circular dependency blocks recalculation");
                self.mark_circular(grid, seeds, &e.cells, &mut stats);
                return stats;
            }
        };

        for cell in order {
            if let Some(value) = self.recalculate_cell(grid, cell) {
                if value.is_error() {
                    stats.errors += 1;
                }
                stats.recalculated.push(cell);
            }
        }

        stats
    }

    /// Record `#CIRCULAR!` on the formula cells of this pass caught in a cycle
    ///
    /// Nothing else is recomputed while any cycle exists; other affected cells keep their
    /// last value until the cycle is broken.
    fn mark_circular<G: GridStore>(
        &mut self,
        grid: &mut G,
        seeds: &HashSet<CellAddress>,
        blocked: &[CellAddress],
        stats: &mut RecalcStats,
    ) {
        let affected = self.graph.affected(seeds.iter().copied());
        let circular = Value::Error(ErrorKind::CircularDependency);
        for cell in blocked.iter().filter(|cell| affected.contains(*cell)) {
            if let Some(formula) = self.formulas.get_mut(cell) {
                formula.value = Some(circular.clone());
                grid.set_text(*cell, circular.as_display());
                stats.circular_references += 1;
            }
        }
    }

    /// Evaluate one formula cell and write its display value to the grid
    fn recalculate_cell<G: GridStore>(&mut self, grid: &mut G, cell: CellAddress) -> Option<Value> {
        let formula = self.formulas.get(&cell)?;

        let value = match &formula.ast {
            None => Value::Error(ErrorKind::Parse),
            Some(ast) => {
                let provider: &dyn GridProvider = &*grid;
                let ctx =
                    EvaluationContext::new(provider).with_max_call_depth(self.options.max_call_depth);
                match evaluate(ast, &ctx, &Environment::new()) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!(cell = %cell, error = %e, "formula evaluation failed");
                        Value::Error(e.kind())
                    }
                }
            }
        };

        debug!(cell = %cell, value = %value, "recalculated");
        grid.set_text(cell, value.as_display());
        if let Some(formula) = self.formulas.get_mut(&cell) {
            formula.value = Some(value.clone());
        }
        Some(value)
    }
}
