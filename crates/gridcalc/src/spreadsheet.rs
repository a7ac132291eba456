//! A grid paired with its recalculation engine

use crate::calculation::{CalculationOptions, RecalcStats, Recalculator};
use crate::error::Result;
use gridcalc_core::{CellAddress, Grid, GridProvider};
use gridcalc_formula::{evaluate_formula, EvaluationContext, Value};

/// An in-memory sheet addressed by A1-style references
///
/// Edits go through [`Spreadsheet::set`], which keeps every formula cell's displayed
/// text in step with the cells it reads.
#[derive(Debug, Default)]
pub struct Spreadsheet {
    grid: Grid,
    engine: Recalculator,
}

impl Spreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CalculationOptions) -> Self {
        Self {
            grid: Grid::new(),
            engine: Recalculator::with_options(options),
        }
    }

    /// Set a cell by reference, e.g. `sheet.set("B1", "=A1*2")`
    pub fn set(&mut self, reference: &str, text: &str) -> Result<RecalcStats> {
        let addr = CellAddress::parse(reference)?;
        Ok(self.set_cell(addr, text))
    }

    pub fn set_cell(&mut self, addr: CellAddress, text: &str) -> RecalcStats {
        self.engine.set_cell(&mut self.grid, addr, text)
    }

    /// Clear a cell by reference
    pub fn clear(&mut self, reference: &str) -> Result<RecalcStats> {
        let addr = CellAddress::parse(reference)?;
        Ok(self.engine.clear_cell(&mut self.grid, addr))
    }

    /// The text a cell displays; empty for an unset cell
    pub fn display(&self, reference: &str) -> Result<String> {
        let addr = CellAddress::parse(reference)?;
        Ok(self.grid.text_of(addr).unwrap_or_default().to_string())
    }

    /// The typed value of a cell
    ///
    /// Formula cells report their last computed value; other cells are read the way a
    /// formula reading them would see them.
    pub fn value(&self, reference: &str) -> Result<Value> {
        let addr = CellAddress::parse(reference)?;
        if let Some(value) = self.engine.value(addr) {
            return Ok(value.clone());
        }
        Ok(self.context().cell_value(addr))
    }

    /// The text as entered: `=<expression>` for a formula cell, the raw text otherwise
    pub fn formula_text(&self, reference: &str) -> Result<Option<String>> {
        let addr = CellAddress::parse(reference)?;
        match self.engine.formula(addr) {
            Some(formula) => Ok(Some(format!("={}", formula.text))),
            None => Ok(self.grid.text_of(addr).map(str::to_string)),
        }
    }

    /// Evaluate a formula against the current cells without storing it
    pub fn evaluate(&self, formula: &str) -> Result<Value> {
        Ok(evaluate_formula(formula, &self.context())?)
    }

    /// Recompute every formula cell
    pub fn recalculate(&mut self) -> RecalcStats {
        self.engine.recalculate_all(&mut self.grid)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn engine(&self) -> &Recalculator {
        &self.engine
    }

    fn context(&self) -> EvaluationContext<'_> {
        EvaluationContext::new(&self.grid).with_max_call_depth(self.engine.options().max_call_depth)
    }
}
