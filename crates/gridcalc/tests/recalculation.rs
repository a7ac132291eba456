//! Recalculation through the spreadsheet API

use gridcalc::prelude::*;
use pretty_assertions::assert_eq;

fn cells(refs: &[&str]) -> Vec<CellAddress> {
    refs.iter().map(|r| CellAddress::parse(r).unwrap()).collect()
}

/// Editing an input recomputes its readers in dependency order
#[test]
fn test_edit_propagates_in_order() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "5").unwrap();
    sheet.set("B1", "=A1*2").unwrap();
    sheet.set("C1", "=SUM(A1:B1)").unwrap();
    assert_eq!(sheet.display("C1").unwrap(), "15");

    let stats = sheet.set("A1", "7").unwrap();
    assert_eq!(stats.recalculated, cells(&["B1", "C1"]));
    assert_eq!(stats.errors, 0);
    assert_eq!(sheet.display("B1").unwrap(), "14");
    assert_eq!(sheet.display("C1").unwrap(), "21");
}

/// A cell read along two paths is computed once, after both
#[test]
fn test_diamond_computes_each_cell_once() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "1").unwrap();
    sheet.set("B1", "=A1+1").unwrap();
    sheet.set("A2", "=A1*10").unwrap();
    sheet.set("B2", "=B1+A2").unwrap();

    let stats = sheet.set("A1", "2").unwrap();
    assert_eq!(stats.recalculated, cells(&["B1", "A2", "B2"]));
    assert_eq!(sheet.display("B2").unwrap(), "23");
}

/// Cells that only read unrelated inputs are left alone
#[test]
fn test_unaffected_cells_not_recomputed() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "1").unwrap();
    sheet.set("A2", "2").unwrap();
    sheet.set("B1", "=A1").unwrap();
    sheet.set("B2", "=A2").unwrap();

    let stats = sheet.set("A2", "5").unwrap();
    assert_eq!(stats.recalculated, cells(&["B2"]));
}

#[test]
fn test_cycle_marks_cells_circular() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "=B1+1").unwrap();
    let stats = sheet.set("B1", "=A1+1").unwrap();

    assert_eq!(stats.circular_references, 2);
    assert!(stats.recalculated.is_empty());
    assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("B1").unwrap(), "#CIRCULAR!");
    assert_eq!(
        sheet.value("A1").unwrap(),
        Value::Error(ErrorKind::CircularDependency)
    );
}

/// Breaking a cycle recomputes the cells it blocked
#[test]
fn test_cycle_recovery() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "3").unwrap();
    sheet.set("B1", "=A1+C1").unwrap();
    sheet.set("C1", "=B1").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "#CIRCULAR!");

    let stats = sheet.set("C1", "4").unwrap();
    assert_eq!(stats.circular_references, 0);
    assert_eq!(sheet.display("B1").unwrap(), "7");
}

/// While any cycle exists no formula is recomputed, even one the cycle never reaches
#[test]
fn test_unrelated_cycle_blocks_recalculation() {
    let mut sheet = Spreadsheet::new();
    sheet.set("C1", "1").unwrap();
    sheet.set("D1", "=C1*2").unwrap();
    sheet.set("A1", "=B1").unwrap();
    sheet.set("B1", "=A1").unwrap();
    assert_eq!(sheet.display("D1").unwrap(), "2");

    let stats = sheet.set("C1", "5").unwrap();
    assert!(stats.recalculated.is_empty());
    assert_eq!(stats.circular_references, 0);
    assert_eq!(sheet.display("D1").unwrap(), "2");
    assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");

    let stats = sheet.set("B1", "1").unwrap();
    assert_eq!(stats.recalculated, cells(&["A1"]));
    assert_eq!(sheet.display("A1").unwrap(), "1");

    sheet.recalculate();
    assert_eq!(sheet.display("D1").unwrap(), "10");
}

/// An error in one cell does not stop other cells from computing
#[test]
fn test_errors_are_isolated() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "0").unwrap();
    sheet.set("B1", "=1/A1").unwrap();
    sheet.set("B2", "=A1+1").unwrap();

    let stats = sheet.set("A1", "0").unwrap();
    assert_eq!(stats.recalculated, cells(&["B1", "B2"]));
    assert_eq!(stats.errors, 1);
    assert_eq!(sheet.display("B1").unwrap(), "#DIV/0!");
    assert_eq!(sheet.display("B2").unwrap(), "1");
}

/// Re-entering a formula replaces its old references
#[test]
fn test_edges_are_replaced() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "1").unwrap();
    sheet.set("A2", "2").unwrap();
    sheet.set("B1", "=A1").unwrap();
    sheet.set("B1", "=A2").unwrap();

    let stats = sheet.set("A1", "100").unwrap();
    assert!(stats.recalculated.is_empty());
    assert_eq!(
        sheet.engine().graph().dependencies(cells(&["B1"])[0]).collect::<Vec<_>>(),
        cells(&["A2"])
    );
}

#[test]
fn test_parse_error_cell() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "=SUM(1,").unwrap();
    sheet.set("B1", "=A1+1").unwrap();

    assert_eq!(sheet.display("A1").unwrap(), "#PARSE!");
    assert_eq!(sheet.display("B1").unwrap(), "#PARSE!");
    assert_eq!(sheet.formula_text("A1").unwrap().as_deref(), Some("=SUM(1,"));
}

#[test]
fn test_lambda_cells() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "6").unwrap();
    sheet.set("B1", "=LAMBDA(x, x * x)(A1)").unwrap();
    sheet.set("C1", "=LAMBDA(f, f(A1) + 1)(LAMBDA(n, n / 2))").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "36");
    assert_eq!(sheet.display("C1").unwrap(), "4");

    sheet.set("A1", "10").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "100");
    assert_eq!(sheet.display("C1").unwrap(), "6");
}

#[test]
fn test_manual_mode() {
    let mut sheet = Spreadsheet::with_options(CalculationOptions {
        auto_recalculate: false,
        ..Default::default()
    });
    sheet.set("A1", "2").unwrap();
    sheet.set("B1", "=A1+A1").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "");

    let stats = sheet.recalculate();
    assert_eq!(stats.recalculated, cells(&["B1"]));
    assert_eq!(sheet.display("B1").unwrap(), "4");
}

#[test]
fn test_text_and_comparison() {
    let mut sheet = Spreadsheet::new();
    sheet.set("A1", "apple").unwrap();
    sheet.set("B1", "=IF(A1 == \"apple\", \"yes\", \"no\")").unwrap();
    sheet.set("C1", "=A1 < \"banana\"").unwrap();

    assert_eq!(sheet.display("B1").unwrap(), "yes");
    assert_eq!(sheet.display("C1").unwrap(), "TRUE");
}
