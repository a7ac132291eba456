//! Cell references a formula reads

use crate::ast::Expr;
use gridcalc_core::CellAddress;
use std::collections::HashSet;

/// Every cell address an expression reads, with ranges expanded
///
/// Lambda parameters are symbols, not references, so they never appear here; the
/// parser already turns a cell-shaped parameter name into a symbol inside its body.
/// Cells referenced anywhere else in a lambda body are collected as usual.
pub fn dependencies_of(expr: &Expr) -> HashSet<CellAddress> {
    let mut deps = HashSet::new();
    collect(expr, &mut deps);
    deps
}

fn collect(expr: &Expr, deps: &mut HashSet<CellAddress>) {
    match expr {
        Expr::CellRef(addr) => {
            deps.insert(*addr);
        }
        Expr::RangeRef { .. } => {
            if let Some(range) = expr.range() {
                deps.extend(range.cells());
            }
        }
        Expr::UnaryOp { operand, .. } => collect(operand, deps),
        Expr::BinaryOp { left, right, .. } => {
            collect(left, deps);
            collect(right, deps);
        }
        Expr::Function { args, .. } => {
            for arg in args {
                collect(arg, deps);
            }
        }
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            collect(condition, deps);
            collect(then_branch, deps);
            collect(else_branch, deps);
        }
        Expr::Lambda { body, .. } => collect(body, deps),
        Expr::Invoke { callee, args } => {
            collect(callee, deps);
            for arg in args {
                collect(arg, deps);
            }
        }
        Expr::Number(_) | Expr::Text(_) | Expr::Boolean(_) | Expr::Symbol(_) => {}
    }
}
