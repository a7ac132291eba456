//! # gridcalc-formula
//!
//! Formula language for gridcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST), with `LAMBDA` closures
//! - Cell reference extraction (AST → set of addresses)
//! - Formula evaluation (AST → value) against a [`GridProvider`](gridcalc_core::GridProvider)
//! - Built-in logical and aggregate functions
//! - Dependency tracking with ordered, cycle-checked recalculation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellAddress, Grid, GridStore};
//! use gridcalc_formula::{dependencies_of, evaluate, parse, Environment, EvaluationContext, Value};
//!
//! let mut grid = Grid::new();
//! grid.set_text(CellAddress::new(0, 0), "5".into());
//!
//! let ast = parse("A1 * 2").unwrap();
//! assert!(dependencies_of(&ast).contains(&CellAddress::new(0, 0)));
//!
//! let ctx = EvaluationContext::new(&grid);
//! let value = evaluate(&ast, &ctx, &Environment::new()).unwrap();
//! assert_eq!(value, Value::Number(10.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod references;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use environment::Environment;
pub use error::{CircularDependencyError, EvalError, FormulaError, FormulaResult, ParseError};
pub use evaluator::{
    evaluate, evaluate_formula, function_registry, invoke, Closure, EvaluationContext, Value,
    DEFAULT_MAX_CALL_DEPTH,
};
pub use functions::FunctionRegistry;
pub use parser::{parse, parse_formula};
pub use references::dependencies_of;
