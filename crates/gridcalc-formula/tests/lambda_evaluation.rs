//! End-to-end parsing and evaluation against a grid

use gridcalc_core::{parse_address, Grid, GridStore};
use gridcalc_formula::{
    dependencies_of, evaluate, evaluate_formula, parse, Environment, EvalError, EvaluationContext,
    FormulaError, ParseError, Value,
};
use pretty_assertions::assert_eq;

fn grid(cells: &[(&str, &str)]) -> Grid {
    let mut grid = Grid::new();
    for (addr, text) in cells {
        grid.set_text(parse_address(addr).unwrap(), text.to_string());
    }
    grid
}

fn eval(grid: &Grid, formula: &str) -> Result<Value, FormulaError> {
    evaluate_formula(formula, &EvaluationContext::new(grid))
}

#[test]
fn test_sum_skips_non_numeric_cells() {
    let g = grid(&[("A1", "1"), ("A2", "2"), ("A3", "x")]);
    assert_eq!(eval(&g, "=SUM(A1:A3)").unwrap(), Value::Number(3.0));
    assert_eq!(eval(&g, "=COUNT(A1:A3)").unwrap(), Value::Number(2.0));
    assert_eq!(eval(&g, "=MAX(A1:A3, 0.5)").unwrap(), Value::Number(2.0));
}

#[test]
fn test_average_of_empty_range_is_zero() {
    let g = grid(&[("B1", "text")]);
    assert_eq!(eval(&g, "=AVERAGE(B1:B9)").unwrap(), Value::Number(0.0));
    assert_eq!(eval(&g, "=AVERAGE()").unwrap(), Value::Number(0.0));
}

#[test]
fn test_division_by_zero_is_an_error() {
    let g = Grid::new();
    assert_eq!(
        eval(&g, "=10/0"),
        Err(FormulaError::Eval(EvalError::DivisionByZero))
    );
    // An empty cell reads as zero
    assert_eq!(
        eval(&g, "=10/A1"),
        Err(FormulaError::Eval(EvalError::DivisionByZero))
    );
}

#[test]
fn test_lambda_arity() {
    let g = Grid::new();
    assert!(matches!(
        eval(&g, "=LAMBDA(x, y, x+y)(1)"),
        Err(FormulaError::Eval(EvalError::ArityMismatch { actual: 1, .. }))
    ));
    assert_eq!(eval(&g, "=LAMBDA(x, y, x+y)(1, 2)").unwrap(), Value::Number(3.0));
}

#[test]
fn test_lambda_reads_cells_and_params() {
    let g = grid(&[("A1", "100"), ("B1", "7")]);
    let ast = parse("LAMBDA(A1, A1 + B1)(1)").unwrap();

    // The parameter shadows the cell, the free reference does not
    let deps = dependencies_of(&ast);
    assert!(!deps.contains(&parse_address("A1").unwrap()));
    assert!(deps.contains(&parse_address("B1").unwrap()));

    let ctx = EvaluationContext::new(&g);
    assert_eq!(
        evaluate(&ast, &ctx, &Environment::new()).unwrap(),
        Value::Number(8.0)
    );
}

#[test]
fn test_higher_order_lambda() {
    let g = grid(&[("A1", "3")]);
    assert_eq!(
        eval(&g, "=LAMBDA(f, f(f(A1)))(LAMBDA(n, n ^ 2))").unwrap(),
        Value::Number(81.0)
    );
}

#[test]
fn test_environment_seeds_symbols() {
    let ctx = EvaluationContext::simple();
    let ast = parse("LAMBDA(x, x * rate)(10)");
    assert!(matches!(
        ast,
        Err(ParseError::MissingFunctionCallParens { ref name, .. }) if name == "rate"
    ));

    let env = Environment::new().with("rate", Value::Number(0.5));
    let closure = match evaluate(&parse("LAMBDA(x, x + 1)").unwrap(), &ctx, &env).unwrap() {
        Value::Lambda(closure) => closure,
        other => panic!("expected a closure, got {:?}", other),
    };
    assert_eq!(closure.env.get("rate"), Some(&Value::Number(0.5)));
}

#[test]
fn test_logic_functions() {
    let g = grid(&[("A1", "TRUE"), ("A2", "0")]);
    assert_eq!(eval(&g, "=AND(A1, 1)").unwrap(), Value::Boolean(true));
    assert_eq!(eval(&g, "=OR(A2, FALSE)").unwrap(), Value::Boolean(false));
    assert_eq!(eval(&g, "=XOR(A1, A2, 1)").unwrap(), Value::Boolean(false));
    assert_eq!(eval(&g, "=NOT(A2)").unwrap(), Value::Boolean(true));
    assert_eq!(
        eval(&g, "=IF(A1, \"yes\", \"no\")").unwrap(),
        Value::Text("yes".into())
    );
}

#[test]
fn test_parse_errors_surface() {
    let g = Grid::new();
    assert!(matches!(
        eval(&g, "=1 +"),
        Err(FormulaError::Parse(ParseError::UnexpectedToken { .. }))
    ));
    assert!(matches!(
        eval(&g, "=SUM"),
        Err(FormulaError::Parse(ParseError::MissingFunctionCallParens { .. }))
    ));
    // A literal beyond f64 range never reaches evaluation as infinity
    assert!(matches!(
        eval(&g, &format!("={}", "9".repeat(400))),
        Err(FormulaError::Parse(ParseError::UnexpectedToken { .. }))
    ));
}
