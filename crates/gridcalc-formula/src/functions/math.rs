//! Aggregate math functions
//!
//! Every aggregate flattens its arguments first: numbers are kept at any list depth,
//! text, booleans and lambdas are ignored, and the first error value wins.

use crate::error::EvalError;
use crate::evaluator::{finite, EvaluationContext, Value};

/// Flatten arguments into their numbers, or the first error value found
fn flatten_numbers(args: &[Value]) -> Result<Vec<f64>, Value> {
    let mut numbers = Vec::new();
    collect_numbers(args, &mut numbers)?;
    Ok(numbers)
}

fn collect_numbers(args: &[Value], numbers: &mut Vec<f64>) -> Result<(), Value> {
    for arg in args {
        match arg {
            Value::Number(n) => numbers.push(*n),
            Value::List(items) => collect_numbers(items, numbers)?,
            Value::Error(_) => return Err(arg.clone()),
            _ => {} // Ignore non-numeric
        }
    }
    Ok(())
}

/// SUM function
pub fn fn_sum(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match flatten_numbers(args) {
        Ok(numbers) => finite(numbers.iter().sum(), "SUM"),
        Err(error) => Ok(error),
    }
}

/// AVERAGE function; zero when there is nothing to average
pub fn fn_average(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match flatten_numbers(args) {
        Ok(numbers) if numbers.is_empty() => Ok(Value::Number(0.0)),
        Ok(numbers) => {
            let sum: f64 = numbers.iter().sum();
            finite(sum / numbers.len() as f64, "AVERAGE")
        }
        Err(error) => Ok(error),
    }
}

/// MIN function; zero when there are no numbers
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match flatten_numbers(args) {
        Ok(numbers) => Ok(Value::Number(
            numbers.into_iter().reduce(f64::min).unwrap_or(0.0),
        )),
        Err(error) => Ok(error),
    }
}

/// MAX function; zero when there are no numbers
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match flatten_numbers(args) {
        Ok(numbers) => Ok(Value::Number(
            numbers.into_iter().reduce(f64::max).unwrap_or(0.0),
        )),
        Err(error) => Ok(error),
    }
}

/// COUNT function: how many numbers the arguments hold
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match flatten_numbers(args) {
        Ok(numbers) => Ok(Value::Number(numbers.len() as f64)),
        Err(error) => Ok(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::ErrorKind;

    fn call(f: crate::functions::FunctionImpl, args: &[Value]) -> Result<Value, EvalError> {
        f(args, &EvaluationContext::simple())
    }

    fn list(numbers: &[f64]) -> Value {
        Value::List(numbers.iter().copied().map(Value::Number).collect())
    }

    #[test]
    fn test_sum() {
        let args = [list(&[1.0, 2.0]), Value::Number(3.0), Value::from("x")];
        assert_eq!(call(fn_sum, &args), Ok(Value::Number(6.0)));
        assert_eq!(call(fn_sum, &[]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_average() {
        assert_eq!(call(fn_average, &[list(&[1.0, 2.0, 6.0])]), Ok(Value::Number(3.0)));
        assert_eq!(call(fn_average, &[list(&[])]), Ok(Value::Number(0.0)));
        assert_eq!(call(fn_average, &[]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_min_max() {
        let args = [list(&[4.0, -2.0]), Value::Number(9.0), Value::Boolean(true)];
        assert_eq!(call(fn_min, &args), Ok(Value::Number(-2.0)));
        assert_eq!(call(fn_max, &args), Ok(Value::Number(9.0)));
        assert_eq!(call(fn_min, &[list(&[])]), Ok(Value::Number(0.0)));
        assert_eq!(call(fn_max, &[Value::from("a")]), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_count_only_numbers() {
        let nested = Value::List(vec![list(&[1.0]), Value::Number(2.0)]);
        let args = [nested, Value::from("3"), Value::Boolean(true)];
        assert_eq!(call(fn_count, &args), Ok(Value::Number(2.0)));
    }

    #[test]
    fn test_errors_propagate() {
        let error = Value::Error(ErrorKind::InvalidNumber);
        assert_eq!(call(fn_sum, &[Value::Number(1.0), error.clone()]), Ok(error.clone()));
        assert_eq!(call(fn_count, &[error.clone()]), Ok(error));
    }

    #[test]
    fn test_overflowing_sum() {
        let args = [Value::Number(f64::MAX), Value::Number(f64::MAX)];
        assert!(matches!(call(fn_sum, &args), Err(EvalError::InvalidNumber(_))));
    }
}
