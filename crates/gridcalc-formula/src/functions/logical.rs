//! Logical functions

use crate::error::EvalError;
use crate::evaluator::{EvaluationContext, Value};

/// Boolean-coerce every argument, flattening lists
///
/// Returns the first error value encountered instead, if any.
fn coerce_all(args: &[Value]) -> Result<Result<Vec<bool>, Value>, EvalError> {
    let mut flags = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Error(_) => return Ok(Err(arg.clone())),
            Value::List(items) => match coerce_all(items)? {
                Ok(inner) => flags.extend(inner),
                Err(error) => return Ok(Err(error)),
            },
            other => flags.push(other.to_bool()?),
        }
    }
    Ok(Ok(flags))
}

/// IF function
pub fn fn_if(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let (condition, if_true) = match args {
        [condition, if_true, ..] => (condition, if_true),
        _ => {
            return Err(EvalError::ArityMismatch {
                callee: "IF".into(),
                expected: "at least 2".into(),
                actual: args.len(),
            })
        }
    };

    if condition.is_error() {
        return Ok(condition.clone());
    }

    if condition.to_bool()? {
        Ok(if_true.clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Boolean(false)))
    }
}

/// AND function
pub fn fn_and(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(match coerce_all(args)? {
        Ok(flags) => Value::Boolean(flags.iter().all(|b| *b)),
        Err(error) => error,
    })
}

/// OR function
pub fn fn_or(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(match coerce_all(args)? {
        Ok(flags) => Value::Boolean(flags.iter().any(|b| *b)),
        Err(error) => error,
    })
}

/// XOR function: true when an odd number of arguments are true
pub fn fn_xor(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    Ok(match coerce_all(args)? {
        Ok(flags) => Value::Boolean(flags.iter().filter(|b| **b).count() % 2 == 1),
        Err(error) => error,
    })
}

/// NOT function
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> Result<Value, EvalError> {
    match args {
        [value] if value.is_error() => Ok(value.clone()),
        [value] => Ok(Value::Boolean(!value.to_bool()?)),
        _ => Err(EvalError::ArityMismatch {
            callee: "NOT".into(),
            expected: "1".into(),
            actual: args.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::ErrorKind;

    fn call(f: crate::functions::FunctionImpl, args: &[Value]) -> Result<Value, EvalError> {
        f(args, &EvaluationContext::simple())
    }

    #[test]
    fn test_if() {
        let args = [Value::Boolean(true), Value::from("yes"), Value::from("no")];
        assert_eq!(call(fn_if, &args), Ok(Value::from("yes")));

        let args = [Value::Number(0.0), Value::from("yes")];
        assert_eq!(call(fn_if, &args), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_and_or() {
        let args = [Value::Boolean(true), Value::Number(1.0), Value::from("TRUE")];
        assert_eq!(call(fn_and, &args), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_or, &args), Ok(Value::Boolean(true)));

        let args = [Value::Boolean(true), Value::Number(0.0)];
        assert_eq!(call(fn_and, &args), Ok(Value::Boolean(false)));
        assert_eq!(call(fn_or, &args), Ok(Value::Boolean(true)));

        let args = [Value::List(vec![Value::Number(0.0), Value::Number(0.0)])];
        assert_eq!(call(fn_or, &args), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_xor() {
        let args = [Value::Boolean(true), Value::Boolean(true), Value::Boolean(true)];
        assert_eq!(call(fn_xor, &args), Ok(Value::Boolean(true)));

        let args = [Value::Boolean(true), Value::Number(5.0)];
        assert_eq!(call(fn_xor, &args), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_not() {
        assert_eq!(call(fn_not, &[Value::Boolean(false)]), Ok(Value::Boolean(true)));
        assert_eq!(call(fn_not, &[Value::Number(3.0)]), Ok(Value::Boolean(false)));
        assert!(matches!(
            call(fn_not, &[Value::from("maybe")]),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_errors_propagate() {
        let error = Value::Error(ErrorKind::DivisionByZero);
        assert_eq!(call(fn_and, &[Value::Boolean(true), error.clone()]), Ok(error.clone()));
        assert_eq!(call(fn_not, &[error.clone()]), Ok(error.clone()));
        assert_eq!(call(fn_if, &[error.clone(), Value::Number(1.0)]), Ok(error));
    }
}
