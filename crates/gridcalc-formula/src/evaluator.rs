//! Formula evaluator
//!
//! Evaluates formula ASTs against a grid value provider and a lambda environment.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::environment::Environment;
use crate::error::{EvalError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use gridcalc_core::{CellAddress, CellRange, ErrorKind, GridProvider};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The built-in function registry
pub fn function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Default bound on nested lambda invocations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Value types during formula evaluation
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Range contents; aggregates flatten nested lists
    List(Vec<Value>),
    Error(ErrorKind),
    Lambda(Rc<Closure>),
}

/// A lambda together with the environment it was defined in
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub env: Environment,
}

impl Value {
    /// The number, when this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerce to boolean
    ///
    /// Numbers are true when non-zero; text must read `TRUE` or `FALSE` in any case, or be
    /// empty (false).
    pub fn to_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) if s.is_empty() || s.eq_ignore_ascii_case("FALSE") => Ok(false),
            Value::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
            other => Err(EvalError::type_mismatch(format!(
                "cannot use {} as a boolean",
                other.type_name()
            ))),
        }
    }

    /// Text shown in the grid for this value
    pub fn as_display(&self) -> String {
        match self {
            Value::Number(n) => {
                // No trailing ".0" for whole numbers
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::Error(e) => e.to_string(),
            Value::List(_) => ErrorKind::TypeMismatch.to_string(),
            Value::Lambda(_) => "#LAMBDA!".to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Error(_) => "error",
            Value::Lambda(_) => "lambda",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Interpret raw cell text as a finite number
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A finite number, or `InvalidNumber` naming the operation that produced it
pub(crate) fn finite(n: f64, operation: &str) -> Result<Value, EvalError> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(EvalError::InvalidNumber(format!("'{}' produced {}", operation, n)))
    }
}

struct EmptyGrid;

impl GridProvider for EmptyGrid {
    fn text_of(&self, _address: CellAddress) -> Option<&str> {
        None
    }
}

static EMPTY_GRID: EmptyGrid = EmptyGrid;

/// Context for formula evaluation
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Source of cell text
    pub grid: &'a dyn GridProvider,
    /// Bound on nested lambda invocations
    pub max_call_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(grid: &'a dyn GridProvider) -> Self {
        Self {
            grid,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Override the lambda call depth bound
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Get a cell value from the grid
    ///
    /// Missing or blank cells are zero, numeric text is a number and an error code is
    /// that error. Anything else is text.
    pub fn cell_value(&self, addr: CellAddress) -> Value {
        let text = match self.grid.text_of(addr) {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Value::Number(0.0),
        };

        if let Some(n) = parse_number(text) {
            return Value::Number(n);
        }
        match ErrorKind::from_code(text) {
            Some(kind) => Value::Error(kind),
            None => Value::Text(text.to_string()),
        }
    }

    /// The numeric cells of a range, row-major; other cells are skipped
    pub fn range_values(&self, range: CellRange) -> Value {
        let values = range
            .cells()
            .filter_map(|addr| self.grid.text_of(addr).and_then(parse_number))
            .map(Value::Number)
            .collect();
        Value::List(values)
    }
}

impl EvaluationContext<'static> {
    /// Create a simple context without any cells (for testing)
    pub fn simple() -> Self {
        Self::new(&EMPTY_GRID)
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("max_call_depth", &self.max_call_depth)
            .finish_non_exhaustive()
    }
}

/// Evaluate a formula expression
pub fn evaluate(
    expr: &Expr,
    ctx: &EvaluationContext,
    env: &Environment,
) -> Result<Value, EvalError> {
    Evaluator::new(ctx).eval(expr, env)
}

/// Call a closure with already evaluated arguments
pub fn invoke(
    closure: &Closure,
    args: Vec<Value>,
    ctx: &EvaluationContext,
) -> Result<Value, EvalError> {
    Evaluator::new(ctx).call(closure, args)
}

/// Parse and evaluate formula text in one step
///
/// # Example
/// ```rust
/// use gridcalc_formula::{evaluate_formula, EvaluationContext, Value};
///
/// let ctx = EvaluationContext::simple();
/// assert_eq!(evaluate_formula("=2*(3+4)", &ctx).unwrap(), Value::Number(14.0));
/// ```
pub fn evaluate_formula(formula: &str, ctx: &EvaluationContext) -> FormulaResult<Value> {
    let ast = parse_formula(formula)?;
    Ok(evaluate(&ast, ctx, &Environment::new())?)
}

struct Evaluator<'c, 'a> {
    ctx: &'c EvaluationContext<'a>,
    depth: usize,
}

impl<'c, 'a> Evaluator<'c, 'a> {
    fn new(ctx: &'c EvaluationContext<'a>) -> Self {
        Self { ctx, depth: 0 }
    }

    fn eval(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            // === Literals ===
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),

            // === References ===
            Expr::CellRef(addr) => Ok(self.ctx.cell_value(*addr)),
            Expr::RangeRef { start, end } => {
                Ok(self.ctx.range_values(CellRange::new(*start, *end)))
            }
            Expr::Symbol(name) => env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownName(name.clone())),

            // === Operators ===
            Expr::UnaryOp { op, operand } => {
                let value = self.eval(operand, env)?;
                evaluate_unary_op(*op, value)
            }
            Expr::BinaryOp { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                evaluate_binary_op(*op, left, right)
            }

            // === Calls ===
            Expr::Function { name, args } => self.eval_function(name, args, env),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.eval(condition, env)?;
                if condition.is_error() {
                    return Ok(condition);
                }
                if condition.to_bool()? {
                    self.eval(then_branch, env)
                } else {
                    self.eval(else_branch, env)
                }
            }
            Expr::Lambda { params, body } => Ok(Value::Lambda(Rc::new(Closure {
                params: params.clone(),
                body: Rc::clone(body),
                env: env.clone(),
            }))),
            Expr::Invoke { callee, args } => {
                let callee = self.eval(callee, env)?;
                let closure = match callee {
                    Value::Lambda(closure) => closure,
                    Value::Error(_) => return Ok(callee),
                    other => {
                        return Err(EvalError::type_mismatch(format!(
                            "{} is not callable",
                            other.type_name()
                        )))
                    }
                };
                let args = self.eval_args(args, env)?;
                self.call(&closure, args)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &Environment) -> Result<Vec<Value>, EvalError> {
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval(arg, env)?);
        }
        Ok(evaluated)
    }

    fn eval_function(
        &mut self,
        name: &str,
        args: &[Expr],
        env: &Environment,
    ) -> Result<Value, EvalError> {
        let func = function_registry()
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;

        func.check_arity(args.len())?;

        let evaluated = self.eval_args(args, env)?;
        (func.implementation)(&evaluated, self.ctx)
    }

    fn call(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, EvalError> {
        if args.len() != closure.params.len() {
            return Err(EvalError::ArityMismatch {
                callee: "LAMBDA".into(),
                expected: closure.params.len().to_string(),
                actual: args.len(),
            });
        }
        if self.depth >= self.ctx.max_call_depth {
            return Err(EvalError::CallDepthExceeded(self.ctx.max_call_depth));
        }

        // Bindings layer over the defining environment, not the caller's
        let env = closure.env.extend(closure.params.iter().cloned().zip(args));

        self.depth += 1;
        let result = self.eval(&closure.body, &env);
        self.depth -= 1;
        result
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, value: Value) -> Result<Value, EvalError> {
    if value.is_error() {
        return Ok(value);
    }

    match op {
        UnaryOperator::Not => Ok(Value::Boolean(!value.to_bool()?)),
        UnaryOperator::Negate | UnaryOperator::Plus => {
            let n = value.as_number().ok_or_else(|| {
                EvalError::type_mismatch(format!(
                    "cannot apply '{}' to {}",
                    op.symbol(),
                    value.type_name()
                ))
            })?;
            Ok(Value::Number(if op == UnaryOperator::Negate { -n } else { n }))
        }
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(op: BinaryOperator, left: Value, right: Value) -> Result<Value, EvalError> {
    // Propagate errors
    if left.is_error() {
        return Ok(left);
    }
    if right.is_error() {
        return Ok(right);
    }

    let apply: fn(f64, f64) -> f64 = match op {
        BinaryOperator::Add => |l, r| l + r,
        BinaryOperator::Subtract => |l, r| l - r,
        BinaryOperator::Multiply => |l, r| l * r,
        BinaryOperator::Divide => |l, r| l / r,
        BinaryOperator::Power => f64::powf,
        _ => return compare(op, &left, &right).map(Value::Boolean),
    };

    let (l, r) = match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(EvalError::type_mismatch(format!(
                "cannot apply '{}' to {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };

    if op == BinaryOperator::Divide && r == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    finite(apply(l, r), op.symbol())
}

/// Compare two values
///
/// Equality works across numbers, text and booleans, with values of different kinds
/// never equal. Ordering needs two numbers or two text values. Text compares
/// case-sensitively.
fn compare(op: BinaryOperator, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let comparable = |v: &Value| matches!(v, Value::Number(_) | Value::Text(_) | Value::Boolean(_));
    if !comparable(left) || !comparable(right) {
        return Err(EvalError::type_mismatch(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        )));
    }

    match op {
        BinaryOperator::Equal => return Ok(left == right),
        BinaryOperator::NotEqual => return Ok(left != right),
        _ => {}
    }

    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        _ => None,
    }
    .ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "cannot order {} against {}",
            left.type_name(),
            right.type_name()
        ))
    })?;

    Ok(match op {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}
