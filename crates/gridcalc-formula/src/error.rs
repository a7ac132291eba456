//! Formula error types

use gridcalc_core::{CellAddress, ErrorKind};
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors produced while turning formula text into an AST
///
/// Positions are byte offsets into the expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token that cannot start or continue an expression here, including spans the
    /// lexer could not recognise
    #[error("Unexpected token '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    /// A `(` that is never closed, or a `)` with no matching `(`
    #[error("Unmatched parenthesis at position {position}")]
    UnmatchedParen { position: usize },

    /// Tokens left over after a complete expression
    #[error("Unexpected input after expression at position {position}: '{remaining}'")]
    TrailingInput { position: usize, remaining: String },

    /// A LAMBDA whose parameters are not distinct bare names, or that has no body
    #[error("Invalid LAMBDA parameters at position {position}: {reason}")]
    InvalidLambdaParams { position: usize, reason: String },

    /// A bare name that is neither a function call nor a bound lambda parameter
    #[error("Expected '(' after function name '{name}' at position {position}")]
    MissingFunctionCallParens { name: String, position: usize },
}

/// Errors produced while evaluating an AST
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A symbol with no binding in the current environment
    #[error("Unknown name: {0}")]
    UnknownName(String),

    /// An operator symbol with no meaning
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// An operand or argument of the wrong type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Division with an exact zero divisor
    #[error("Division by zero")]
    DivisionByZero,

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {callee}: expected {expected}, got {actual}")]
    ArityMismatch {
        callee: String,
        expected: String,
        actual: usize,
    },

    /// A numeric result that is NaN or infinite
    #[error("Invalid numeric result: {0}")]
    InvalidNumber(String),

    /// Nested lambda invocations went deeper than allowed
    #[error("Lambda calls nested deeper than {0}")]
    CallDepthExceeded(usize),
}

impl EvalError {
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch(message.into())
    }

    /// The error code recorded as a cell value for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            EvalError::UnknownName(_) => ErrorKind::UnknownName,
            EvalError::UnknownOperator(_) => ErrorKind::UnknownOperator,
            EvalError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            EvalError::DivisionByZero => ErrorKind::DivisionByZero,
            EvalError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            EvalError::InvalidNumber(_) => ErrorKind::InvalidNumber,
            EvalError::CallDepthExceeded(_) => ErrorKind::CallDepthExceeded,
        }
    }
}

/// The dependency graph contains at least one cycle
///
/// `cells` holds every node that could not be ordered: the members of each cycle and
/// everything downstream of them, across the whole graph. `ordered` is the valid
/// partial order emitted before the algorithm stalled, limited to the requested cells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circular dependency detected among {} cell(s)", .cells.len())]
pub struct CircularDependencyError {
    pub cells: Vec<CellAddress>,
    pub ordered: Vec<CellAddress>,
}

/// Errors that can occur during formula parsing, evaluation or ordering
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Circular reference
    #[error(transparent)]
    CircularDependency(#[from] CircularDependencyError),
}

impl FormulaError {
    /// The error code recorded as a cell value for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Parse(_) => ErrorKind::Parse,
            FormulaError::Eval(e) => e.kind(),
            FormulaError::CircularDependency(_) => ErrorKind::CircularDependency,
        }
    }
}
