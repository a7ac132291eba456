//! Formula Abstract Syntax Tree types

use crate::error::EvalError;
use gridcalc_core::{CellAddress, CellRange};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Formula expression AST
///
/// Nodes are immutable once the parser has built them; re-parsing produces a new tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Text literal
    Text(String),
    /// Boolean literal
    Boolean(bool),

    // === References ===
    /// Single cell reference
    CellRef(CellAddress),
    /// Rectangular range reference, corners as written
    RangeRef { start: CellAddress, end: CellAddress },
    /// Lambda parameter placeholder
    Symbol(String),

    // === Operators ===
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // === Calls ===
    /// Function call; the name is stored uppercase
    Function { name: String, args: Vec<Expr> },
    /// `IF(condition, then, else)`, evaluating only the chosen branch
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Anonymous function
    Lambda { params: Vec<String>, body: Rc<Expr> },
    /// Invocation of a callable expression, e.g. `LAMBDA(x, x*2)(21)`
    Invoke { callee: Box<Expr>, args: Vec<Expr> },
}

impl Expr {
    /// Normalized range for a `RangeRef`
    pub fn range(&self) -> Option<CellRange> {
        match self {
            Expr::RangeRef { start, end } => Some(CellRange::new(*start, *end)),
            _ => None,
        }
    }

    /// Symbols used in this expression that no enclosing lambda inside it binds
    ///
    /// Parsing rejects unbound names, so a whole formula never has any.
    #[cfg(test)]
    pub(crate) fn free_symbols(&self) -> Vec<String> {
        let mut free = Vec::new();
        self.collect_free_symbols(&mut Vec::new(), &mut free);
        free
    }

    #[cfg(test)]
    fn collect_free_symbols<'a>(&'a self, bound: &mut Vec<&'a str>, free: &mut Vec<String>) {
        match self {
            Expr::Symbol(name) => {
                let is_bound = bound.iter().any(|b| b.eq_ignore_ascii_case(name));
                if !is_bound && !free.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                    free.push(name.clone());
                }
            }
            Expr::UnaryOp { operand, .. } => operand.collect_free_symbols(bound, free),
            Expr::BinaryOp { left, right, .. } => {
                left.collect_free_symbols(bound, free);
                right.collect_free_symbols(bound, free);
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_free_symbols(bound, free);
                }
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_symbols(bound, free);
                then_branch.collect_free_symbols(bound, free);
                else_branch.collect_free_symbols(bound, free);
            }
            Expr::Lambda { params, body } => {
                let depth = bound.len();
                bound.extend(params.iter().map(String::as_str));
                body.collect_free_symbols(bound, free);
                bound.truncate(depth);
            }
            Expr::Invoke { callee, args } => {
                callee.collect_free_symbols(bound, free);
                for arg in args {
                    arg.collect_free_symbols(bound, free);
                }
            }
            Expr::Number(_)
            | Expr::Text(_)
            | Expr::Boolean(_)
            | Expr::CellRef(_)
            | Expr::RangeRef { .. } => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::UnaryOp { .. } => 5,
            _ => 6,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Canonical symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Whether the operator compares its operands and yields a boolean
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            BinaryOperator::Multiply | BinaryOperator::Divide => 3,
            BinaryOperator::Power => 4,
            _ => 1,
        }
    }
}

impl FromStr for BinaryOperator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "^" => BinaryOperator::Power,
            "==" | "=" => BinaryOperator::Equal,
            "!=" | "<>" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterEqual,
            other => return Err(EvalError::UnknownOperator(other.to_string())),
        })
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Prefix `+`, numeric identity
    Plus,
    /// Prefix `-`
    Negate,
    /// Boolean inversion
    Not,
}

impl UnaryOperator {
    /// Canonical symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "NOT",
        }
    }
}

impl FromStr for UnaryOperator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(UnaryOperator::Plus),
            "-" => Ok(UnaryOperator::Negate),
            _ if s.eq_ignore_ascii_case("NOT") => Ok(UnaryOperator::Not),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

/// Prints formula text (without the leading `=`) that parses back to an equivalent tree
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Boolean(true) => f.write_str("TRUE"),
            Expr::Boolean(false) => f.write_str("FALSE"),
            Expr::CellRef(addr) => write!(f, "{}", addr),
            Expr::RangeRef { start, end } => write!(f, "{}:{}", start, end),
            Expr::Symbol(name) => f.write_str(name),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand,
            } => write!(f, "NOT({})", operand),
            Expr::UnaryOp { op, operand } => {
                f.write_str(op.symbol())?;
                write_operand(f, operand, matches!(**operand, Expr::BinaryOp { .. }))
            }
            Expr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                // `^` groups to the right, every other level to the left
                let (left_wrap, right_wrap) = if *op == BinaryOperator::Power {
                    (left.precedence() <= prec, right.precedence() < prec)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                write_operand(f, left, left_wrap)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right_wrap)
            }
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "IF({}, {}, {})", condition, then_branch, else_branch),
            Expr::Lambda { params, body } => {
                f.write_str("LAMBDA(")?;
                for param in params {
                    write!(f, "{}, ", param)?;
                }
                write!(f, "{})", body)
            }
            Expr::Invoke { callee, args } => {
                let bare = matches!(
                    **callee,
                    Expr::Lambda { .. } | Expr::Invoke { .. } | Expr::Symbol(_)
                );
                write_operand(f, callee, !bare)?;
                f.write_str("(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}
