//! Built-in functions

pub mod logical;
pub mod math;

use crate::error::EvalError;
use crate::evaluator::{EvaluationContext, Value};
use std::collections::HashMap;

/// Function implementation signature
///
/// Arguments arrive already evaluated, in call order.
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> Result<Value, EvalError>;

/// A built-in function and the argument counts it accepts
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    const fn fixed(
        name: &'static str,
        min_args: usize,
        max_args: usize,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
            implementation,
        }
    }

    const fn variadic(name: &'static str, min_args: usize, implementation: FunctionImpl) -> Self {
        Self {
            name,
            min_args,
            max_args: None,
            implementation,
        }
    }

    /// `ArityMismatch` unless `count` arguments are accepted
    pub fn check_arity(&self, count: usize) -> Result<(), EvalError> {
        let expected = match self.max_args {
            _ if count < self.min_args => format!("at least {}", self.min_args),
            Some(max) if count > max => format!("at most {}", max),
            _ => return Ok(()),
        };
        Err(EvalError::ArityMismatch {
            callee: self.name.to_string(),
            expected,
            actual: count,
        })
    }
}

// IF with three arguments is lowered to a lazy conditional by the parser, so only the
// two-argument form reaches `fn_if`. Aggregates accept an empty argument list.
const BUILTINS: &[FunctionDef] = &[
    FunctionDef::fixed("IF", 2, 3, logical::fn_if),
    FunctionDef::variadic("AND", 1, logical::fn_and),
    FunctionDef::variadic("OR", 1, logical::fn_or),
    FunctionDef::variadic("XOR", 1, logical::fn_xor),
    FunctionDef::fixed("NOT", 1, 1, logical::fn_not),
    FunctionDef::variadic("SUM", 0, math::fn_sum),
    FunctionDef::variadic("AVERAGE", 0, math::fn_average),
    FunctionDef::variadic("MIN", 0, math::fn_min),
    FunctionDef::variadic("MAX", 0, math::fn_max),
    FunctionDef::variadic("COUNT", 0, math::fn_count),
];

/// Name-keyed lookup over the built-in functions
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::with_capacity(BUILTINS.len()),
        };
        for def in BUILTINS {
            registry.register(*def);
        }
        registry
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add or replace a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_ascii_uppercase(), def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
