//! Error codes a cell can hold as its computed value

use std::fmt;

/// The kind of failure recorded as a cell's value when its formula cannot produce one
///
/// Errors are local to one formula: a failing cell stores its kind and displays the
/// matching code, while unrelated cells keep computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// #PARSE! - The formula text could not be parsed
    Parse,
    /// #NAME? - Unrecognized function name
    UnknownFunction,
    /// #NAME? - A symbol with no binding in the environment
    UnknownName,
    /// #OPERATOR! - Unrecognized operator symbol
    UnknownOperator,
    /// #VALUE! - Wrong type of argument or operand
    TypeMismatch,
    /// #DIV/0! - Division by zero
    DivisionByZero,
    /// #ARGS! - Wrong number of arguments for a lambda or function
    ArityMismatch,
    /// #NUM! - The result is not a finite number
    InvalidNumber,
    /// #CALC! - Nested lambda calls exceeded the configured depth
    CallDepthExceeded,
    /// #CIRCULAR! - The cell takes part in, or depends on, a dependency cycle
    CircularDependency,
}

impl ErrorKind {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "#PARSE!",
            ErrorKind::UnknownFunction => "#NAME?",
            ErrorKind::UnknownName => "#NAME?",
            ErrorKind::UnknownOperator => "#OPERATOR!",
            ErrorKind::TypeMismatch => "#VALUE!",
            ErrorKind::DivisionByZero => "#DIV/0!",
            ErrorKind::ArityMismatch => "#ARGS!",
            ErrorKind::InvalidNumber => "#NUM!",
            ErrorKind::CallDepthExceeded => "#CALC!",
            ErrorKind::CircularDependency => "#CIRCULAR!",
        }
    }

    /// Parse an error from its display code
    ///
    /// `#NAME?` is shared by two kinds and reads back as [`ErrorKind::UnknownName`].
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "#PARSE!" => ErrorKind::Parse,
            "#NAME?" => ErrorKind::UnknownName,
            "#OPERATOR!" => ErrorKind::UnknownOperator,
            "#VALUE!" => ErrorKind::TypeMismatch,
            "#DIV/0!" => ErrorKind::DivisionByZero,
            "#ARGS!" => ErrorKind::ArityMismatch,
            "#NUM!" => ErrorKind::InvalidNumber,
            "#CALC!" => ErrorKind::CallDepthExceeded,
            "#CIRCULAR!" => ErrorKind::CircularDependency,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_read_back() {
        for kind in [
            ErrorKind::Parse,
            ErrorKind::UnknownOperator,
            ErrorKind::TypeMismatch,
            ErrorKind::DivisionByZero,
            ErrorKind::ArityMismatch,
            ErrorKind::InvalidNumber,
            ErrorKind::CallDepthExceeded,
            ErrorKind::CircularDependency,
        ] {
            assert_eq!(ErrorKind::from_code(kind.as_str()), Some(kind));
        }
        assert_eq!(
            ErrorKind::from_code(ErrorKind::UnknownFunction.as_str()),
            Some(ErrorKind::UnknownName)
        );
        assert_eq!(ErrorKind::from_code("#div/0!"), None);
        assert_eq!(ErrorKind::from_code("hello"), None);
    }
}
