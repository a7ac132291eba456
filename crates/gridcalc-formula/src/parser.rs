//! Formula parser
//!
//! A recursive descent parser over the lexer's tokens with proper operator precedence.
//! From loosest to tightest: comparison, additive, multiplicative, `^` (right
//! associative), prefix `+`/`-`, then primaries with optional postfix invocation.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};
use gridcalc_core::parse_address;
use std::rc::Rc;

const COMPARISON_OPERATORS: &[&str] = &["==", "=", "!=", "<>", "<", ">", "<=", ">="];
const ADDITIVE_OPERATORS: &[&str] = &["+", "-"];
const MULTIPLICATIVE_OPERATORS: &[&str] = &["*", "/"];

/// Parse expression text (without the leading `=`) into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse;
///
/// let ast = parse("1+2").unwrap();
/// let ast = parse("SUM(A1:A10)").unwrap();
/// let ast = parse("LAMBDA(x, y, x+y)(1, 2)").unwrap();
/// ```
pub fn parse(expression: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(expression);
    let expr = parser.parse_expression()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse formula text, accepting an optional leading `=`
///
/// Error positions are relative to the text after the marker.
pub fn parse_formula(formula: &str) -> Result<Expr, ParseError> {
    let formula = formula.trim_start();
    parse(formula.strip_prefix('=').unwrap_or(formula))
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    paren_depth: usize,
    /// Parameters of every enclosing lambda, innermost last
    scope: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: tokenize(input),
            pos: 0,
            paren_depth: 0,
            scope: Vec::new(),
        }
    }

    // === Token access ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn current_position(&self) -> usize {
        self.peek().map_or(self.input.len(), |t| t.position)
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(token) if token.kind == TokenKind::RightParen && self.paren_depth == 0 => {
                ParseError::UnmatchedParen {
                    position: token.position,
                }
            }
            Some(token) => ParseError::UnexpectedToken {
                found: token.describe(),
                position: token.position,
            },
            None => ParseError::UnexpectedToken {
                found: "end of input".into(),
                position: self.input.len(),
            },
        }
    }

    /// Make sure we consumed all input
    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) if matches!(token.kind, TokenKind::RightParen | TokenKind::Invalid(_)) => {
                Err(self.unexpected())
            }
            Some(token) => Err(ParseError::TrailingInput {
                position: token.position,
                remaining: self.input[token.position..].trim_end().to_string(),
            }),
        }
    }

    /// Consume the closing paren of a group opened at `open`
    fn expect_close(&mut self, open: usize) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::RightParen) => {
                self.pos += 1;
                self.paren_depth -= 1;
                Ok(())
            }
            None => Err(ParseError::UnmatchedParen { position: open }),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn match_operator(&mut self, symbols: &[&str]) -> Option<BinaryOperator> {
        let op = match self.peek_kind() {
            Some(TokenKind::Operator(symbol)) if symbols.contains(symbol) => symbol.parse().ok(),
            _ => None,
        };
        if op.is_some() {
            self.pos += 1;
        }
        op
    }

    /// The spelling of an enclosing lambda parameter matching `name`
    fn bound_name(&self, name: &str) -> Option<String> {
        self.scope
            .iter()
            .rev()
            .find(|param| param.eq_ignore_ascii_case(name))
            .cloned()
    }

    // === Expression parsing ===

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_comparison()
    }

    fn parse_left_associative(
        &mut self,
        symbols: &[&str],
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = operand(self)?;

        while let Some(op) = self.match_operator(symbols) {
            let right = operand(self)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_associative(COMPARISON_OPERATORS, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_associative(ADDITIVE_OPERATORS, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_left_associative(MULTIPLICATIVE_OPERATORS, Self::parse_power)
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;

        if let Some(op) = self.match_operator(&["^"]) {
            let exponent = self.parse_power()?; // Right associative
            return Ok(Expr::BinaryOp {
                op,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Operator("-")) => Some(UnaryOperator::Negate),
            Some(TokenKind::Operator("+")) => Some(UnaryOperator::Plus),
            _ => None,
        };

        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.parse_unary()?;
                Ok(Expr::UnaryOp {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.unexpected()),
        };
        let followed_by_paren = self.peek_kind_at(1) == Some(&TokenKind::LeftParen);

        match token.kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            TokenKind::Text(s) => {
                self.pos += 1;
                Ok(Expr::Text(s))
            }
            TokenKind::Cell(name) | TokenKind::Name(name) if followed_by_paren => {
                self.pos += 1;
                self.parse_call(name)
            }
            TokenKind::Cell(text) => {
                self.pos += 1;
                self.parse_cell(text, token.position)
            }
            TokenKind::Name(name) => {
                self.pos += 1;
                self.parse_bare_name(name, token.position)
            }
            TokenKind::LeftParen => {
                self.pos += 1;
                self.paren_depth += 1;
                let inner = self.parse_expression()?;
                self.expect_close(token.position)?;
                self.parse_invocations(inner)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_cell(&mut self, text: String, position: usize) -> Result<Expr, ParseError> {
        if let Some(param) = self.bound_name(&text) {
            return Ok(Expr::Symbol(param));
        }

        let start = parse_address(&text).ok_or_else(|| ParseError::UnexpectedToken {
            found: text.clone(),
            position,
        })?;

        if self.peek_kind() != Some(&TokenKind::Colon) {
            return Ok(Expr::CellRef(start));
        }
        self.pos += 1;

        match self.peek().cloned() {
            Some(Token {
                kind: TokenKind::Cell(end_text),
                position,
            }) => {
                let end = parse_address(&end_text).ok_or(ParseError::UnexpectedToken {
                    found: end_text.clone(),
                    position,
                })?;
                self.pos += 1;
                Ok(Expr::RangeRef { start, end })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_bare_name(&mut self, name: String, position: usize) -> Result<Expr, ParseError> {
        if name.eq_ignore_ascii_case("TRUE") {
            return Ok(Expr::Boolean(true));
        }
        if name.eq_ignore_ascii_case("FALSE") {
            return Ok(Expr::Boolean(false));
        }

        match self.bound_name(&name) {
            Some(param) => Ok(Expr::Symbol(param)),
            None => Err(ParseError::MissingFunctionCallParens { name, position }),
        }
    }

    /// Parse a call; the current token is the opening paren
    fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        let open = self.current_position();
        self.pos += 1;

        if name.eq_ignore_ascii_case("LAMBDA") {
            let lambda = self.parse_lambda(open)?;
            return self.parse_invocations(lambda);
        }

        let args = self.parse_arguments(open)?;

        // A lambda parameter called like a function
        if let Some(param) = self.bound_name(&name) {
            let invoke = Expr::Invoke {
                callee: Box::new(Expr::Symbol(param)),
                args,
            };
            return self.parse_invocations(invoke);
        }

        let name = name.to_ascii_uppercase();
        let args = match (name.as_str(), <[Expr; 3]>::try_from(args)) {
            ("IF", Ok([condition, then_branch, else_branch])) => {
                return Ok(Expr::Conditional {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                });
            }
            (_, Ok(args)) => args.into(),
            (_, Err(args)) => args,
        };

        Ok(Expr::Function { name, args })
    }

    /// Parse a comma separated argument list; the opening paren is already consumed
    fn parse_arguments(&mut self, open: usize) -> Result<Vec<Expr>, ParseError> {
        self.paren_depth += 1;
        let mut args = Vec::new();

        if self.peek_kind() == Some(&TokenKind::RightParen) {
            return self.expect_close(open).map(|_| args);
        }

        loop {
            args.push(self.parse_expression()?);

            if self.peek_kind() == Some(&TokenKind::Comma) {
                self.pos += 1;
            } else {
                self.expect_close(open)?;
                return Ok(args);
            }
        }
    }

    /// Parse `LAMBDA(param, ..., body)`; the opening paren is already consumed
    fn parse_lambda(&mut self, open: usize) -> Result<Expr, ParseError> {
        self.paren_depth += 1;
        let outer_scope = self.scope.len();
        let mut params: Vec<String> = Vec::new();

        // Parameters: bare names, each followed by a comma
        loop {
            let param = match (self.peek(), self.peek_kind_at(1)) {
                (
                    Some(Token {
                        kind: TokenKind::Name(name) | TokenKind::Cell(name),
                        position,
                    }),
                    Some(TokenKind::Comma),
                ) => Some((name.clone(), *position)),
                _ => None,
            };
            let Some((name, position)) = param else {
                break;
            };

            if name.eq_ignore_ascii_case("TRUE") || name.eq_ignore_ascii_case("FALSE") {
                return Err(ParseError::InvalidLambdaParams {
                    position,
                    reason: format!("reserved parameter name '{}'", name),
                });
            }
            if params.iter().any(|p| p.eq_ignore_ascii_case(&name)) {
                return Err(ParseError::InvalidLambdaParams {
                    position,
                    reason: format!("duplicate parameter '{}'", name),
                });
            }

            self.pos += 2;
            self.scope.push(name.clone());
            params.push(name);
        }

        match self.peek_kind() {
            None => return Err(ParseError::UnmatchedParen { position: open }),
            Some(TokenKind::RightParen) => {
                return Err(ParseError::InvalidLambdaParams {
                    position: self.current_position(),
                    reason: "missing body".into(),
                });
            }
            Some(_) if !self.at_last_argument() => {
                return Err(ParseError::InvalidLambdaParams {
                    position: self.current_position(),
                    reason: "parameters must be bare names".into(),
                });
            }
            Some(_) => {}
        }

        let body = self.parse_expression()?;
        self.expect_close(open)?;
        self.scope.truncate(outer_scope);

        Ok(Expr::Lambda {
            params,
            body: Rc::new(body),
        })
    }

    /// Whether no top-level comma separates the current token from the closing paren
    fn at_last_argument(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => return true,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Comma if depth == 0 => return false,
                _ => {}
            }
        }
        true
    }

    /// Postfix argument lists applied to a callable expression
    fn parse_invocations(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut expr = callee;

        while self.peek_kind() == Some(&TokenKind::LeftParen) {
            let open = self.current_position();
            self.pos += 1;
            let args = self.parse_arguments(open)?;
            expr = Expr::Invoke {
                callee: Box::new(expr),
                args,
            };
        }

        Ok(expr)
    }
}
