//! Formula tokenizer
//!
//! Converts expression text into a flat token sequence. The lexer never fails: a span it
//! cannot recognise becomes a [`TokenKind::Invalid`] token, which the parser reports as
//! an unexpected token.

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer or decimal literal
    Number(f64),
    /// Quoted text literal, with `""` unescaped
    Text(String),
    /// Column letters followed by row digits, e.g. `AC12`
    Cell(String),
    /// Bare identifier: function names, lambda parameters, TRUE/FALSE
    Name(String),
    /// One of `+ - * / ^ = == != <> < > <= >=`
    Operator(&'static str),
    Comma,
    Colon,
    LeftParen,
    RightParen,
    /// A run of characters no other token matches
    Invalid(String),
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    /// The source text this token represents, for error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Text(s) => format!("\"{}\"", s),
            TokenKind::Cell(s) | TokenKind::Name(s) | TokenKind::Invalid(s) => s.clone(),
            TokenKind::Operator(op) => (*op).to_string(),
            TokenKind::Comma => ",".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::LeftParen => "(".into(),
            TokenKind::RightParen => ")".into(),
        }
    }
}

// Longest first so that `<=` wins over `<`
const OPERATORS: [&str; 13] = [
    "==", "!=", "<>", "<=", ">=", "+", "-", "*", "/", "^", "<", ">", "=",
];

/// Tokenize an expression, discarding whitespace
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek_char().map_or(false, &pred) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        self.advance_while(char::is_whitespace);
    }

    /// Whether a token of any kind could start at the current position
    fn at_token_start(&self) -> bool {
        match self.peek_char() {
            None => false,
            Some(c) => {
                c.is_whitespace()
                    || c.is_ascii_alphanumeric()
                    || c == '_'
                    || c == '"'
                    || (c == '.' && self.peek_char_at(1).map_or(false, |d| d.is_ascii_digit()))
                    || matches!(c, ',' | ':' | '(' | ')')
                    || OPERATORS.iter().any(|op| self.rest().starts_with(op))
            }
        }
    }

    fn scan_token(&mut self) -> TokenKind {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return TokenKind::Invalid(String::new()),
        };

        // Single-character tokens
        match c {
            ',' => {
                self.advance();
                return TokenKind::Comma;
            }
            ':' => {
                self.advance();
                return TokenKind::Colon;
            }
            '(' => {
                self.advance();
                return TokenKind::LeftParen;
            }
            ')' => {
                self.advance();
                return TokenKind::RightParen;
            }
            '"' => return self.scan_text(),
            _ => {}
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |d| d.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_identifier();
        }

        if let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(**op)) {
            self.pos += op.len();
            return TokenKind::Operator(*op);
        }

        self.scan_invalid()
    }

    fn scan_text(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '"' {
                // Check for escaped quote ("")
                if self.peek_char() == Some('"') {
                    s.push('"');
                    self.advance();
                } else {
                    return TokenKind::Text(s);
                }
            } else {
                s.push(c);
            }
        }

        // Unterminated literal
        TokenKind::Invalid(self.input[start..].to_string())
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        // Integer part
        self.advance_while(|c| c.is_ascii_digit());

        // Decimal part, only when digits follow the point
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }

        let text = &self.input[start..self.pos];
        // Literals too large for f64 parse to infinity
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => TokenKind::Number(n),
            _ => TokenKind::Invalid(text.to_string()),
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = &self.input[start..self.pos];

        if is_cell_shaped(text) {
            TokenKind::Cell(text.to_string())
        } else {
            TokenKind::Name(text.to_string())
        }
    }

    fn scan_invalid(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance();
        while !self.at_token_start() && self.peek_char().is_some() {
            self.advance();
        }
        TokenKind::Invalid(self.input[start..self.pos].to_string())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return None;
        }

        let position = self.pos;
        let kind = self.scan_token();
        Some(Token { kind, position })
    }
}

/// Letters followed by digits and nothing else
fn is_cell_shaped(text: &str) -> bool {
    let letters = text.bytes().take_while(u8::is_ascii_alphabetic).count();
    letters > 0 && letters < text.len() && text.bytes().skip(letters).all(|b| b.is_ascii_digit())
}
