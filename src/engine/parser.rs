//! Expression parser: tokenizer plus Pratt-style precedence climbing.
//!
//! Accepted grammar: numeric literals (integer, decimal, scientific),
//! identifiers, `+ - * /`, power as `**` or `^` (right-associative), unary
//! plus/minus, parentheses, and calls to the built-in function set.

use std::sync::Arc;

use super::ast::Expr;
use super::error::{EngineError, Span};

/// Built-in unary functions the parser accepts.
///
/// `log` is accepted as input and canonicalized to `ln` (natural logarithm).
const BUILTIN_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "exp", "ln", "log",
    "sqrt", "abs",
];

/// Whether `name` is a syntactically valid symbol (variable) name.
pub fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn parse(input: &str) -> Result<Expr, EngineError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EngineError::EmptyExpression);
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_expr(0)?;
    if let Some(tok) = parser.current() {
        return Err(EngineError::UnexpectedToken {
            expected: "end of input".to_string(),
            got: tok.kind.describe(),
            span: tok.span,
        });
    }
    Ok(expr)
}

// ── Tokens ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("{n}"),
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Plus => "+".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Star => "*".into(),
            TokenKind::Slash => "/".into(),
            TokenKind::Power => "**".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::Comma => ",".into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Span,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EngineError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '+' => {
                tokens.push(Token { kind: TokenKind::Plus, span: Span::at(i) });
                i += 1;
            }
            '-' => {
                tokens.push(Token { kind: TokenKind::Minus, span: Span::at(i) });
                i += 1;
            }
            '*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    tokens.push(Token { kind: TokenKind::Power, span: Span::new(i, i + 2) });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Star, span: Span::at(i) });
                    i += 1;
                }
            }
            '^' => {
                tokens.push(Token { kind: TokenKind::Power, span: Span::at(i) });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, span: Span::at(i) });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, span: Span::at(i) });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, span: Span::at(i) });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, span: Span::at(i) });
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Optional exponent: e / E with optional sign, then digits.
                if i < bytes.len()
                    && (bytes[i] == b'e' || bytes[i] == b'E')
                    && bytes
                        .get(i + 1)
                        .is_some_and(|&b| b.is_ascii_digit() || b == b'+' || b == b'-')
                {
                    i += 2;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = &input[start..i];
                let value: f64 = text.parse().map_err(|_| EngineError::InvalidNumber {
                    value: text.to_string(),
                    span: Span::new(start, i),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    span: Span::new(start, i),
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(input[start..i].to_string()),
                    span: Span::new(start, i),
                });
            }
            other => {
                return Err(EngineError::InvalidToken {
                    token: other.to_string(),
                    span: Span::at(i),
                });
            }
        }
    }

    Ok(tokens)
}

// ── Parser ───────────────────────────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, EngineError> {
        let mut lhs = self.parse_prefix()?;

        while let Some(tok) = self.current() {
            // Left and right binding powers per operator. Power binds
            // tightest and is right-associative (equal right power).
            let (lbp, rbp) = match tok.kind {
                TokenKind::Plus | TokenKind::Minus => (10, 11),
                TokenKind::Star | TokenKind::Slash => (20, 21),
                TokenKind::Power => (30, 30),
                _ => break,
            };
            if lbp < min_bp {
                break;
            }
            let kind = tok.kind.clone();
            self.advance();
            let rhs = self.parse_expr(rbp)?;
            lhs = match kind {
                TokenKind::Plus => lhs + rhs,
                TokenKind::Minus => lhs - rhs,
                TokenKind::Star => lhs * rhs,
                TokenKind::Slash => lhs / rhs,
                TokenKind::Power => lhs.pow(rhs),
                _ => unreachable!(),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, EngineError> {
        let tok = self.current().ok_or(EngineError::UnexpectedEndOfInput)?;

        match &tok.kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::number(n))
            }

            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = tok.span;
                self.advance();

                if matches!(self.current().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    self.advance();
                    let args = self.parse_arguments()?;
                    self.expect_rparen()?;
                    // `log` is a surface alias for the natural logarithm.
                    let canonical = if name == "log" { "ln".to_string() } else { name.clone() };
                    if !BUILTIN_FUNCTIONS.contains(&name.as_str()) {
                        return Err(EngineError::UnknownFunction { name, span });
                    }
                    if args.len() != 1 {
                        return Err(EngineError::WrongArity {
                            name,
                            expected: 1,
                            got: args.len(),
                        });
                    }
                    Ok(Expr::Call(canonical, args.into_iter().map(Arc::new).collect()))
                } else {
                    Ok(Expr::symbol(name))
                }
            }

            // Unary minus binds between Mul (20) and Pow (30) so that
            // -x**2 parses as -(x**2), not (-x)**2.
            TokenKind::Minus => {
                self.advance();
                let inner = self.parse_expr(25)?;
                Ok(-inner)
            }

            TokenKind::Plus => {
                self.advance();
                self.parse_expr(25)
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect_rparen()?;
                Ok(expr)
            }

            other => Err(EngineError::UnexpectedToken {
                expected: "a number, symbol, or '('".to_string(),
                got: other.describe(),
                span: tok.span,
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EngineError> {
        let mut args = Vec::new();

        if matches!(self.current().map(|t| &t.kind), Some(TokenKind::RParen)) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr(0)?);
            match self.current().map(|t| &t.kind) {
                Some(TokenKind::Comma) => self.advance(),
                Some(TokenKind::RParen) | None => break,
                Some(other) => {
                    return Err(EngineError::UnexpectedToken {
                        expected: "',' or ')'".to_string(),
                        got: other.describe(),
                        span: self.current().map(|t| t.span).unwrap_or_default(),
                    });
                }
            }
        }

        Ok(args)
    }

    fn expect_rparen(&mut self) -> Result<(), EngineError> {
        match self.current() {
            Some(tok) if tok.kind == TokenKind::RParen => {
                self.advance();
                Ok(())
            }
            Some(tok) => Err(EngineError::UnexpectedToken {
                expected: "')'".to_string(),
                got: tok.kind.describe(),
                span: tok.span,
            }),
            None => Err(EngineError::UnexpectedEndOfInput),
        }
    }
}
