//! Recursive-descent parser for formulas.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr           := additive
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/') unary)*
//! unary          := ('-' | '+') unary | power
//! power          := primary ('^' unary)?
//! primary        := number | ident | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! Power is right associative and binds tighter than unary minus, so
//! `-x^2 == -(x^2)` and `2^-1 == 0.5`.
//!
//! Compiling and evaluating recurse over the tree, so both the parser's own
//! nesting and the height of the tree it builds are capped. Formulas past
//! either cap are parse errors.

use crate::formula::ast::{BinOp, Expr, ExprKind};
use crate::formula::error::{FormulaError, Span};
use crate::formula::lexer::{Token, TokenKind};

/// Deepest nesting of parentheses, calls, signs and exponents.
pub const MAX_NESTING: usize = 128;

/// Tallest syntax tree accepted, counted in nodes.
pub const MAX_TREE_HEIGHT: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_len: usize,
    depth: usize,
}

impl Parser {
    fn enter(&mut self) -> Result<(), FormulaError> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Parse {
                message: format!("expression nested too deeply (limit {MAX_NESTING})"),
                span: self.current_span(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<Span, FormulaError> {
        match self.tokens.get(self.pos) {
            Some(tok) if &tok.kind == expected => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(FormulaError::Parse {
                message: format!("expected {}, got {}", describe(expected), describe(&tok.kind)),
                span: tok.span,
            }),
            None => Err(FormulaError::Parse {
                message: format!("expected {}, got end of input", describe(expected)),
                span: self.eof_span(),
            }),
        }
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        Span::new(self.source_len, self.source_len)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(v) => format!("number {v}"),
        TokenKind::Ident(name) => format!("'{name}'"),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::Comma => "','".into(),
        TokenKind::Plus => "'+'".into(),
        TokenKind::Minus => "'-'".into(),
        TokenKind::Star => "'*'".into(),
        TokenKind::Slash => "'/'".into(),
        TokenKind::Caret => "'^'".into(),
    }
}

/// Parse a complete expression; trailing tokens are an error.
///
/// `source_len` positions the end-of-input span in diagnostics.
pub fn parse(tokens: Vec<Token>, source_len: usize) -> Result<Expr, FormulaError> {
    let mut p = Parser {
        tokens,
        pos: 0,
        source_len,
        depth: 0,
    };
    if p.tokens.is_empty() {
        return Err(FormulaError::Parse {
            message: "empty expression".into(),
            span: p.eof_span(),
        });
    }
    let expr = parse_additive(&mut p)?;
    if let Some(tok) = p.tokens.get(p.pos) {
        return Err(FormulaError::Parse {
            message: format!("unexpected {} after expression", describe(&tok.kind)),
            span: tok.span,
        });
    }
    Ok(expr)
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Result<Expr, FormulaError> {
    let span = Span::new(lhs.span.start, rhs.span.end);
    bounded(Expr {
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    })
}

/// Reject `expr` once it grows past [`MAX_TREE_HEIGHT`]. Long operator
/// chains build tall trees without any parser recursion.
fn bounded(expr: Expr) -> Result<Expr, FormulaError> {
    if expr.height() > MAX_TREE_HEIGHT {
        return Err(FormulaError::Parse {
            message: format!("expression too long (more than {MAX_TREE_HEIGHT} nested operations)"),
            span: expr.span,
        });
    }
    Ok(expr)
}

fn parse_additive(p: &mut Parser) -> Result<Expr, FormulaError> {
    let mut left = parse_multiplicative(p)?;
    loop {
        let op = match p.peek_kind() {
            Some(TokenKind::Plus) => BinOp::Add,
            Some(TokenKind::Minus) => BinOp::Sub,
            _ => break,
        };
        p.advance();
        let right = parse_multiplicative(p)?;
        left = binary(op, left, right)?;
    }
    Ok(left)
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr, FormulaError> {
    let mut left = parse_unary(p)?;
    loop {
        let op = match p.peek_kind() {
            Some(TokenKind::Star) => BinOp::Mul,
            Some(TokenKind::Slash) => BinOp::Div,
            _ => break,
        };
        p.advance();
        let right = parse_unary(p)?;
        left = binary(op, left, right)?;
    }
    Ok(left)
}

// Every recursive path (signs, exponents, parentheses, call arguments)
// passes through here, so this is where nesting is counted.
fn parse_unary(p: &mut Parser) -> Result<Expr, FormulaError> {
    p.enter()?;
    let expr = parse_signed(p);
    p.leave();
    expr
}

fn parse_signed(p: &mut Parser) -> Result<Expr, FormulaError> {
    match p.peek_kind() {
        Some(TokenKind::Minus) => {
            let start = p.current_span().start;
            p.advance();
            let operand = parse_unary(p)?;
            let span = Span::new(start, operand.span.end);
            bounded(Expr {
                kind: ExprKind::Neg(Box::new(operand)),
                span,
            })
        }
        Some(TokenKind::Plus) => {
            p.advance();
            parse_unary(p)
        }
        _ => parse_power(p),
    }
}

fn parse_power(p: &mut Parser) -> Result<Expr, FormulaError> {
    let base = parse_primary(p)?;
    if matches!(p.peek_kind(), Some(TokenKind::Caret)) {
        p.advance();
        let exponent = parse_unary(p)?;
        return binary(BinOp::Pow, base, exponent);
    }
    Ok(base)
}

fn parse_primary(p: &mut Parser) -> Result<Expr, FormulaError> {
    let span = p.current_span();
    match p.peek_kind().cloned() {
        Some(TokenKind::Number(v)) => {
            p.advance();
            Ok(Expr {
                kind: ExprKind::Number(v),
                span,
            })
        }
        Some(TokenKind::LParen) => {
            p.advance();
            let inner = parse_additive(p)?;
            let close = p.expect(&TokenKind::RParen)?;
            Ok(Expr {
                kind: inner.kind,
                span: Span::new(span.start, close.end),
            })
        }
        Some(TokenKind::Ident(name)) => {
            p.advance();
            if !matches!(p.peek_kind(), Some(TokenKind::LParen)) {
                return Ok(Expr {
                    kind: ExprKind::Ident(name),
                    span,
                });
            }
            p.advance();
            let mut args = Vec::new();
            if !matches!(p.peek_kind(), Some(TokenKind::RParen)) {
                args.push(parse_additive(p)?);
                while matches!(p.peek_kind(), Some(TokenKind::Comma)) {
                    p.advance();
                    args.push(parse_additive(p)?);
                }
            }
            let close = p.expect(&TokenKind::RParen)?;
            bounded(Expr {
                kind: ExprKind::Call { name, args },
                span: Span::new(span.start, close.end),
            })
        }
        Some(other) => Err(FormulaError::Parse {
            message: format!("expected a value, got {}", describe(&other)),
            span,
        }),
        None => Err(FormulaError::Parse {
            message: "expected a value, got end of input".into(),
            span,
        }),
    }
}
