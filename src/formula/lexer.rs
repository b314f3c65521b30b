//! Lexer for algebraic formulas.
//!
//! Produces numbers (with optional fraction and exponent), identifiers, and
//! the operators `+ - * / ^ **` plus parentheses and commas. `**` is lexed as
//! the same power token as `^`. Whitespace is insignificant.

use crate::formula::error::{FormulaError, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    /// `^` or `**`
    Caret,
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if ch.is_ascii_digit()
            || (ch == b'.' && pos + 1 < bytes.len() && bytes[pos + 1].is_ascii_digit())
        {
            let end = lex_number_end(bytes, pos);
            let text = &source[pos..end];
            let value: f64 = text.parse().map_err(|_| FormulaError::Lex {
                message: format!("malformed number '{text}'"),
                span: Span::new(pos, end),
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                span: Span::new(pos, end),
            });
            pos = end;
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == b'_' {
            let end = pos
                + bytes[pos..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                    .count();
            tokens.push(Token {
                kind: TokenKind::Ident(source[pos..end].to_string()),
                span: Span::new(pos, end),
            });
            pos = end;
            continue;
        }

        if ch == b'*' && bytes.get(pos + 1) == Some(&b'*') {
            tokens.push(Token {
                kind: TokenKind::Caret,
                span: Span::new(pos, pos + 2),
            });
            pos += 2;
            continue;
        }

        let kind = match ch {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'^' => TokenKind::Caret,
            _ => {
                let c = source[pos..].chars().next().unwrap_or('?');
                return Err(FormulaError::Lex {
                    message: format!("unexpected character '{c}'"),
                    span: Span::new(pos, pos + c.len_utf8()),
                });
            }
        };
        tokens.push(Token {
            kind,
            span: Span::new(pos, pos + 1),
        });
        pos += 1;
    }

    Ok(tokens)
}

/// End of the number starting at `start`: digits, an optional fraction and
/// an optional exponent. The exponent is only consumed when digits follow,
/// so `2e` lexes as `2` followed by the identifier `e`.
fn lex_number_end(bytes: &[u8], start: usize) -> usize {
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut pos = start + digits(start);
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        pos += digits(pos);
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let n = digits(exp);
        if n > 0 {
            pos = exp + n;
        }
    }
    pos
}
