#[cfg(test)]
mod tests;

use std::str::Chars;

use verona_interner::Interner;
use verona_session::diagnostics::prelude::*;
use verona_utils::peek::Peek;

use crate::token::*;

#[derive(Debug)]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub span: Span,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("digit {digit:?} is invalid for base {base}")]
    IntegerDigitWrongBase { base: u32, digit: char },

    #[error("expected at least one base {0} digit")]
    IntegerNoDigits(u32),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("unterminated block comment")]
    UnterminatedComment,
}

impl IntoDiagnostic<SourceId> for LexerError {
    fn into_diagnostic(self, source_id: &SourceId) -> Diagnostic {
        Diagnostic::error()
            .with_message("syntax error")
            .with_snippet(Snippet::primary(
                self.kind.to_string(),
                *source_id,
                self.span,
            ))
    }
}

pub struct Lexer<'sess> {
    interner: &'sess Interner,
    errors: Vec<LexerError>,

    all: &'sess str,
    chars: Chars<'sess>,

    token_start: usize,
}

impl<'sess> Lexer<'sess> {
    pub fn new(source: &'sess str, interner: &'sess Interner) -> Self {
        Self {
            interner,
            errors: vec![],

            all: source,
            chars: source.chars(),

            token_start: 0,
        }
    }

    pub fn lex(mut self) -> (TokenIter, Vec<LexerError>) {
        let mut tokens = vec![];
        while let Some(token) = self.lex_token() {
            tokens.push(token);
        }

        let iter = TokenIter {
            tokens: tokens.into_iter(),
            prev_span: Span::empty(0),
            eof_span: Span::empty(self.all.len()),
        };

        (iter, self.errors)
    }

    fn lex_token(&mut self) -> Option<Token> {
        loop {
            self.token_start = self.byte_pos();

            let kind = match self.chars.next()? {
                '/' if self.chars.eat('/') => {
                    while !matches!(self.chars.next(), Some('\n') | None) {}
                    continue;
                }
                '/' if self.chars.eat('*') => {
                    self.skip_block_comment();
                    continue;
                }

                ch if ch.is_whitespace() => continue,

                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,

                '.' => TokenKind::Dot,
                ':' if self.chars.eat(':') => TokenKind::DoubleColon,
                ':' => TokenKind::Colon,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,

                '+' => TokenKind::Add,
                '-' => TokenKind::Sub,
                '*' => TokenKind::Mul,
                '/' => TokenKind::Div,
                '%' => TokenKind::Mod,

                '=' if self.chars.eat('=') => TokenKind::EqEq,
                '=' => TokenKind::Assign,
                '!' if self.chars.eat('=') => TokenKind::NotEq,
                '!' => TokenKind::Not,
                '<' if self.chars.eat('=') => TokenKind::LtEq,
                '<' => TokenKind::Lt,
                '>' if self.chars.eat('=') => TokenKind::GtEq,
                '>' => TokenKind::Gt,

                '&' if self.chars.eat('&') => TokenKind::And,
                '&' => TokenKind::Ampersand,
                '|' if self.chars.eat('|') => TokenKind::Or,
                '|' => TokenKind::Pipe,
                '^' => TokenKind::Caret,

                '"' => self.lex_string(),

                '0' if self.chars.eat('x') => self.lex_integer(None, 16),
                '0' if self.chars.eat('o') => self.lex_integer(None, 8),
                '0' if self.chars.eat('b') => self.lex_integer(None, 2),

                ch @ '0'..='9' => self.lex_integer(ch.to_digit(10), 10),

                ch if is_ident_start(ch) => self.lex_alpha(),

                ch => {
                    self.report_error(LexerErrorKind::UnexpectedChar(ch));
                    continue;
                }
            };

            let token = Token {
                kind,
                span: Span::new(self.token_start, self.byte_pos()),
            };

            return Some(token);
        }
    }

    fn skip_block_comment(&mut self) {
        let mut depth = 1_usize;

        while depth > 0 {
            match self.chars.next() {
                Some('*') if self.chars.eat('/') => depth -= 1,
                Some('/') if self.chars.eat('*') => depth += 1,
                Some(_) => {}
                None => {
                    self.report_error(LexerErrorKind::UnterminatedComment);
                    return;
                }
            }
        }
    }

    /// Lexes the rest of a string literal. An unterminated string is
    /// reported but still produces a token holding everything up to the end
    /// of the file.
    fn lex_string(&mut self) -> TokenKind {
        let mut contents = String::new();

        loop {
            let escape_start = self.byte_pos();

            match self.chars.next() {
                Some('"') => break,

                Some('\\') => match self.chars.next() {
                    Some('n') => contents.push('\n'),
                    Some('t') => contents.push('\t'),
                    Some('r') => contents.push('\r'),
                    Some('0') => contents.push('\0'),
                    Some('\\') => contents.push('\\'),
                    Some('"') => contents.push('"'),
                    Some(ch) => {
                        let span = Span::new(escape_start, self.byte_pos());
                        self.errors.push(LexerError {
                            kind: LexerErrorKind::InvalidEscape(ch),
                            span,
                        });
                        contents.push(ch);
                    }
                    None => {
                        self.report_error(LexerErrorKind::UnterminatedString);
                        break;
                    }
                },

                Some(ch) => contents.push(ch),

                None => {
                    self.report_error(LexerErrorKind::UnterminatedString);
                    break;
                }
            }
        }

        TokenKind::String(self.interner.intern(&contents))
    }

    /// Lexes the digits of an integer literal. A malformed literal is
    /// reported and lexed as zero so the parser sees a single expression.
    fn lex_integer(&mut self, first_digit: Option<u32>, base: u32) -> TokenKind {
        let mut n = Some(first_digit.map_or(0, i64::from));
        let mut has_digits = first_digit.is_some();
        let mut wrong_digit = None;

        while let Some(ch) = self.chars.peek().filter(|ch| is_ident(*ch)) {
            self.chars.next();

            if ch == '_' {
                continue;
            }

            let Some(digit) = ch.to_digit(base) else {
                wrong_digit.get_or_insert(ch);
                continue;
            };

            has_digits = true;
            n = n.and_then(|n| n.checked_mul(i64::from(base)));
            n = n.and_then(|n| n.checked_add(i64::from(digit)));
        }

        let error = match (wrong_digit, n) {
            (Some(digit), _) => LexerErrorKind::IntegerDigitWrongBase { base, digit },
            _ if !has_digits => LexerErrorKind::IntegerNoDigits(base),
            (None, Some(n)) => return TokenKind::Integer(n),
            (None, None) => LexerErrorKind::IntegerOverflow,
        };

        self.report_error(error);
        TokenKind::Integer(0)
    }

    fn lex_alpha(&mut self) -> TokenKind {
        while matches!(self.chars.peek(), Some(ch) if is_ident(ch)) {
            self.chars.next();
        }

        let s = &self.all[self.token_start..self.byte_pos()];

        match s {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => match Keyword::lookup(s) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(self.interner.intern(s)),
            },
        }
    }

    fn byte_pos(&self) -> usize {
        self.all.len() - self.chars.as_str().len()
    }

    fn report_error(&mut self, kind: LexerErrorKind) {
        let span = Span::new(self.token_start, self.byte_pos());
        self.errors.push(LexerError { kind, span });
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub struct TokenIter {
    tokens: std::vec::IntoIter<Token>,
    prev_span: Span,
    eof_span: Span,
}

impl TokenIter {
    pub fn prev_span(&self) -> Span {
        self.prev_span
    }

    pub fn peek_span(&self) -> Span {
        self.peek().map_or(self.eof_span, |t| t.span)
    }

    pub fn eof_span(&self) -> Span {
        self.eof_span
    }

    /// Looks one token past [`Peek::peek`].
    pub fn peek2(&self) -> Option<Token> {
        self.tokens.as_slice().get(1).copied()
    }

    /// Number of tokens not yet consumed.
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

impl Iterator for TokenIter {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.next()?;
        self.prev_span = token.span;
        Some(token)
    }
}

impl Peek for TokenIter {
    fn peek(&self) -> Option<Self::Item> {
        self.tokens.as_slice().first().copied()
    }
}
