
mod expr;

use verona_interner::Istr;
use verona_session::diagnostics::prelude::*;
use verona_utils::peek::Peek;

use crate::ast::*;
use crate::lexer::TokenIter;
use crate::token::{Keyword, Token, TokenKind};

#[derive(Debug)]
pub struct ParseError {
    pub expected: String,
    pub found: Option<&'static str>,
    pub span: Span,
}

impl IntoDiagnostic<SourceId> for ParseError {
    fn into_diagnostic(self, source_id: &SourceId) -> Diagnostic {
        let found = self.found.unwrap_or("end of file");

        Diagnostic::error()
            .with_message("syntax error")
            .with_snippet(Snippet::primary(
                format!("expected {}, found {found}", self.expected),
                *source_id,
                self.span,
            ))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// The members of one source file, along with every module it refers to.
#[derive(Debug)]
pub struct ParsedFile {
    pub members: Vec<Member>,
    pub imports: Vec<Import>,
}

struct Spanned<T> {
    node: T,
    span: Span,
}

pub struct Parser {
    tokens: TokenIter,
    errors: Vec<ParseError>,
    imports: Vec<Import>,
}

impl Parser {
    pub fn new(tokens: TokenIter) -> Self {
        Self {
            tokens,
            errors: vec![],
            imports: vec![],
        }
    }

    pub fn parse(mut self) -> (ParsedFile, Vec<ParseError>) {
        let members = self.parse_members(false);

        let file = ParsedFile {
            members,
            imports: self.imports,
        };

        (file, self.errors)
    }

    /// Parses members up to the end of the file, or up to the closing brace
    /// of the entity body when `in_entity` is set.
    fn parse_members(&mut self, in_entity: bool) -> Vec<Member> {
        let mut members = vec![];

        loop {
            match self.tokens.peek() {
                None => break,
                Some(t) if in_entity && t.kind == TokenKind::RBrace => break,
                Some(_) => {
                    let remaining = self.tokens.remaining();

                    let member = self.parse_or_recover(Self::parse_member, |parser, span| {
                        parser.recover_member(in_entity);
                        Member::ParseError(span)
                    });
                    members.push(member);

                    if self.tokens.remaining() == remaining {
                        self.tokens.next();
                    }
                }
            }
        }

        members
    }

    fn parse_member(&mut self) -> ParseResult<Member> {
        let Some(token) = self.tokens.peek() else {
            return Err(self.error_expected("a member", None));
        };

        match token.kind {
            TokenKind::Keyword(Keyword::Using) => {
                self.tokens.next();
                let ty = self.parse_type()?;
                self.expect_or_recover(TokenKind::Semicolon);

                Ok(Member::Using(Using {
                    ty,
                    span: token.span.union(self.tokens.prev_span()),
                }))
            }

            TokenKind::Keyword(Keyword::Class) => {
                self.tokens.next();
                self.parse_entity(EntityKind::Class).map(Member::Entity)
            }

            TokenKind::Keyword(Keyword::Interface) => {
                self.tokens.next();
                self.parse_entity(EntityKind::Interface)
                    .map(Member::Entity)
            }

            TokenKind::Keyword(Keyword::Type) => {
                self.tokens.next();
                self.parse_type_alias().map(Member::TypeAlias)
            }

            TokenKind::Identifier(_) => {
                if self
                    .tokens
                    .peek2()
                    .is_some_and(|t| t.kind == TokenKind::Colon)
                {
                    self.parse_field().map(Member::Field)
                } else {
                    self.parse_function().map(Member::Function)
                }
            }

            _ => Err(self.error_expected("a member", Some(token))),
        }
    }

    /// Skips the rest of a malformed member: up to and including a `;` or a
    /// braced body, or up to the start of the next member.
    fn recover_member(&mut self, in_entity: bool) {
        loop {
            match self.tokens.peek().map(|t| t.kind) {
                None => return,

                Some(TokenKind::Semicolon) => {
                    self.tokens.next();
                    return;
                }

                Some(TokenKind::LBrace) => {
                    self.tokens.next();
                    self.seek_and_consume(TokenKind::RBrace);
                    return;
                }

                Some(TokenKind::RBrace) => {
                    if !in_entity {
                        self.tokens.next();
                    }
                    return;
                }

                Some(TokenKind::Keyword(
                    Keyword::Using | Keyword::Class | Keyword::Interface | Keyword::Type,
                )) => return,

                Some(_) => {
                    self.tokens.next();
                }
            }
        }
    }

    fn parse_entity(&mut self, kind: EntityKind) -> ParseResult<Entity> {
        let ident = self.parse_ident()?;
        let type_params = self.parse_type_params()?;

        let inherits = if self.eat_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let members = self.parse_members(true);
        self.expect_or_recover(TokenKind::RBrace);

        Ok(Entity {
            kind,
            ident,
            type_params,
            inherits,
            members,
        })
    }

    fn parse_type_alias(&mut self) -> ParseResult<TypeAlias> {
        let ident = self.parse_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::Assign)?;
        let ty = self.parse_type()?;
        self.expect_or_recover(TokenKind::Semicolon);

        Ok(TypeAlias {
            ident,
            type_params,
            ty,
        })
    }

    fn parse_field(&mut self) -> ParseResult<Field> {
        let ident = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;

        let init = if self.eat_kind(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect_or_recover(TokenKind::Semicolon);

        Ok(Field { ident, ty, init })
    }

    fn parse_function(&mut self) -> ParseResult<Function> {
        let ident = self.parse_ident()?;
        let type_params = self.parse_type_params()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_comma_list(TokenKind::RParen, Self::parse_param)?;

        let ret_ty = if self.eat_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.eat_kind(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_block()?)
        };

        Ok(Function {
            ident,
            type_params,
            params,
            ret_ty,
            body,
        })
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let ident = self.parse_ident()?;

        let ty = if self.eat_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        Ok(Param { ident, ty })
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<Ident>> {
        if self.eat_kind(TokenKind::LBracket) {
            self.parse_comma_list(TokenKind::RBracket, Self::parse_ident)
        } else {
            Ok(vec![])
        }
    }

    /// Parses `item, item, ...` up to and including `close`, which must
    /// follow an already consumed opening delimiter. A trailing comma is
    /// allowed.
    fn parse_comma_list<T>(
        &mut self,
        close: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![];

        loop {
            if self.eat_kind(close) {
                return Ok(items);
            }

            items.push(parse_item(self)?);

            if !self.eat_kind(TokenKind::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        self.parse_type_list(TokenKind::Pipe, TypeKind::Union, |parser| {
            parser.parse_type_list(TokenKind::Ampersand, TypeKind::Isect, Self::parse_type_atom)
        })
    }

    fn parse_type_list(
        &mut self,
        separator: TokenKind,
        combine: fn(Vec<Type>) -> TypeKind,
        mut parse_operand: impl FnMut(&mut Self) -> ParseResult<Type>,
    ) -> ParseResult<Type> {
        let first = parse_operand(self)?;
        if !self.tokens.peek().is_some_and(|t| t.kind == separator) {
            return Ok(first);
        }

        let start = first.span;
        let mut types = vec![first];
        while self.eat_kind(separator) {
            types.push(parse_operand(self)?);
        }

        Ok(Type {
            kind: combine(types),
            span: start.union(self.tokens.prev_span()),
        })
    }

    fn parse_type_atom(&mut self) -> ParseResult<Type> {
        match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::LParen => {
                self.tokens.next();
                let mut types = self.parse_comma_list(TokenKind::RParen, Self::parse_type)?;
                let span = t.span.union(self.tokens.prev_span());

                if types.len() == 1 {
                    if let Some(ty) = types.pop() {
                        return Ok(ty);
                    }
                }

                Ok(Type {
                    kind: TypeKind::Tuple(types),
                    span,
                })
            }

            Some(t) if matches!(t.kind, TokenKind::Identifier(_) | TokenKind::String(_)) => {
                let path = self.parse_path()?;
                Ok(Type {
                    span: path_span(&path),
                    kind: TypeKind::Ref(path),
                })
            }

            other => Err(self.error_expected("a type", other)),
        }
    }

    fn parse_path(&mut self) -> ParseResult<Path> {
        let mut segments = vec![self.parse_path_segment()?];
        while self.eat_kind(TokenKind::DoubleColon) {
            segments.push(self.parse_path_segment()?);
        }

        Ok(Path {
            segments,
            resolved: None,
        })
    }

    fn parse_path_segment(&mut self) -> ParseResult<PathSegment> {
        let (name, start) = match self.tokens.next() {
            Some(Token {
                kind: TokenKind::Identifier(istr),
                span,
            }) => (SegmentName::Ident(istr), span),

            Some(Token {
                kind: TokenKind::String(istr),
                span,
            }) => {
                self.record_import(istr, span);
                (SegmentName::Module(istr), span)
            }

            other => return Err(self.error_expected("a name", other)),
        };

        let type_args = if self.eat_kind(TokenKind::LBracket) {
            self.parse_comma_list(TokenKind::RBracket, Self::parse_type)?
        } else {
            vec![]
        };

        Ok(PathSegment {
            name,
            type_args,
            span: start.union(self.tokens.prev_span()),
        })
    }

    fn record_import(&mut self, name: Istr, span: Span) {
        if !self.imports.iter().any(|import| import.name == name) {
            self.imports.push(Import {
                name,
                span,
                module: None,
            });
        }
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;

        let mut stmts = vec![];
        while self
            .tokens
            .peek()
            .is_some_and(|t| t.kind != TokenKind::RBrace)
        {
            let remaining = self.tokens.remaining();

            stmts.push(self.parse_stmt_or_recover());

            if self.tokens.remaining() == remaining {
                self.tokens.next();
            }
        }

        self.expect_or_recover(TokenKind::RBrace);

        Ok(Block {
            stmts,
            span: open.span.union(self.tokens.prev_span()),
        })
    }

    fn parse_stmt_or_recover(&mut self) -> Stmt {
        self.parse_or_recover(Self::parse_stmt, |parser, span| {
            parser.seek_and_consume(TokenKind::Semicolon);
            Stmt::ParseError(span)
        })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.tokens.peek() else {
            return Err(self.error_expected("a statement", None));
        };

        match token.kind {
            TokenKind::Keyword(kw @ (Keyword::Let | Keyword::Var)) => {
                self.tokens.next();
                let mutable = kw == Keyword::Var;

                let ident = self.parse_ident()?;

                let ty = if self.eat_kind(TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };

                let init = if self.eat_kind(TokenKind::Assign) {
                    Some(self.parse_expr()?)
                } else if mutable {
                    None
                } else {
                    return Err(self.error_expected_kind(TokenKind::Assign, self.tokens.peek()));
                };

                self.expect_stmt_end();

                Ok(Stmt::Let {
                    mutable,
                    ident,
                    ty,
                    init,
                })
            }

            TokenKind::Keyword(Keyword::Return) => {
                self.tokens.next();

                let expr = match self.tokens.peek().map(|t| t.kind) {
                    Some(TokenKind::Semicolon | TokenKind::RBrace) | None => None,
                    Some(_) => Some(self.parse_expr()?),
                };

                self.expect_stmt_end();

                Ok(Stmt::Return {
                    expr,
                    span: token.span.union(self.tokens.prev_span()),
                })
            }

            TokenKind::Keyword(Keyword::While) => {
                self.tokens.next();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }

            // `if` and blocks end at their closing brace, so they neither
            // continue into a binary expression nor need a `;`.
            TokenKind::Keyword(Keyword::If) | TokenKind::LBrace => {
                let expr = self.parse_block_like()?;
                self.eat_kind(TokenKind::Semicolon);
                Ok(Stmt::Expr(expr))
            }

            _ => {
                let expr = self.parse_expr()?;
                self.expect_stmt_end();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Statements end with `;`, which may be left out before the `}` that
    /// closes the block.
    fn expect_stmt_end(&mut self) {
        if !self
            .tokens
            .peek()
            .is_some_and(|t| t.kind == TokenKind::RBrace)
        {
            self.expect_or_recover(TokenKind::Semicolon);
        }
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenKind::Identifier(istr),
                span,
            }) => Ok(Ident { istr, span }),
            other => Err(self.error_expected("an identifier", other)),
        }
    }

    fn parse_or_recover<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
        recover: impl FnOnce(&mut Self, Span) -> T,
    ) -> T {
        let result = self.parse_spanned(parse);
        match result.node {
            Ok(node) => node,
            Err(err) => {
                self.report(err);
                recover(self, result.span)
            }
        }
    }

    fn parse_spanned<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> Spanned<T> {
        let span_start = self.tokens.peek_span();
        let node = f(self);
        let span_end = self.tokens.prev_span();

        let span = Span::new(span_start.start, span_end.end.max(span_start.start));
        Spanned { node, span }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.tokens.peek() {
            Some(t) if t.kind == kind => {
                self.tokens.next();
                Ok(t)
            }

            other => Err(self.error_expected_kind(kind, other)),
        }
    }

    fn expect_or_recover(&mut self, kind: TokenKind) {
        if let Err(error) = self.expect(kind) {
            self.report(error);
        }
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        self.tokens.eat_where(|t| t.kind == kind)
    }

    fn seek_and_consume(&mut self, kind: TokenKind) {
        if self.seek(kind) {
            self.tokens.next();
        }
    }

    /// Skips tokens until `kind` is next, stepping over balanced braces and
    /// parentheses. Stops without consuming at an unbalanced closing
    /// delimiter.
    fn seek(&mut self, kind: TokenKind) -> bool {
        let mut depth_stack: Vec<TokenKind> = vec![];

        loop {
            let Some(token) = self.tokens.peek() else {
                return false;
            };

            if depth_stack.is_empty() && token.kind == kind {
                return true;
            }

            match token.kind {
                TokenKind::LBrace => depth_stack.push(TokenKind::RBrace),
                TokenKind::LParen => depth_stack.push(TokenKind::RParen),

                TokenKind::RBrace | TokenKind::RParen => {
                    if depth_stack.last() == Some(&token.kind) {
                        depth_stack.pop();
                    } else {
                        return false;
                    }
                }

                _ => {}
            }

            self.tokens.next();
        }
    }

    fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn error_expected_kind(&self, kind: TokenKind, found: Option<Token>) -> ParseError {
        self.error_expected(kind.token_name(), found)
    }

    fn error_expected(&self, expected: impl Into<String>, found: Option<Token>) -> ParseError {
        match found {
            Some(token) => ParseError {
                expected: expected.into(),
                found: Some(token.kind.token_name()),
                span: token.span,
            },
            None => ParseError {
                expected: expected.into(),
                found: None,
                span: self.tokens.eof_span(),
            },
        }
    }
}

fn path_span(path: &Path) -> Span {
    match (path.segments.first(), path.segments.last()) {
        (Some(first), Some(last)) => first.span.union(last.span),
        _ => Span::default(),
    }
}
