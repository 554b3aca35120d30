use verona_utils::peek::Peek;

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::token::*;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Assign,

    LogicalOr,
    LogicalAnd,

    Equality,
    Comparison,

    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,

    Term,
    Factor,

    Unary,
}

fn should_parse_binop_in_prec(binop: BinOp, in_prec: Prec) -> bool {
    binop_prec(binop) > in_prec
}

fn binop_prec(binop: BinOp) -> Prec {
    match binop {
        BinOp::Or => Prec::LogicalOr,
        BinOp::And => Prec::LogicalAnd,

        BinOp::Eq | BinOp::NotEq => Prec::Equality,
        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => Prec::Comparison,

        BinOp::BitwiseOr => Prec::BitwiseOr,
        BinOp::BitwiseXor => Prec::BitwiseXor,
        BinOp::BitwiseAnd => Prec::BitwiseAnd,

        BinOp::Add | BinOp::Sub => Prec::Term,
        BinOp::Mul | BinOp::Div | BinOp::Mod => Prec::Factor,
    }
}

impl Parser {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let target = self.parse_prec(Prec::Assign)?;

        if !self.eat_kind(TokenKind::Assign) {
            return Ok(target);
        }

        // right associative: `a = b = c` assigns `c` to `b` first
        let value = self.parse_expr()?;
        let span = target.span.union(value.span);

        Ok(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_prec(&mut self, prec: Prec) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;

        while let Some(op) = self.peek_bin_op(prec) {
            self.tokens.next();

            let rhs = self.parse_prec(binop_prec(op))?;

            let span = expr.span.union(rhs.span);
            expr = Expr::new(
                ExprKind::BinOp {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.tokens.peek().map(|t| t.kind) {
            Some(TokenKind::Sub) => UnOp::Negate,
            Some(TokenKind::Not) => UnOp::Not,
            _ => return self.parse_postfix(),
        };

        let start = self.tokens.peek_span();
        self.tokens.next();

        let expr = self.parse_prec(Prec::Unary)?;
        let span = start.union(expr.span);

        Ok(Expr::new(
            ExprKind::UnOp {
                op,
                expr: Box::new(expr),
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat_kind(TokenKind::Dot) {
                let ident = self.parse_ident()?;
                let span = expr.span.union(ident.span);

                expr = Expr::new(
                    ExprKind::Select {
                        expr: Box::new(expr),
                        ident,
                    },
                    span,
                );
            } else if self.eat_kind(TokenKind::LParen) {
                let args = self.parse_comma_list(TokenKind::RParen, Self::parse_expr)?;
                let span = expr.span.union(self.tokens.prev_span());

                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.tokens.peek() else {
            return Err(self.error_expected("an expression", None));
        };

        match token.kind {
            TokenKind::Integer(n) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Integer(n), token.span))
            }

            TokenKind::Bool(b) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Bool(b), token.span))
            }

            // a string followed by `::` names a module
            TokenKind::String(s)
                if !self
                    .tokens
                    .peek2()
                    .is_some_and(|t| t.kind == TokenKind::DoubleColon) =>
            {
                self.tokens.next();
                Ok(Expr::new(ExprKind::String(s), token.span))
            }

            TokenKind::Identifier(_) | TokenKind::String(_) => {
                let path = self.parse_path()?;
                let span = token.span.union(self.tokens.prev_span());
                Ok(Expr::new(ExprKind::Path(path), span))
            }

            TokenKind::LParen => {
                self.tokens.next();

                let expr = self.parse_or_recover(Self::parse_expr, |parser, span| {
                    parser.seek(TokenKind::RParen);
                    Expr::new(ExprKind::ParseError, span)
                });

                self.expect(TokenKind::RParen)?;

                Ok(expr)
            }

            TokenKind::Keyword(Keyword::If) | TokenKind::LBrace => self.parse_block_like(),

            _ => Err(self.error_expected("an expression", Some(token))),
        }
    }

    /// Parses an `if` expression or a block.
    pub(super) fn parse_block_like(&mut self) -> ParseResult<Expr> {
        if !self
            .tokens
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Keyword(Keyword::If))
        {
            let block = self.parse_block()?;
            let span = block.span;
            return Ok(Expr::new(ExprKind::Block(block), span));
        }

        let start = self.tokens.peek_span();
        self.tokens.next();

        let cond = self.parse_expr()?;
        let then = self.parse_block()?;

        let else_ = if self.eat_kind(TokenKind::Keyword(Keyword::Else)) {
            Some(Box::new(self.parse_block_like()?))
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then,
                else_,
            },
            start.union(self.tokens.prev_span()),
        ))
    }

    fn peek_bin_op(&self, prec: Prec) -> Option<BinOp> {
        let op = match self.tokens.peek().map(|t| t.kind)? {
            TokenKind::Add => BinOp::Add,
            TokenKind::Sub => BinOp::Sub,
            TokenKind::Mul => BinOp::Mul,
            TokenKind::Div => BinOp::Div,
            TokenKind::Mod => BinOp::Mod,

            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::LtEq,
            TokenKind::GtEq => BinOp::GtEq,

            TokenKind::And => BinOp::And,
            TokenKind::Or => BinOp::Or,

            TokenKind::Ampersand => BinOp::BitwiseAnd,
            TokenKind::Pipe => BinOp::BitwiseOr,
            TokenKind::Caret => BinOp::BitwiseXor,

            _ => return None,
        };

        should_parse_binop_in_prec(op, prec).then_some(op)
    }
}
