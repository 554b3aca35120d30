use verona_diagnostic::span::Span;
use verona_interner::Istr;

use crate::NodeCopy;

#[derive(NodeCopy!)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(NodeCopy!)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(Istr),
    Integer(i64),
    /// The unescaped contents of a string literal.
    String(Istr),
    Bool(bool),

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Dot,
    Colon,
    DoubleColon,
    Comma,
    Semicolon,

    Assign,

    Add,
    Sub,
    Mul,
    Div,
    Mod,

    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    And,
    Or,
    Not,

    Ampersand,
    Pipe,
    Caret,
}

#[derive(NodeCopy!)]
pub enum Keyword {
    Using,
    Class,
    Interface,
    Type,

    Let,
    Var,
    Return,
    If,
    Else,
    While,
}

impl Keyword {
    pub fn lookup(s: &str) -> Option<Self> {
        let kw = match s {
            "using" => Keyword::Using,
            "class" => Keyword::Class,
            "interface" => Keyword::Interface,
            "type" => Keyword::Type,
            "let" => Keyword::Let,
            "var" => Keyword::Var,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            _ => return None,
        };

        Some(kw)
    }
}

impl TokenKind {
    pub fn token_name(&self) -> &'static str {
        match self {
            TokenKind::Keyword(kw) => match kw {
                Keyword::Using => "keyword `using`",
                Keyword::Class => "keyword `class`",
                Keyword::Interface => "keyword `interface`",
                Keyword::Type => "keyword `type`",
                Keyword::Let => "keyword `let`",
                Keyword::Var => "keyword `var`",
                Keyword::Return => "keyword `return`",
                Keyword::If => "keyword `if`",
                Keyword::Else => "keyword `else`",
                Keyword::While => "keyword `while`",
            },
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Integer(_) => "integer",
            TokenKind::String(_) => "string",
            TokenKind::Bool(_) => "boolean",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Dot => "`.`",
            TokenKind::Colon => "`:`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Assign => "`=`",
            TokenKind::Add => "`+`",
            TokenKind::Sub => "`-`",
            TokenKind::Mul => "`*`",
            TokenKind::Div => "`/`",
            TokenKind::Mod => "`%`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::And => "`&&`",
            TokenKind::Or => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::Ampersand => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
        }
    }
}
