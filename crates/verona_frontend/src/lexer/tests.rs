use verona_interner::Interner;

use super::{Lexer, LexerError, LexerErrorKind};
use crate::token::{Keyword, TokenKind};

fn lex(source: &str, interner: &Interner) -> (Vec<TokenKind>, Vec<LexerError>) {
    let (tokens, errors) = Lexer::new(source, interner).lex();
    (tokens.map(|token| token.kind).collect(), errors)
}

fn error_kinds(errors: &[LexerError]) -> Vec<LexerErrorKind> {
    errors.iter().map(|err| err.kind).collect()
}

#[test]
fn integers() {
    let interner = Interner::new();
    let (tokens, errors) = lex("100 0x1F 0o17 0b101 1_000", &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [
            TokenKind::Integer(100),
            TokenKind::Integer(31),
            TokenKind::Integer(15),
            TokenKind::Integer(5),
            TokenKind::Integer(1000),
        ]
    );
}

#[test]
fn integer_overflow() {
    let interner = Interner::new();
    let (tokens, errors) = lex("100000000000000000000;", &interner);

    assert_eq!(tokens, [TokenKind::Integer(0), TokenKind::Semicolon]);
    assert_eq!(error_kinds(&errors), [LexerErrorKind::IntegerOverflow]);
    assert_eq!(errors[0].span.end, 21);
}

#[test]
fn digit_wrong_base() {
    let interner = Interner::new();
    let (tokens, errors) = lex("0b102", &interner);

    assert_eq!(tokens, [TokenKind::Integer(0)]);

    assert_eq!(
        error_kinds(&errors),
        [LexerErrorKind::IntegerDigitWrongBase {
            base: 2,
            digit: '2'
        }]
    );
}

#[test]
fn radix_prefix_without_digits() {
    let interner = Interner::new();

    for (source, base) in [("0x", 16), ("0b", 2), ("0o", 8), ("0x_", 16)] {
        let (tokens, errors) = lex(source, &interner);

        assert_eq!(tokens, [TokenKind::Integer(0)], "{source}");
        assert_eq!(
            error_kinds(&errors),
            [LexerErrorKind::IntegerNoDigits(base)],
            "{source}"
        );
        assert_eq!((errors[0].span.start, errors[0].span.end), (0, source.len()));
    }
}

#[test]
fn zero_and_underscores() {
    let interner = Interner::new();
    let (tokens, errors) = lex("0 0x_ff 0_", &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [
            TokenKind::Integer(0),
            TokenKind::Integer(255),
            TokenKind::Integer(0),
        ]
    );
}

#[test]
fn keywords_and_identifiers() {
    let interner = Interner::new();
    let (tokens, errors) = lex("class Foo { let x = true; }", &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [
            TokenKind::Keyword(Keyword::Class),
            TokenKind::Identifier(interner.intern("Foo")),
            TokenKind::LBrace,
            TokenKind::Keyword(Keyword::Let),
            TokenKind::Identifier(interner.intern("x")),
            TokenKind::Assign,
            TokenKind::Bool(true),
            TokenKind::Semicolon,
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn compound_operators() {
    let interner = Interner::new();
    let (tokens, errors) = lex(":: : == = != ! <= < >= > && & || |", &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [
            TokenKind::DoubleColon,
            TokenKind::Colon,
            TokenKind::EqEq,
            TokenKind::Assign,
            TokenKind::NotEq,
            TokenKind::Not,
            TokenKind::LtEq,
            TokenKind::Lt,
            TokenKind::GtEq,
            TokenKind::Gt,
            TokenKind::And,
            TokenKind::Ampersand,
            TokenKind::Or,
            TokenKind::Pipe,
        ]
    );
}

#[test]
fn comments() {
    let interner = Interner::new();
    let (tokens, errors) = lex("a // line\n/* block /* nested */ still */ b", &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [
            TokenKind::Identifier(interner.intern("a")),
            TokenKind::Identifier(interner.intern("b")),
        ]
    );
}

#[test]
fn unterminated_comment() {
    let interner = Interner::new();
    let (tokens, errors) = lex("a /* /* */", &interner);

    assert_eq!(tokens.len(), 1);
    assert_eq!(error_kinds(&errors), [LexerErrorKind::UnterminatedComment]);
}

#[test]
fn strings() {
    let interner = Interner::new();
    let (tokens, errors) = lex(r#""hello\n\"world\"""#, &interner);

    assert!(errors.is_empty());
    assert_eq!(
        tokens,
        [TokenKind::String(interner.intern("hello\n\"world\""))]
    );
}

#[test]
fn unterminated_string_still_produces_token() {
    let interner = Interner::new();
    let source = "x = \"abc";
    let (tokens, errors) = lex(source, &interner);

    assert_eq!(
        tokens,
        [
            TokenKind::Identifier(interner.intern("x")),
            TokenKind::Assign,
            TokenKind::String(interner.intern("abc")),
        ]
    );
    assert_eq!(error_kinds(&errors), [LexerErrorKind::UnterminatedString]);
    assert_eq!((errors[0].span.start, errors[0].span.end), (4, source.len()));
}

#[test]
fn invalid_escape() {
    let interner = Interner::new();
    let (tokens, errors) = lex(r#""a\qb""#, &interner);

    assert_eq!(tokens, [TokenKind::String(interner.intern("aqb"))]);
    assert_eq!(error_kinds(&errors), [LexerErrorKind::InvalidEscape('q')]);
    assert_eq!((errors[0].span.start, errors[0].span.end), (2, 4));
}

#[test]
fn unexpected_char() {
    let interner = Interner::new();
    let (tokens, errors) = lex("a $ b", &interner);

    assert_eq!(tokens.len(), 2);
    assert_eq!(error_kinds(&errors), [LexerErrorKind::UnexpectedChar('$')]);
}

#[test]
fn spans_cover_tokens() {
    let interner = Interner::new();
    let (tokens, _) = Lexer::new("  foo::bar", &interner).lex();
    let spans: Vec<_> = tokens.map(|t| (t.span.start, t.span.end)).collect();

    assert_eq!(spans, [(2, 5), (5, 7), (7, 10)]);
}
