#[macro_use]
extern crate macro_rules_attribute;

mod lexer;
mod parser;

mod gather_modules;

pub mod ast;
pub mod print;
pub mod token;

use std::path::Path;

pub use gather_modules::{GatherModulesError, BUILTIN_MODULE};
pub use lexer::{LexerError, LexerErrorKind, TokenIter};
pub use parser::{ParseError, ParsedFile};

use gather_modules::ModuleGatherer;
use lexer::Lexer;
use parser::Parser;
use verona_interner::Interner;
use verona_session::diagnostics::DiagnosticEmitter;
use verona_session::module_loader::ModuleLoader;
use verona_session::Session;

derive_alias! {
    #[derive(Node!)] = #[derive(Debug, Clone, PartialEq, Eq)];
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)];
}

/// The result of the parse stage. The tree is always present; `success` is
/// false if any module failed to load, lex or parse.
#[derive(Debug, Clone)]
pub struct ParseOutcome<A> {
    pub success: bool,
    pub ast: A,
}

pub fn lex(source: &str, interner: &Interner) -> (TokenIter, Vec<LexerError>) {
    Lexer::new(source, interner).lex()
}

pub fn parse_tokens(tokens: TokenIter) -> (ParsedFile, Vec<ParseError>) {
    Parser::new(tokens).parse()
}

/// Loads and parses the module at `module_path` along with the builtin
/// module from `stdlib_path` and every module either of them references.
pub fn parse<L: ModuleLoader, D: DiagnosticEmitter>(
    module_path: &Path,
    stdlib_path: &Path,
    loader: &L,
    session: &mut Session<D>,
    interner: &Interner,
) -> ParseOutcome<ast::Program> {
    ModuleGatherer::new(session, loader, interner, stdlib_path).run(module_path)
}
