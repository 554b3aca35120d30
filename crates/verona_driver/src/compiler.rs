use std::path::Path;

use verona_frontend::ast::Program;
use verona_frontend::{print, ParseOutcome};
use verona_interner::Interner;
use verona_session::diagnostics::DiagnosticEmitter;
use verona_session::module_loader::ModuleLoader;
use verona_session::Session;

use crate::pipeline::Stages;

/// The front end proper: parsing with `verona_frontend`, resolution with
/// `verona_middle`, and S-expression rendering.
pub struct Compiler<D: DiagnosticEmitter, L: ModuleLoader> {
    pub session: Session<D>,
    pub interner: Interner,
    pub loader: L,
}

impl<D: DiagnosticEmitter, L: ModuleLoader> Compiler<D, L> {
    pub fn new(diagnostics: D, loader: L) -> Self {
        Self {
            session: Session::new(diagnostics),
            interner: Interner::new(),
            loader,
        }
    }
}

impl<D: DiagnosticEmitter, L: ModuleLoader> Stages for Compiler<D, L> {
    type Ast = Program;

    fn parse(&mut self, module: &Path, stdlib: &Path) -> ParseOutcome<Program> {
        verona_frontend::parse(
            module,
            stdlib,
            &self.loader,
            &mut self.session,
            &self.interner,
        )
    }

    fn resolve(&mut self, ast: &mut Program) -> bool {
        verona_middle::resolve(ast, &mut self.session, &self.interner)
    }

    fn render(&self, ast: &Program) -> String {
        print::pretty(ast, &self.interner)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use verona_session::diagnostics::Diagnostic;
    use verona_session::module_loader::{FsLoader, HashMapLoader};

    use super::Compiler;
    use crate::pipeline::run;

    const STDLIB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../stdlib");

    fn compile(root: &str, files: &[(&str, &str)]) -> (bool, String, Vec<Diagnostic>) {
        let mut compiler = Compiler::new(
            Vec::<Diagnostic>::new(),
            HashMapLoader::new(files.iter().copied()),
        );
        let mut out = Vec::new();

        let success = run(&mut compiler, Path::new(root), Path::new("/std"), &mut out).unwrap();

        (
            success,
            String::from_utf8(out).unwrap(),
            compiler.session.diagnostics,
        )
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter_map(|diagnostic| diagnostic.message.as_deref())
            .collect()
    }

    const BUILTIN: (&str, &str) = ("/std/builtin/builtin.verona", "class I64 {}");

    #[test]
    fn resolves_against_builtin() {
        let (success, out, diagnostics) = compile(
            "main.verona",
            &[("main.verona", "class Foo { x: I64; }"), BUILTIN],
        );

        assert!(success, "{diagnostics:?}");
        assert!(out.contains("(field x (ref I64 -> $1::I64))"), "{out}");
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn syntax_error_skips_resolution() {
        let (success, out, diagnostics) = compile(
            "main.verona",
            &[("main.verona", "class Foo { x: I64; } class"), BUILTIN],
        );

        assert!(!success);
        let messages = messages(&diagnostics);
        assert!(!messages.is_empty());
        assert!(messages.iter().all(|message| *message == "syntax error"));
        // unresolved, since the resolver never ran
        assert!(out.contains("(ref I64)"), "{out}");
    }

    #[test]
    fn undefined_name_fails() {
        let (success, out, diagnostics) = compile(
            "main.verona",
            &[("main.verona", "class Foo { x: Nope; }"), BUILTIN],
        );

        assert!(!success);
        assert_eq!(messages(&diagnostics), ["undefined name `Nope`"]);
        assert!(out.contains("(ref Nope)"), "{out}");
    }

    #[test]
    fn radix_prefix_without_digits_fails() {
        let (success, out, diagnostics) = compile(
            "main.verona",
            &[("main.verona", "class Foo { x: I64 = 0x; }"), BUILTIN],
        );

        assert!(!success);
        assert_eq!(messages(&diagnostics), ["syntax error"]);
        assert!(out.contains("(field x (ref I64) (int 0))"), "{out}");
    }

    #[test]
    fn integer_overflow_is_a_single_error() {
        let (success, out, diagnostics) = compile(
            "main.verona",
            &[
                ("main.verona", "class Foo { x: I64 = 100000000000000000000; y: I64; }"),
                BUILTIN,
            ],
        );

        assert!(!success);
        assert_eq!(messages(&diagnostics), ["syntax error"]);
        assert!(out.contains("(field y (ref I64))"), "{out}");
    }

    #[test]
    fn real_stdlib_is_well_formed() {
        let dir = temp_dir::TempDir::new().unwrap();
        let main = dir.child("main.verona");
        std::fs::write(
            &main,
            "f(a: I64, b: Array[String]): Option[Bool] { a.lt(b.size()) }",
        )
        .unwrap();

        let mut compiler = Compiler::new(Vec::<Diagnostic>::new(), FsLoader);
        let mut out = Vec::new();
        let stdlib = std::fs::canonicalize(STDLIB).unwrap();

        let success = run(&mut compiler, &main, &stdlib, &mut out).unwrap();

        assert!(success, "{:?}", messages(&compiler.session.diagnostics));
    }
}
