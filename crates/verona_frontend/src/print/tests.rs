use std::path::Path;

use verona_interner::Interner;
use verona_session::diagnostics::Diagnostic;
use verona_session::module_loader::HashMapLoader;
use verona_session::Session;
use verona_utils::assert_snapshot_with_source;
use verona_utils::keyvec::Key;

use super::{pretty, Printer, Sexpr};
use crate::ast::{DefPath, ModuleId, Resolution};

const BUILTIN: &str = "class I64 {}";

fn render(source: &str) -> String {
    let loader = HashMapLoader::new([
        ("main.verona", source),
        ("/std/builtin/builtin.verona", BUILTIN),
    ]);
    let interner = Interner::new();
    let mut session = Session::new(Vec::<Diagnostic>::new());

    let outcome = crate::parse(
        Path::new("main.verona"),
        Path::new("/std"),
        &loader,
        &mut session,
        &interner,
    );

    pretty(&outcome.ast, &interner)
}

#[test]
fn short_modules_stay_on_one_line() {
    let source = "class Foo { x: I64; }";

    assert_snapshot_with_source!(source => render(source), @r###"
    (program
      (module $0 "main" (class Foo (field x (ref I64))))
      (module $1 "builtin" (class I64)))
    "###);
}

#[test]
fn long_lists_are_broken_and_indented() {
    let source = "run(count: I64): I64 { let total = count + 1; return total; }";

    assert_snapshot_with_source!(source => render(source), @r###"
    (program
      (module $0 "main"
        (function run
          (params (param count (ref I64)))
          (result (ref I64))
          (block (let total (binop + (ref count) (int 1))) (return (ref total)))))
      (module $1 "builtin" (class I64)))
    "###);
}

#[test]
fn error_nodes_are_rendered() {
    let rendered = render("class A { x: ; }");

    assert!(rendered.contains("(class A (error))"), "{rendered}");
}

#[test]
fn strings_are_escaped() {
    let rendered = render(r#"f() { "a\"b\n"; }"#);

    assert!(rendered.contains(r#"(string "a\"b\n")"#), "{rendered}");
}

#[test]
fn rendering_is_deterministic() {
    let source = "class Foo[T] { bar(self, x: T): T { x } }";

    assert_eq!(render(source), render(source));
}

#[test]
fn leading_atoms_share_the_opening_line() {
    let sexpr = Sexpr::tagged(
        "a",
        [
            Sexpr::atom("b"),
            Sexpr::tagged("c", [Sexpr::atom("ddddd")]),
            Sexpr::tagged("e", []),
        ],
    );

    let mut out = String::new();
    sexpr.write(&mut out, 0, 10);
    assert_eq!(out, "(a b\n  (c ddddd)\n  (e))");

    let mut out = String::new();
    sexpr.write(&mut out, 0, 80);
    assert_eq!(out, "(a b (c ddddd) (e))");
}

#[test]
fn resolutions() {
    let interner = Interner::new();
    let printer = Printer {
        interner: &interner,
    };

    let def = Resolution::Def(DefPath {
        module: ModuleId::from_usize(1),
        names: vec![interner.intern("Foo"), interner.intern("bar")],
    });

    assert_eq!(printer.resolution(&def), "$1::Foo::bar");
    assert_eq!(
        printer.resolution(&Resolution::Module(ModuleId::from_usize(2))),
        "$2"
    );
    assert_eq!(printer.resolution(&Resolution::Local), "local");
    assert_eq!(printer.resolution(&Resolution::TypeParam), "typeparam");
}
