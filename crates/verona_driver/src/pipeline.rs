use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use tracing::debug;
use verona_frontend::ParseOutcome;

/// The stages a compilation runs through. Implemented by the real compiler
/// and by stand-ins in tests.
pub trait Stages {
    type Ast;

    fn parse(&mut self, module: &Path, stdlib: &Path) -> ParseOutcome<Self::Ast>;

    /// Binds names in place, returning false on failure.
    fn resolve(&mut self, ast: &mut Self::Ast) -> bool;

    fn render(&self, ast: &Self::Ast) -> String;
}

/// Parses `module`, resolves it if parsing succeeded, and writes the
/// rendered tree to `out` whatever the outcome. Returns whether both stages
/// succeeded.
pub fn run<S: Stages>(
    stages: &mut S,
    module: &Path,
    stdlib: &Path,
    out: &mut impl Write,
) -> io::Result<bool> {
    let ParseOutcome { success, mut ast } = stages.parse(module, stdlib);
    debug!(success, "parsed");

    let success = success && {
        let resolved = stages.resolve(&mut ast);
        debug!(success = resolved, "resolved");
        resolved
    };

    writeln!(out, "{}", stages.render(&ast))?;
    out.flush()?;

    Ok(success)
}

pub fn exit_status(success: bool) -> u8 {
    if success {
        0
    } else {
        1
    }
}

pub fn exit_code(success: bool) -> ExitCode {
    ExitCode::from(exit_status(success))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use verona_frontend::ParseOutcome;

    use super::{exit_status, run, Stages};

    #[derive(Default)]
    struct Mock {
        parse_ok: bool,
        resolve_ok: bool,
        calls: Vec<String>,
        args: Option<(PathBuf, PathBuf)>,
    }

    impl Stages for Mock {
        type Ast = Vec<&'static str>;

        fn parse(&mut self, module: &Path, stdlib: &Path) -> ParseOutcome<Self::Ast> {
            self.calls.push("parse".into());
            self.args = Some((module.to_owned(), stdlib.to_owned()));
            ParseOutcome {
                success: self.parse_ok,
                ast: vec!["parsed"],
            }
        }

        fn resolve(&mut self, ast: &mut Self::Ast) -> bool {
            self.calls.push("resolve".into());
            ast.push("resolved");
            self.resolve_ok
        }

        fn render(&self, ast: &Self::Ast) -> String {
            format!("({})", ast.join(" "))
        }
    }

    fn run_mock(parse_ok: bool, resolve_ok: bool) -> (bool, Mock, String) {
        let mut mock = Mock {
            parse_ok,
            resolve_ok,
            ..Mock::default()
        };
        let mut out = Vec::new();

        let success = run(
            &mut mock,
            Path::new("main.verona"),
            Path::new("/opt/stdlib"),
            &mut out,
        )
        .unwrap();

        (success, mock, String::from_utf8(out).unwrap())
    }

    #[test]
    fn both_stages_succeed() {
        let (success, mock, out) = run_mock(true, true);

        assert!(success);
        assert_eq!(mock.calls, ["parse", "resolve"]);
        assert_eq!(out, "(parsed resolved)\n");
        assert_eq!(
            mock.args,
            Some(("main.verona".into(), "/opt/stdlib".into()))
        );
    }

    #[test]
    fn parse_failure_skips_resolution() {
        let (success, mock, out) = run_mock(false, true);

        assert!(!success);
        assert_eq!(mock.calls, ["parse"]);
        assert_eq!(out, "(parsed)\n");
    }

    #[test]
    fn resolve_failure_still_prints() {
        let (success, mock, out) = run_mock(true, false);

        assert!(!success);
        assert_eq!(mock.calls, ["parse", "resolve"]);
        assert_eq!(out, "(parsed resolved)\n");
    }

    #[test]
    fn exit_statuses() {
        assert_eq!(exit_status(true), 0);
        assert_eq!(exit_status(false), 1);
    }
}
