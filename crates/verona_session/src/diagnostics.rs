use verona_diagnostic::termcolor::{ColorChoice, StandardStream};

pub use verona_diagnostic::*;

use crate::sourcemap::SourceMap;

pub mod prelude {
    pub use super::{Diagnostic, IntoDiagnostic, Snippet};
    pub use crate::sourcemap::{SourceId, SourceSpan};
    pub use verona_diagnostic::span::Span;
    pub use verona_diagnostic::{Severity, SnippetKind};
}

pub type Diagnostic = verona_diagnostic::Diagnostic<SourceMap>;
pub type Snippet = verona_diagnostic::Snippet<SourceMap>;

pub trait DiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap);
}

/// Collects diagnostics instead of printing them.
impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, _sources: &SourceMap) {
        self.push(diagnostic);
    }
}

#[derive(Debug)]
pub struct PrettyDiagnosticEmitter {
    pub stream: StandardStream,
    pub config: Config,
}

impl Default for PrettyDiagnosticEmitter {
    fn default() -> Self {
        Self {
            stream: StandardStream::stderr(ColorChoice::Auto),
            config: Config::default(),
        }
    }
}

impl DiagnosticEmitter for PrettyDiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap) {
        if let Err(err) = diagnostic.write_to_stream(sources, &self.config, &mut self.stream) {
            tracing::warn!("failed to emit diagnostic: {err}");
        }
    }
}

pub trait IntoDiagnostic<Context: ?Sized> {
    fn into_diagnostic(self, cx: &Context) -> Diagnostic;
}

impl IntoDiagnostic<()> for Diagnostic {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        self
    }
}
