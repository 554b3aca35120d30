pub mod diagnostics;
pub mod module_loader;
pub mod sourcemap;

use diagnostics::{DiagnosticEmitter, IntoDiagnostic, Severity};
use sourcemap::SourceMap;

/// Returned when a reported diagnostic was an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorsEmitted;

/// State shared by every stage of one compilation: the loaded sources and
/// where diagnostics go.
pub struct Session<D: DiagnosticEmitter> {
    pub sources: SourceMap,
    pub diagnostics: D,

    error_count: usize,
}

impl<D: DiagnosticEmitter> Session<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            sources: SourceMap::default(),
            diagnostics,

            error_count: 0,
        }
    }

    pub fn report<Context: ?Sized>(
        &mut self,
        diagnostic: impl IntoDiagnostic<Context>,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted> {
        let diagnostic = diagnostic.into_diagnostic(cx);
        let severity = diagnostic.severity;

        self.diagnostics.emit_diagnostic(diagnostic, &self.sources);

        if severity < Severity::Error {
            Ok(())
        } else {
            self.error_count += 1;
            Err(ErrorsEmitted)
        }
    }

    pub fn report_all<Context: ?Sized, I>(
        &mut self,
        diagnostics: I,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted>
    where
        I: IntoIterator,
        I::Item: IntoDiagnostic<Context>,
    {
        let mut had_error = false;

        for diagnostic in diagnostics {
            had_error |= self.report(diagnostic, cx).is_err();
        }

        if had_error {
            Err(ErrorsEmitted)
        } else {
            Ok(())
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn had_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Diagnostic;
    use crate::{ErrorsEmitted, Session};

    #[test]
    fn errors_are_counted() {
        let mut session = Session::new(vec![]);

        assert_eq!(session.report(Diagnostic::warning(), &()), Ok(()));
        assert!(!session.had_errors());

        let result = session.report_all([Diagnostic::error(), Diagnostic::warning()], &());
        assert_eq!(result, Err(ErrorsEmitted));
        assert_eq!(session.error_count(), 1);
        assert_eq!(session.diagnostics.len(), 3);
    }
}
