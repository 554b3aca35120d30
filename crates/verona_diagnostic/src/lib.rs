mod render;
pub mod sources;
pub mod span;

use derive_where::derive_where;
pub use termcolor;
use termcolor::{Color, ColorSpec};

use self::sources::Sources;
use self::span::{AsSpan, Span};

#[derive_where(Debug, Clone; S::SourceId)]
pub struct Diagnostic<S: Sources> {
    pub severity: Severity,

    pub message: Option<String>,
    pub id: Option<String>,

    pub snippets: Vec<Snippet<S>>,
    pub notes: Vec<String>,
}

impl<S: Sources> Diagnostic<S> {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            message: None,
            id: None,
            snippets: vec![],
            notes: vec![],
        }
    }

    pub fn warning() -> Self {
        Self::new(Severity::Warning)
    }

    pub fn error() -> Self {
        Self::new(Severity::Error)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: Snippet<S>) -> Self {
        self.snippets.push(snippet);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive_where(Debug, Clone; S::SourceId)]
pub struct Snippet<S: Sources> {
    label: String,
    kind: SnippetKind,

    source_id: S::SourceId,
    span: Span,
}

impl<S: Sources> Snippet<S> {
    pub fn new(
        kind: SnippetKind,
        label: impl Into<String>,
        source_id: S::SourceId,
        span: impl AsSpan,
    ) -> Self {
        Self {
            label: label.into(),
            kind,

            source_id,
            span: span.as_span(),
        }
    }

    pub fn primary(label: impl Into<String>, source_id: S::SourceId, span: impl AsSpan) -> Self {
        Self::new(SnippetKind::Primary, label, source_id, span)
    }

    pub fn secondary(label: impl Into<String>, source_id: S::SourceId, span: impl AsSpan) -> Self {
        Self::new(SnippetKind::Secondary, label, source_id, span)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> SnippetKind {
        self.kind
    }

    pub fn source_id(&self) -> S::SourceId {
        self.source_id
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnippetKind {
    Primary,
    Secondary,
}

#[derive(Debug)]
pub struct Config {
    pub error_color: ColorSpec,
    pub warning_color: ColorSpec,

    pub emphasis: ColorSpec,
    pub subtle: ColorSpec,

    pub gutter: &'static str,
    pub arrow: &'static str,

    pub primary_underline: &'static str,
    pub secondary_underline: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        let mut error_color = ColorSpec::new();
        error_color.set_fg(Some(Color::Red));
        error_color.set_bold(true);

        let mut warning_color = ColorSpec::new();
        warning_color.set_fg(Some(Color::Yellow));
        warning_color.set_bold(true);

        let mut subtle = ColorSpec::new();
        subtle.set_dimmed(true);

        let mut emphasis = ColorSpec::new();
        emphasis.set_fg(Some(Color::Blue));
        emphasis.set_bold(true);

        Self {
            error_color,
            warning_color,
            emphasis,
            subtle,

            gutter: "│",
            arrow: "-->",

            primary_underline: "^",
            secondary_underline: "-",
        }
    }
}
