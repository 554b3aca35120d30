use std::io;

use termcolor::{ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

use super::sources::{Source, Sources};
use super::{Config, Diagnostic, Severity, Snippet, SnippetKind};

const TAB: &str = "    ";

impl<S: Sources> Diagnostic<S> {
    pub fn write_to_stream(
        &self,
        sources: &S,
        config: &Config,
        stream: &mut impl WriteColor,
    ) -> io::Result<()> {
        DiagnosticWriter {
            diagnostic: self,
            sources,
            stream,
            config,
        }
        .draw_all()
    }
}

struct DiagnosticWriter<'stream, 'a, W: WriteColor, S: Sources> {
    diagnostic: &'a Diagnostic<S>,
    sources: &'a S,

    stream: &'stream mut W,
    config: &'a Config,
}

impl<'a, W: WriteColor, S: Sources> DiagnosticWriter<'_, 'a, W, S> {
    fn draw_all(mut self) -> io::Result<()> {
        self.draw_header()?;

        for snippet in &self.diagnostic.snippets {
            self.draw_snippet(snippet)?;
        }

        for note in &self.diagnostic.notes {
            self.stream.set_color(&self.config.emphasis)?;
            write!(self.stream, "  = note:")?;
            self.stream.reset()?;
            writeln!(self.stream, " {note}")?;
        }

        writeln!(self.stream)?;

        Ok(())
    }

    fn draw_header(&mut self) -> io::Result<()> {
        self.stream.set_color(self.severity_color())?;

        write!(self.stream, "{}", self.diagnostic.severity.as_str())?;
        if let Some(id) = &self.diagnostic.id {
            write!(self.stream, "[{id}]")?;
        }
        write!(self.stream, ":")?;

        self.stream.reset()?;

        match &self.diagnostic.message {
            Some(message) => writeln!(self.stream, " {message}"),
            None => writeln!(self.stream),
        }
    }

    fn draw_snippet(&mut self, snippet: &Snippet<S>) -> io::Result<()> {
        let Some(source) = self.sources.get_source(snippet.source_id()) else {
            return self.draw_unknown_location(snippet.label());
        };

        // clamp so that a stale span still points somewhere sensible
        let len = source.source_str().len();
        let start = snippet.span().start.min(len);
        let end = snippet.span().end.clamp(start, len);

        let line_index = source.byte_to_line_index(start).unwrap_or(0);
        let (line_num, col_num) = source.byte_to_line_col(start).unwrap_or((1, 1));
        let line_num_width = 1 + line_num.ilog10() as usize;

        self.stream.set_color(&self.config.subtle)?;
        write!(self.stream, "{:>line_num_width$}{} ", "", self.config.arrow)?;
        write!(self.stream, "{}:{line_num}:{col_num}", source.name_str())?;
        self.stream.reset()?;
        writeln!(self.stream)?;

        let line_start = source.line_to_byte(line_index).unwrap_or(0);
        let line_str = source.line_str(line_index).unwrap_or_default();
        let line_end = line_start + line_str.len();

        self.draw_gutter(None, line_num_width)?;
        writeln!(self.stream)?;

        self.draw_gutter(Some(line_num), line_num_width)?;
        writeln!(self.stream, "{}", line_str.replace('\t', TAB))?;

        self.draw_gutter(None, line_num_width)?;

        let before = &source.source_str()[line_start..start.min(line_end)];
        let underlined = &source.source_str()[start.min(line_end)..end.min(line_end)];
        let offset = str_width(before);
        let width = str_width(underlined).max(1);

        let underline = match snippet.kind() {
            SnippetKind::Primary => self.config.primary_underline,
            SnippetKind::Secondary => self.config.secondary_underline,
        };

        write!(self.stream, "{:offset$}", "")?;
        self.stream.set_color(self.snippet_color(snippet.kind()))?;
        write!(self.stream, "{}", underline.repeat(width))?;
        if !snippet.label().is_empty() {
            write!(self.stream, " {}", snippet.label())?;
        }
        self.stream.reset()?;
        writeln!(self.stream)?;

        Ok(())
    }

    fn draw_unknown_location(&mut self, label: &str) -> io::Result<()> {
        self.stream.set_color(&self.config.subtle)?;
        write!(self.stream, "{} <unknown source>", self.config.arrow)?;
        self.stream.reset()?;

        if label.is_empty() {
            writeln!(self.stream)
        } else {
            writeln!(self.stream, ": {label}")
        }
    }

    fn draw_gutter(&mut self, line: Option<usize>, line_num_width: usize) -> io::Result<()> {
        self.stream.set_color(&self.config.subtle)?;

        match line {
            Some(line) => write!(self.stream, "{line:>line_num_width$}")?,
            None => write!(self.stream, "{:>line_num_width$}", "")?,
        }

        write!(self.stream, " {} ", self.config.gutter)?;

        self.stream.reset()
    }

    fn severity_color(&self) -> &'a ColorSpec {
        match self.diagnostic.severity {
            Severity::Warning => &self.config.warning_color,
            Severity::Error => &self.config.error_color,
        }
    }

    fn snippet_color(&self, kind: SnippetKind) -> &'a ColorSpec {
        match kind {
            SnippetKind::Primary => self.severity_color(),
            SnippetKind::Secondary => &self.config.emphasis,
        }
    }
}

fn str_width(s: &str) -> usize {
    let num_tabs = s.chars().filter(|&ch| ch == '\t').count();
    s.width() + num_tabs * TAB.len()
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use crate::sources::{Cached, Sources};
    use crate::{Config, Diagnostic, Snippet};

    fn diagnostic_to_string<S: Sources>(diagnostic: &Diagnostic<S>, sources: &S) -> String {
        let mut stream = NoColor::new(vec![]);

        diagnostic
            .write_to_stream(sources, &Config::default(), &mut stream)
            .unwrap();

        String::from_utf8(stream.into_inner()).unwrap()
    }

    fn sources(source: &str) -> Vec<Cached<(String, String)>> {
        vec![Cached::new(("main.verona".to_owned(), source.to_owned()))]
    }

    #[test]
    fn primary_snippet() {
        let sources = sources("class Foo {\n  bar(): Baz;\n}\n");

        let diagnostic = Diagnostic::error()
            .with_message("undefined name `Baz`")
            .with_snippet(Snippet::primary("not found in scope", 0, 21..24));

        assert_eq!(
            diagnostic_to_string(&diagnostic, &sources),
            "error: undefined name `Baz`\n \
             --> main.verona:2:10\n  \
             │ \n\
             2 │   bar(): Baz;\n  \
             │          ^^^ not found in scope\n\n"
        );
    }

    #[test]
    fn secondary_snippet_and_note() {
        let sources = sources("f();\nf();\n");

        let diagnostic = Diagnostic::error()
            .with_message("duplicate definition")
            .with_id("E1")
            .with_snippet(Snippet::secondary("first", 0, 0..1))
            .with_note("names must be unique");

        let rendered = diagnostic_to_string(&diagnostic, &sources);

        assert!(rendered.starts_with("error[E1]: duplicate definition\n"));
        assert!(rendered.contains("1 │ f();\n"));
        assert!(rendered.contains("  │ - first\n"));
        assert!(rendered.contains("  = note: names must be unique\n"));
    }

    #[test]
    fn span_past_end_is_clamped() {
        let sources = sources("x");

        let diagnostic =
            Diagnostic::error().with_snippet(Snippet::primary("end of file", 0, 5..9));

        let rendered = diagnostic_to_string(&diagnostic, &sources);
        assert!(rendered.contains("--> main.verona:1:2"));
        assert!(rendered.contains("^ end of file"));
    }

    #[test]
    fn missing_source() {
        let sources = sources("");

        let diagnostic = Diagnostic::warning()
            .with_message("lost")
            .with_snippet(Snippet::primary("here", 3, 0..1));

        let rendered = diagnostic_to_string(&diagnostic, &sources);
        assert_eq!(rendered, "warning: lost\n--> <unknown source>: here\n\n");
    }
}
