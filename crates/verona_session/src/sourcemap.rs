use std::path::{Path, PathBuf};

use verona_diagnostic::sources::{Cached, Sources};
use verona_diagnostic::span::Span;
use verona_utils::keyvec::{declare_key_type, KeyVec};

declare_key_type! {
    pub struct SourceId;
}

#[derive(Default, Debug, Clone)]
pub struct SourceMap {
    inner: KeyVec<SourceId, Cached<Source>>,
}

#[derive(Debug, Clone)]
pub struct Source {
    /// Short name shown in diagnostics.
    pub name: String,
    pub path: Option<PathBuf>,
    pub source: String,
}

impl Source {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl SourceMap {
    pub fn insert(&mut self, source: Source) -> SourceId {
        self.inner.insert(Cached::new(source))
    }

    #[allow(clippy::missing_panics_doc)]
    pub fn insert_and_get(&mut self, source: Source) -> (SourceId, &Cached<Source>) {
        let id = self.insert(source);
        (id, &self.inner[id])
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Sources for SourceMap {
    type SourceId = SourceId;
    type Source = Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.inner.get(id)
    }
}

impl verona_diagnostic::sources::Source for Source {
    fn name_str(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn source_str(&self) -> &str {
        &self.source
    }
}

/// A span together with the source it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub span: Span,
    pub source_id: SourceId,
}

impl SourceSpan {
    pub fn new(span: Span, source_id: SourceId) -> Self {
        Self { span, source_id }
    }
}
