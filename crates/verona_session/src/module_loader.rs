use std::collections::BTreeMap;
use std::error::Error;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::{fs, io};

use crate::diagnostics::prelude::*;

/// Extension of source files. A directory module consists of every file
/// with this extension directly inside it.
pub const SOURCE_EXTENSION: &str = "verona";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub source: String,
}

pub trait ModuleLoader {
    /// Locates the module referred to as `name` from the directory `base`.
    ///
    /// `base/name` is tried first (a file or a directory), then
    /// `base/name.verona`. The returned location is canonical, so two
    /// references to the same module yield equal paths.
    fn find_module(&self, base: &Path, name: &str) -> Option<PathBuf>;

    /// Reads the files making up the module at `location`, ordered by path.
    fn load_module(&self, location: &Path) -> Result<Vec<LoadedFile>, ModuleLoaderError>;
}

#[derive(Debug)]
pub struct ModuleLoaderError {
    pub location: PathBuf,
    pub cause: Option<Box<dyn Error + Send + Sync>>,
}

impl IntoDiagnostic<Option<SourceSpan>> for ModuleLoaderError {
    fn into_diagnostic(self, source_span: &Option<SourceSpan>) -> Diagnostic {
        let mut diagnostic = Diagnostic::error().with_message(format!(
            "couldn't load module `{}`",
            self.location.display()
        ));

        if let Some(source_span) = source_span {
            diagnostic = diagnostic.with_snippet(Snippet::primary(
                "imported here",
                source_span.source_id,
                source_span.span,
            ));
        }

        if let Some(cause) = &self.cause {
            let mut note = cause.to_string();

            let mut source = cause.source();
            while let Some(inner) = source {
                let _ = write!(note, ": {inner}");
                source = inner.source();
            }

            diagnostic = diagnostic.with_note(note);
        }

        diagnostic
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FsLoaderError {
    #[error("error reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory `{}` contains no `.verona` files", path.display())]
    EmptyDirectory { path: PathBuf },
}

/// Loads modules from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl ModuleLoader for FsLoader {
    fn find_module(&self, base: &Path, name: &str) -> Option<PathBuf> {
        candidates(base, name)
            .into_iter()
            .find(|candidate| candidate.exists())
            .and_then(|candidate| fs::canonicalize(candidate).ok())
    }

    fn load_module(&self, location: &Path) -> Result<Vec<LoadedFile>, ModuleLoaderError> {
        let to_error = |cause: FsLoaderError| ModuleLoaderError {
            location: location.to_owned(),
            cause: Some(Box::new(cause)),
        };
        let io_error = |path: &Path, source| FsLoaderError::Io {
            path: path.to_owned(),
            source,
        };

        if !location.is_dir() {
            let source = fs::read_to_string(location)
                .map_err(|err| to_error(io_error(location, err)))?;

            return Ok(vec![LoadedFile {
                path: location.to_owned(),
                source,
            }]);
        }

        let entries =
            fs::read_dir(location).map_err(|err| to_error(io_error(location, err)))?;

        let mut paths = vec![];
        for entry in entries {
            let path = entry
                .map_err(|err| to_error(io_error(location, err)))?
                .path();

            if path.is_file() && has_source_extension(&path) {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(to_error(FsLoaderError::EmptyDirectory {
                path: location.to_owned(),
            }));
        }

        paths.sort();

        paths
            .into_iter()
            .map(|path| match fs::read_to_string(&path) {
                Ok(source) => Ok(LoadedFile { path, source }),
                Err(err) => Err(to_error(io_error(&path, err))),
            })
            .collect()
    }
}

/// An in-memory file system, keyed by normalized path. Directories exist
/// implicitly as prefixes of file paths.
#[derive(Debug, Clone, Default)]
pub struct HashMapLoader {
    pub files: BTreeMap<PathBuf, String>,
}

impl HashMapLoader {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(files: impl IntoIterator<Item = (P, S)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, source)| (normalize(&path.into()), source.into()))
                .collect(),
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

impl ModuleLoader for HashMapLoader {
    fn find_module(&self, base: &Path, name: &str) -> Option<PathBuf> {
        candidates(base, name)
            .into_iter()
            .map(|candidate| normalize(&candidate))
            .find(|candidate| self.files.contains_key(candidate) || self.is_dir(candidate))
    }

    fn load_module(&self, location: &Path) -> Result<Vec<LoadedFile>, ModuleLoaderError> {
        if let Some(source) = self.files.get(location) {
            return Ok(vec![LoadedFile {
                path: location.to_owned(),
                source: source.clone(),
            }]);
        }

        let files: Vec<_> = self
            .files
            .iter()
            .filter(|(path, _)| path.parent() == Some(location) && has_source_extension(path))
            .map(|(path, source)| LoadedFile {
                path: path.clone(),
                source: source.clone(),
            })
            .collect();

        if files.is_empty() {
            Err(ModuleLoaderError {
                location: location.to_owned(),
                cause: None,
            })
        } else {
            Ok(files)
        }
    }
}

fn candidates(base: &Path, name: &str) -> [PathBuf; 2] {
    let exact = base.join(name);

    let mut with_extension = exact.clone().into_os_string();
    with_extension.push(".");
    with_extension.push(SOURCE_EXTENSION);

    [exact, PathBuf::from(with_extension)]
}

fn has_source_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(SOURCE_EXTENSION))
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use temp_dir::TempDir;

    use super::{normalize, FsLoader, HashMapLoader, ModuleLoader};

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn hashmap_loader_finds_files_and_directories() {
        let loader = HashMapLoader::new([
            ("src/main.verona", "class Main {}"),
            ("src/util.verona", ""),
            ("src/lib/a.verona", ""),
            ("src/lib/b.verona", ""),
        ]);

        assert_eq!(
            loader.find_module(Path::new("src"), "util"),
            Some(PathBuf::from("src/util.verona"))
        );
        assert_eq!(
            loader.find_module(Path::new("src/lib"), "../util.verona"),
            Some(PathBuf::from("src/util.verona"))
        );
        assert_eq!(
            loader.find_module(Path::new("src"), "lib"),
            Some(PathBuf::from("src/lib"))
        );
        assert_eq!(loader.find_module(Path::new("src"), "missing"), None);

        let files = loader.load_module(Path::new("src/lib")).unwrap();
        let paths: Vec<_> = files.iter().map(|file| file.path.clone()).collect();
        assert_eq!(
            paths,
            [PathBuf::from("src/lib/a.verona"), PathBuf::from("src/lib/b.verona")]
        );
    }

    #[test]
    fn fs_loader_reads_directories_in_order() {
        let dir = TempDir::new().unwrap();
        let module = dir.child("module");
        std::fs::create_dir(&module).unwrap();
        std::fs::write(module.join("b.verona"), "b").unwrap();
        std::fs::write(module.join("a.verona"), "a").unwrap();
        std::fs::write(module.join("notes.txt"), "ignored").unwrap();

        let location = FsLoader.find_module(dir.path(), "module").unwrap();
        assert!(location.is_absolute());

        let files = FsLoader.load_module(&location).unwrap();
        let sources: Vec<_> = files.iter().map(|file| file.source.as_str()).collect();
        assert_eq!(sources, ["a", "b"]);
    }

    #[test]
    fn fs_loader_appends_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child("foo.verona"), "").unwrap();

        let by_stem = FsLoader.find_module(dir.path(), "foo").unwrap();
        let by_name = FsLoader.find_module(dir.path(), "foo.verona").unwrap();
        assert_eq!(by_stem, by_name);

        assert!(FsLoader.find_module(dir.path(), "bar").is_none());
    }

    #[test]
    fn fs_loader_rejects_empty_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.child("empty")).unwrap();

        let location = FsLoader.find_module(dir.path(), "empty").unwrap();
        let err = FsLoader.load_module(&location).unwrap_err();

        assert!(err
            .cause
            .unwrap()
            .to_string()
            .contains("contains no `.verona` files"));
    }
}
