
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use verona_interner::Interner;
use verona_session::diagnostics::prelude::*;
use verona_session::diagnostics::sources::Source as _;
use verona_session::diagnostics::DiagnosticEmitter;
use verona_session::module_loader::{LoadedFile, ModuleLoader, SOURCE_EXTENSION};
use verona_session::sourcemap::Source;
use verona_session::Session;
use verona_utils::keyvec::KeyVec;

use crate::ast::{Module, ModuleFile, ModuleId, Program};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::ParseOutcome;

/// Name of the standard library module every program implicitly depends on.
pub const BUILTIN_MODULE: &str = "builtin";

#[derive(Debug)]
pub enum GatherModulesError {
    ModuleNotFound {
        name: String,
        site: Option<SourceSpan>,
    },

    BuiltinNotFound {
        stdlib: PathBuf,
    },
}

impl IntoDiagnostic<()> for GatherModulesError {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        match self {
            GatherModulesError::ModuleNotFound { name, site } => {
                let diagnostic =
                    Diagnostic::error().with_message(format!("couldn't find module `{name}`"));

                match site {
                    Some(site) => diagnostic.with_snippet(Snippet::primary(
                        "not found relative to this file or in the standard library",
                        site.source_id,
                        site.span,
                    )),
                    None => diagnostic,
                }
            }

            GatherModulesError::BuiltinNotFound { stdlib } => Diagnostic::error()
                .with_message(format!("module `{BUILTIN_MODULE}` not found"))
                .with_note(format!(
                    "the standard library was expected in `{}`",
                    stdlib.display()
                )),
        }
    }
}

/// Loads the root module, the builtin module and everything they reference,
/// breadth first. Modules are identified by their canonical location, so a
/// module referenced several times (or cyclically) is loaded once.
pub struct ModuleGatherer<'a, L: ModuleLoader, D: DiagnosticEmitter> {
    session: &'a mut Session<D>,
    loader: &'a L,
    interner: &'a Interner,
    stdlib: &'a Path,

    modules: KeyVec<ModuleId, Module>,
    by_location: HashMap<PathBuf, ModuleId>,
    import_sites: HashMap<ModuleId, SourceSpan>,
    queue: VecDeque<ModuleId>,

    success: bool,
}

impl<'a, L: ModuleLoader, D: DiagnosticEmitter> ModuleGatherer<'a, L, D> {
    pub fn new(
        session: &'a mut Session<D>,
        loader: &'a L,
        interner: &'a Interner,
        stdlib: &'a Path,
    ) -> Self {
        Self {
            session,
            loader,
            interner,
            stdlib,

            modules: KeyVec::new(),
            by_location: HashMap::new(),
            import_sites: HashMap::new(),
            queue: VecDeque::new(),

            success: true,
        }
    }

    pub fn run(mut self, module_path: &Path) -> ParseOutcome<Program> {
        let root = match self
            .loader
            .find_module(Path::new(""), &module_path.to_string_lossy())
        {
            Some(location) => self.add_module(location, None),
            None => {
                self.report(GatherModulesError::ModuleNotFound {
                    name: module_path.display().to_string(),
                    site: None,
                });

                self.modules.insert(Module {
                    name: module_name(module_path),
                    location: module_path.to_owned(),
                    files: vec![],
                })
            }
        };

        let builtin = match self.loader.find_module(self.stdlib, BUILTIN_MODULE) {
            Some(location) => Some(self.add_module(location, None)),
            None => {
                self.report(GatherModulesError::BuiltinNotFound {
                    stdlib: self.stdlib.to_owned(),
                });
                None
            }
        };

        while let Some(module_id) = self.queue.pop_front() {
            self.load_module(module_id);
        }

        info!(
            modules = self.modules.len(),
            success = self.success,
            "finished parsing"
        );

        ParseOutcome {
            success: self.success,
            ast: Program {
                modules: self.modules,
                root,
                builtin,
            },
        }
    }

    fn add_module(&mut self, location: PathBuf, site: Option<SourceSpan>) -> ModuleId {
        if let Some(&module_id) = self.by_location.get(&location) {
            return module_id;
        }

        let module_id = self.modules.insert(Module {
            name: module_name(&location),
            location: location.clone(),
            files: vec![],
        });

        debug!(?module_id, location = %location.display(), "discovered module");

        self.by_location.insert(location, module_id);
        if let Some(site) = site {
            self.import_sites.insert(module_id, site);
        }
        self.queue.push_back(module_id);

        module_id
    }

    fn load_module(&mut self, module_id: ModuleId) {
        let location = self.modules[module_id].location.clone();

        let files = match self.loader.load_module(&location) {
            Ok(files) => files,
            Err(err) => {
                let site = self.import_sites.get(&module_id).copied();
                if self.session.report(err, &site).is_err() {
                    self.success = false;
                }
                return;
            }
        };

        for file in files {
            let module_file = self.parse_file(file);
            self.modules[module_id].files.push(module_file);
        }
    }

    fn parse_file(&mut self, file: LoadedFile) -> ModuleFile {
        let LoadedFile { path, source } = file;
        let base = path.parent().map(Path::to_owned).unwrap_or_default();

        debug!(path = %path.display(), "parsing file");

        let (source_id, source) = self
            .session
            .sources
            .insert_and_get(Source::new(path.display().to_string(), source).with_path(path));

        let (tokens, lexer_errors) = Lexer::new(source.source_str(), self.interner).lex();
        let (parsed, parse_errors) = Parser::new(tokens).parse();

        if self.session.report_all(lexer_errors, &source_id).is_err() {
            self.success = false;
        }
        if self.session.report_all(parse_errors, &source_id).is_err() {
            self.success = false;
        }

        let interner = self.interner;
        let stdlib = self.stdlib;

        let mut imports = parsed.imports;
        for import in &mut imports {
            let name = &interner[import.name];
            let site = SourceSpan::new(import.span, source_id);

            let location = self
                .loader
                .find_module(&base, name)
                .or_else(|| self.loader.find_module(stdlib, name));

            match location {
                Some(location) => import.module = Some(self.add_module(location, Some(site))),
                None => self.report(GatherModulesError::ModuleNotFound {
                    name: name.to_owned(),
                    site: Some(site),
                }),
            }
        }

        ModuleFile {
            source_id,
            members: parsed.members,
            imports,
        }
    }

    fn report(&mut self, error: GatherModulesError) {
        if self.session.report(error, &()).is_err() {
            self.success = false;
        }
    }
}

/// `foo.verona` is named `foo`; a directory keeps its own name.
fn module_name(location: &Path) -> String {
    let is_file = location
        .extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION);

    let name = if is_file {
        location.file_stem()
    } else {
        location.file_name()
    };

    name.map_or_else(
        || location.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
