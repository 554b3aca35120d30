use std::collections::HashMap;

use verona_frontend::ast::{DefPath, EntityKind, Member, ModuleId, Program};
use verona_interner::Istr;
use verona_session::sourcemap::{SourceId, SourceSpan};
use verona_utils::keyvec::KeyVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Class,
    Interface,
    TypeAlias,
    Field,
    Function,
}

impl DefKind {
    pub fn is_type(self) -> bool {
        matches!(self, DefKind::Class | DefKind::Interface | DefKind::TypeAlias)
    }

    pub fn is_entity(self) -> bool {
        matches!(self, DefKind::Class | DefKind::Interface)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DefKind::Class => "class",
            DefKind::Interface => "interface",
            DefKind::TypeAlias => "type alias",
            DefKind::Field => "field",
            DefKind::Function => "function",
        }
    }
}

#[derive(Debug)]
pub struct Def {
    pub kind: DefKind,
    pub site: SourceSpan,
    /// Members of a class or interface. Empty for everything else.
    pub members: Namespace,
}

#[derive(Debug, Default)]
pub struct Namespace {
    defs: HashMap<Istr, Def>,
}

impl Namespace {
    pub fn get(&self, name: Istr) -> Option<&Def> {
        self.defs.get(&name)
    }

    pub fn contains(&self, name: Istr) -> bool {
        self.defs.contains_key(&name)
    }

    /// Keeps the first definition of a name, returning its site if `def`
    /// would replace it.
    pub fn insert(&mut self, name: Istr, def: Def) -> Result<(), SourceSpan> {
        match self.defs.get(&name) {
            Some(first) => Err(first.site),
            None => {
                self.defs.insert(name, def);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate {
    pub name: Istr,
    pub first: SourceSpan,
    pub second: SourceSpan,
}

/// Every named definition in the program, per module. Definitions from all
/// the files of a module share one namespace.
#[derive(Debug, Default)]
pub struct DefTable {
    modules: KeyVec<ModuleId, Namespace>,
}

impl DefTable {
    pub fn build(program: &Program) -> (Self, Vec<Duplicate>) {
        let mut modules = KeyVec::new();
        let mut duplicates = vec![];

        for module in &program.modules {
            let mut namespace = Namespace::default();
            for file in &module.files {
                declare_members(
                    &mut namespace,
                    &file.members,
                    file.source_id,
                    &mut duplicates,
                );
            }

            let _: ModuleId = modules.insert(namespace);
        }

        (Self { modules }, duplicates)
    }

    /// # Panics
    /// Panics if the module is not part of the program the table was built
    /// from.
    pub fn module(&self, module_id: ModuleId) -> &Namespace {
        &self.modules[module_id]
    }

    pub fn lookup(&self, path: &DefPath) -> Option<&Def> {
        let (first, rest) = path.names.split_first()?;

        let mut def = self.modules.get(path.module)?.get(*first)?;
        for name in rest {
            def = def.members.get(*name)?;
        }

        Some(def)
    }
}

fn declare_members(
    namespace: &mut Namespace,
    members: &[Member],
    source_id: SourceId,
    duplicates: &mut Vec<Duplicate>,
) {
    for member in members {
        let (ident, kind) = match member {
            Member::Entity(entity) => (
                entity.ident,
                match entity.kind {
                    EntityKind::Class => DefKind::Class,
                    EntityKind::Interface => DefKind::Interface,
                },
            ),
            Member::TypeAlias(alias) => (alias.ident, DefKind::TypeAlias),
            Member::Field(field) => (field.ident, DefKind::Field),
            Member::Function(function) => (function.ident, DefKind::Function),
            Member::Using(_) | Member::ParseError(_) => continue,
        };

        let mut members = Namespace::default();
        if let Member::Entity(entity) = member {
            declare_members(&mut members, &entity.members, source_id, duplicates);
        }

        let site = SourceSpan::new(ident.span, source_id);
        let def = Def {
            kind,
            site,
            members,
        };

        if let Err(first) = namespace.insert(ident.istr, def) {
            duplicates.push(Duplicate {
                name: ident.istr,
                first,
                second: site,
            });
        }
    }
}
