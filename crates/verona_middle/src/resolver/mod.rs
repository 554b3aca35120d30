
mod scope;

use tracing::debug;
use verona_frontend::ast::*;
use verona_interner::{Interner, Istr};
use verona_session::diagnostics::prelude::*;
use verona_session::diagnostics::DiagnosticEmitter;
use verona_session::Session;

use scope::{DefTable, Duplicate};

#[derive(Debug)]
pub enum ResolverError {
    Undefined {
        name: String,
        site: SourceSpan,
    },

    UndefinedMember {
        name: String,
        parent: String,
        site: SourceSpan,
    },

    NoMembers {
        parent: String,
        site: SourceSpan,
    },

    NotAType {
        name: String,
        kind: &'static str,
        site: SourceSpan,
    },

    InvalidUsing {
        site: SourceSpan,
    },

    DuplicateDefinition {
        name: String,
        first: SourceSpan,
        second: SourceSpan,
    },
}

impl IntoDiagnostic<()> for ResolverError {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        match self {
            ResolverError::Undefined { name, site } => Diagnostic::error()
                .with_message(format!("undefined name `{name}`"))
                .with_snippet(Snippet::primary(
                    "not found in this scope",
                    site.source_id,
                    site.span,
                )),

            ResolverError::UndefinedMember { name, parent, site } => Diagnostic::error()
                .with_message(format!("no member `{name}` in `{parent}`"))
                .with_snippet(Snippet::primary(
                    "not found",
                    site.source_id,
                    site.span,
                )),

            ResolverError::NoMembers { parent, site } => Diagnostic::error()
                .with_message(format!("`{parent}` has no members"))
                .with_snippet(Snippet::primary(
                    "member lookup here",
                    site.source_id,
                    site.span,
                )),

            ResolverError::NotAType { name, kind, site } => Diagnostic::error()
                .with_message(format!("expected a type, found {kind} `{name}`"))
                .with_snippet(Snippet::primary(
                    "not a type",
                    site.source_id,
                    site.span,
                )),

            ResolverError::InvalidUsing { site } => Diagnostic::error()
                .with_message("`using` needs a module or an entity")
                .with_snippet(Snippet::primary(
                    "not a module, class or interface",
                    site.source_id,
                    site.span,
                )),

            ResolverError::DuplicateDefinition {
                name,
                first,
                second,
            } => Diagnostic::error()
                .with_message(format!("duplicate definition of `{name}`"))
                .with_snippet(Snippet::secondary(
                    "first definition",
                    first.source_id,
                    first.span,
                ))
                .with_snippet(Snippet::primary(
                    "second definition",
                    second.source_id,
                    second.span,
                )),
        }
    }
}

/// Binds every name in `program` to what it refers to, filling in
/// [`Path::resolved`]. Returns false if any name could not be bound.
///
/// Unbound names are reported and left unresolved, so the tree stays
/// printable either way.
pub fn resolve<D: DiagnosticEmitter>(
    program: &mut Program,
    session: &mut Session<D>,
    interner: &Interner,
) -> bool {
    let (table, duplicates) = DefTable::build(program);

    let mut errors: Vec<_> = duplicates
        .into_iter()
        .map(|Duplicate { name, first, second }| ResolverError::DuplicateDefinition {
            name: interner[name].to_owned(),
            first,
            second,
        })
        .collect();

    let builtin = program.builtin;

    for (module_id, module) in program.modules.iter_keyed_mut() {
        debug!(?module_id, name = %module.name, "resolving module");

        for file in &mut module.files {
            let mut resolver = Resolver {
                table: &table,
                interner,
                module: module_id,
                builtin,
                source_id: file.source_id,
                imports: &file.imports,

                usings: vec![],
                entities: vec![],
                type_params: vec![],
                locals: vec![],

                errors: vec![],
            };

            resolver.resolve_members(&mut file.members);
            errors.extend(resolver.errors);
        }
    }

    debug!(errors = errors.len(), "resolution finished");

    session.report_all(errors, &()).is_ok()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PathContext {
    Type,
    Expr,
    Using,
}

struct Resolver<'a> {
    table: &'a DefTable,
    interner: &'a Interner,

    module: ModuleId,
    builtin: Option<ModuleId>,
    source_id: SourceId,
    imports: &'a [Import],

    /// Modules and entities brought into scope by `using`, innermost last.
    usings: Vec<Resolution>,
    /// Enclosing classes and interfaces, innermost last.
    entities: Vec<DefPath>,
    type_params: Vec<Ident>,
    /// Parameters and local variables, innermost last.
    locals: Vec<(Ident, Resolution)>,

    errors: Vec<ResolverError>,
}

impl Resolver<'_> {
    fn resolve_members(&mut self, members: &mut [Member]) {
        let usings_len = self.usings.len();

        // `using` applies to the whole body it appears in
        for member in members.iter_mut() {
            if let Member::Using(using) = member {
                self.resolve_using(using);
            }
        }

        for member in members.iter_mut() {
            match member {
                Member::Entity(entity) => self.resolve_entity(entity),

                Member::TypeAlias(alias) => {
                    let type_params_len = self.push_type_params(&alias.type_params);
                    self.resolve_type(&mut alias.ty);
                    self.type_params.truncate(type_params_len);
                }

                Member::Field(field) => {
                    self.resolve_type(&mut field.ty);
                    if let Some(init) = &mut field.init {
                        self.resolve_expr(init);
                    }
                }

                Member::Function(function) => self.resolve_function(function),

                Member::Using(_) | Member::ParseError(_) => {}
            }
        }

        self.usings.truncate(usings_len);
    }

    fn resolve_using(&mut self, using: &mut Using) {
        let TypeKind::Ref(path) = &mut using.ty.kind else {
            self.errors.push(ResolverError::InvalidUsing {
                site: self.site(using.ty.span),
            });
            return;
        };

        self.resolve_path(path, PathContext::Using);

        let in_scope = match &path.resolved {
            Some(resolution @ Resolution::Module(_)) => resolution.clone(),
            Some(Resolution::Def(def_path))
                if self
                    .table
                    .lookup(def_path)
                    .is_some_and(|def| def.kind.is_entity()) =>
            {
                Resolution::Def(def_path.clone())
            }
            // already reported
            None => return,
            Some(_) => {
                self.errors.push(ResolverError::InvalidUsing {
                    site: self.site(using.ty.span),
                });
                return;
            }
        };

        self.usings.push(in_scope);
    }

    fn resolve_entity(&mut self, entity: &mut Entity) {
        let def_path = self.def_path(entity.ident.istr);
        let type_params_len = self.push_type_params(&entity.type_params);

        if let Some(inherits) = &mut entity.inherits {
            self.resolve_type(inherits);
        }

        self.entities.push(def_path);
        self.resolve_members(&mut entity.members);
        self.entities.pop();

        self.type_params.truncate(type_params_len);
    }

    fn resolve_function(&mut self, function: &mut Function) {
        let type_params_len = self.push_type_params(&function.type_params);
        let locals_len = self.locals.len();

        for param in &mut function.params {
            if let Some(ty) = &mut param.ty {
                self.resolve_type(ty);
            }
        }

        for param in &function.params {
            if let Some((first, _)) = self.locals[locals_len..]
                .iter()
                .find(|(ident, _)| ident.istr == param.ident.istr)
            {
                self.errors.push(self.duplicate(*first, param.ident));
            }
            self.locals.push((param.ident, Resolution::Param));
        }

        if let Some(ret_ty) = &mut function.ret_ty {
            self.resolve_type(ret_ty);
        }

        if let Some(body) = &mut function.body {
            self.resolve_block(body);
        }

        self.locals.truncate(locals_len);
        self.type_params.truncate(type_params_len);
    }

    fn push_type_params(&mut self, type_params: &[Ident]) -> usize {
        let len = self.type_params.len();

        for param in type_params {
            if let Some(first) = self.type_params[len..]
                .iter()
                .find(|ident| ident.istr == param.istr)
            {
                self.errors.push(self.duplicate(*first, *param));
            }
            self.type_params.push(*param);
        }

        len
    }

    fn resolve_block(&mut self, block: &mut Block) {
        let locals_len = self.locals.len();

        for stmt in &mut block.stmts {
            self.resolve_stmt(stmt);
        }

        self.locals.truncate(locals_len);
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Let {
                ident, ty, init, ..
            } => {
                // the binding isn't visible in its own initializer
                if let Some(init) = init {
                    self.resolve_expr(init);
                }
                if let Some(ty) = ty {
                    self.resolve_type(ty);
                }
                self.locals.push((*ident, Resolution::Local));
            }

            Stmt::Return { expr, .. } => {
                if let Some(expr) = expr {
                    self.resolve_expr(expr);
                }
            }

            Stmt::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_block(body);
            }

            Stmt::Expr(expr) => self.resolve_expr(expr),

            Stmt::ParseError(_) => {}
        }
    }

    fn resolve_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Integer(_) | ExprKind::String(_) | ExprKind::Bool(_) => {}

            ExprKind::Path(path) => self.resolve_path(path, PathContext::Expr),

            ExprKind::Select { expr, .. } => self.resolve_expr(expr),

            ExprKind::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }

            ExprKind::UnOp { expr, .. } => self.resolve_expr(expr),

            ExprKind::BinOp { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }

            ExprKind::Assign { target, value } => {
                self.resolve_expr(target);
                self.resolve_expr(value);
            }

            ExprKind::If { cond, then, else_ } => {
                self.resolve_expr(cond);
                self.resolve_block(then);
                if let Some(else_) = else_ {
                    self.resolve_expr(else_);
                }
            }

            ExprKind::Block(block) => self.resolve_block(block),

            ExprKind::ParseError => {}
        }
    }

    fn resolve_type(&mut self, ty: &mut Type) {
        match &mut ty.kind {
            TypeKind::Ref(path) => self.resolve_path(path, PathContext::Type),

            TypeKind::Union(types) | TypeKind::Isect(types) | TypeKind::Tuple(types) => {
                for ty in types {
                    self.resolve_type(ty);
                }
            }

            TypeKind::ParseError => {}
        }
    }

    /// Resolves a path segment by segment. The first segment is looked up in
    /// scope, every later one among the members of what precedes it.
    fn resolve_path(&mut self, path: &mut Path, cx: PathContext) {
        let mut resolution: Option<Resolution> = None;
        let mut prev_name = String::new();

        for segment in &mut path.segments {
            for arg in &mut segment.type_args {
                self.resolve_type(arg);
            }

            let site = self.site(segment.span);
            let name = self.segment_str(segment.name);

            let next = match (&resolution, segment.name) {
                (None, SegmentName::Ident(istr)) => self
                    .lookup(istr, cx)
                    .ok_or(ResolverError::Undefined { name: name.clone(), site }),

                (None, SegmentName::Module(istr)) => self
                    .import(istr)
                    .map(Resolution::Module)
                    .ok_or(ResolverError::Undefined { name: name.clone(), site }),

                (Some(parent), SegmentName::Ident(istr)) => {
                    self.lookup_member(parent, istr)
                        .ok_or_else(|| match parent {
                            Resolution::Module(_) | Resolution::Def(_) => {
                                ResolverError::UndefinedMember {
                                    name: name.clone(),
                                    parent: prev_name.clone(),
                                    site,
                                }
                            }
                            _ => ResolverError::NoMembers {
                                parent: prev_name.clone(),
                                site,
                            },
                        })
                }

                // a module can only start a path
                (Some(_), SegmentName::Module(_)) => Err(ResolverError::UndefinedMember {
                    name: name.clone(),
                    parent: prev_name.clone(),
                    site,
                }),
            };

            match next {
                Ok(next) => resolution = Some(next),
                Err(err) => {
                    self.errors.push(err);
                    return;
                }
            }

            prev_name = name;
        }

        if cx == PathContext::Type {
            if let Some(Resolution::Def(def_path)) = &resolution {
                let kind = self.table.lookup(def_path).map(|def| def.kind);

                if let Some(kind) = kind.filter(|kind| !kind.is_type()) {
                    let span = match (path.segments.first(), path.segments.last()) {
                        (Some(first), Some(last)) => first.span.union(last.span),
                        _ => Span::default(),
                    };

                    self.errors.push(ResolverError::NotAType {
                        name: prev_name,
                        kind: kind.as_str(),
                        site: self.site(span),
                    });
                    return;
                }
            }
        }

        path.resolved = resolution;
    }

    /// Looks up an unqualified name: locals and parameters (in expressions
    /// only), then type parameters, enclosing entities, the current module,
    /// `using`s and finally the builtin module.
    fn lookup(&self, name: Istr, cx: PathContext) -> Option<Resolution> {
        if cx == PathContext::Expr {
            let local = self.locals.iter().rev().find(|(ident, _)| ident.istr == name);
            if let Some((_, resolution)) = local {
                return Some(resolution.clone());
            }
        }

        if self.type_params.iter().any(|ident| ident.istr == name) {
            return Some(Resolution::TypeParam);
        }

        for entity in self.entities.iter().rev() {
            if self
                .table
                .lookup(entity)
                .is_some_and(|def| def.members.contains(name))
            {
                return Some(Resolution::Def(entity.child(name)));
            }
        }

        if let Some(resolution) = self.lookup_member(&Resolution::Module(self.module), name) {
            return Some(resolution);
        }

        for using in self.usings.iter().rev() {
            if let Some(resolution) = self.lookup_member(using, name) {
                return Some(resolution);
            }
        }

        self.builtin
            .and_then(|builtin| self.lookup_member(&Resolution::Module(builtin), name))
    }

    fn lookup_member(&self, parent: &Resolution, name: Istr) -> Option<Resolution> {
        match parent {
            Resolution::Module(module_id) => {
                self.table.module(*module_id).contains(name).then(|| {
                    Resolution::Def(DefPath {
                        module: *module_id,
                        names: vec![name],
                    })
                })
            }

            Resolution::Def(def_path) => self
                .table
                .lookup(def_path)
                .is_some_and(|def| def.members.contains(name))
                .then(|| Resolution::Def(def_path.child(name))),

            Resolution::Local | Resolution::Param | Resolution::TypeParam => None,
        }
    }

    fn import(&self, name: Istr) -> Option<ModuleId> {
        self.imports
            .iter()
            .find(|import| import.name == name)
            .and_then(|import| import.module)
    }

    fn def_path(&self, name: Istr) -> DefPath {
        match self.entities.last() {
            Some(parent) => parent.child(name),
            None => DefPath {
                module: self.module,
                names: vec![name],
            },
        }
    }

    fn segment_str(&self, name: SegmentName) -> String {
        match name {
            SegmentName::Ident(istr) => self.interner[istr].to_owned(),
            SegmentName::Module(istr) => format!("{:?}", &self.interner[istr]),
        }
    }

    fn site(&self, span: Span) -> SourceSpan {
        SourceSpan::new(span, self.source_id)
    }

    fn duplicate(&self, first: Ident, second: Ident) -> ResolverError {
        ResolverError::DuplicateDefinition {
            name: self.interner[second.istr].to_owned(),
            first: self.site(first.span),
            second: self.site(second.span),
        }
    }
}
