//! Renders a [`Program`] as an indented S-expression.
//!
//! A list that fits in the remaining width is printed on one line. Otherwise
//! its leading atoms stay on the opening line and every other element goes
//! on its own line, indented by two more columns. The output depends only on
//! the tree, so rendering the same program twice gives identical text.

#[cfg(test)]
mod tests;

use verona_interner::{Interner, Istr};
use verona_utils::keyvec::Key;

use crate::ast::*;

pub const WIDTH: usize = 80;

const INDENT: usize = 2;

pub fn pretty(program: &Program, interner: &Interner) -> String {
    pretty_with_width(program, interner, WIDTH)
}

pub(crate) fn pretty_with_width(program: &Program, interner: &Interner, width: usize) -> String {
    let sexpr = Printer { interner }.program(program);

    let mut out = String::new();
    sexpr.write(&mut out, 0, width);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sexpr {
    Atom(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    fn atom(s: impl Into<String>) -> Self {
        Sexpr::Atom(s.into())
    }

    fn tagged(tag: &str, items: impl IntoIterator<Item = Sexpr>) -> Self {
        let mut list = vec![Sexpr::atom(tag)];
        list.extend(items);
        Sexpr::List(list)
    }

    /// Subtracts the flat width of `self` from `budget`, giving up as soon
    /// as it runs out.
    fn fits(&self, budget: &mut usize) -> bool {
        let needed = match self {
            Sexpr::Atom(s) => s.len(),
            Sexpr::List(items) => 2 + items.len().saturating_sub(1),
        };

        if needed > *budget {
            return false;
        }
        *budget -= needed;

        match self {
            Sexpr::Atom(_) => true,
            Sexpr::List(items) => items.iter().all(|item| item.fits(budget)),
        }
    }

    fn write_flat(&self, out: &mut String) {
        match self {
            Sexpr::Atom(s) => out.push_str(s),
            Sexpr::List(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    item.write_flat(out);
                }
                out.push(')');
            }
        }
    }

    fn write(&self, out: &mut String, indent: usize, width: usize) {
        let mut budget = width.saturating_sub(indent);

        let items = match self {
            Sexpr::List(items) if !self.fits(&mut budget) => items,
            _ => return self.write_flat(out),
        };

        let split = items
            .iter()
            .position(|item| matches!(item, Sexpr::List(_)))
            .unwrap_or(items.len());
        let (head, rest) = items.split_at(split);

        out.push('(');
        for (i, atom) in head.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            atom.write_flat(out);
        }

        for item in rest {
            out.push('\n');
            out.extend(std::iter::repeat(' ').take(indent + INDENT));
            item.write(out, indent + INDENT, width);
        }

        out.push(')');
    }
}

struct Printer<'a> {
    interner: &'a Interner,
}

impl Printer<'_> {
    fn program(&self, program: &Program) -> Sexpr {
        Sexpr::tagged(
            "program",
            program
                .modules
                .iter_keyed()
                .map(|(module_id, module)| self.module(module_id, module)),
        )
    }

    fn module(&self, module_id: ModuleId, module: &Module) -> Sexpr {
        let header = [
            Sexpr::atom(module_ref(module_id)),
            Sexpr::atom(format!("{:?}", module.name)),
        ];

        let members = module
            .files
            .iter()
            .flat_map(|file| &file.members)
            .map(|member| self.member(member));

        Sexpr::tagged("module", header.into_iter().chain(members))
    }

    fn member(&self, member: &Member) -> Sexpr {
        match member {
            Member::Using(using) => Sexpr::tagged("using", [self.ty(&using.ty)]),

            Member::Entity(entity) => {
                let mut items = vec![self.ident(entity.ident)];
                items.extend(self.type_params(&entity.type_params));
                if let Some(inherits) = &entity.inherits {
                    items.push(Sexpr::tagged("inherits", [self.ty(inherits)]));
                }
                items.extend(entity.members.iter().map(|member| self.member(member)));

                Sexpr::tagged(entity.kind.as_str(), items)
            }

            Member::TypeAlias(alias) => {
                let mut items = vec![self.ident(alias.ident)];
                items.extend(self.type_params(&alias.type_params));
                items.push(self.ty(&alias.ty));

                Sexpr::tagged("type", items)
            }

            Member::Field(field) => {
                let mut items = vec![self.ident(field.ident), self.ty(&field.ty)];
                items.extend(field.init.as_ref().map(|init| self.expr(init)));

                Sexpr::tagged("field", items)
            }

            Member::Function(function) => self.function(function),

            Member::ParseError(_) => error(),
        }
    }

    fn function(&self, function: &Function) -> Sexpr {
        let mut items = vec![self.ident(function.ident)];
        items.extend(self.type_params(&function.type_params));

        let params = function.params.iter().map(|param| {
            let mut items = vec![self.ident(param.ident)];
            items.extend(param.ty.as_ref().map(|ty| self.ty(ty)));
            Sexpr::tagged("param", items)
        });
        items.push(Sexpr::tagged("params", params));

        if let Some(ret_ty) = &function.ret_ty {
            items.push(Sexpr::tagged("result", [self.ty(ret_ty)]));
        }
        items.extend(function.body.as_ref().map(|body| self.block(body)));

        Sexpr::tagged("function", items)
    }

    fn type_params(&self, type_params: &[Ident]) -> Option<Sexpr> {
        if type_params.is_empty() {
            return None;
        }

        Some(Sexpr::tagged(
            "typeparams",
            type_params.iter().map(|ident| self.ident(*ident)),
        ))
    }

    fn ty(&self, ty: &Type) -> Sexpr {
        let types = |types: &[Type]| types.iter().map(|ty| self.ty(ty)).collect::<Vec<_>>();

        match &ty.kind {
            TypeKind::Ref(path) => self.path(path),
            TypeKind::Union(items) => Sexpr::tagged("union", types(items)),
            TypeKind::Isect(items) => Sexpr::tagged("isect", types(items)),
            TypeKind::Tuple(items) => Sexpr::tagged("tuple", types(items)),
            TypeKind::ParseError => error(),
        }
    }

    fn path(&self, path: &Path) -> Sexpr {
        let mut items: Vec<_> = path
            .segments
            .iter()
            .map(|segment| {
                let name = match segment.name {
                    SegmentName::Ident(istr) => Sexpr::atom(self.str(istr)),
                    SegmentName::Module(istr) => Sexpr::atom(format!("{:?}", self.str(istr))),
                };

                if segment.type_args.is_empty() {
                    name
                } else {
                    let mut items = vec![name];
                    items.extend(segment.type_args.iter().map(|ty| self.ty(ty)));
                    Sexpr::List(items)
                }
            })
            .collect();

        if let Some(resolved) = &path.resolved {
            items.push(Sexpr::atom("->"));
            items.push(Sexpr::atom(self.resolution(resolved)));
        }

        Sexpr::tagged("ref", items)
    }

    fn resolution(&self, resolution: &Resolution) -> String {
        match resolution {
            Resolution::Local => "local".to_owned(),
            Resolution::Param => "param".to_owned(),
            Resolution::TypeParam => "typeparam".to_owned(),
            Resolution::Module(module_id) => module_ref(*module_id),
            Resolution::Def(def_path) => {
                let mut s = module_ref(def_path.module);
                for name in &def_path.names {
                    s.push_str("::");
                    s.push_str(self.str(*name));
                }
                s
            }
        }
    }

    fn block(&self, block: &Block) -> Sexpr {
        Sexpr::tagged("block", block.stmts.iter().map(|stmt| self.stmt(stmt)))
    }

    fn stmt(&self, stmt: &Stmt) -> Sexpr {
        match stmt {
            Stmt::Let {
                mutable,
                ident,
                ty,
                init,
            } => {
                let mut items = vec![self.ident(*ident)];
                items.extend(ty.as_ref().map(|ty| self.ty(ty)));
                items.extend(init.as_ref().map(|init| self.expr(init)));

                Sexpr::tagged(if *mutable { "var" } else { "let" }, items)
            }

            Stmt::Return { expr, .. } => {
                Sexpr::tagged("return", expr.as_ref().map(|expr| self.expr(expr)))
            }

            Stmt::While { cond, body } => {
                Sexpr::tagged("while", [self.expr(cond), self.block(body)])
            }

            Stmt::Expr(expr) => self.expr(expr),

            Stmt::ParseError(_) => error(),
        }
    }

    fn expr(&self, expr: &Expr) -> Sexpr {
        match &expr.kind {
            ExprKind::Integer(n) => Sexpr::tagged("int", [Sexpr::atom(n.to_string())]),
            ExprKind::String(s) => {
                Sexpr::tagged("string", [Sexpr::atom(format!("{:?}", self.str(*s)))])
            }
            ExprKind::Bool(b) => Sexpr::tagged("bool", [Sexpr::atom(b.to_string())]),

            ExprKind::Path(path) => self.path(path),

            ExprKind::Select { expr, ident } => {
                Sexpr::tagged("select", [self.expr(expr), self.ident(*ident)])
            }

            ExprKind::Call { callee, args } => Sexpr::tagged(
                "call",
                std::iter::once(self.expr(callee)).chain(args.iter().map(|arg| self.expr(arg))),
            ),

            ExprKind::UnOp { op, expr } => {
                Sexpr::tagged("unop", [Sexpr::atom(op.as_str()), self.expr(expr)])
            }

            ExprKind::BinOp { op, lhs, rhs } => Sexpr::tagged(
                "binop",
                [Sexpr::atom(op.as_str()), self.expr(lhs), self.expr(rhs)],
            ),

            ExprKind::Assign { target, value } => {
                Sexpr::tagged("assign", [self.expr(target), self.expr(value)])
            }

            ExprKind::If { cond, then, else_ } => {
                let mut items = vec![self.expr(cond), self.block(then)];
                items.extend(else_.as_ref().map(|else_| self.expr(else_)));

                Sexpr::tagged("if", items)
            }

            ExprKind::Block(block) => self.block(block),

            ExprKind::ParseError => error(),
        }
    }

    fn ident(&self, ident: Ident) -> Sexpr {
        Sexpr::atom(self.str(ident.istr))
    }

    fn str(&self, istr: Istr) -> &str {
        self.interner.get(istr).unwrap_or("<unknown>")
    }
}

fn module_ref(module_id: ModuleId) -> String {
    format!("${}", module_id.as_usize())
}

fn error() -> Sexpr {
    Sexpr::tagged("error", [])
}

