use std::path::PathBuf;

use verona_diagnostic::span::Span;
use verona_interner::Istr;
use verona_session::sourcemap::SourceId;
use verona_utils::keyvec::{declare_key_type, KeyVec};

use crate::{Node, NodeCopy};

declare_key_type! {
    /// Index of a module in [`Program::modules`].
    pub struct ModuleId;
}

/// Every module reachable from the module being compiled.
#[derive(Debug, Clone)]
pub struct Program {
    pub modules: KeyVec<ModuleId, Module>,
    pub root: ModuleId,
    /// Absent only when the standard library could not be loaded.
    pub builtin: Option<ModuleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub location: PathBuf,
    pub files: Vec<ModuleFile>,
}

#[derive(Node!)]
pub struct ModuleFile {
    pub source_id: SourceId,
    pub members: Vec<Member>,
    pub imports: Vec<Import>,
}

/// A module referenced by a string segment in a type path, e.g. `"lib"` in
/// `"lib"::Foo`.
#[derive(Node!)]
pub struct Import {
    pub name: Istr,
    pub span: Span,
    /// Filled in once the module has been located and loaded.
    pub module: Option<ModuleId>,
}

#[derive(NodeCopy!)]
pub struct Ident {
    pub istr: Istr,
    pub span: Span,
}

#[derive(Node!)]
pub enum Member {
    Using(Using),
    Entity(Entity),
    TypeAlias(TypeAlias),
    Field(Field),
    Function(Function),
    ParseError(Span),
}

#[derive(Node!)]
pub struct Using {
    pub ty: Type,
    pub span: Span,
}

#[derive(NodeCopy!)]
pub enum EntityKind {
    Class,
    Interface,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Interface => "interface",
        }
    }
}

#[derive(Node!)]
pub struct Entity {
    pub kind: EntityKind,
    pub ident: Ident,
    pub type_params: Vec<Ident>,
    pub inherits: Option<Type>,
    pub members: Vec<Member>,
}

#[derive(Node!)]
pub struct TypeAlias {
    pub ident: Ident,
    pub type_params: Vec<Ident>,
    pub ty: Type,
}

#[derive(Node!)]
pub struct Field {
    pub ident: Ident,
    pub ty: Type,
    pub init: Option<Expr>,
}

#[derive(Node!)]
pub struct Function {
    pub ident: Ident,
    pub type_params: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret_ty: Option<Type>,
    /// `None` for an abstract function, as found in interfaces.
    pub body: Option<Block>,
}

#[derive(Node!)]
pub struct Param {
    pub ident: Ident,
    pub ty: Option<Type>,
}

#[derive(Node!)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Node!)]
pub enum TypeKind {
    Ref(Path),
    Union(Vec<Type>),
    Isect(Vec<Type>),
    Tuple(Vec<Type>),
    ParseError,
}

/// A possibly qualified name, e.g. `Foo`, `Array[I64]` or `"lib"::Foo::Bar`.
#[derive(Node!)]
pub struct Path {
    pub segments: Vec<PathSegment>,
    pub resolved: Option<Resolution>,
}

#[derive(Node!)]
pub struct PathSegment {
    pub name: SegmentName,
    pub type_args: Vec<Type>,
    pub span: Span,
}

#[derive(NodeCopy!)]
pub enum SegmentName {
    Ident(Istr),
    Module(Istr),
}

/// What a [`Path`] refers to.
#[derive(Node!)]
pub enum Resolution {
    Local,
    Param,
    TypeParam,
    Def(DefPath),
    Module(ModuleId),
}

/// A definition, named by its module and the chain of entity names leading
/// to it.
#[derive(Node!)]
pub struct DefPath {
    pub module: ModuleId,
    pub names: Vec<Istr>,
}

impl DefPath {
    #[must_use]
    pub fn child(&self, name: Istr) -> Self {
        let mut names = self.names.clone();
        names.push(name);
        Self {
            module: self.module,
            names,
        }
    }
}

#[derive(Node!)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Node!)]
pub enum Stmt {
    Let {
        mutable: bool,
        ident: Ident,
        ty: Option<Type>,
        init: Option<Expr>,
    },

    Return {
        expr: Option<Expr>,
        span: Span,
    },

    While {
        cond: Expr,
        body: Block,
    },

    Expr(Expr),

    ParseError(Span),
}

#[derive(Node!)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Node!)]
pub enum ExprKind {
    Integer(i64),
    String(Istr),
    Bool(bool),

    Path(Path),

    Select {
        expr: Box<Expr>,
        ident: Ident,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    UnOp {
        op: UnOp,
        expr: Box<Expr>,
    },

    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    If {
        cond: Box<Expr>,
        then: Block,
        else_: Option<Box<Expr>>,
    },

    Block(Block),

    ParseError,
}

#[derive(NodeCopy!)]
pub enum UnOp {
    Negate,
    Not,
}

#[derive(NodeCopy!)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    And,
    Or,

    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Negate => "-",
            UnOp::Not => "!",
        }
    }
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitwiseAnd => "&",
            BinOp::BitwiseOr => "|",
            BinOp::BitwiseXor => "^",
        }
    }
}
