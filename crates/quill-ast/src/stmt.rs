//! Statement AST nodes.

use bitflags::bitflags;
use quill_core::{NodeId, Span};

use crate::decl::Decl;
use crate::expr::Expr;
use crate::ops::{AssignOp, BranchKind};
use crate::Ident;

bitflags! {
    /// `#bounds_check` / `#no_bounds_check` tags on a block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StmtStateFlags: u8 {
        const BOUNDS_CHECK    = 1 << 0;
        const NO_BOUNDS_CHECK = 1 << 1;
    }
}

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `;`
    Empty(EmptyStmt),
    /// Expression evaluated for its effect
    Expr(&'ast ExprStmt<'ast>),
    /// `a, b = x, y` or `a += x`
    Assign(&'ast AssignStmt<'ast>),
    Block(&'ast Block<'ast>),
    If(&'ast IfStmt<'ast>),
    /// Compile-time conditional
    When(&'ast WhenStmt<'ast>),
    Return(&'ast ReturnStmt<'ast>),
    /// `for init; cond; post {}`
    For(&'ast ForStmt<'ast>),
    /// `for v, i in expr {}`
    Range(&'ast RangeStmt<'ast>),
    Match(&'ast MatchStmt<'ast>),
    /// `match type v in tag {}`
    TypeMatch(&'ast TypeMatchStmt<'ast>),
    Defer(&'ast DeferStmt<'ast>),
    Branch(&'ast BranchStmt),
    Using(&'ast UsingStmt<'ast>),
    Decl(Decl<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Empty(s) => s.id,
            Self::Expr(s) => s.id,
            Self::Assign(s) => s.id,
            Self::Block(s) => s.id,
            Self::If(s) => s.id,
            Self::When(s) => s.id,
            Self::Return(s) => s.id,
            Self::For(s) => s.id,
            Self::Range(s) => s.id,
            Self::Match(s) => s.id,
            Self::TypeMatch(s) => s.id,
            Self::Defer(s) => s.id,
            Self::Branch(s) => s.id,
            Self::Using(s) => s.id,
            Self::Decl(d) => d.id(),
        }
    }

    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::Empty(s) => s.span,
            Self::Expr(s) => s.span,
            Self::Assign(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::When(s) => s.span,
            Self::Return(s) => s.span,
            Self::For(s) => s.span,
            Self::Range(s) => s.span,
            Self::Match(s) => s.span,
            Self::TypeMatch(s) => s.span,
            Self::Defer(s) => s.span,
            Self::Branch(s) => s.span,
            Self::Using(s) => s.span,
            Self::Decl(d) => d.span(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Bounds-checking tags attached to this statement.
    pub fn state_flags(&self) -> StmtStateFlags {
        match self {
            Self::Block(b) => b.state,
            _ => StmtStateFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmptyStmt {
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub op: AssignOp,
    pub lhs: &'ast [Expr<'ast>],
    pub rhs: &'ast [Expr<'ast>],
    pub id: NodeId,
    /// Position of the operator
    pub span: Span,
}

/// `{ stmts }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub state: StmtStateFlags,
    pub id: NodeId,
    pub span: Span,
    /// Position of the closing brace
    pub close: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    pub cond: Expr<'ast>,
    pub body: &'ast Block<'ast>,
    /// Either another `if` or a block
    pub else_stmt: Option<Stmt<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhenStmt<'ast> {
    pub cond: Expr<'ast>,
    pub body: &'ast Block<'ast>,
    /// Either another `when` or a block
    pub else_stmt: Option<Stmt<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub results: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    /// `None` loops forever
    pub cond: Option<Expr<'ast>>,
    pub post: Option<Stmt<'ast>>,
    pub body: &'ast Block<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `for value, index in expr { ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeStmt<'ast> {
    pub value: Option<Ident<'ast>>,
    pub index: Option<Ident<'ast>>,
    /// A collection or an [`Expr::Interval`]
    pub expr: Expr<'ast>,
    pub body: &'ast Block<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `case a, b: stmts`; an empty list is the `default` clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseClause<'ast> {
    pub list: &'ast [Expr<'ast>],
    pub stmts: &'ast [Stmt<'ast>],
    pub id: NodeId,
    pub span: Span,
}

impl CaseClause<'_> {
    pub fn is_default(&self) -> bool {
        self.list.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchStmt<'ast> {
    pub init: Option<Stmt<'ast>>,
    /// `None` matches against `true`
    pub tag: Option<Expr<'ast>>,
    pub clauses: &'ast [CaseClause<'ast>],
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMatchStmt<'ast> {
    /// Variable bound in each clause
    pub var: Ident<'ast>,
    pub tag: Expr<'ast>,
    pub clauses: &'ast [CaseClause<'ast>],
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferStmt<'ast> {
    pub stmt: Stmt<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub id: NodeId,
    pub span: Span,
}

/// `using a, b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsingStmt<'ast> {
    pub exprs: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}
