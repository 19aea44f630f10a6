//! Abstract syntax tree consumed by the Quill checker.
//!
//! The tree is immutable once built and lives in a [`bumpalo::Bump`] arena for
//! the `'ast` lifetime. Every node carries a [`NodeId`], which the checker uses
//! as the key of its result tables, and a [`Span`] for diagnostics.
//!
//! - [`expr`]: expressions, including literals and procedure literals
//! - [`types`]: type expressions (`^T`, `[N]T`, `struct {...}`, ...)
//! - [`stmt`]: statements and blocks
//! - [`decl`]: value and import declarations
//! - [`file`]: source files and packages
//! - [`ops`]: operator enums
//! - [`builder`]: [`AstBuilder`] for constructing trees by hand
//!
//! Expressions render back to source-like text through [`std::fmt::Display`],
//! which diagnostics use to quote the offending sub-expression.

pub mod builder;
pub mod decl;
mod display;
pub mod expr;
pub mod file;
pub mod ops;
pub mod stmt;
pub mod types;

pub use builder::AstBuilder;
pub use decl::{Decl, ImportDecl, ValueDecl};
pub use expr::{
    CallExpr, CastExpr, CompoundLit, DerefExpr, Directive, DirectiveKind, Expr, FieldValue,
    IndexExpr, IntervalExpr, Literal, LiteralKind, ParenExpr, ProcLit, SelectorExpr, SliceExpr,
    TernaryExpr, UnaryExpr, BinaryExpr,
};
pub use file::{Package, SourceFile};
pub use ops::{AssignOp, BinaryOp, BranchKind, CastKind, UnaryOp};
pub use stmt::{
    AssignStmt, Block, BranchStmt, CaseClause, DeferStmt, EmptyStmt, ExprStmt, ForStmt, IfStmt, MatchStmt,
    RangeStmt, ReturnStmt, Stmt, StmtStateFlags, TypeMatchStmt, UsingStmt, WhenStmt,
};
pub use types::{
    ArrayCount, ArrayType, EnumField, EnumType, FieldDecl, MapType, ProcType, RecordType,
    TypeExpr, TypeExprKind, VectorType,
};

use quill_core::{NodeId, Span};

/// The blank identifier, a write-only sink.
pub const BLANK: &str = "_";

/// An identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub id: NodeId,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, id: NodeId, span: Span) -> Self {
        Self { name, id, span }
    }

    /// Whether this is the blank identifier `_`.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.name == BLANK
    }
}
