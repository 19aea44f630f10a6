//! Type expression nodes.
//!
//! Only structural forms are represented here. Named types are plain
//! identifiers or selectors, and pointer types are `^T` unary expressions, so
//! any [`Expr`] may appear in a type position.

use quill_core::{CallingConvention, NodeId, Span};

use crate::expr::Expr;
use crate::Ident;

/// A structural type expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'ast> {
    pub kind: TypeExprKind<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeExprKind<'ast> {
    /// `^T`
    Pointer(Expr<'ast>),
    /// `[N]T` or `[..]T`
    Array(ArrayType<'ast>),
    /// `[dynamic]T`
    DynamicArray(Expr<'ast>),
    /// `[]T`
    Slice(Expr<'ast>),
    /// `[vector N]T`
    Vector(VectorType<'ast>),
    /// `map[K]V`
    Map(MapType<'ast>),
    Struct(RecordType<'ast>),
    /// Tagged union; each field names one variant
    Union(RecordType<'ast>),
    RawUnion(RecordType<'ast>),
    Enum(EnumType<'ast>),
    Proc(ProcType<'ast>),
}

/// Element count of an array type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrayCount<'ast> {
    Expr(Expr<'ast>),
    /// `[..]`, inferred from a compound literal
    Infer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayType<'ast> {
    pub count: ArrayCount<'ast>,
    pub elem: Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorType<'ast> {
    pub count: Expr<'ast>,
    pub elem: Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapType<'ast> {
    /// Optional fixed bucket count
    pub count: Option<Expr<'ast>>,
    pub key: Expr<'ast>,
    pub value: Expr<'ast>,
}

/// Field list shared by struct, union and raw_union types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordType<'ast> {
    pub fields: &'ast [FieldDecl<'ast>],
    /// `#packed`
    pub is_packed: bool,
    /// `#ordered`
    pub is_ordered: bool,
    /// `#align N`
    pub align: Option<Expr<'ast>>,
}

/// One line of a field or parameter list: `using? a, b: T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDecl<'ast> {
    /// Empty for unnamed results
    pub names: &'ast [Ident<'ast>],
    pub ty: Expr<'ast>,
    pub is_using: bool,
    /// `..T`; only legal on the final parameter
    pub is_variadic: bool,
    /// `immutable` parameter
    pub is_immutable: bool,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumType<'ast> {
    pub base: Option<Expr<'ast>>,
    pub fields: &'ast [EnumField<'ast>],
}

/// `Name` or `Name = value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumField<'ast> {
    pub name: Ident<'ast>,
    pub value: Option<Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcType<'ast> {
    pub params: &'ast [FieldDecl<'ast>],
    pub results: &'ast [FieldDecl<'ast>],
    pub convention: CallingConvention,
}

impl<'ast> TypeExpr<'ast> {
    /// The procedure signature, if this is a procedure type.
    pub fn as_proc(&self) -> Option<&ProcType<'ast>> {
        match &self.kind {
            TypeExprKind::Proc(pt) => Some(pt),
            _ => None,
        }
    }
}
