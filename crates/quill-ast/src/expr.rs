//! Expression AST nodes.
//!
//! Type expressions are expressions too: a name used as a type is an
//! [`Expr::Ident`], `^T` is a [`UnaryOp::AddressOf`](crate::UnaryOp) applied to
//! a type, and every structural form lives under [`Expr::Type`].

use quill_core::{NodeId, Span};

use crate::ops::{BinaryOp, CastKind, UnaryOp};
use crate::stmt::Block;
use crate::types::TypeExpr;
use crate::Ident;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Name reference
    Ident(Ident<'ast>),
    /// Integer, float, string or rune literal
    Literal(&'ast Literal<'ast>),
    /// `#file`, `#line`, `#procedure`
    Directive(&'ast Directive),
    /// Procedure literal `proc(...) -> ... { body }`
    ProcLit(&'ast ProcLit<'ast>),
    /// Compound literal `T{a, b}` or `T{x = a}`
    CompoundLit(&'ast CompoundLit<'ast>),
    /// `name = value` element inside a compound literal
    FieldValue(&'ast FieldValue<'ast>),
    /// Parenthesized expression
    Paren(&'ast ParenExpr<'ast>),
    /// Prefix unary operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// `if cond then a else b`
    Ternary(&'ast TernaryExpr<'ast>),
    /// `a.b`
    Selector(&'ast SelectorExpr<'ast>),
    /// `a[i]`
    Index(&'ast IndexExpr<'ast>),
    /// `a[lo:hi]`
    Slice(&'ast SliceExpr<'ast>),
    /// `a^`
    Deref(&'ast DerefExpr<'ast>),
    /// `f(args)`
    Call(&'ast CallExpr<'ast>),
    /// `cast(T)x` and friends
    Cast(&'ast CastExpr<'ast>),
    /// `lo ..< hi`, only meaningful as a range loop subject
    Interval(&'ast IntervalExpr<'ast>),
    /// Structural type expression
    Type(&'ast TypeExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Node id of this expression.
    pub fn id(&self) -> NodeId {
        match self {
            Self::Ident(e) => e.id,
            Self::Literal(e) => e.id,
            Self::Directive(e) => e.id,
            Self::ProcLit(e) => e.id,
            Self::CompoundLit(e) => e.id,
            Self::FieldValue(e) => e.id,
            Self::Paren(e) => e.id,
            Self::Unary(e) => e.id,
            Self::Binary(e) => e.id,
            Self::Ternary(e) => e.id,
            Self::Selector(e) => e.id,
            Self::Index(e) => e.id,
            Self::Slice(e) => e.id,
            Self::Deref(e) => e.id,
            Self::Call(e) => e.id,
            Self::Cast(e) => e.id,
            Self::Interval(e) => e.id,
            Self::Type(e) => e.id,
        }
    }

    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Ident(e) => e.span,
            Self::Literal(e) => e.span,
            Self::Directive(e) => e.span,
            Self::ProcLit(e) => e.span,
            Self::CompoundLit(e) => e.span,
            Self::FieldValue(e) => e.span,
            Self::Paren(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Ternary(e) => e.span,
            Self::Selector(e) => e.span,
            Self::Index(e) => e.span,
            Self::Slice(e) => e.span,
            Self::Deref(e) => e.span,
            Self::Call(e) => e.span,
            Self::Cast(e) => e.span,
            Self::Interval(e) => e.span,
            Self::Type(e) => e.span,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(self) -> Expr<'ast> {
        let mut e = self;
        while let Expr::Paren(p) = e {
            e = p.expr;
        }
        e
    }

    /// The identifier, if this expression is a bare name.
    pub fn as_ident(&self) -> Option<Ident<'ast>> {
        match self {
            Self::Ident(ident) => Some(*ident),
            _ => None,
        }
    }
}

/// Literal token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Rune,
}

/// A literal. The checker evaluates the text; the parser does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Literal<'ast> {
    pub kind: LiteralKind,
    /// Literal text without quotes
    pub text: &'ast str,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    File,
    Line,
    Procedure,
}

/// A `#directive` expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub id: NodeId,
    pub span: Span,
}

/// A procedure literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcLit<'ast> {
    /// Signature, expected to be a procedure type expression
    pub ty: Expr<'ast>,
    /// Body; `None` for foreign declarations
    pub body: Option<&'ast Block<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// A compound literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundLit<'ast> {
    /// Literal type; `None` when elided and supplied by context
    pub ty: Option<Expr<'ast>>,
    pub elems: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
    /// Position of the closing brace
    pub close: Span,
}

/// `field = value` inside a compound literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldValue<'ast> {
    pub field: Expr<'ast>,
    pub value: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: Expr<'ast>,
    pub op: BinaryOp,
    pub right: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// Conditional expression `if cond then a else b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TernaryExpr<'ast> {
    pub cond: Expr<'ast>,
    pub then_expr: Expr<'ast>,
    pub else_expr: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorExpr<'ast> {
    pub base: Expr<'ast>,
    pub field: Ident<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub base: Expr<'ast>,
    /// `None` only for malformed `a[]`
    pub index: Option<Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceExpr<'ast> {
    pub base: Expr<'ast>,
    pub low: Option<Expr<'ast>>,
    pub high: Option<Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerefExpr<'ast> {
    pub base: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// A call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Expr<'ast>,
    pub args: &'ast [Expr<'ast>],
    /// Position of a trailing `..` spread on the last argument
    pub ellipsis: Option<Span>,
    pub id: NodeId,
    pub span: Span,
    /// Position of the closing parenthesis
    pub close: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub kind: CastKind,
    pub ty: Expr<'ast>,
    pub expr: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// Half-open interval `low ..< high`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalExpr<'ast> {
    pub low: Expr<'ast>,
    pub high: Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}
