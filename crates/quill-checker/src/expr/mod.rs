//! Expression checking.
//!
//! Every expression goes through [`Checker::check_expr_base`], which
//! dispatches on the node kind, fills in an [`Operand`] and records the
//! result for the node. The public entry points differ only in what they
//! accept afterwards:
//!
//! - [`Checker::check_expr`]: a single value
//! - [`Checker::check_multi_expr`]: a value or a tuple of values
//! - [`Checker::check_expr_or_type`]: a single value or a type
//! - [`Checker::check_expr_with_type_hint`]: a single value, letting an
//!   expected type steer elided compound literal types and overloaded names
//!
//! Untyped results are kept in the `untyped` table until context gives them
//! a type; everything else goes straight into `types`.

mod binary;
mod calls;
mod cast;
mod compound;
mod identifiers;
mod index;
mod literals;
mod member;
mod ternary;
mod unary;

pub use calls::CallArgumentError;

use quill_ast::Expr;
use quill_core::{ErrorKind, ExactValue};
use quill_registry::TypeId;

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Check an expression that must produce exactly one value.
    pub fn check_expr(&mut self, e: Expr<'ast>) -> Operand<'ast> {
        let mut o = self.check_multi_expr(e);
        self.check_not_tuple(&mut o);
        o
    }

    /// Check an expression that may produce several values, such as a call
    /// to a procedure with more than one result.
    pub fn check_multi_expr(&mut self, e: Expr<'ast>) -> Operand<'ast> {
        let mut o = self.check_expr_base(e, None);
        let problem = match o.mode {
            AddressingMode::NoValue => Some("used as a value"),
            AddressingMode::Type => Some("is not an expression"),
            _ => None,
        };
        if let Some(problem) = problem {
            self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` {problem}"));
            o.set_invalid();
        }
        o
    }

    /// Check an expression that may denote either a value or a type.
    pub fn check_expr_or_type(&mut self, e: Expr<'ast>) -> Operand<'ast> {
        let mut o = self.check_expr_base(e, None);
        self.check_not_tuple(&mut o);
        if o.mode == AddressingMode::NoValue {
            self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` used as a value"));
            o.set_invalid();
        }
        o
    }

    /// Check a single-valued expression against an expected type.
    ///
    /// The hint is not enforced here; callers follow up with
    /// [`Checker::check_assignment`].
    pub fn check_expr_with_type_hint(&mut self, e: Expr<'ast>, hint: Option<TypeId>) -> Operand<'ast> {
        let mut o = self.check_expr_base(e, hint);
        self.check_not_tuple(&mut o);
        let problem = match o.mode {
            AddressingMode::NoValue => Some("used as a value"),
            AddressingMode::Type => Some("is not an expression"),
            AddressingMode::Builtin(_) => Some("must be called"),
            _ => None,
        };
        if let Some(problem) = problem {
            self.error(ErrorKind::TypeMismatch, e.span(), format!("`{e}` {problem}"));
            o.set_invalid();
        }
        o
    }

    /// Check any expression and record its result.
    pub(crate) fn check_expr_base(&mut self, e: Expr<'ast>, hint: Option<TypeId>) -> Operand<'ast> {
        let mut o = self.check_expr_internal(e, hint);
        o.expr = Some(e);

        let id = e.id();
        match o.mode {
            AddressingMode::Invalid => {}
            AddressingMode::NoValue => {
                self.info
                    .add_type_and_value(id, AddressingMode::NoValue, None, ExactValue::Invalid);
            }
            _ if o.ty != TypeId::INVALID && self.registry.is_type_untyped(o.ty) => {
                // A shift may already have marked this node as a left operand
                let is_lhs = self.info.untyped.get(&id).is_some_and(|info| info.is_lhs);
                self.info
                    .add_untyped(id, is_lhs, o.mode.clone(), o.ty, o.value.clone());
            }
            _ => {
                self.info
                    .add_type_and_value(id, o.mode.clone(), Some(o.ty), o.value.clone());
            }
        }
        o
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn check_expr_internal(&mut self, e: Expr<'ast>, hint: Option<TypeId>) -> Operand<'ast> {
        match e {
            Expr::Ident(ident) => self.check_identifier(ident, hint),
            Expr::Literal(lit) => self.check_basic_literal(lit, e),
            Expr::Directive(d) => self.check_directive(d, e),
            Expr::ProcLit(pl) => self.check_proc_lit(pl, e),
            Expr::CompoundLit(cl) => self.check_compound_literal(cl, e, hint),
            Expr::FieldValue(fv) => {
                self.error(
                    ErrorKind::SyntaxShape,
                    fv.span,
                    "`field = value` is only allowed in compound literals",
                );
                Operand::invalid(Some(e))
            }
            Expr::Paren(p) => self.check_expr_base(p.expr, hint),
            Expr::Unary(u) => self.check_unary_expr(u, e, hint),
            Expr::Binary(b) => self.check_binary_expr(b, e),
            Expr::Ternary(t) => self.check_ternary_expr(t, e, hint),
            Expr::Selector(s) => self.check_selector(s, e, hint),
            Expr::Index(ie) => self.check_index_expr(ie, e),
            Expr::Slice(se) => self.check_slice_expr(se, e),
            Expr::Deref(de) => self.check_deref_expr(de, e),
            Expr::Call(ce) => self.check_call_expr(ce, e),
            Expr::Cast(ce) => self.check_cast_expr(ce, e),
            Expr::Interval(ie) => {
                self.error(ErrorKind::SyntaxShape, ie.span, "Invalid use of an interval expression");
                Operand::invalid(Some(e))
            }
            Expr::Type(t) => {
                let ty = self.check_type_expr(t, None);
                if ty == TypeId::INVALID {
                    return Operand::invalid(Some(e));
                }
                Operand::new(AddressingMode::Type, ty, e)
            }
        }
    }

    /// Element type of a vector, or `ty` itself.
    pub(crate) fn base_vector_type(&self, ty: TypeId) -> TypeId {
        let base = self.registry.base_type(ty);
        match self.registry.ty(base).kind {
            quill_registry::TypeKind::Vector { elem, .. } => elem,
            _ => ty,
        }
    }
}
