use quill_ast::{Expr, UnaryExpr, UnaryOp};
use quill_core::{ErrorKind, UnaryValueOp};
use quill_registry::{EntityFlags, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn check_unary_expr(
        &mut self,
        u: &'ast UnaryExpr<'ast>,
        e: Expr<'ast>,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        let mut o = self.check_expr_base(u.operand, hint);
        if o.is_invalid() {
            return Operand::invalid(Some(e));
        }

        if u.op == UnaryOp::AddressOf {
            return self.check_address_of(o, u, e);
        }

        if !o.mode.is_value() {
            let what = if o.is_type() { "is not an expression" } else { "used as a value" };
            self.error(ErrorKind::TypeMismatch, u.operand.span(), format!("`{}` {what}", u.operand));
            return Operand::invalid(Some(e));
        }
        self.check_not_tuple(&mut o);
        if o.is_invalid() || !self.check_unary_op(&o, u.op, e) {
            return Operand::invalid(Some(e));
        }

        if o.is_constant() {
            let ty = o.ty;
            if !self.registry.is_type_constant_type(ty) {
                let s = self.type_str(ty);
                self.error(
                    ErrorKind::Constant,
                    u.span,
                    format!("Invalid type, `{s}`, for constant unary expression `{e}`"),
                );
                return Operand::invalid(Some(e));
            }
            let base = self.registry.base_type(ty);
            let precision = if self.registry.is_type_unsigned(base) {
                (8 * self.size_of(base)) as u32
            } else {
                0
            };
            let op = match u.op {
                UnaryOp::Plus => UnaryValueOp::Plus,
                UnaryOp::Minus => UnaryValueOp::Minus,
                UnaryOp::BitNot => UnaryValueOp::BitNot,
                UnaryOp::Not => UnaryValueOp::Not,
                // Handled above
                UnaryOp::AddressOf => return Operand::invalid(Some(e)),
            };
            let mut result = Operand::constant(ty, o.value.unary(op, precision), e);
            if self.registry.is_type_typed(ty) {
                self.check_is_expressible(&mut result, base);
            }
            return result;
        }

        Operand::new(AddressingMode::Value, o.ty, e)
    }

    /// `&x` on a value, or `^T` written in expression position.
    fn check_address_of(&mut self, o: Operand<'ast>, u: &'ast UnaryExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        if o.is_type() {
            let ty = self.registry.make_pointer(o.ty);
            return Operand::new(AddressingMode::Type, ty, e);
        }
        if self.is_vector_elem(u.operand) {
            self.error(
                ErrorKind::TypeMismatch,
                u.span,
                "Cannot take the pointer address of a vector element",
            );
            return Operand::invalid(Some(e));
        }
        if o.mode != AddressingMode::Variable {
            self.error(
                ErrorKind::TypeMismatch,
                u.span,
                format!("Cannot take the pointer address of `{}`", u.operand),
            );
            return Operand::invalid(Some(e));
        }
        let ty = self.registry.make_pointer(o.ty);
        Operand::new(AddressingMode::Value, ty, e)
    }

    /// Whether `e` selects or indexes a single component of a vector.
    pub(crate) fn is_vector_elem(&self, e: Expr<'ast>) -> bool {
        match e.unparen() {
            Expr::Selector(s) => self
                .info
                .uses
                .get(&s.field.id)
                .is_some_and(|&f| self.registry.entity(f).flags.contains(EntityFlags::VECTOR_ELEM)),
            Expr::Index(ie) => self
                .info
                .type_of(ie.base)
                .is_some_and(|t| self.registry.is_type_vector(self.registry.type_deref(t))),
            _ => false,
        }
    }

    fn check_unary_op(&mut self, o: &Operand<'ast>, op: UnaryOp, e: Expr<'ast>) -> bool {
        let ty = self.base_vector_type(o.ty);
        let message = match op {
            UnaryOp::Plus | UnaryOp::Minus if !self.registry.is_type_numeric(ty) => {
                format!("Operator `{}` is not allowed with `{}`", op.symbol(), o.expr_string())
            }
            UnaryOp::BitNot if !self.registry.is_type_integer(ty) => {
                format!("Operator `{}` is only allowed with integers", op.symbol())
            }
            UnaryOp::Not if !self.registry.is_type_boolean(ty) => {
                format!("Operator `{}` is only allowed on boolean expressions", op.symbol())
            }
            _ => return true,
        };
        self.error(ErrorKind::TypeMismatch, e.span(), message);
        false
    }
}
