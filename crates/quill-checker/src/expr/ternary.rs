use quill_ast::{Expr, TernaryExpr};
use quill_core::ErrorKind;
use quill_registry::TypeId;

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// `if cond then a else b` in expression position.
    pub(super) fn check_ternary_expr(
        &mut self,
        t: &'ast TernaryExpr<'ast>,
        e: Expr<'ast>,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        let cond = self.check_expr(t.cond);
        if cond.is_invalid() {
            return Operand::invalid(Some(e));
        }
        if !self.registry.is_type_boolean(cond.ty) {
            self.error(ErrorKind::TypeMismatch, t.cond.span(), "Non-boolean condition in if expression");
            return Operand::invalid(Some(e));
        }

        let mut x = self.check_expr_with_type_hint(t.then_expr, hint);
        if x.is_invalid() {
            return Operand::invalid(Some(e));
        }
        let mut y = self.check_expr_with_type_hint(t.else_expr, hint.or(Some(x.ty)));
        if y.is_invalid() {
            return Operand::invalid(Some(e));
        }

        self.convert_to_typed(&mut x, y.ty);
        if x.is_invalid() {
            return Operand::invalid(Some(e));
        }
        self.convert_to_typed(&mut y, x.ty);
        if y.is_invalid() {
            return Operand::invalid(Some(e));
        }

        if !self.registry.are_types_identical(x.ty, y.ty) {
            let (xs, ys) = (self.type_str(x.ty), self.type_str(y.ty));
            self.error(
                ErrorKind::TypeMismatch,
                t.span,
                format!("Mismatched types in if expression, {xs} vs {ys}"),
            );
            return Operand::invalid(Some(e));
        }

        Operand::new(AddressingMode::Value, x.ty, e)
    }
}
