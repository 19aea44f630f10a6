//! Finalizing untyped constants.
//!
//! Literals and constant expressions start out untyped. They stay untyped
//! while combined with other untyped operands, promoting only upward
//! (integer to float, never back), and receive a concrete type when they
//! meet a typed operand, are assigned to a typed destination, or reach the
//! end of checking. Every expression still untyped is kept in the `untyped`
//! table so that finalizing a parent expression can push the type down into
//! its operands.

use quill_ast::Expr;
use quill_core::{BasicKind, ErrorKind, ExactValue};
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::Operand;

impl<'ast> Checker<'ast> {
    /// Give an untyped operand the type `target`.
    ///
    /// Converting to another untyped type only ever promotes numeric kinds.
    /// Converting to a typed target checks that a constant is representable
    /// and that a non-constant untyped value has a compatible kind. On
    /// failure the operand becomes invalid.
    pub fn convert_to_typed(&mut self, o: &mut Operand<'ast>, target: TypeId) {
        if o.is_invalid() || o.is_type() || target == TypeId::INVALID || self.registry.is_type_typed(o.ty) {
            return;
        }

        if self.registry.is_type_untyped(target) {
            let from = self.registry.basic_kind(o.ty);
            let to = self.registry.basic_kind(target);
            if self.registry.is_type_numeric(o.ty) && self.registry.is_type_numeric(target) {
                if from < to {
                    o.ty = target;
                    if let Some(e) = o.expr {
                        self.update_expr_type(e, target, false);
                    }
                }
            } else if from != to {
                self.convert_untyped_error(o, target);
            }
            return;
        }

        let mut target = target;
        let base = self.registry.base_enum_type(target);
        match self.registry.ty(base).kind {
            TypeKind::Basic(kind) => {
                if o.is_constant() {
                    self.check_is_expressible(o, target);
                    if o.is_invalid() {
                        return;
                    }
                    if let Some(e) = o.expr {
                        self.update_expr_value(e, o.value.clone());
                    }
                } else {
                    let ok = match self.registry.basic_kind(o.ty) {
                        Some(BasicKind::UntypedBool) => self.registry.is_type_boolean(base),
                        Some(BasicKind::UntypedInteger | BasicKind::UntypedFloat | BasicKind::UntypedRune) => {
                            self.registry.is_type_numeric(base)
                        }
                        Some(BasicKind::UntypedNil) => self.registry.type_has_nil(base),
                        Some(BasicKind::UntypedString) => kind == BasicKind::String,
                        _ => true,
                    };
                    if !ok {
                        self.convert_untyped_error(o, target);
                        return;
                    }
                }
            }
            _ => {
                if !self.registry.is_type_untyped_nil(o.ty) || !self.registry.type_has_nil(target) {
                    self.convert_untyped_error(o, target);
                    return;
                }
                target = TypeId::UNTYPED_NIL;
            }
        }

        o.ty = target;
        if let Some(e) = o.expr {
            self.update_expr_type(e, target, true);
        }
    }

    fn convert_untyped_error(&mut self, o: &mut Operand<'ast>, target: TypeId) {
        let e = o.expr_string();
        let t = self.type_str(target);
        let mut message = format!("Cannot convert `{e}` to `{t}`");
        if o.is_constant() && o.value == ExactValue::Integer(0) && e != "nil" {
            message.push_str(" - Did you want `nil`?");
        }
        let span = o.expr.map(|x| x.span()).unwrap_or_default();
        self.error(ErrorKind::TypeMismatch, span, message);
        o.set_invalid();
    }

    /// Push a type into an untyped expression and its untyped operands.
    ///
    /// With `final_type` unset the expression only changes its untyped kind;
    /// otherwise it leaves the untyped table and its result is recorded.
    pub(crate) fn update_expr_type(&mut self, e: Expr<'ast>, ty: TypeId, final_type: bool) {
        let Some(old) = self.info.untyped.get(&e.id()).cloned() else {
            return;
        };

        // Constants already carry their final value; their operands keep theirs
        if old.value.is_invalid() {
            match e {
                Expr::Unary(u) => self.update_expr_type(u.operand, ty, final_type),
                Expr::Binary(b) => {
                    if b.op.is_comparison() {
                        // Comparisons are boolean whatever their operands are
                    } else if b.op.is_shift() {
                        self.update_expr_type(b.left, ty, final_type);
                    } else {
                        self.update_expr_type(b.left, ty, final_type);
                        self.update_expr_type(b.right, ty, final_type);
                    }
                }
                Expr::Paren(p) => self.update_expr_type(p.expr, ty, final_type),
                Expr::Ternary(t) => {
                    self.update_expr_type(t.then_expr, ty, final_type);
                    self.update_expr_type(t.else_expr, ty, final_type);
                }
                _ => {}
            }
        }

        if !final_type && self.registry.is_type_untyped(ty) {
            let base = self.registry.base_type(ty);
            if let Some(info) = self.info.untyped.get_mut(&e.id()) {
                info.ty = base;
            }
            return;
        }

        self.info.untyped.remove(&e.id());
        if old.is_lhs && !self.registry.is_type_integer(ty) {
            let t = self.type_str(ty);
            self.error(
                ErrorKind::TypeMismatch,
                e.span(),
                format!("Shifted operand `{e}` must be an integer, got `{t}`"),
            );
            return;
        }
        self.info.add_type_and_value(e.id(), old.mode, Some(ty), old.value);
    }

    pub(crate) fn update_expr_value(&mut self, e: Expr<'ast>, value: ExactValue) {
        if let Some(info) = self.info.untyped.get_mut(&e.id()) {
            info.value = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::{AstBuilder, BinaryOp};

    use super::*;
    use crate::config::CheckerConfig;

    #[test]
    fn literal_finalizes_to_target() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let lit = b.int("5");
        let mut o = c.check_expr(lit);
        assert_eq!(o.ty, TypeId::UNTYPED_INTEGER);
        assert!(c.info().untyped.contains_key(&lit.id()));

        c.convert_to_typed(&mut o, TypeId::I64);
        assert_eq!(o.ty, TypeId::I64);
        assert!(!c.info().untyped.contains_key(&lit.id()));
        assert_eq!(c.info().types[&lit.id()].ty, Some(TypeId::I64));
    }

    #[test]
    fn untyped_promotion_only_moves_up() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let mut o = c.check_expr(b.float("1.5"));
        c.convert_to_typed(&mut o, TypeId::UNTYPED_INTEGER);
        assert_eq!(o.ty, TypeId::UNTYPED_FLOAT);

        let mut i = c.check_expr(b.int("1"));
        c.convert_to_typed(&mut i, TypeId::UNTYPED_FLOAT);
        assert_eq!(i.ty, TypeId::UNTYPED_FLOAT);
    }

    #[test]
    fn overflow_poisons_the_operand() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let mut o = c.check_expr(b.int("300"));
        c.convert_to_typed(&mut o, TypeId::U8);
        assert!(o.is_invalid());
        assert!(c.diagnostics().contains("`300 = 300` overflows `u8`"));
    }

    #[test]
    fn finalizing_a_sum_types_both_operands() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let (one, two) = (b.int("1"), b.int("2"));
        let sum = b.binary(one, BinaryOp::Add, two);
        let mut o = c.check_expr(sum);
        assert!(o.is_constant());
        c.convert_to_typed(&mut o, TypeId::F32);
        assert_eq!(c.info().types[&sum.id()].ty, Some(TypeId::F32));
        // The folded sum is constant, so its operands were finalized on their own
        assert!(c.info().untyped.contains_key(&one.id()));
    }

    #[test]
    fn zero_suggests_nil() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let ptr = c.registry_mut().make_pointer(TypeId::INT);
        let mut o = c.check_expr(b.int("0"));
        c.convert_to_typed(&mut o, ptr);
        assert!(c.diagnostics().contains("Cannot convert `0` to `^int` - Did you want `nil`?"));
    }
}
