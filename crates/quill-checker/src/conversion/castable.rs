//! Explicit conversions: `cast(T) x`.

use quill_core::ErrorKind;
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Whether `o` may be converted to `target` with an explicit cast.
    pub fn is_castable_to(&mut self, o: &Operand<'ast>, target: TypeId) -> bool {
        if self.is_assignable_to(o, target) {
            return true;
        }
        let reg = &self.registry;
        let src = reg.base_enum_type(o.ty);
        let dst = reg.base_enum_type(target);
        if reg.are_types_identical(src, dst) {
            return true;
        }

        match (&reg.ty(src).kind, &reg.ty(dst).kind) {
            (TypeKind::Array { elem: a, count: n }, TypeKind::Array { elem: b, count: m }) => {
                if n == m && reg.are_types_identical(*a, *b) {
                    return true;
                }
            }
            (TypeKind::Slice(a), TypeKind::Slice(b)) => {
                if reg.are_types_identical(*a, *b) {
                    return true;
                }
            }
            _ => {}
        }

        let int_like = |t| reg.is_type_boolean(t) || reg.is_type_integer(t);
        if int_like(src) && int_like(dst) {
            return true;
        }
        let number = |t| reg.is_type_integer(t) || reg.is_type_float(t);
        if number(src) && number(dst) {
            return true;
        }
        if reg.is_type_pointer(src) && reg.is_type_pointer(dst) {
            return true;
        }
        if (reg.is_type_int_or_uint(src) && reg.is_type_rawptr(dst))
            || (reg.is_type_rawptr(src) && reg.is_type_int_or_uint(dst))
        {
            return true;
        }
        if reg.is_type_u8_slice(src) && reg.is_type_string(dst) {
            return true;
        }
        // Untyped strings have no backing storage to slice
        if reg.is_type_string(src) && reg.is_type_u8_slice(dst) && reg.is_type_typed(src) {
            return true;
        }
        if reg.is_type_proc(src) && (reg.is_type_proc(dst) || reg.is_type_rawptr(dst)) {
            return true;
        }
        reg.is_type_rawptr(src) && reg.is_type_proc(dst)
    }

    /// Convert `o` to `target`, as in `cast(T) x`.
    ///
    /// A constant converted to a constant type stays constant and must be
    /// representable; every other conversion yields a value.
    pub(crate) fn check_conversion(&mut self, o: &mut Operand<'ast>, target: TypeId) {
        let is_const_expr = o.is_constant();
        let bt = self.registry.base_type(target);
        let mut can_convert = false;

        if is_const_expr && self.registry.is_type_constant_type(bt) {
            if let TypeKind::Basic(_) = self.registry.ty(self.registry.base_enum_type(bt)).kind {
                if let Some(value) = self.representable_as_constant(&o.value, bt) {
                    o.value = value;
                    can_convert = true;
                } else if self.registry.is_type_pointer(target) && self.is_castable_to(o, target) {
                    o.mode = AddressingMode::Value;
                    can_convert = true;
                }
            }
        } else if self.is_castable_to(o, target) {
            if !o.is_constant() || (self.registry.is_type_slice(target) && self.registry.is_type_string(o.ty)) {
                o.mode = AddressingMode::Value;
            }
            can_convert = true;
        }

        if !can_convert {
            let e = o.expr_string();
            let to = self.type_str(target);
            let from = self.type_str(o.ty);
            let span = o.expr.map(|x| x.span()).unwrap_or_default();
            self.error(
                ErrorKind::TypeMismatch,
                span,
                format!("Cannot cast `{e}` as `{to}` from `{from}`"),
            );
            o.set_invalid();
            return;
        }

        if self.registry.is_type_untyped(o.ty) {
            let final_type = if is_const_expr && !self.registry.is_type_constant_type(target) {
                self.registry.default_type(o.ty)
            } else {
                target
            };
            if let Some(e) = o.expr {
                self.update_expr_type(e, final_type, true);
            }
        }
        o.ty = target;
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use super::*;
    use crate::config::CheckerConfig;

    fn value<'a>(c: &mut Checker<'a>, b: &AstBuilder<'a>, ty: TypeId) -> Operand<'a> {
        let mut o = c.check_expr(b.ident("true"));
        o.mode = AddressingMode::Variable;
        o.ty = ty;
        o
    }

    #[test]
    fn numeric_and_pointer_casts() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let f = value(&mut c, &b, TypeId::F32);
        assert!(c.is_castable_to(&f, TypeId::I64));
        let p = c.registry_mut().make_pointer(TypeId::INT);
        let ptr = value(&mut c, &b, p);
        assert!(c.is_castable_to(&ptr, TypeId::RAWPTR));
        assert!(!c.is_castable_to(&ptr, TypeId::F64));
        let uint = value(&mut c, &b, TypeId::UINT);
        assert!(c.is_castable_to(&uint, TypeId::RAWPTR));
        let u32v = value(&mut c, &b, TypeId::U32);
        assert!(!c.is_castable_to(&u32v, TypeId::RAWPTR));
    }

    #[test]
    fn strings_and_byte_slices() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let bytes = c.registry_mut().make_slice(TypeId::U8);
        let s = value(&mut c, &b, TypeId::STRING);
        assert!(c.is_castable_to(&s, bytes));
        let raw = value(&mut c, &b, bytes);
        assert!(c.is_castable_to(&raw, TypeId::STRING));
        let untyped = c.check_expr(b.str("abc"));
        assert!(!c.is_castable_to(&untyped, bytes));
    }

    #[test]
    fn constant_casts_stay_constant() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let mut o = c.check_expr(b.float("3.0"));
        c.check_conversion(&mut o, TypeId::INT);
        assert!(o.is_constant());
        assert_eq!(o.ty, TypeId::INT);

        let mut o = c.check_expr(b.float("3.5"));
        c.check_conversion(&mut o, TypeId::INT);
        assert!(o.is_invalid());
        assert!(c.diagnostics().contains("Cannot cast `3.5` as `int` from `untyped float`"));
    }
}
