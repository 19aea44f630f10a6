//! Constant representability.

use quill_core::{BasicKind, ErrorKind, ExactValue};
use quill_registry::TypeId;

use crate::checker::Checker;
use crate::operand::Operand;

impl<'ast> Checker<'ast> {
    /// Convert `value` to the representation of basic type `ty`.
    ///
    /// # Returns
    ///
    /// The converted value, or `None` when it does not fit. An invalid value
    /// fits everything.
    pub fn representable_as_constant(&self, value: &ExactValue, ty: TypeId) -> Option<ExactValue> {
        if value.is_invalid() {
            return Some(ExactValue::Invalid);
        }
        let kind = self.registry.basic_kind(ty)?;
        let reg = &self.registry;
        if reg.is_type_boolean(ty) {
            return matches!(value, ExactValue::Bool(_)).then(|| value.clone());
        }
        if reg.is_type_string(ty) {
            return matches!(value, ExactValue::String(_)).then(|| value.clone());
        }
        if reg.is_type_integer(ty) {
            let ExactValue::Integer(i) = value.to_integer() else {
                return None;
            };
            if kind == BasicKind::UntypedInteger || kind == BasicKind::UntypedRune {
                return Some(ExactValue::Integer(i));
            }
            let bits = kind.size(reg.sizes().word_size) * 8;
            let fits = if reg.is_type_unsigned(ty) {
                i >= 0 && (bits >= 64 || i < (1i64 << bits))
            } else if bits >= 64 {
                true
            } else {
                let half = 1i64 << (bits - 1);
                -half <= i && i < half
            };
            return fits.then_some(ExactValue::Integer(i));
        }
        if reg.is_type_float(ty) {
            return match value.to_float() {
                ExactValue::Float(f) => Some(ExactValue::Float(f)),
                _ => None,
            };
        }
        if reg.is_type_pointer(ty) {
            return matches!(value, ExactValue::Pointer(_)).then(|| value.clone());
        }
        None
    }

    /// Check that a constant operand fits `ty`, converting its value.
    ///
    /// On failure an overflow, truncation or conversion error is reported and
    /// the operand becomes invalid.
    pub(crate) fn check_is_expressible(&mut self, o: &mut Operand<'ast>, ty: TypeId) {
        if let Some(value) = self.representable_as_constant(&o.value, ty) {
            o.value = value;
            return;
        }
        let e = o.expr_string();
        let t = self.type_str(ty);
        let span = o.expr.map(|x| x.span()).unwrap_or_default();
        let message = if self.registry.is_type_numeric(o.ty) && self.registry.is_type_numeric(ty) {
            if !self.registry.is_type_integer(o.ty) && self.registry.is_type_integer(ty) {
                format!("`{e}` truncated to `{t}`")
            } else {
                format!("`{e} = {}` overflows `{t}`", o.value)
            }
        } else {
            format!("Cannot convert `{e}` to `{t}`")
        };
        self.error(ErrorKind::Constant, span, message);
        o.set_invalid();
    }
}
