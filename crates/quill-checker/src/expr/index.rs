//! Indexing, slicing and dereferencing.

use quill_ast::{DerefExpr, Expr, IndexExpr, SliceExpr};
use quill_core::ErrorKind;
use quill_registry::{EntityFlags, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn check_index_expr(&mut self, ie: &'ast IndexExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let mut o = self.check_expr(ie.base);
        if o.is_invalid() {
            return Operand::invalid(Some(e));
        }

        let t = self.registry.base_type(self.registry.type_deref(o.ty));
        if let TypeKind::Map { key, value, .. } = self.registry.ty(t).kind {
            let Some(index) = ie.index else {
                self.error(ErrorKind::SyntaxShape, ie.span, format!("Missing index for `{}`", ie.base));
                return Operand::invalid(Some(e));
            };
            let mut k = self.check_expr_with_type_hint(index, Some(key));
            self.check_assignment(&mut k, Some(key), "map index");
            if k.is_invalid() {
                return Operand::invalid(Some(e));
            }
            return Operand::new(AddressingMode::MapIndex, value, e);
        }

        let is_const = o.is_constant();
        let mut max_count = -1;
        let mut valid = !is_const && self.set_index_data(&mut o, t, &mut max_count);
        if !valid && !is_const && (self.registry.is_type_struct(t) || self.registry.is_type_raw_union(t)) {
            if let Some(field_ty) = self.find_using_index_target(t) {
                valid = self.set_index_data(&mut o, field_ty, &mut max_count);
            }
        }
        if !valid {
            let message = if is_const {
                format!("Cannot index a constant `{}`", ie.base)
            } else {
                format!("Cannot index `{}`", ie.base)
            };
            self.error(ErrorKind::TypeMismatch, ie.base.span(), message);
            return Operand::invalid(Some(e));
        }

        let Some(index) = ie.index else {
            self.error(ErrorKind::SyntaxShape, ie.span, format!("Missing index for `{}`", ie.base));
            return Operand::invalid(Some(e));
        };
        if self.check_index_value(index, max_count).is_none() {
            return Operand::invalid(Some(e));
        }

        Operand::new(o.mode, o.ty, e)
    }

    /// Turn `o` into the element of an indexable `t`.
    fn set_index_data(&mut self, o: &mut Operand<'ast>, t: TypeId, max_count: &mut i64) -> bool {
        let indirect = self.registry.is_type_pointer(o.ty);
        let t = self.registry.base_type(self.registry.type_deref(t));
        let addressable_elem = |mode: &AddressingMode| {
            if indirect || *mode == AddressingMode::Variable {
                AddressingMode::Variable
            } else {
                AddressingMode::Value
            }
        };
        match self.registry.ty(t).kind {
            TypeKind::Basic(_) if self.registry.is_type_string(t) => {
                if let Some(s) = o.value.as_str() {
                    *max_count = s.len() as i64;
                }
                // Strings are immutable, their bytes can be read only
                o.mode = AddressingMode::Value;
                o.ty = TypeId::U8;
                true
            }
            TypeKind::Array { elem, count } | TypeKind::Vector { elem, count } => {
                *max_count = count;
                o.mode = addressable_elem(&o.mode);
                o.ty = elem;
                true
            }
            TypeKind::Slice(elem) | TypeKind::DynamicArray(elem) => {
                o.mode = AddressingMode::Variable;
                o.ty = elem;
                true
            }
            _ => false,
        }
    }

    /// Type of the `using` field an otherwise unindexable record forwards
    /// indexing to.
    fn find_using_index_target(&self, record_ty: TypeId) -> Option<TypeId> {
        let record = self.registry.record(record_ty)?;
        record.fields.iter().copied().find_map(|f| {
            let entity = self.registry.entity(f);
            if !entity.flags.contains(EntityFlags::ANONYMOUS) {
                return None;
            }
            let ty = self.registry.entity_type(f);
            self.registry.is_type_indexable(ty).then_some(ty)
        })
    }

    /// Check an index operand against a bound.
    ///
    /// # Arguments
    ///
    /// * `index` - The index expression
    /// * `max_count` - Exclusive upper bound, or `-1` when unknown
    ///
    /// # Returns
    ///
    /// `None` after reporting an error; otherwise the constant index value,
    /// or `-1` when the index is not constant or bounds checks are off.
    pub(crate) fn check_index_value(&mut self, index: Expr<'ast>, max_count: i64) -> Option<i64> {
        let mut o = self.check_expr(index);
        if o.is_invalid() {
            return None;
        }
        self.convert_to_typed(&mut o, TypeId::INT);
        if o.is_invalid() {
            return None;
        }
        if !self.registry.is_type_integer(self.registry.base_enum_type(o.ty)) {
            self.error(
                ErrorKind::TypeMismatch,
                index.span(),
                format!("Index `{index}` must be an integer"),
            );
            return None;
        }

        if o.is_constant() && self.bounds_checking() {
            let i = o.value.to_integer().as_integer().unwrap_or(0);
            if i < 0 {
                self.error(
                    ErrorKind::Constant,
                    index.span(),
                    format!("Index `{index}` cannot be a negative value"),
                );
                return None;
            }
            if max_count >= 0 {
                if i >= max_count {
                    self.error(
                        ErrorKind::Constant,
                        index.span(),
                        format!("Index `{i}` is out of bounds range 0..<{max_count}"),
                    );
                    return None;
                }
                return Some(i);
            }
        }
        Some(-1)
    }

    pub(super) fn check_slice_expr(&mut self, se: &'ast SliceExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let o = self.check_expr(se.base);
        if o.is_invalid() {
            return Operand::invalid(Some(e));
        }

        let indirect = self.registry.is_type_pointer(o.ty);
        let t = self.registry.base_type(self.registry.type_deref(o.ty));
        let mut max_count = -1;
        let ty = match self.registry.ty(t).kind {
            TypeKind::Basic(_) if self.registry.is_type_string(t) => {
                if let Some(s) = o.value.as_str() {
                    max_count = s.len() as i64;
                }
                TypeId::STRING
            }
            TypeKind::Array { elem, count } => {
                if !indirect && o.mode != AddressingMode::Variable {
                    self.error(
                        ErrorKind::TypeMismatch,
                        se.span,
                        format!("Cannot slice array `{e}`, value is not addressable"),
                    );
                    return Operand::invalid(Some(e));
                }
                max_count = count;
                self.registry.make_slice(elem)
            }
            TypeKind::Slice(_) => t,
            TypeKind::DynamicArray(elem) => self.registry.make_slice(elem),
            _ => {
                self.error(ErrorKind::TypeMismatch, se.base.span(), format!("Cannot slice `{}`", se.base));
                return Operand::invalid(Some(e));
            }
        };

        // The high bound may equal the length
        let capacity = if max_count >= 0 { max_count + 1 } else { -1 };
        let mut bounds = [0, max_count];
        for (slot, bound) in bounds.iter_mut().zip([se.low, se.high]) {
            if let Some(bound) = bound {
                if let Some(value) = self.check_index_value(bound, capacity) {
                    *slot = value;
                }
            }
        }
        let [low, high] = bounds;
        if high >= 0 && low > high {
            self.error(
                ErrorKind::Constant,
                se.span,
                format!("Invalid slice indices: [{low} > {high}]"),
            );
        }

        Operand::new(AddressingMode::Value, ty, e)
    }

    pub(super) fn check_deref_expr(&mut self, de: &'ast DerefExpr<'ast>, e: Expr<'ast>) -> Operand<'ast> {
        let o = self.check_expr(de.base);
        if o.is_invalid() {
            return Operand::invalid(Some(e));
        }
        match self.registry.ty(self.registry.base_type(o.ty)).kind {
            TypeKind::Pointer(elem) => {
                let mode = if o.mode == AddressingMode::Immutable {
                    AddressingMode::Immutable
                } else {
                    AddressingMode::Variable
                };
                Operand::new(mode, elem, e)
            }
            _ => {
                self.error(ErrorKind::TypeMismatch, de.span, format!("Cannot dereference `{}`", de.base));
                Operand::invalid(Some(e))
            }
        }
    }
}
