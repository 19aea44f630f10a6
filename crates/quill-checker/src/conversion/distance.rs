//! Conversion distance between an operand and a target type.

use quill_core::BasicKind;
use quill_registry::{EntityFlags, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

/// Score of a conversion distance for overload ranking.
///
/// Smaller distances score higher; the score saturates at zero.
pub fn distance_score(distance: i64) -> i64 {
    1_000_000i64.saturating_sub(distance.saturating_mul(distance)).max(0)
}

impl<'ast> Checker<'ast> {
    /// How far `o` is from being a value of `target`.
    ///
    /// # Returns
    ///
    /// `-1` when the operand is not assignable to `target`, otherwise a
    /// non-negative distance (see the module table).
    pub fn distance_between(&mut self, o: &Operand<'ast>, target: TypeId) -> i64 {
        if o.is_invalid() || self.registry.is_type_invalid(target) {
            return 0;
        }
        if matches!(o.mode, AddressingMode::Builtin(_)) {
            return -1;
        }

        let s = o.ty;
        if self.registry.are_types_identical(s, target) {
            return 0;
        }
        let src = self.registry.base_type(s);
        let dst = self.registry.base_type(target);

        if self.registry.is_type_untyped_nil(src) {
            return if self.registry.type_has_nil(target) { 1 } else { -1 };
        }

        if self.registry.is_type_untyped(src) {
            if self.registry.is_type_any(dst) {
                let default = self.registry.default_type(s);
                self.add_type_info(default);
                return 10;
            }
            if let TypeKind::Basic(_) = self.registry.ty(self.registry.base_enum_type(dst)).kind {
                if o.is_constant() {
                    if self.representable_as_constant(&o.value, target).is_none() {
                        return -1;
                    }
                    // A literal of the target's own kind is closer
                    return if self.untyped_kind_matches(src, dst) { 1 } else { 2 };
                }
                if self.registry.basic_kind(src) == Some(BasicKind::UntypedBool) {
                    if !self.registry.is_type_boolean(dst) {
                        return -1;
                    }
                    return if self.registry.is_type_named(target) { 2 } else { 1 };
                }
            }
        }

        if self.registry.are_types_identical(src, dst)
            && (!self.registry.is_type_named(s) || !self.registry.is_type_named(target))
        {
            return 1;
        }

        if self.is_assignable_using_subtype(s, target) {
            return 4;
        }

        if self.registry.is_type_rawptr(dst) && self.registry.is_type_pointer(src) {
            return 5;
        }

        if let Some(record) = self.registry.record(dst) {
            if self.registry.is_type_union(dst) {
                let matched = record
                    .fields
                    .iter()
                    .skip(1)
                    .any(|&v| self.registry.are_types_identical(self.registry.entity_type(v), s));
                if matched {
                    return 1;
                }
            }
        }

        if self.registry.is_type_any(dst) {
            self.add_type_info(s);
            return 10;
        }

        -1
    }

    /// Whether a value of `ty` may be used where `target` is expected.
    pub fn is_assignable_to(&mut self, o: &Operand<'ast>, target: TypeId) -> bool {
        self.distance_between(o, target) >= 0
    }

    /// Overload score of using `o` where `target` is expected, `None` when
    /// it is not assignable.
    pub(crate) fn assignment_score(&mut self, o: &Operand<'ast>, target: TypeId) -> Option<i64> {
        let d = self.distance_between(o, target);
        (d >= 0).then(|| distance_score(d))
    }

    /// Whether `src` embeds `dst` through `using` fields, directly or
    /// transitively. Both sides must agree on being pointers.
    fn is_assignable_using_subtype(&self, src: TypeId, dst: TypeId) -> bool {
        let src_deref = self.registry.type_deref(src);
        let dst_deref = self.registry.type_deref(dst);
        let src_is_ptr = src_deref != src;
        let dst_is_ptr = dst_deref != dst;
        if src_is_ptr != dst_is_ptr {
            return false;
        }
        self.embeds_type(src_deref, dst_deref, 0)
    }

    fn embeds_type(&self, outer: TypeId, target: TypeId, depth: usize) -> bool {
        // A struct embedding itself is rejected by layout; stop well before
        if depth > 32 || !self.registry.is_type_struct(outer) {
            return false;
        }
        let base = self.registry.base_type(outer);
        let Some(record) = self.registry.record(base) else {
            return false;
        };
        record.fields.iter().any(|&f| {
            let e = self.registry.entity(f);
            if !e.flags.contains(EntityFlags::ANONYMOUS) {
                return false;
            }
            let ft = self.registry.entity_type(f);
            self.registry.are_types_identical(ft, target) || self.embeds_type(ft, target, depth + 1)
        })
    }

    fn untyped_kind_matches(&self, src: TypeId, dst: TypeId) -> bool {
        if !self.registry.is_type_typed(dst) {
            return false;
        }
        match self.registry.basic_kind(src) {
            Some(BasicKind::UntypedInteger | BasicKind::UntypedRune) => self.registry.is_type_integer(dst),
            Some(BasicKind::UntypedFloat) => self.registry.is_type_float(dst),
            Some(BasicKind::UntypedBool) => self.registry.is_type_boolean(dst),
            Some(BasicKind::UntypedString) => self.registry.is_type_string(dst),
            _ => false,
        }
    }
}
