//! Type classification.
//!
//! Numeric-flavoured predicates look through named types and enums to the
//! underlying basic type; shape predicates (`is_type_slice`, `is_type_struct`,
//! ...) only look through named types.

use quill_core::{BasicFlags, BasicKind};

use crate::ids::TypeId;
use crate::registry::Registry;
use crate::types::{RecordKind, TypeKind};

impl Registry {
    // ==========================================================================
    // Resolution
    // ==========================================================================

    /// Strip named types. A name that resolves to itself yields `INVALID`.
    pub fn base_type(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        // A chain longer than the arena must loop
        for _ in 0..=self.types.len() {
            match &self.ty(current).kind {
                TypeKind::Named { base, .. } => {
                    if *base == current {
                        return TypeId::INVALID;
                    }
                    current = *base;
                }
                _ => return current,
            }
        }
        TypeId::INVALID
    }

    /// Like [`Registry::base_type`], but enums resolve to their base type.
    pub fn base_enum_type(&self, ty: TypeId) -> TypeId {
        let base = self.base_type(ty);
        match self.record(base) {
            Some(record) if record.kind == RecordKind::Enum => {
                self.base_type(record.enum_base.unwrap_or(TypeId::INT))
            }
            _ => base,
        }
    }

    /// Basic kind of `ty` with names and enums stripped.
    pub fn basic_kind(&self, ty: TypeId) -> Option<BasicKind> {
        match self.ty(self.base_enum_type(ty)).kind {
            TypeKind::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    fn basic_flags(&self, ty: TypeId) -> BasicFlags {
        self.basic_kind(ty)
            .map(BasicKind::flags)
            .unwrap_or(BasicFlags::empty())
    }

    /// Basic kind of `ty` itself, without stripping names.
    fn raw_basic_kind(&self, ty: TypeId) -> Option<BasicKind> {
        match self.ty(ty).kind {
            TypeKind::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    fn base_kind(&self, ty: TypeId) -> &TypeKind {
        &self.ty(self.base_type(ty)).kind
    }

    fn base_basic_kind(&self, ty: TypeId) -> Option<BasicKind> {
        match self.base_kind(ty) {
            TypeKind::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    fn vector_elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.base_kind(ty) {
            TypeKind::Vector { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    // ==========================================================================
    // Basic predicates
    // ==========================================================================

    pub fn is_type_invalid(&self, ty: TypeId) -> bool {
        self.base_type(ty) == TypeId::INVALID
    }

    pub fn is_type_boolean(&self, ty: TypeId) -> bool {
        self.basic_flags(ty).contains(BasicFlags::BOOLEAN)
    }

    pub fn is_type_integer(&self, ty: TypeId) -> bool {
        self.basic_flags(ty).contains(BasicFlags::INTEGER)
    }

    pub fn is_type_unsigned(&self, ty: TypeId) -> bool {
        self.basic_flags(ty).contains(BasicFlags::UNSIGNED)
    }

    pub fn is_type_float(&self, ty: TypeId) -> bool {
        self.basic_flags(ty).contains(BasicFlags::FLOAT)
    }

    /// Integers, floats, and vectors of either.
    pub fn is_type_numeric(&self, ty: TypeId) -> bool {
        if self.basic_flags(ty).intersects(BasicFlags::NUMERIC) {
            return true;
        }
        self.vector_elem(ty).is_some_and(|elem| self.is_type_numeric(elem))
    }

    /// Types with a total order: numbers, strings, pointers.
    pub fn is_type_ordered(&self, ty: TypeId) -> bool {
        if self.basic_flags(ty).intersects(BasicFlags::ORDERED) {
            return true;
        }
        match self.ty(self.base_enum_type(ty)).kind {
            TypeKind::Pointer(_) => true,
            TypeKind::Vector { elem, .. } => self.is_type_ordered(elem),
            _ => false,
        }
    }

    /// Types whose values may be compile-time constants.
    pub fn is_type_constant_type(&self, ty: TypeId) -> bool {
        self.basic_flags(ty).intersects(BasicFlags::CONSTANT_TYPE)
    }

    pub fn is_type_string(&self, ty: TypeId) -> bool {
        self.base_basic_kind(ty)
            .is_some_and(|k| k.flags().contains(BasicFlags::STRING))
    }

    pub fn is_type_typed(&self, ty: TypeId) -> bool {
        !self.is_type_untyped(ty)
    }

    pub fn is_type_untyped(&self, ty: TypeId) -> bool {
        self.base_basic_kind(ty).is_some_and(BasicKind::is_untyped)
    }

    pub fn is_type_untyped_nil(&self, ty: TypeId) -> bool {
        self.base_basic_kind(ty) == Some(BasicKind::UntypedNil)
    }

    pub fn is_type_any(&self, ty: TypeId) -> bool {
        self.base_basic_kind(ty) == Some(BasicKind::Any)
    }

    pub fn is_type_int_or_uint(&self, ty: TypeId) -> bool {
        matches!(
            self.raw_basic_kind(ty),
            Some(BasicKind::Int | BasicKind::Uint)
        )
    }

    pub fn is_type_rawptr(&self, ty: TypeId) -> bool {
        self.raw_basic_kind(ty) == Some(BasicKind::Rawptr)
    }

    pub fn is_type_u8(&self, ty: TypeId) -> bool {
        self.raw_basic_kind(ty) == Some(BasicKind::U8)
    }

    // ==========================================================================
    // Shape predicates
    // ==========================================================================

    /// `rawptr` or `^T`.
    pub fn is_type_pointer(&self, ty: TypeId) -> bool {
        match self.base_kind(ty) {
            TypeKind::Basic(kind) => kind.flags().contains(BasicFlags::POINTER),
            TypeKind::Pointer(_) => true,
            _ => false,
        }
    }

    pub fn is_type_tuple(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Tuple(_))
    }

    pub fn is_type_array(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Array { .. })
    }

    pub fn is_type_dynamic_array(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::DynamicArray(_))
    }

    pub fn is_type_slice(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Slice(_))
    }

    pub fn is_type_u8_slice(&self, ty: TypeId) -> bool {
        match self.base_kind(ty) {
            TypeKind::Slice(elem) => self.is_type_u8(*elem),
            _ => false,
        }
    }

    pub fn is_type_vector(&self, ty: TypeId) -> bool {
        self.vector_elem(ty).is_some()
    }

    pub fn is_type_proc(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Proc(_))
    }

    pub fn is_type_map(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Map { .. })
    }

    fn is_record_kind(&self, ty: TypeId, kind: RecordKind) -> bool {
        matches!(self.base_kind(ty), TypeKind::Record(r) if r.kind == kind)
    }

    pub fn is_type_struct(&self, ty: TypeId) -> bool {
        self.is_record_kind(ty, RecordKind::Struct)
    }

    pub fn is_type_union(&self, ty: TypeId) -> bool {
        self.is_record_kind(ty, RecordKind::Union)
    }

    pub fn is_type_raw_union(&self, ty: TypeId) -> bool {
        self.is_record_kind(ty, RecordKind::RawUnion)
    }

    pub fn is_type_enum(&self, ty: TypeId) -> bool {
        self.is_record_kind(ty, RecordKind::Enum)
    }

    /// Whether `ty` was declared with a name.
    pub fn is_type_named(&self, ty: TypeId) -> bool {
        match &self.ty(ty).kind {
            TypeKind::Named { .. } => true,
            TypeKind::Basic(kind) => !kind.is_untyped(),
            _ => false,
        }
    }

    // ==========================================================================
    // Capability predicates
    // ==========================================================================

    /// Key types accepted by `map[K]V`.
    pub fn is_type_valid_map_key(&self, ty: TypeId) -> bool {
        if self.is_type_untyped(ty) {
            return false;
        }
        self.is_type_integer(ty)
            || self.is_type_float(ty)
            || self.is_type_string(ty)
            || self.is_type_pointer(ty)
    }

    /// Types that support `x[i]`.
    pub fn is_type_indexable(&self, ty: TypeId) -> bool {
        matches!(
            self.base_kind(ty),
            TypeKind::Array { .. }
                | TypeKind::Slice(_)
                | TypeKind::Vector { .. }
                | TypeKind::DynamicArray(_)
                | TypeKind::Map { .. }
        ) || self.is_type_string(ty)
    }

    /// Types that can hold `nil`.
    pub fn type_has_nil(&self, ty: TypeId) -> bool {
        match self.base_kind(ty) {
            TypeKind::Basic(kind) => matches!(kind, BasicKind::Rawptr | BasicKind::Any),
            TypeKind::Slice(_)
            | TypeKind::DynamicArray(_)
            | TypeKind::Proc(_)
            | TypeKind::Pointer(_)
            | TypeKind::Map { .. } => true,
            _ => false,
        }
    }

    /// Types accepted by `==` and `!=`.
    pub fn is_type_comparable(&self, ty: TypeId) -> bool {
        let base = self.base_type(ty);
        match &self.ty(base).kind {
            TypeKind::Basic(kind) => !matches!(kind, BasicKind::UntypedNil | BasicKind::Any),
            TypeKind::Pointer(_) | TypeKind::Proc(_) => true,
            TypeKind::Record(record) if record.kind == RecordKind::Enum => {
                self.is_type_comparable(record.enum_base.unwrap_or(TypeId::INT))
            }
            TypeKind::Vector { elem, .. } => self.is_type_comparable(*elem),
            _ => false,
        }
    }

    /// Element type of an indexable or pointer type.
    pub fn elem_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.base_kind(ty) {
            TypeKind::Pointer(elem)
            | TypeKind::Slice(elem)
            | TypeKind::DynamicArray(elem)
            | TypeKind::Array { elem, .. }
            | TypeKind::Vector { elem, .. } => Some(*elem),
            TypeKind::Map { value, .. } => Some(*value),
            TypeKind::Basic(BasicKind::String | BasicKind::UntypedString) => Some(TypeId::U8),
            _ => None,
        }
    }
}
