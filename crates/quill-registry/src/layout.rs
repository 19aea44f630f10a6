//! Size, alignment and field offsets.
//!
//! Layout queries walk the type graph with an explicit path of the types
//! currently being sized. Reaching a type that is already on the path means
//! the type contains itself by value: the query fails with a
//! [`CheckError::CyclicType`] naming the cycle, and the offending type is
//! marked failed so that later queries report size and alignment zero
//! instead of the same error again.

use log::warn;
use quill_core::{BasicKind, CheckError, ErrorKind, Span};

use crate::ids::{EntityId, TypeId};
use crate::registry::Registry;
use crate::selection::Selection;
use crate::types::{RecordKind, TypeKind};

/// Target sizes the layout is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSizes {
    pub word_size: i64,
    pub max_align: i64,
}

impl Default for TypeSizes {
    fn default() -> Self {
        Self {
            word_size: 8,
            max_align: 16,
        }
    }
}

/// Round `size` up to a multiple of `align`.
pub fn align_formula(size: i64, align: i64) -> i64 {
    if align > 0 {
        let result = size + align - 1;
        result - result % align
    } else {
        size
    }
}

fn next_pow2(n: i64) -> i64 {
    if n <= 1 {
        return 1;
    }
    1i64.checked_shl(64 - (n - 1).leading_zeros()).unwrap_or(i64::MAX)
}

fn prev_pow2(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    1i64 << (63 - n.leading_zeros())
}

type LayoutResult = Result<i64, CheckError>;

/// Types currently being sized, outermost first.
#[derive(Debug, Default)]
struct TypePath {
    stack: Vec<TypeId>,
}

impl Registry {
    // ==========================================================================
    // Public queries
    // ==========================================================================

    /// Size of `ty` in bytes.
    pub fn size_of(&mut self, ty: TypeId) -> LayoutResult {
        self.size_internal(ty, &mut TypePath::default())
    }

    /// Alignment of `ty` in bytes.
    pub fn align_of(&mut self, ty: TypeId) -> LayoutResult {
        self.align_internal(ty, &mut TypePath::default())
    }

    /// Offset of field `index` in a struct, tuple or a builtin aggregate
    /// (`string`, `any`, slices, dynamic arrays).
    pub fn offset_of(&mut self, ty: TypeId, index: usize) -> LayoutResult {
        let base = self.base_type(ty);
        let word = self.sizes.word_size;
        match self.ty(base).kind.clone() {
            TypeKind::Record(record) if record.kind == RecordKind::Struct => {
                let offsets = self.struct_offsets(base, &mut TypePath::default())?;
                Ok(offsets.get(index).copied().unwrap_or(0))
            }
            TypeKind::Tuple(vars) => {
                let offsets = self.offsets_of(&vars, false, &mut TypePath::default())?;
                Ok(offsets.get(index).copied().unwrap_or(0))
            }
            TypeKind::Basic(BasicKind::String | BasicKind::Any) | TypeKind::Slice(_) => {
                Ok(if index == 1 { word } else { 0 })
            }
            TypeKind::DynamicArray(_) if index < 4 => Ok(index as i64 * word),
            _ => Ok(0),
        }
    }

    /// Byte offset reached by following a field selection from `ty`.
    pub fn offset_of_selection(&mut self, ty: TypeId, selection: &Selection) -> LayoutResult {
        let mut current = ty;
        let mut offset = 0;
        for &index in &selection.index {
            let base = self.base_type(current);
            offset += self.offset_of(base, index)?;
            current = match &self.ty(base).kind {
                TypeKind::Record(record) if record.kind == RecordKind::Struct => record
                    .fields
                    .get(index)
                    .map(|&f| self.entity_type(f))
                    .unwrap_or(TypeId::INVALID),
                TypeKind::Basic(BasicKind::String) => {
                    if index == 0 { TypeId::RAWPTR } else { TypeId::INT }
                }
                TypeKind::Basic(BasicKind::Any) => {
                    if index == 0 { self.type_info_ptr } else { TypeId::RAWPTR }
                }
                TypeKind::Slice(_) => {
                    if index == 0 { TypeId::RAWPTR } else { TypeId::INT }
                }
                TypeKind::DynamicArray(_) => match index {
                    0 => TypeId::RAWPTR,
                    1 | 2 => TypeId::INT,
                    _ => self.allocator,
                },
                _ => TypeId::INVALID,
            };
        }
        Ok(offset)
    }

    // ==========================================================================
    // Cycle tracking
    // ==========================================================================

    fn path_push(&mut self, path: &mut TypePath, ty: TypeId) -> Result<(), CheckError> {
        if path.stack.contains(&ty) {
            let name = self.type_to_string(ty);
            let mut message = format!("Illegal declaration cycle of `{name}`");
            for &t in &path.stack {
                message.push_str(&format!("\n\t{} refers to", self.type_to_string(t)));
            }
            message.push_str(&format!("\n\t{name}"));
            let span = self.type_span(ty);
            warn!("layout cycle through `{name}`");
            self.ty_mut(ty).failed = true;
            return Err(CheckError::new(ErrorKind::CyclicType, span, message));
        }
        path.stack.push(ty);
        Ok(())
    }

    fn type_span(&self, ty: TypeId) -> Span {
        match &self.ty(ty).kind {
            TypeKind::Named {
                type_name: Some(e), ..
            } => self.entity(*e).span,
            _ => Span::default(),
        }
    }

    /// Align or size of `ty` as a nested element of the current type.
    fn nested(
        &mut self,
        ty: TypeId,
        path: &mut TypePath,
        query: fn(&mut Registry, TypeId, &mut TypePath) -> LayoutResult,
    ) -> LayoutResult {
        self.path_push(path, ty)?;
        let result = query(self, ty, path);
        path.stack.pop();
        result
    }

    // ==========================================================================
    // Alignment
    // ==========================================================================

    fn align_internal(&mut self, ty: TypeId, path: &mut TypePath) -> LayoutResult {
        if self.ty(ty).failed {
            return Ok(0);
        }
        let sizes = self.sizes;
        let base = self.base_type(ty);
        match self.ty(base).kind.clone() {
            TypeKind::Basic(BasicKind::String | BasicKind::Any | BasicKind::Int | BasicKind::Uint | BasicKind::Rawptr) => {
                Ok(sizes.word_size)
            }
            TypeKind::Array { elem, .. } => self.nested(elem, path, Registry::align_internal),
            TypeKind::DynamicArray(_) | TypeKind::Slice(_) | TypeKind::Map { .. } => {
                Ok(sizes.word_size)
            }
            TypeKind::Vector { elem, count } => {
                let size = self.nested(elem, path, Registry::size_internal)?;
                let total = size * prev_pow2(count).max(1);
                Ok(total.clamp(1, sizes.max_align))
            }
            TypeKind::Tuple(vars) => {
                let mut max = 1;
                for var in vars {
                    let var_ty = self.entity_type(var);
                    max = max.max(self.align_internal(var_ty, path)?);
                }
                Ok(max)
            }
            TypeKind::Record(record) => match record.kind {
                RecordKind::Struct => {
                    if record.custom_align > 0 {
                        return Ok(record.custom_align.clamp(1, sizes.max_align));
                    }
                    if record.fields.is_empty() {
                        return Ok(1);
                    }
                    let mut max = if record.is_packed { sizes.word_size } else { 1 };
                    for field in record.fields {
                        let field_ty = self.entity_type(field);
                        max = max.max(self.nested(field_ty, path, Registry::align_internal)?);
                    }
                    Ok(max)
                }
                RecordKind::Union | RecordKind::RawUnion => {
                    let skip = usize::from(record.kind == RecordKind::Union);
                    let mut max = 1;
                    for field in record.fields.into_iter().skip(skip) {
                        let field_ty = self.entity_type(field);
                        max = max.max(self.nested(field_ty, path, Registry::align_internal)?);
                    }
                    Ok(max)
                }
                RecordKind::Enum => {
                    self.align_internal(record.enum_base.unwrap_or(TypeId::INT), path)
                }
            },
            _ => {
                let size = self.size_internal(base, path)?;
                Ok(next_pow2(size).clamp(1, sizes.word_size))
            }
        }
    }

    // ==========================================================================
    // Size
    // ==========================================================================

    fn size_internal(&mut self, ty: TypeId, path: &mut TypePath) -> LayoutResult {
        if self.ty(ty).failed {
            return Ok(0);
        }
        let sizes = self.sizes;
        let base = self.base_type(ty);
        match self.ty(base).kind.clone() {
            TypeKind::Basic(kind) => Ok(kind.size(sizes.word_size)),
            TypeKind::Array { elem, count } | TypeKind::Vector { elem, count } => {
                if count == 0 {
                    return Ok(0);
                }
                let align = self.nested(elem, path, Registry::align_internal)?;
                let size = self.nested(elem, path, Registry::size_internal)?;
                Ok(align_formula(size, align) * (count - 1) + size)
            }
            TypeKind::DynamicArray(_) => Ok(self.dynamic_array_size()),
            TypeKind::Slice(_) => Ok(2 * sizes.word_size),
            // Hash table of entries plus its hash index
            TypeKind::Map { .. } => Ok(2 * self.dynamic_array_size()),
            TypeKind::Tuple(vars) => {
                if vars.is_empty() {
                    return Ok(0);
                }
                let align = self.align_internal(base, path)?;
                let offsets = self.offsets_of(&vars, false, path)?;
                let last = vars[vars.len() - 1];
                let last_size = self.size_internal(self.entity_type(last), path)?;
                Ok(align_formula(offsets[offsets.len() - 1] + last_size, align))
            }
            TypeKind::Record(record) => match record.kind {
                RecordKind::Struct => {
                    if record.fields.is_empty() {
                        return Ok(0);
                    }
                    let align = self.align_internal(base, path)?;
                    let offsets = self.struct_offsets(base, path)?;
                    let last = record.fields[record.fields.len() - 1];
                    let last_size =
                        self.nested(self.entity_type(last), path, Registry::size_internal)?;
                    Ok(align_formula(offsets[offsets.len() - 1] + last_size, align))
                }
                RecordKind::Union => {
                    let align = self.align_internal(base, path)?;
                    let mut max = 0;
                    for field in record.fields.into_iter().skip(1) {
                        let field_ty = self.entity_type(field);
                        max = max.max(self.nested(field_ty, path, Registry::size_internal)?);
                    }
                    let size = align_formula(max, sizes.word_size) + sizes.word_size;
                    Ok(align_formula(size, align))
                }
                RecordKind::RawUnion => {
                    let align = self.align_internal(base, path)?;
                    let mut max = 0;
                    for field in record.fields {
                        let field_ty = self.entity_type(field);
                        max = max.max(self.nested(field_ty, path, Registry::size_internal)?);
                    }
                    Ok(align_formula(max, align))
                }
                RecordKind::Enum => {
                    self.size_internal(record.enum_base.unwrap_or(TypeId::INT), path)
                }
            },
            _ => Ok(sizes.word_size),
        }
    }

    /// data, count, capacity, allocator
    fn dynamic_array_size(&self) -> i64 {
        // Allocator is two words and never cyclic
        3 * self.sizes.word_size + 2 * self.sizes.word_size
    }

    // ==========================================================================
    // Offsets
    // ==========================================================================

    fn struct_offsets(&mut self, ty: TypeId, path: &mut TypePath) -> Result<Vec<i64>, CheckError> {
        let Some(record) = self.record(ty) else {
            return Ok(Vec::new());
        };
        if let Some(offsets) = &record.offsets {
            return Ok(offsets.clone());
        }
        let fields = record.fields.clone();
        let packed = record.is_packed;
        let offsets = self.offsets_of(&fields, packed, path)?;
        if let Some(record) = self.record_mut(ty) {
            record.offsets = Some(offsets.clone());
        }
        Ok(offsets)
    }

    fn offsets_of(
        &mut self,
        fields: &[EntityId],
        packed: bool,
        path: &mut TypePath,
    ) -> Result<Vec<i64>, CheckError> {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut current = 0;
        for &field in fields {
            let field_ty = self.entity_type(field);
            if !packed {
                let align = self.nested(field_ty, path, Registry::align_internal)?;
                current = align_formula(current, align);
            }
            offsets.push(current);
            current += self.nested(field_ty, path, Registry::size_internal)?;
        }
        Ok(offsets)
    }
}

#[cfg(test)]
mod tests {
    use quill_core::Span;

    use super::*;
    use crate::entity::Entity;
    use crate::types::Record;

    fn registry() -> Registry {
        Registry::new(TypeSizes::default())
    }

    fn record(reg: &mut Registry, kind: RecordKind, packed: bool, fields: &[TypeId]) -> TypeId {
        let mut record = Record::new(kind);
        record.is_packed = packed;
        for (i, &ty) in fields.iter().enumerate() {
            let name = format!("f{i}");
            let field = reg.add_entity(Entity::field(name, Span::default(), ty, false, i));
            record.fields.push(field);
            record.fields_in_src_order.push(field);
        }
        reg.make_record(record)
    }

    #[test]
    fn pow2_helpers() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(8), 8);
        assert_eq!(prev_pow2(3), 2);
        assert_eq!(prev_pow2(4), 4);
        assert_eq!(align_formula(5, 4), 8);
        assert_eq!(align_formula(5, 0), 5);
    }

    #[test]
    fn basic_sizes() {
        let mut reg = registry();
        assert_eq!(reg.size_of(TypeId::INT).unwrap(), 8);
        assert_eq!(reg.size_of(TypeId::STRING).unwrap(), 16);
        assert_eq!(reg.align_of(TypeId::STRING).unwrap(), 8);
        assert_eq!(reg.align_of(TypeId::U16).unwrap(), 2);
        assert_eq!(reg.size_of(TypeId::BOOL).unwrap(), 1);
    }

    #[test]
    fn struct_layout_pads_fields() {
        let mut reg = registry();
        let s = record(&mut reg, RecordKind::Struct, false, &[TypeId::U8, TypeId::I32, TypeId::U8]);
        assert_eq!(reg.align_of(s).unwrap(), 4);
        assert_eq!(reg.offset_of(s, 1).unwrap(), 4);
        assert_eq!(reg.offset_of(s, 2).unwrap(), 8);
        assert_eq!(reg.size_of(s).unwrap(), 12);
    }

    #[test]
    fn packed_struct_has_no_padding() {
        let mut reg = registry();
        let s = record(&mut reg, RecordKind::Struct, true, &[TypeId::U8, TypeId::I32]);
        assert_eq!(reg.offset_of(s, 1).unwrap(), 1);
        assert_eq!(reg.align_of(s).unwrap(), 8);
        assert_eq!(reg.size_of(s).unwrap(), 8);
    }

    #[test]
    fn arrays_and_vectors() {
        let mut reg = registry();
        let a = reg.make_array(TypeId::I32, 3);
        let empty = reg.make_array(TypeId::I32, 0);
        let v = reg.make_vector(TypeId::F32, 3);
        assert_eq!(reg.size_of(a).unwrap(), 12);
        assert_eq!(reg.size_of(empty).unwrap(), 0);
        assert_eq!(reg.size_of(v).unwrap(), 12);
        assert_eq!(reg.align_of(v).unwrap(), 8);
    }

    #[test]
    fn slices_and_dynamic_arrays() {
        let mut reg = registry();
        let s = reg.make_slice(TypeId::INT);
        let d = reg.make_dynamic_array(TypeId::INT);
        assert_eq!(reg.size_of(s).unwrap(), 16);
        assert_eq!(reg.size_of(d).unwrap(), 40);
        assert_eq!(reg.offset_of(d, 3).unwrap(), 24);
    }

    #[test]
    fn raw_union_takes_largest_field() {
        let mut reg = registry();
        let u = record(&mut reg, RecordKind::RawUnion, false, &[TypeId::U8, TypeId::F64]);
        assert_eq!(reg.size_of(u).unwrap(), 8);
        assert_eq!(reg.align_of(u).unwrap(), 8);
    }

    #[test]
    fn self_containing_struct_is_a_cycle() {
        let mut reg = registry();
        let named = reg.make_named("Node", TypeId::INVALID, None);
        let s = record(&mut reg, RecordKind::Struct, false, &[TypeId::INT, named]);
        reg.set_named_base(named, s);

        let err = reg.size_of(named).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicType);
        assert!(err.message().starts_with("Illegal declaration cycle of `Node`"));
        assert!(err.message().contains("\tNode refers to"));

        // Reported once; afterwards the type is failed and sized as zero
        assert_eq!(reg.size_of(named).unwrap(), 0);
    }

    #[test]
    fn pointer_to_self_is_fine() {
        let mut reg = registry();
        let named = reg.make_named("List", TypeId::INVALID, None);
        let ptr = reg.make_pointer(named);
        let s = record(&mut reg, RecordKind::Struct, false, &[ptr, TypeId::INT]);
        reg.set_named_base(named, s);
        assert_eq!(reg.size_of(named).unwrap(), 16);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn align_formula_rounds_up_to_a_multiple(size in 0i64..1_000_000, align in 1i64..64) {
                let aligned = align_formula(size, align);
                prop_assert_eq!(aligned % align, 0);
                prop_assert!(aligned >= size);
                prop_assert!(aligned - size < align);
            }

            #[test]
            fn array_size_grows_with_count(count in 1i64..512) {
                let mut reg = registry();
                let small = reg.make_array(TypeId::I32, count);
                let large = reg.make_array(TypeId::I32, count + 1);
                prop_assert_eq!(reg.size_of(large).unwrap() - reg.size_of(small).unwrap(), 4);
            }
        }
    }
}
