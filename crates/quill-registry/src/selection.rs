//! Field lookup for selector expressions.

use quill_core::{BasicKind, ExactValue, Span};

use crate::entity::{Entity, EntityFlags, EntityKind};
use crate::ids::{EntityId, TypeId};
use crate::registry::Registry;
use crate::types::{RecordKind, TypeKind};

/// Result of resolving `x.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// The selected field, constant or type name; `None` when not found
    pub entity: Option<EntityId>,
    /// Field index path, one step per struct or `using` hop
    pub index: Vec<usize>,
    /// The path goes through a pointer
    pub indirect: bool,
}

impl Selection {
    pub fn found(&self) -> bool {
        self.entity.is_some()
    }
}

const VECTOR_ELEMS: [&str; 4] = ["x", "y", "z", "w"];

impl Registry {
    /// Strip one level of pointer, looking through names.
    pub fn type_deref(&self, ty: TypeId) -> TypeId {
        match self.ty(self.base_type(ty)).kind {
            TypeKind::Pointer(elem) => elem,
            _ => ty,
        }
    }

    /// Resolve `name` as a member of `ty`.
    ///
    /// With `is_type` set the lookup is for `T.name` (union variants, enum
    /// constants and enum metadata); otherwise it is for `value.name`, where
    /// fields declared directly in a record win over fields promoted from
    /// `using` members.
    pub fn lookup_field(&mut self, ty: TypeId, name: &str, is_type: bool) -> Selection {
        self.lookup_field_with(ty, name, is_type, Selection::default(), &mut Vec::new())
    }

    /// `path` holds the records whose `using` fields are being walked; a
    /// record reached again through its own `using` chain selects nothing.
    fn lookup_field_with(
        &mut self,
        ty: TypeId,
        name: &str,
        is_type: bool,
        mut sel: Selection,
        path: &mut Vec<TypeId>,
    ) -> Selection {
        if name == "_" {
            return Selection::default();
        }
        let target = self.type_deref(ty);
        sel.indirect |= target != ty;
        let base = self.base_type(target);

        match self.ty(base).kind.clone() {
            TypeKind::Basic(BasicKind::Any) => {
                let fields = [("type_info", self.type_info_ptr), ("data", TypeId::RAWPTR)];
                self.builtin_field(sel, base, name, &fields, false)
            }
            TypeKind::Basic(BasicKind::String) => {
                let data = self.make_pointer(TypeId::U8);
                self.builtin_field(sel, base, name, &[("data", data), ("count", TypeId::INT)], false)
            }
            TypeKind::Array { count, .. } => {
                if name == "count" {
                    sel.entity = Some(self.count_constant(base, count));
                }
                sel
            }
            TypeKind::Vector { elem, count } => {
                if name == "count" {
                    sel.entity = Some(self.count_constant(base, count));
                    return sel;
                }
                if count <= 4 && !self.is_type_boolean(elem) {
                    if let Some(i) = VECTOR_ELEMS[..count.max(0) as usize].iter().position(|&n| n == name) {
                        sel.index.push(i);
                        let key = (base, name.to_string());
                        let entity = match self.synthesized.get(&key) {
                            Some(&e) => e,
                            None => {
                                let mut e = Entity::field(name, Span::default(), elem, false, i);
                                e.flags |= EntityFlags::VECTOR_ELEM;
                                let e = self.add_entity(e);
                                self.synthesized.insert(key, e);
                                e
                            }
                        };
                        sel.entity = Some(entity);
                    }
                }
                sel
            }
            TypeKind::Slice(elem) => {
                let data = self.make_pointer(elem);
                self.builtin_field(sel, base, name, &[("data", data), ("count", TypeId::INT)], false)
            }
            TypeKind::DynamicArray(elem) => {
                let data = self.make_pointer(elem);
                let allocator = self.allocator;
                self.builtin_field(
                    sel,
                    base,
                    name,
                    &[
                        ("data", data),
                        ("count", TypeId::INT),
                        ("capacity", TypeId::INT),
                        ("allocator", allocator),
                    ],
                    false,
                )
            }
            TypeKind::Map { .. } => {
                let allocator = self.allocator;
                self.builtin_field(
                    sel,
                    base,
                    name,
                    &[
                        ("count", TypeId::INT),
                        ("capacity", TypeId::INT),
                        ("allocator", allocator),
                    ],
                    true,
                )
            }
            TypeKind::Record(record) if is_type => {
                match record.kind {
                    RecordKind::Union => {
                        sel.entity = record
                            .fields
                            .iter()
                            .copied()
                            .find(|&f| self.entity(f).name == name);
                    }
                    RecordKind::Enum => {
                        let meta = match name {
                            "count" => record.enum_count,
                            "min_value" => record.enum_min_value,
                            "max_value" => record.enum_max_value,
                            _ => None,
                        };
                        sel.entity = meta.or_else(|| {
                            record
                                .fields
                                .iter()
                                .copied()
                                .find(|&f| self.entity(f).name == name)
                        });
                    }
                    RecordKind::Struct | RecordKind::RawUnion => {}
                }
                sel
            }
            TypeKind::Record(record) => {
                if matches!(record.kind, RecordKind::Union | RecordKind::Enum) || path.contains(&base) {
                    return sel;
                }
                // Walk in declaration order, but index by layout position
                let src_order = if record.fields_in_src_order.is_empty() {
                    &record.fields
                } else {
                    &record.fields_in_src_order
                };
                let fields: Vec<(usize, EntityId)> = src_order
                    .iter()
                    .filter_map(|&f| record.fields.iter().position(|&g| g == f).map(|i| (i, f)))
                    .filter(|&(_, f)| {
                        let e = self.entity(f);
                        e.is_variable() && e.flags.contains(EntityFlags::FIELD)
                    })
                    .collect();

                for &(i, f) in &fields {
                    if self.entity(f).name == name {
                        sel.index.push(i);
                        sel.entity = Some(f);
                        return sel;
                    }
                }

                path.push(base);
                for &(i, f) in &fields {
                    if !self.entity(f).flags.contains(EntityFlags::ANONYMOUS) {
                        continue;
                    }
                    let field_ty = self.entity_type(f);
                    let mut nested = sel.clone();
                    nested.index.push(i);
                    let mut nested = self.lookup_field_with(field_ty, name, is_type, nested, path);
                    if nested.found() {
                        if self.is_type_pointer(field_ty) {
                            nested.indirect = true;
                        }
                        path.pop();
                        return nested;
                    }
                }
                path.pop();
                sel
            }
            _ => sel,
        }
    }

    /// Select one of the implicit fields of a builtin aggregate.
    fn builtin_field(
        &mut self,
        mut sel: Selection,
        owner: TypeId,
        name: &str,
        fields: &[(&str, TypeId)],
        immutable: bool,
    ) -> Selection {
        let Some(index) = fields.iter().position(|&(n, _)| n == name) else {
            return sel;
        };
        let key = (owner, name.to_string());
        let entity = match self.synthesized.get(&key) {
            Some(&e) => e,
            None => {
                let mut e = Entity::field(name, Span::default(), fields[index].1, false, index);
                if let EntityKind::Variable { is_immutable, .. } = &mut e.kind {
                    *is_immutable = immutable;
                }
                let e = self.add_entity(e);
                self.synthesized.insert(key, e);
                e
            }
        };
        sel.index.push(index);
        sel.entity = Some(entity);
        sel
    }

    fn count_constant(&mut self, owner: TypeId, count: i64) -> EntityId {
        let key = (owner, "count".to_string());
        if let Some(&e) = self.synthesized.get(&key) {
            return e;
        }
        let e = self.add_entity(Entity::constant(
            "count",
            Span::default(),
            Some(TypeId::INT),
            ExactValue::Integer(count),
        ));
        self.synthesized.insert(key, e);
        e
    }

    /// The field of a struct or tuple declared at source position `index`.
    pub fn lookup_field_from_index(&self, ty: TypeId, index: usize) -> Selection {
        let base = self.base_type(ty);
        match &self.ty(base).kind {
            TypeKind::Record(record) => record
                .fields
                .iter()
                .enumerate()
                .find(|&(_, &f)| {
                    matches!(self.entity(f).kind, EntityKind::Variable { field_src_index, .. } if field_src_index == index)
                })
                .map(|(i, &f)| Selection {
                    entity: Some(f),
                    index: vec![i],
                    indirect: false,
                })
                .unwrap_or_default(),
            TypeKind::Tuple(vars) => vars
                .get(index)
                .map(|&f| Selection {
                    entity: Some(f),
                    index: vec![index],
                    indirect: false,
                })
                .unwrap_or_default(),
            _ => Selection::default(),
        }
    }
}
