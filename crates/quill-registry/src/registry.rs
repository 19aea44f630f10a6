//! The [`Registry`]: arenas for types, entities and scopes.
//!
//! Every type, entity and scope created while checking a package lives in one
//! of three `Vec` arenas owned by the registry and is addressed by a typed
//! handle ([`TypeId`], [`EntityId`], [`ScopeId`]). Handles never dangle: nothing
//! is removed from an arena until the registry is dropped.
//!
//! # Interning
//!
//! Structural types (pointer, array, dynamic array, vector, slice, map) are
//! interned, so `make_pointer(T)` twice yields the same handle. Records, named
//! types, tuples and procedure signatures are always fresh.
//!
//! # Example
//!
//! ```
//! use quill_registry::{Registry, TypeId, TypeSizes};
//!
//! let mut registry = Registry::new(TypeSizes::default());
//! let a = registry.make_pointer(TypeId::INT);
//! let b = registry.make_pointer(TypeId::INT);
//! assert_eq!(a, b);
//! assert_eq!(registry.type_to_string(a), "^int");
//! ```

use rustc_hash::FxHashMap;

use quill_core::{BasicKind, Span};

use crate::entity::{Entity, EntityKind};
use crate::ids::{EntityId, ScopeId, TypeId};
use crate::layout::TypeSizes;
use crate::scope::Scope;
use crate::types::{CompositeKey, ProcSig, Record, Type, TypeKind};

/// Arena storage for one checking session.
#[derive(Debug, Clone)]
pub struct Registry {
    pub(crate) types: Vec<Type>,
    pub(crate) entities: Vec<Entity>,
    pub(crate) scopes: Vec<Scope>,

    /// Scope holding the predeclared names
    pub(crate) universal: ScopeId,

    /// Structural type interning table
    interned: FxHashMap<CompositeKey, TypeId>,

    /// Fields synthesized for selector lookups, keyed by the selected type
    pub(crate) synthesized: FxHashMap<(TypeId, String), EntityId>,

    pub(crate) sizes: TypeSizes,

    // Types the universe declares and the field tables refer to
    pub(crate) type_info: TypeId,
    pub(crate) type_info_ptr: TypeId,
    pub(crate) allocator: TypeId,
}

impl Registry {
    /// Create a registry with the basic types and the universe scope populated.
    pub fn new(sizes: TypeSizes) -> Self {
        let mut registry = Self {
            types: BasicKind::ALL
                .iter()
                .map(|&kind| Type::new(TypeKind::Basic(kind)))
                .collect(),
            entities: Vec::new(),
            scopes: Vec::new(),
            universal: ScopeId::new(0),
            interned: FxHashMap::default(),
            synthesized: FxHashMap::default(),
            sizes,
            type_info: TypeId::INVALID,
            type_info_ptr: TypeId::INVALID,
            allocator: TypeId::INVALID,
        };
        registry.populate_universe();
        registry
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    #[inline]
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    #[inline]
    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// The scope holding the predeclared names.
    pub fn universal(&self) -> ScopeId {
        self.universal
    }

    pub fn sizes(&self) -> TypeSizes {
        self.sizes
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// The predeclared `Type_Info` record.
    pub fn type_info_type(&self) -> TypeId {
        self.type_info
    }

    /// `^Type_Info`, the result of the type-info builtins.
    pub fn type_info_ptr_type(&self) -> TypeId {
        self.type_info_ptr
    }

    /// The predeclared `Allocator` record carried by dynamic arrays and maps.
    pub fn allocator_type(&self) -> TypeId {
        self.allocator
    }

    /// The record behind `ty`, without resolving names.
    pub fn record(&self, ty: TypeId) -> Option<&Record> {
        self.ty(ty).as_record()
    }

    pub fn record_mut(&mut self, ty: TypeId) -> Option<&mut Record> {
        match &mut self.ty_mut(ty).kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn proc_sig(&self, ty: TypeId) -> Option<&ProcSig> {
        self.ty(ty).as_proc()
    }

    /// Variables of a tuple type; empty for anything else.
    pub fn tuple_vars(&self, ty: TypeId) -> &[EntityId] {
        match &self.ty(ty).kind {
            TypeKind::Tuple(vars) => vars,
            _ => &[],
        }
    }

    // ==========================================================================
    // Entities
    // ==========================================================================

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    /// Type of an entity, `INVALID` when it has not been resolved.
    pub fn entity_type(&self, id: EntityId) -> TypeId {
        self.entity(id).ty.unwrap_or(TypeId::INVALID)
    }

    // ==========================================================================
    // Type construction
    // ==========================================================================

    fn push_type(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(Type::new(kind));
        id
    }

    fn intern(&mut self, key: CompositeKey, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.push_type(kind);
        self.interned.insert(key, id);
        id
    }

    pub fn make_pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(CompositeKey::Pointer(elem), TypeKind::Pointer(elem))
    }

    pub fn make_array(&mut self, elem: TypeId, count: i64) -> TypeId {
        self.intern(
            CompositeKey::Array(elem, count),
            TypeKind::Array { elem, count },
        )
    }

    pub fn make_dynamic_array(&mut self, elem: TypeId) -> TypeId {
        self.intern(CompositeKey::DynamicArray(elem), TypeKind::DynamicArray(elem))
    }

    pub fn make_vector(&mut self, elem: TypeId, count: i64) -> TypeId {
        self.intern(
            CompositeKey::Vector(elem, count),
            TypeKind::Vector { elem, count },
        )
    }

    pub fn make_slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(CompositeKey::Slice(elem), TypeKind::Slice(elem))
    }

    pub fn make_map(&mut self, key: TypeId, value: TypeId, count: i64) -> TypeId {
        self.intern(
            CompositeKey::Map(key, value, count),
            TypeKind::Map { key, value, count },
        )
    }

    pub fn make_record(&mut self, record: Record) -> TypeId {
        self.push_type(TypeKind::Record(record))
    }

    /// A named type. The base is usually filled in later with
    /// [`Registry::set_named_base`] once the declaration is checked.
    pub fn make_named(
        &mut self,
        name: impl Into<String>,
        base: TypeId,
        type_name: Option<EntityId>,
    ) -> TypeId {
        self.push_type(TypeKind::Named {
            name: name.into(),
            base,
            type_name,
        })
    }

    pub fn set_named_base(&mut self, named: TypeId, new_base: TypeId) {
        if let TypeKind::Named { base, .. } = &mut self.ty_mut(named).kind {
            *base = new_base;
        }
    }

    pub fn make_tuple(&mut self, vars: Vec<EntityId>) -> TypeId {
        self.push_type(TypeKind::Tuple(vars))
    }

    /// A tuple of unnamed variables, one per type.
    pub fn make_tuple_of(&mut self, types: &[TypeId]) -> TypeId {
        let vars = types
            .iter()
            .enumerate()
            .map(|(i, &ty)| {
                let mut var = Entity::param("", Span::default(), ty, false, false);
                if let EntityKind::Variable {
                    field_index,
                    field_src_index,
                    ..
                } = &mut var.kind
                {
                    *field_index = i;
                    *field_src_index = i;
                }
                self.add_entity(var)
            })
            .collect();
        self.make_tuple(vars)
    }

    pub fn make_proc(&mut self, sig: ProcSig) -> TypeId {
        self.push_type(TypeKind::Proc(sig))
    }
}
