//! Runtime type descriptors.
//!
//! Any type whose `Type_Info` may be needed at run time (the dynamic type of
//! an `any`, `type_info(T)`, map keys) is registered here once per identity,
//! together with every type it is built from.

use log::trace;
use quill_registry::{TypeId, TypeKind};

use crate::checker::Checker;

impl<'ast> Checker<'ast> {
    /// Register `ty` and its component types for runtime type information.
    pub(crate) fn add_type_info(&mut self, ty: TypeId) {
        if ty == TypeId::INVALID {
            return;
        }
        let ty = if self.registry.is_type_untyped(ty) {
            if self.registry.is_type_untyped_nil(ty) {
                return;
            }
            self.registry.default_type(ty)
        } else {
            ty
        };

        if self.info.type_info_map.contains_key(&ty) {
            return;
        }
        let existing = self
            .info
            .type_info_types
            .iter()
            .position(|&t| self.registry.are_types_identical(t, ty));
        if let Some(index) = existing {
            self.info.type_info_map.insert(ty, index);
            return;
        }

        let index = self.info.type_info_types.len();
        self.info.type_info_types.push(ty);
        self.info.type_info_map.insert(ty, index);
        trace!("type info #{index} for `{}`", self.type_str(ty));

        for component in self.type_components(ty) {
            self.add_type_info(component);
        }
    }

    /// Types `ty` is directly built from.
    fn type_components(&self, ty: TypeId) -> Vec<TypeId> {
        match &self.registry.ty(ty).kind {
            TypeKind::Basic(_) => Vec::new(),
            TypeKind::Named { base, .. } => vec![*base],
            TypeKind::Pointer(elem)
            | TypeKind::DynamicArray(elem)
            | TypeKind::Slice(elem)
            | TypeKind::Array { elem, .. }
            | TypeKind::Vector { elem, .. } => vec![*elem],
            TypeKind::Map { key, value, .. } => vec![*key, *value],
            TypeKind::Tuple(vars) => vars.iter().map(|&v| self.registry.entity_type(v)).collect(),
            TypeKind::Proc(sig) => sig.params.into_iter().chain(sig.results).collect(),
            TypeKind::Record(record) => {
                let mut types: Vec<TypeId> = record
                    .fields
                    .iter()
                    .map(|&f| self.registry.entity_type(f))
                    .collect();
                types.extend(record.enum_base);
                types
            }
        }
    }

    /// Types registered for runtime type information, in registration order.
    pub fn type_info_types(&self) -> &[TypeId] {
        &self.info.type_info_types
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;

    use super::*;
    use crate::config::CheckerConfig;

    #[test]
    fn components_are_registered_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let ty = c.check_type(b.slice_type(b.pointer_type(b.ident("f32"))));
        c.add_type_info(ty);
        c.add_type_info(ty);

        let ptr = c.registry_mut().make_pointer(TypeId::F32);
        let registered = c.type_info_types();
        assert_eq!(registered, &[ty, ptr, TypeId::F32]);
    }

    #[test]
    fn untyped_constants_use_their_default_type() {
        let arena = Bump::new();
        let mut c = Checker::new(&arena, CheckerConfig::default());
        c.add_type_info(TypeId::UNTYPED_FLOAT);
        c.add_type_info(TypeId::UNTYPED_NIL);
        assert_eq!(c.type_info_types(), &[TypeId::F64]);
    }

    #[test]
    fn self_referential_records_terminate() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let named = c.registry_mut().make_named("Node", TypeId::INVALID, None);
        let parent = c.current_scope();
        let scope = c.registry_mut().new_scope(Some(parent));
        c.set_scope(scope);
        let entity = c
            .registry_mut()
            .add_entity(quill_registry::Entity::type_name("Node", Default::default(), Some(named)));
        c.add_entity(scope, None, entity);
        let record = c.check_type_named(
            b.struct_type(&[b.field(&["next"], b.pointer_type(b.ident("Node")))]),
            Some(named),
        );
        c.registry_mut().set_named_base(named, record);

        c.add_type_info(named);
        assert!(c.type_info_types().len() >= 3);
    }
}
