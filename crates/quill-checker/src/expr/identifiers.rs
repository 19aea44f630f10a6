//! Identifier resolution.

use log::trace;
use quill_ast::{Expr, Ident};
use quill_core::{ErrorKind, NodeId};
use quill_registry::{EntityFlags, EntityId, EntityKind, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn check_identifier(&mut self, ident: Ident<'ast>, hint: Option<TypeId>) -> Operand<'ast> {
        let e = Expr::Ident(ident);
        if ident.is_blank() {
            self.error(ErrorKind::Name, ident.span, "`_` cannot be used as a value type");
            return Operand::invalid(Some(e));
        }

        let Some((scope, entity)) = self.registry.lookup_parent(self.context.scope, ident.name) else {
            self.error(ErrorKind::Name, ident.span, format!("Undeclared name: {}", ident.name));
            return Operand::invalid(Some(e));
        };

        if self.registry.entity(entity).is_procedure() {
            let procs = self.registry.scope(scope).get_all(ident.name).to_vec();
            if procs.len() > 1 {
                return self.check_overloaded_name(Some(ident.id), e, procs, hint);
            }
        }

        self.operand_for_entity(e, Some(ident.id), entity)
    }

    /// A name bound to several procedures.
    ///
    /// An expected procedure type picks the candidate with exactly that
    /// type; otherwise the set is kept for the call to resolve.
    pub(super) fn check_overloaded_name(
        &mut self,
        node: Option<NodeId>,
        e: Expr<'ast>,
        procs: Vec<EntityId>,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        for &p in &procs {
            self.check_entity_decl(p);
        }
        if let Some(hint) = hint {
            let chosen = procs.iter().copied().find(|&p| {
                let ty = self.registry.entity_type(p);
                ty != TypeId::INVALID && self.registry.are_types_identical(ty, hint)
            });
            if let Some(p) = chosen {
                trace!("`{e}` resolved by its expected type");
                self.add_entity_use(node, p);
                return Operand::new(AddressingMode::Value, self.registry.entity_type(p), e);
            }
        }
        Operand::new(AddressingMode::Overload(procs), TypeId::INVALID, e)
    }

    /// The operand an occurrence of `entity` denotes.
    pub(super) fn operand_for_entity(&mut self, e: Expr<'ast>, node: Option<NodeId>, entity: EntityId) -> Operand<'ast> {
        self.add_entity_use(node, entity);
        self.check_entity_decl(entity);

        let ent = self.registry.entity(entity);
        let ty = ent.ty.unwrap_or(TypeId::INVALID);
        let using_parent = ent.using_parent;
        let name = ent.name.clone();

        match ent.kind.clone() {
            EntityKind::Constant { value } => {
                if ty == TypeId::INVALID || value.is_invalid() {
                    return Operand::invalid(Some(e));
                }
                Operand::constant(ty, value, e)
            }
            EntityKind::Variable { is_immutable, .. } => {
                if let Some(parent) = using_parent {
                    self.registry.entity_mut(parent).flags |= EntityFlags::USED;
                }
                if ty == TypeId::INVALID {
                    return Operand::invalid(Some(e));
                }
                let mode = if is_immutable {
                    AddressingMode::Immutable
                } else {
                    AddressingMode::Variable
                };
                Operand::new(mode, ty, e)
            }
            EntityKind::TypeName => {
                if ty == TypeId::INVALID {
                    return Operand::invalid(Some(e));
                }
                Operand::new(AddressingMode::Type, ty, e)
            }
            EntityKind::Procedure { .. } => {
                if ty == TypeId::INVALID {
                    return Operand::invalid(Some(e));
                }
                Operand::new(AddressingMode::Value, ty, e)
            }
            EntityKind::Builtin(id) => Operand::new(AddressingMode::Builtin(id), TypeId::INVALID, e),
            EntityKind::ImportName { .. } => {
                self.error(ErrorKind::Name, e.span(), format!("Use of import `{name}` not in selector"));
                Operand::invalid(Some(e))
            }
            EntityKind::LibraryName { .. } => {
                self.error(
                    ErrorKind::Name,
                    e.span(),
                    format!("Use of library `{name}` not in #foreign tag"),
                );
                Operand::invalid(Some(e))
            }
            EntityKind::Nil => Operand::new(AddressingMode::Value, TypeId::UNTYPED_NIL, e),
            EntityKind::ImplicitValue => Operand::new(AddressingMode::Value, ty, e),
            EntityKind::Label => {
                self.error(ErrorKind::Name, e.span(), format!("Use of label `{name}` as a value"));
                Operand::invalid(Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_ast::AstBuilder;
    use quill_core::ExactValue;
    use quill_registry::Entity;

    use super::*;
    use crate::config::CheckerConfig;

    #[test]
    fn universe_names() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let t = c.check_expr(b.ident("true"));
        assert!(t.is_constant());
        assert_eq!(t.value, ExactValue::Bool(true));
        assert_eq!(t.ty, TypeId::UNTYPED_BOOL);
        let nil = c.check_expr(b.ident("nil"));
        assert_eq!(nil.ty, TypeId::UNTYPED_NIL);
    }

    #[test]
    fn undeclared_and_blank_names() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        assert!(c.check_expr(b.ident("nope")).is_invalid());
        assert!(c.diagnostics().contains("Undeclared name: nope"));
        assert!(c.check_expr(b.ident("_")).is_invalid());
        assert!(c.diagnostics().contains("`_` cannot be used as a value type"));
    }

    #[test]
    fn variables_record_their_use() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut c = Checker::new(&arena, CheckerConfig::default());
        let parent = c.current_scope();
        let scope = c.registry_mut().new_scope(Some(parent));
        c.set_scope(scope);
        let x = c.registry_mut().add_entity(Entity::variable("x", Default::default(), Some(TypeId::F32)));
        c.add_entity(scope, None, x);
        let id = b.ident("x");
        let o = c.check_expr(id);
        assert_eq!(o.mode, AddressingMode::Variable);
        assert_eq!(o.ty, TypeId::F32);
        assert_eq!(c.info().entity_of_ident(id.id()), Some(x));
        assert!(c.registry().entity(x).flags.contains(EntityFlags::USED));
    }
}
