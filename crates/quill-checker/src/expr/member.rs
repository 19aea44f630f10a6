//! Selector expressions: `pkg.name`, `value.field` and `Type.member`.

use quill_ast::{Expr, SelectorExpr};
use quill_core::ErrorKind;
use quill_registry::{EntityId, EntityKind, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn check_selector(
        &mut self,
        se: &'ast SelectorExpr<'ast>,
        e: Expr<'ast>,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        if let Some(base) = se.base.as_ident() {
            let found = self.registry.lookup(self.context.scope, base.name);
            if let Some(import) = found {
                if let EntityKind::ImportName { scope, .. } = self.registry.entity(import).kind {
                    self.add_entity_use(Some(base.id), import);
                    if let EntityKind::ImportName { used, .. } = &mut self.registry.entity_mut(import).kind {
                        *used = true;
                    }
                    return self.check_package_selector(se, e, base.name, scope, hint);
                }
            }
        }

        let base = self.check_expr_base(se.base, None);
        if base.is_invalid() {
            return Operand::invalid(Some(e));
        }
        if matches!(base.mode, AddressingMode::NoValue | AddressingMode::Builtin(_) | AddressingMode::Overload(_)) {
            self.error(ErrorKind::TypeMismatch, se.base.span(), format!("`{}` used as a value", se.base));
            return Operand::invalid(Some(e));
        }

        let field = se.field.name;
        let sel = self.registry.lookup_field(base.ty, field, base.is_type());
        let Some(entity) = sel.entity else {
            let t = self.type_str(base.ty);
            self.error(
                ErrorKind::Name,
                se.field.span,
                format!("`{}` (`{t}`) has no field `{field}`", se.base),
            );
            return Operand::invalid(Some(e));
        };

        let base_is_constant_name = se
            .base
            .as_ident()
            .and_then(|id| self.info.uses.get(&id.id))
            .is_some_and(|&b| matches!(self.registry.entity(b).kind, EntityKind::Constant { .. }));
        let is_constant_member = matches!(self.registry.entity(entity).kind, EntityKind::Constant { .. });
        if base_is_constant_name && !is_constant_member {
            self.error(
                ErrorKind::Constant,
                se.field.span,
                format!("Cannot access non-constant field `{field}` from `{}`", se.base),
            );
            return Operand::invalid(Some(e));
        }

        self.add_entity_use(Some(se.field.id), entity);
        let ent = self.registry.entity(entity);
        let ty = ent.ty.unwrap_or(TypeId::INVALID);
        match ent.kind.clone() {
            EntityKind::Constant { value } => Operand::constant(ty, value, e),
            EntityKind::Variable { is_immutable, .. } => {
                let mode = if is_immutable || base.mode == AddressingMode::Immutable {
                    AddressingMode::Immutable
                } else if sel.indirect || base.mode == AddressingMode::Variable {
                    AddressingMode::Variable
                } else {
                    AddressingMode::Value
                };
                Operand::new(mode, ty, e)
            }
            EntityKind::TypeName => Operand::new(AddressingMode::Type, ty, e),
            EntityKind::Builtin(id) => Operand::new(AddressingMode::Builtin(id), TypeId::INVALID, e),
            _ => Operand::new(AddressingMode::Value, ty, e),
        }
    }

    /// `pkg.name` through an import.
    fn check_package_selector(
        &mut self,
        se: &'ast SelectorExpr<'ast>,
        e: Expr<'ast>,
        pkg: &str,
        scope: quill_registry::ScopeId,
        hint: Option<TypeId>,
    ) -> Operand<'ast> {
        let name = se.field.name;
        let found = self
            .registry
            .lookup_in_package(scope, name)
            .filter(|&f| !matches!(self.registry.entity(f).kind, EntityKind::Builtin(_)));
        let Some(entity) = found else {
            self.error(ErrorKind::Name, se.field.span, format!("`{name}` is not declared by `{pkg}`"));
            return Operand::invalid(Some(e));
        };

        let not_exported =
            !is_exported(name) || matches!(self.registry.entity(entity).kind, EntityKind::ImportName { .. });
        if not_exported {
            self.error(ErrorKind::Name, se.field.span, format!("`{name}` is not exported by `{pkg}`"));
            return Operand::invalid(Some(e));
        }

        if self.registry.entity(entity).is_procedure() {
            let procs = self.package_overloads(scope, name);
            if procs.len() > 1 {
                return self.check_overloaded_name(Some(se.field.id), e, procs, hint);
            }
        }
        self.operand_for_entity(e, Some(se.field.id), entity)
    }

    /// Every procedure called `name` declared at package level.
    fn package_overloads(&self, package: quill_registry::ScopeId, name: &str) -> Vec<EntityId> {
        let s = self.registry.scope(package);
        let mut procs: Vec<EntityId> = s.get_all(name).to_vec();
        for &shared in &s.shared {
            procs.extend(
                self.registry
                    .scope(shared)
                    .get_all(name)
                    .iter()
                    .copied()
                    .filter(|&p| self.registry.entity(p).scope == Some(shared)),
            );
        }
        procs
    }
}

/// Names starting with an underscore stay private to their package.
fn is_exported(name: &str) -> bool {
    !name.starts_with('_')
}
