//! `using` statements and field promotion.

use log::trace;
use quill_ast::{Expr, UsingStmt};
use quill_core::{ErrorKind, Span};
use quill_registry::{Entity, EntityFlags, EntityId, EntityKind, RecordKind, ScopeId, TypeId};

use crate::checker::Checker;
use crate::operand::AddressingMode;

/// Promotion follows embedded fields at most this deep.
const MAX_USING_DEPTH: usize = 32;

impl<'ast> Checker<'ast> {
    pub(super) fn visit_using(&mut self, u: &'ast UsingStmt<'ast>) {
        for &expr in u.exprs {
            match expr.unparen() {
                Expr::Ident(ident) => {
                    let Some((_, entity)) = self.registry.lookup_parent(self.context.scope, ident.name) else {
                        self.error(ErrorKind::Name, u.span, "`using` applied to an unknown entity");
                        continue;
                    };
                    self.add_entity_use(Some(ident.id), entity);
                    self.check_entity_decl(entity);
                    if !self.using_entity(entity, expr, u.span) {
                        return;
                    }
                }
                Expr::Selector(_) => {
                    if !self.using_selector(expr, u.span) {
                        return;
                    }
                }
                other => {
                    self.error(
                        ErrorKind::SyntaxShape,
                        other.span(),
                        format!("`using` cannot be applied to `{other}`"),
                    );
                }
            }
        }
    }

    /// `using name`. Stops at the first namespace collision.
    fn using_entity(&mut self, entity: EntityId, expr: Expr<'ast>, span: Span) -> bool {
        let scope = self.context.scope;
        let message = match self.registry.entity(entity).kind.clone() {
            EntityKind::ImportName { scope: package, .. } => return self.using_package(package, expr, span),
            EntityKind::TypeName => {
                let ty = self.registry.entity_type(entity);
                return self.using_type_name(ty, expr, span);
            }
            EntityKind::Variable { .. } => {
                self.promote_fields(entity, scope, span, &expr.to_string());
                return true;
            }
            EntityKind::Constant { .. } => "`using` cannot be applied to a constant",
            EntityKind::Procedure { .. } | EntityKind::Builtin(_) => "`using` cannot be applied to a procedure",
            EntityKind::ImplicitValue => "`using` cannot be applied to an implicit value",
            EntityKind::Nil => "`using` cannot be applied to `nil`",
            EntityKind::LibraryName { .. } | EntityKind::Label => "`using` cannot be applied to an invalid entity",
        };
        self.error(ErrorKind::SyntaxShape, span, message);
        true
    }

    /// `using a.b`: a type reached through a package, or a field value.
    fn using_selector(&mut self, expr: Expr<'ast>, span: Span) -> bool {
        let o = self.check_expr_or_type(expr);
        if o.is_invalid() {
            return true;
        }
        let message = match o.mode {
            AddressingMode::Type => return self.using_type_name(o.ty, expr, span),
            AddressingMode::Constant => "`using` cannot be applied to a constant",
            AddressingMode::Builtin(_) | AddressingMode::Overload(_) => "`using` cannot be applied to a procedure",
            _ if self.registry.is_type_proc(o.ty) => "`using` cannot be applied to a procedure",
            _ => {
                let name = expr.to_string();
                let holder = self
                    .registry
                    .add_entity(Entity::variable(name.clone(), expr.span(), Some(o.ty)));
                self.registry.entity_mut(holder).flags |= EntityFlags::ANONYMOUS | EntityFlags::USED;
                let scope = self.context.scope;
                self.promote_fields(holder, scope, span, &name);
                return true;
            }
        };
        self.error(ErrorKind::SyntaxShape, span, message);
        true
    }

    fn using_type_name(&mut self, ty: TypeId, expr: Expr<'ast>, span: Span) -> bool {
        let base = self.registry.base_type(ty);
        let members: Vec<EntityId> = match self.registry.record(base) {
            Some(r) if r.kind == RecordKind::Enum => r.fields.clone(),
            Some(r) if r.kind == RecordKind::Union => r.fields.iter().skip(1).copied().collect(),
            _ => {
                self.error(
                    ErrorKind::TypeMismatch,
                    span,
                    "`using` can be only applied to `union` or `enum` type entities",
                );
                return true;
            }
        };
        let scope = self.context.scope;
        let label = expr.to_string();
        members
            .into_iter()
            .all(|m| self.insert_using_entity(scope, m, &label, span))
    }

    /// Bring the globals of an imported package into the current scope.
    fn using_package(&mut self, package: ScopeId, expr: Expr<'ast>, span: Span) -> bool {
        let mut scopes = vec![package];
        scopes.extend(self.registry.scope(package).shared.iter().copied());
        let mut entities = Vec::new();
        for s in scopes {
            entities.extend(self.registry.scope(s).order.iter().copied().filter(|&e| {
                let ent = self.registry.entity(e);
                ent.scope == Some(s) && !matches!(ent.kind, EntityKind::ImportName { .. } | EntityKind::LibraryName { .. })
            }));
        }
        let scope = self.context.scope;
        let label = expr.to_string();
        entities
            .into_iter()
            .all(|e| self.insert_using_entity(scope, e, &label, span))
    }

    fn insert_using_entity(&mut self, scope: ScopeId, entity: EntityId, label: &str, span: Span) -> bool {
        let Err(prev) = self.registry.insert_entity(scope, entity) else {
            return true;
        };
        if prev == entity {
            return true;
        }
        let name = self.registry.entity(prev).name.clone();
        let at = self.diagnostics.location(self.registry.entity(prev).span);
        self.error(
            ErrorKind::Redeclaration,
            span,
            format!("Namespace collision while `using` `{label}` of: {name}\n\tat {at}"),
        );
        false
    }

    /// Declare the fields of the struct behind `e` in `scope` as variables
    /// of their own, reached through `e`.
    ///
    /// # Returns
    ///
    /// `false` when `e` is not a struct or raw_union (or a pointer to one),
    /// or when a promoted name collides.
    pub(crate) fn promote_using_entity(&mut self, e: EntityId, scope: ScopeId, span: Span) -> bool {
        let label = self.registry.entity(e).name.clone();
        self.promote_fields(e, scope, span, &label)
    }

    fn promote_fields(&mut self, e: EntityId, scope: ScopeId, span: Span, label: &str) -> bool {
        let ty = self.registry.entity_type(e);
        if ty == TypeId::INVALID {
            return false;
        }
        let target = self.registry.base_type(self.registry.type_deref(ty));
        if !self.registry.is_type_struct(target) && !self.registry.is_type_raw_union(target) {
            self.error(
                ErrorKind::TypeMismatch,
                span,
                "`using` can only be applied to variables of type struct or raw_union",
            );
            return false;
        }
        self.promote_record_fields(e, target, scope, span, label, 0)
    }

    fn promote_record_fields(
        &mut self,
        parent: EntityId,
        record_ty: TypeId,
        scope: ScopeId,
        span: Span,
        label: &str,
        depth: usize,
    ) -> bool {
        if depth > MAX_USING_DEPTH {
            return true;
        }
        let fields = match self.registry.record(record_ty) {
            Some(r) if r.fields_in_src_order.is_empty() => r.fields.clone(),
            Some(r) => r.fields_in_src_order.clone(),
            None => return true,
        };
        for f in fields {
            let field = self.registry.entity(f);
            if field.is_blank() || !field.is_variable() {
                continue;
            }
            let anonymous = field.flags.contains(EntityFlags::ANONYMOUS);
            let mut promoted = Entity::new(field.kind.clone(), field.name.clone(), span, field.ty);
            promoted.flags = EntityFlags::FIELD | EntityFlags::USED;
            promoted.using_parent = Some(parent);
            let promoted = self.registry.add_entity(promoted);
            trace!("promote `{}` through `{label}`", self.registry.entity(promoted).name);
            if !self.insert_using_entity(scope, promoted, label, span) {
                return false;
            }

            if anonymous {
                let inner = self.registry.entity_type(promoted);
                let inner = self.registry.base_type(self.registry.type_deref(inner));
                if (self.registry.is_type_struct(inner) || self.registry.is_type_raw_union(inner))
                    && !self.promote_record_fields(promoted, inner, scope, span, label, depth + 1)
                {
                    return false;
                }
            }
        }
        true
    }
}
