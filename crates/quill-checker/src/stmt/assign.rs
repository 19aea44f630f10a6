//! Assignment statements and local variable declarations.

use quill_ast::{AssignStmt, BinaryExpr, Expr, ValueDecl};
use quill_core::{ErrorKind, ExactValue};
use quill_registry::{Entity, EntityId, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    pub(super) fn visit_assign(&mut self, a: &'ast AssignStmt<'ast>) {
        match a.op.to_binary() {
            None => self.visit_plain_assign(a),
            Some(op) => self.visit_op_assign(a, op),
        }
    }

    /// `a, b = x, y`
    fn visit_plain_assign(&mut self, a: &'ast AssignStmt<'ast>) {
        if a.lhs.is_empty() {
            return;
        }

        let targets: Vec<Option<Operand<'ast>>> = a
            .lhs
            .iter()
            .map(|&lhs| {
                if lhs.unparen().as_ident().is_some_and(|id| id.is_blank()) {
                    if let Some(ident) = lhs.unparen().as_ident() {
                        self.add_entity_definition(ident, None);
                    }
                    None
                } else {
                    Some(self.check_assign_target(lhs))
                }
            })
            .collect();

        let hints: Vec<Option<TypeId>> = targets
            .iter()
            .map(|t| t.as_ref().filter(|o| !o.is_invalid()).map(|o| o.ty))
            .collect();
        let values = self.check_unpacked_exprs(a.rhs, &hints);

        if values.len() != targets.len() {
            if values.iter().all(|o| !o.is_invalid()) {
                let lhs = join_exprs(a.lhs);
                let rhs = join_exprs(a.rhs);
                self.error(
                    ErrorKind::Arity,
                    a.span,
                    format!("Assignment count mismatch `{lhs}` = `{rhs}`"),
                );
            }
            return;
        }

        for (target, mut value) in targets.into_iter().zip(values) {
            match target {
                None => self.check_assignment(&mut value, None, "assignment"),
                Some(t) if t.is_invalid() => {}
                Some(t) => self.check_assignment(&mut value, Some(t.ty), "assignment"),
            }
        }
    }

    /// `x op= y`, checked as `x = x op y`.
    fn visit_op_assign(&mut self, a: &'ast AssignStmt<'ast>, op: quill_ast::BinaryOp) {
        if a.lhs.len() != 1 || a.rhs.len() != 1 {
            let sym = a.op.symbol();
            self.error(
                ErrorKind::Arity,
                a.span,
                format!("Assignment operation `{sym}` requires single-valued expressions"),
            );
            return;
        }
        let (lhs, rhs) = (a.lhs[0], a.rhs[0]);
        let binary = Expr::Binary(self.arena.alloc(BinaryExpr {
            left: lhs,
            op,
            right: rhs,
            id: self.synthetic_id(),
            span: a.span,
        }));
        let mut value = self.check_expr(binary);

        let Some(target) = self.info.types.get(&lhs.id()) else {
            if !value.is_invalid() {
                self.error(ErrorKind::TypeMismatch, lhs.span(), format!("Cannot assign to `{lhs}`"));
            }
            return;
        };
        let (mode, ty) = (target.mode.clone(), target.ty);
        if !mode.is_addressable() {
            self.error(ErrorKind::TypeMismatch, lhs.span(), format!("Cannot assign to `{lhs}`"));
            return;
        }
        if let Some(ty) = ty {
            self.check_assignment(&mut value, Some(ty), "assignment operation");
        }
    }

    /// Check the left-hand side of an assignment.
    fn check_assign_target(&mut self, lhs: Expr<'ast>) -> Operand<'ast> {
        let mut o = self.check_expr(lhs);
        if o.is_invalid() {
            return o;
        }
        if !o.mode.is_addressable() {
            let message = match o.mode {
                AddressingMode::Immutable => format!("Cannot assign to immutable `{lhs}`"),
                _ => format!("Cannot assign to `{lhs}`"),
            };
            self.error(ErrorKind::TypeMismatch, lhs.span(), message);
            o.set_invalid();
        }
        o
    }

    /// Evaluate `exprs` into one operand per value, splicing the values of
    /// multi-valued expressions.
    ///
    /// `hints[i]` steers the `i`th expression when the counts line up. A
    /// single map index or optional-ok value unpacked into two destinations
    /// yields its value and an `ok` boolean.
    pub(crate) fn check_unpacked_exprs(
        &mut self,
        exprs: &'ast [Expr<'ast>],
        hints: &[Option<TypeId>],
    ) -> Vec<Operand<'ast>> {
        let mut operands = Vec::with_capacity(hints.len().max(exprs.len()));
        let aligned = exprs.len() == hints.len();
        for (i, &e) in exprs.iter().enumerate() {
            let hint = if aligned { hints[i] } else { None };
            let o = match hint {
                Some(t) => self.check_expr_with_type_hint(e, Some(t)),
                None => self.check_multi_expr(e),
            };
            let comma_ok = exprs.len() == 1 && hints.len() == 2;
            if comma_ok && matches!(o.mode, AddressingMode::MapIndex | AddressingMode::OptionalOk) {
                operands.extend(self.split_comma_ok(o));
                continue;
            }
            if !o.is_invalid() && self.registry.is_type_tuple(o.ty) {
                let vars = self.registry.tuple_vars(o.ty).to_vec();
                for var in vars {
                    operands.push(Operand {
                        mode: AddressingMode::Value,
                        ty: self.registry.entity_type(var),
                        ..o.clone()
                    });
                }
                continue;
            }
            operands.push(o);
        }
        operands
    }

    /// `v, ok := m[k]`: the looked-up value and whether the key was present.
    fn split_comma_ok(&mut self, o: Operand<'ast>) -> [Operand<'ast>; 2] {
        if let Some(e) = o.expr {
            self.info
                .add_type_and_value(e.id(), AddressingMode::OptionalOk, Some(o.ty), ExactValue::Invalid);
        }
        let ok = Operand {
            mode: AddressingMode::Value,
            ty: TypeId::BOOL,
            value: ExactValue::Invalid,
            expr: o.expr,
        };
        let value = Operand {
            mode: AddressingMode::Value,
            ..o
        };
        [value, ok]
    }

    /// `a, b: T = x, y` inside a procedure. The names come into scope after
    /// the initializers are checked.
    pub(super) fn visit_local_var_decl(&mut self, vd: &'ast ValueDecl<'ast>) {
        self.check_arity_match(vd);
        let entities: Vec<EntityId> = vd
            .names
            .iter()
            .map(|name| self.registry.add_entity(Entity::variable(name.name, name.span, None)))
            .collect();

        if let Some(te) = vd.ty {
            let t = self.check_type(te);
            for &e in &entities {
                self.registry.entity_mut(e).ty = Some(t);
            }
        }
        if vd.values.is_empty() {
            if vd.ty.is_none() {
                for &e in &entities {
                    self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                }
            }
        } else {
            self.check_init_variables(&entities, vd.values, "variable declaration");
        }

        let scope = self.context.scope;
        for (&name, &e) in vd.names.iter().zip(&entities) {
            if name.is_blank() {
                self.add_entity_definition(name, None);
                continue;
            }
            self.add_entity(scope, Some(name), e);
        }

        if vd.is_using {
            for (&name, &e) in vd.names.iter().zip(&entities) {
                self.promote_using_entity(e, scope, name.span);
            }
        }
    }
}

fn join_exprs(exprs: &[Expr<'_>]) -> String {
    exprs.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}
