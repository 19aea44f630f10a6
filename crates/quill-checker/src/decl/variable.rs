//! Variable declarations.

use quill_ast::Expr;
use quill_core::ErrorKind;
use quill_registry::{EntityId, TypeId};

use crate::checker::{Checker, DeclState};
use crate::info::DeclId;
use crate::operand::Operand;

impl<'ast> Checker<'ast> {
    /// `a, b: T = x, y` or `a, b := f()`; checks every entity of the group.
    pub(crate) fn check_var_decl(&mut self, decl: DeclId) {
        let d = self.info.decl(decl);
        let entities = d.entities.clone();
        let type_expr = d.type_expr;
        let inits = d.init_exprs;

        for &e in &entities {
            self.set_decl_state(e, DeclState::InProgress);
        }

        let declared = type_expr.map(|te| self.check_type(te));
        if let Some(t) = declared {
            for &e in &entities {
                self.registry.entity_mut(e).ty = Some(t);
            }
        }
        if inits.is_empty() {
            if declared.is_none() {
                for &e in &entities {
                    self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                }
            }
            return;
        }
        self.check_init_variables(&entities, inits, "variable declaration");
    }

    /// Initialize `lhs` from `inits`, splicing the results of a single
    /// multi-valued call.
    pub(crate) fn check_init_variables(&mut self, lhs: &[EntityId], inits: &'ast [Expr<'ast>], context: &str) {
        let hints: Vec<Option<TypeId>> = lhs.iter().map(|&e| self.registry.entity(e).ty).collect();
        let operands = self.check_unpacked_exprs(inits, &hints);

        if operands.len() != lhs.len() {
            // Differing expression counts were reported with the declaration
            let counts_match = inits.len() == 1 || inits.len() == lhs.len();
            if counts_match && operands.iter().all(|o| !o.is_invalid()) {
                let span = inits.first().map(|e| e.span()).unwrap_or_default();
                let names = lhs
                    .iter()
                    .map(|&e| self.registry.entity(e).name.clone())
                    .collect::<Vec<_>>()
                    .join(", ");
                let values = inits.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ");
                self.error(
                    ErrorKind::Arity,
                    span,
                    format!("Assignment count mismatch `{names}` = `{values}`"),
                );
            }
            for &e in lhs {
                if self.registry.entity(e).ty.is_none() {
                    self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
                }
            }
            return;
        }

        for (&e, mut o) in lhs.iter().zip(operands) {
            self.check_init_variable(e, &mut o, context);
        }
    }

    fn check_init_variable(&mut self, e: EntityId, o: &mut Operand<'ast>, context: &str) {
        let declared = self.registry.entity(e).ty;
        if o.is_invalid() {
            if declared.is_none() {
                self.registry.entity_mut(e).ty = Some(TypeId::INVALID);
            }
            return;
        }
        self.check_assignment(o, declared, context);
        if declared.is_none() {
            let ty = if o.is_invalid() { TypeId::INVALID } else { o.ty };
            self.registry.entity_mut(e).ty = Some(ty);
        }
    }
}
