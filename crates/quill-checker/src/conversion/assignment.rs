//! The assignment choke point.
//!
//! Every place a value flows into a typed slot (variable initializers,
//! assignments, arguments, return values, composite literal elements) goes
//! through [`Checker::check_assignment`], so untyped finalization and
//! assignability are decided in one place.

use quill_ast::Expr;
use quill_core::ErrorKind;
use quill_registry::{EntityId, TypeId};

use crate::checker::Checker;
use crate::operand::{AddressingMode, Operand};

impl<'ast> Checker<'ast> {
    /// Check that `o` can be stored into a slot of type `target`.
    ///
    /// # Arguments
    ///
    /// * `o` - The operand; finalized to `target` (or its default type when
    ///   `target` is `None` or `any`), and invalidated on error
    /// * `target` - Type of the destination, `None` when it is inferred
    /// * `context` - What is being assigned, for diagnostics
    pub fn check_assignment(&mut self, o: &mut Operand<'ast>, target: Option<TypeId>, context: &str) {
        self.check_not_tuple(o);
        if o.is_invalid() || target == Some(TypeId::INVALID) {
            return;
        }

        if let AddressingMode::Overload(procs) = o.mode.clone() {
            if !self.select_overload_for(o, &procs, target, context) {
                o.set_invalid();
                return;
            }
        }

        if self.registry.is_type_untyped(o.ty) {
            let mut convert_to = target;
            let infer = match target {
                None => true,
                Some(t) => self.registry.is_type_any(t),
            };
            if infer {
                if self.registry.is_type_untyped_nil(o.ty) {
                    let span = o.expr.map(|e| e.span()).unwrap_or_default();
                    self.error(ErrorKind::TypeMismatch, span, format!("Use of untyped nil in {context}"));
                    o.set_invalid();
                    return;
                }
                convert_to = Some(self.registry.default_type(o.ty));
            }
            if let Some(t) = convert_to {
                self.convert_to_typed(o, t);
            }
            if o.is_invalid() {
                return;
            }
        }

        let Some(target) = target else {
            return;
        };
        if self.is_assignable_to(o, target) {
            return;
        }

        let e = o.expr_string();
        let span = o.expr.map(|x| x.span()).unwrap_or_default();
        let message = match o.mode {
            AddressingMode::Builtin(_) => format!("Cannot assign builtin procedure `{e}` in {context}"),
            AddressingMode::Type => format!("Cannot assign `{e}` which is a type in {context}"),
            _ => {
                let from = self.type_str(o.ty);
                let to = self.type_str(target);
                format!("Cannot assign value `{e}` of type `{from}` to `{to}` in {context}")
            }
        };
        self.error(ErrorKind::TypeMismatch, span, message);
        o.set_invalid();
    }

    /// Narrow an overloaded name to the candidate whose type is `target`.
    fn select_overload_for(
        &mut self,
        o: &mut Operand<'ast>,
        procs: &[EntityId],
        target: Option<TypeId>,
        context: &str,
    ) -> bool {
        let e = o.expr_string();
        let span = o.expr.map(|x| x.span()).unwrap_or_default();
        let Some(target) = target else {
            self.error(
                ErrorKind::Overload,
                span,
                format!("Cannot determine type from overloaded procedure `{e}`"),
            );
            return false;
        };
        for &p in procs {
            self.check_entity_decl(p);
        }
        let chosen = procs
            .iter()
            .copied()
            .find(|&p| self.registry.are_types_identical(self.registry.entity_type(p), target));
        let Some(p) = chosen else {
            let t = self.type_str(target);
            self.error(
                ErrorKind::Overload,
                span,
                format!("Cannot assign overloaded procedure `{e}` to `{t}` in {context}"),
            );
            return false;
        };
        o.mode = AddressingMode::Value;
        o.ty = self.registry.entity_type(p);
        let node = match o.expr.map(|x| x.unparen()) {
            Some(Expr::Ident(ident)) => Some(ident.id),
            Some(Expr::Selector(s)) => Some(s.field.id),
            _ => None,
        };
        self.add_entity_use(node, p);
        true
    }

    /// Reject a multi-valued operand where a single value is expected.
    pub(crate) fn check_not_tuple(&mut self, o: &mut Operand<'ast>) {
        if o.is_invalid() || !self.registry.is_type_tuple(o.ty) {
            return;
        }
        let count = self.registry.tuple_vars(o.ty).len();
        let span = o.expr.map(|x| x.span()).unwrap_or_default();
        self.error(
            ErrorKind::Arity,
            span,
            format!("{count}-valued tuple found where single value expected"),
        );
        o.set_invalid();
    }
}
